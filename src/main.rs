use clap::Parser;
use winit::event_loop::EventLoop;

use piv::browser::{DirectoryBrowser, FormatSet};
use piv::cli::Cli;
use piv::ui::App;
use piv::ui::state::ViewerState;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let browser = DirectoryBrowser::new(FormatSet::default());
    let state = ViewerState::new(browser);

    let event_loop = EventLoop::new().expect("create event loop");
    let mut app = App::new(state, cli.path);

    event_loop.run_app(&mut app).expect("run event loop");
}
