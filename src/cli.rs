use clap::Parser;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q       : Quit (Esc cancels an active rename first)
  Left / h      : Previous image
  Right / l     : Next image
  Space         : Next image
  Home / End    : First / last image
  + / - / Wheel : Zoom in / out (wheel zooms at the cursor)
  z             : Toggle 1:1 / fit to window
  Drag          : Pan
  f             : Toggle fullscreen
  i             : Toggle info overlay
  ?             : Toggle help overlay
  o             : Open file dialog
  Delete        : Move image (and companions) to trash
  F2            : Rename image (and companions)
";

#[derive(Parser)]
#[command(name = "piv", about = "A simple image viewer", after_help = HELP_KEYS)]
pub struct Cli {
    /// Image file to open; its directory siblings become the browse list
    pub path: Option<std::path::PathBuf>,
}
