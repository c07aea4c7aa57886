use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use winit::keyboard::NamedKey;
use winit::window::{Fullscreen, Window};

use crate::browser::{DirectoryBrowser, IMAGE_EXTENSIONS};
use crate::cli::HELP_KEYS;
use crate::error::Error;
use crate::loader::{DecodedImage, decode_image};
use crate::ui::render::{BG_COLOR, blit_scaled, draw_text, fill_rect, rgb};
use crate::ui::view::{ViewState, ZOOM_STEP};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// Key-hold navigation repeat. The CLI takes no flags, so these are fixed.
pub const NAV_INITIAL_DELAY: f64 = 0.5;
pub const NAV_REPEAT_DELAY: f64 = 0.035;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

pub struct ViewerState {
    pub browser: DirectoryBrowser,
    pub view: ViewState,
    pub current: Option<DecodedImage>,
    pub error_message: Option<String>,
    pub status_message: Option<String>,

    pub show_info: bool,
    pub show_help: bool,
    pub is_fullscreen: bool,

    pub dragging: bool,
    pub drag_start: (f64, f64),
    pub drag_pan_start: (f32, f32),
    pub mouse_pos: (f64, f64),

    /// Rename prompt edit buffer; `Some` while the input line is active.
    /// While active, the event handler routes all keyboard input here.
    pub rename_input: Option<String>,

    // Key-hold repeat state
    pub nav_hold_timer: f64,
    pub nav_past_initial: bool,
    pub last_frame: Instant,

    // Track which keys are currently held
    pub keys_down: HashSet<NamedKey>,
    pub chars_down: HashSet<char>,

    // Track keys that were just pressed this frame
    pub keys_pressed: HashSet<NamedKey>,
    pub chars_pressed: HashSet<char>,

    // Mouse wheel accumulator for this frame
    pub wheel_y: f32,
}

impl ViewerState {
    pub fn new(browser: DirectoryBrowser) -> Self {
        Self {
            browser,
            view: ViewState::new(),
            current: None,
            error_message: None,
            status_message: None,
            show_info: false,
            show_help: false,
            is_fullscreen: false,
            dragging: false,
            drag_start: (0.0, 0.0),
            drag_pan_start: (0.0, 0.0),
            mouse_pos: (0.0, 0.0),
            rename_input: None,
            nav_hold_timer: 0.0,
            nav_past_initial: false,
            last_frame: Instant::now(),
            keys_down: HashSet::new(),
            chars_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            chars_pressed: HashSet::new(),
            wheel_y: 0.0,
        }
    }

    pub fn is_key_pressed_named(&self, k: NamedKey) -> bool {
        self.keys_pressed.contains(&k)
    }

    pub fn is_char_pressed(&self, c: char) -> bool {
        self.chars_pressed.contains(&c)
    }

    pub fn is_key_down_named(&self, k: NamedKey) -> bool {
        self.keys_down.contains(&k)
    }

    pub fn is_char_down(&self, c: char) -> bool {
        self.chars_down.contains(&c)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load `path`, rebuilding the sibling list around it.
    pub fn load(&mut self, path: &Path, window: &Window) {
        match self.browser.load(path) {
            Ok(result) => {
                log::info!(
                    "loaded {} ({}/{})",
                    result.path.display(),
                    result.index + 1,
                    result.count
                );
                self.show_current(window);
            }
            Err(err) => {
                // A failed load may have reset the browser (unsupported
                // format); keep the display consistent with it.
                if self.browser.is_empty() {
                    self.current = None;
                    self.view.clear_image();
                }
                self.report(err);
            }
        }
    }

    /// Decode and display whatever the browser currently points at.
    fn show_current(&mut self, window: &Window) {
        self.error_message = None;
        self.status_message = None;

        let Some(path) = self.browser.current_path().map(Path::to_path_buf) else {
            self.current = None;
            self.view.clear_image();
            window.set_title("piv");
            return;
        };

        match decode_image(&path) {
            Ok(decoded) => {
                self.view.set_image(decoded.width, decoded.height);
                self.current = Some(decoded);
                self.update_title(window);
            }
            Err(err) => {
                self.current = None;
                self.view.clear_image();
                self.report(err);
            }
        }
    }

    fn update_title(&self, window: &Window) {
        let (Some(path), Some(index)) =
            (self.browser.current_path(), self.browser.current_index())
        else {
            window.set_title("piv");
            return;
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        window.set_title(&format!(
            "{} [{}/{}] - piv",
            name,
            index + 1,
            self.browser.len()
        ));
    }

    fn report(&mut self, err: Error) {
        log::error!("{err}");
        self.error_message = Some(err.to_string());
    }

    // ------------------------------------------------------------------
    // Delete / rename / open
    // ------------------------------------------------------------------

    fn delete_current(&mut self, window: &Window) {
        match self.browser.delete_current() {
            Ok(Some(result)) => {
                log::info!("trashed {}", result.deleted.display());
                self.show_current(window);
                let name = result
                    .deleted
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.status_message = Some(if result.companions.is_empty() {
                    format!("Moved {} to trash", name)
                } else {
                    format!(
                        "Moved {} and {} companion file(s) to trash",
                        name,
                        result.companions.len()
                    )
                });
            }
            Ok(None) => {}
            Err(err) => self.report(err),
        }
    }

    pub fn begin_rename(&mut self) {
        if let Some(path) = self.browser.current_path() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.rename_input = Some(stem);
        }
    }

    pub fn rename_push(&mut self, text: &str) {
        if let Some(buffer) = &mut self.rename_input {
            buffer.extend(text.chars().filter(|c| !c.is_control()));
        }
    }

    pub fn rename_backspace(&mut self) {
        if let Some(buffer) = &mut self.rename_input {
            buffer.pop();
        }
    }

    pub fn cancel_rename(&mut self) {
        self.rename_input = None;
    }

    pub fn commit_rename(&mut self, window: &Window) {
        let Some(new_base) = self.rename_input.take() else {
            return;
        };
        match self.browser.rename_current(&new_base) {
            Ok(Some(new_path)) => {
                log::info!("renamed to {}", new_path.display());
                self.update_title(window);
                let name = new_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.status_message = Some(format!("Renamed to {}", name));
            }
            Ok(None) => {}
            Err(err) => self.report(err),
        }
    }

    fn open_dialog(&mut self, window: &Window) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file();
        if let Some(path) = picked {
            self.load(&path, window);
        }
    }

    // ------------------------------------------------------------------
    // Per-frame update
    // ------------------------------------------------------------------

    /// Run the per-frame logic: input handling and dispatch.
    /// Returns true if the app should quit.
    pub fn update(&mut self, window: &Window) -> bool {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;

        // The rename prompt captures all keyboard input in the event handler.
        if self.rename_input.is_some() {
            self.end_frame();
            return false;
        }

        // ------------------------------------------------------------------
        // Quit
        // ------------------------------------------------------------------
        if self.is_key_pressed_named(NamedKey::Escape) || self.is_char_pressed('q') {
            return true;
        }

        // ------------------------------------------------------------------
        // Navigation (with key-hold repeat)
        // ------------------------------------------------------------------
        let mut nav = 0i32;

        let fwd_down = self.is_key_down_named(NamedKey::ArrowRight)
            || self.is_key_down_named(NamedKey::Space)
            || self.is_char_down('l');
        let bwd_down = self.is_key_down_named(NamedKey::ArrowLeft) || self.is_char_down('h');
        let fwd_pressed = self.is_key_pressed_named(NamedKey::ArrowRight)
            || self.is_key_pressed_named(NamedKey::Space)
            || self.is_char_pressed('l');
        let bwd_pressed = self.is_key_pressed_named(NamedKey::ArrowLeft) || self.is_char_pressed('h');

        if fwd_pressed || bwd_pressed {
            nav = if fwd_pressed { 1 } else { -1 };
            self.nav_hold_timer = 0.0;
            self.nav_past_initial = false;
        } else if fwd_down || bwd_down {
            self.nav_hold_timer += dt;
            if !self.nav_past_initial {
                if self.nav_hold_timer >= NAV_INITIAL_DELAY {
                    nav = if fwd_down { 1 } else { -1 };
                    self.nav_hold_timer = 0.0;
                    self.nav_past_initial = true;
                }
            } else if self.nav_hold_timer >= NAV_REPEAT_DELAY {
                nav = if fwd_down { 1 } else { -1 };
                self.nav_hold_timer -= NAV_REPEAT_DELAY;
            }
        } else {
            self.nav_hold_timer = 0.0;
            self.nav_past_initial = false;
        }

        let before = self.browser.current_index();
        let mut moved = false;
        if self.is_key_pressed_named(NamedKey::Home) {
            self.browser.first();
            moved = true;
        } else if self.is_key_pressed_named(NamedKey::End) {
            self.browser.last();
            moved = true;
        } else if nav != 0 {
            if nav > 0 {
                self.browser.next();
            } else {
                self.browser.previous();
            }
            moved = true;
        }
        if moved && self.browser.current_index() != before {
            log::debug!(
                "[nav] move {:?} -> {:?}",
                before,
                self.browser.current_index()
            );
            self.show_current(window);
        }

        // ------------------------------------------------------------------
        // Overlays and window
        // ------------------------------------------------------------------
        if self.is_char_pressed('i') {
            self.show_info = !self.show_info;
        }
        if self.is_char_pressed('?') {
            self.show_help = !self.show_help;
        }
        if self.is_char_pressed('f') {
            self.is_fullscreen = !self.is_fullscreen;
            if self.is_fullscreen {
                window.set_fullscreen(Some(Fullscreen::Borderless(None)));
            } else {
                window.set_fullscreen(None);
            }
            // The resize event re-fits or re-clamps the view.
        }

        // ------------------------------------------------------------------
        // Zoom: z toggles 1:1 / fit, = / - / wheel step at the anchor
        // ------------------------------------------------------------------
        if self.is_char_pressed('z') {
            self.view.toggle_actual_size();
        }

        let zoom_in = self.is_char_pressed('=') || self.is_char_pressed('+');
        let zoom_out = self.is_char_pressed('-');
        let wheel = self.wheel_y;
        let zoom_delta = if zoom_in {
            ZOOM_STEP
        } else if zoom_out {
            -ZOOM_STEP
        } else if wheel.abs() > 0.1 {
            wheel.signum() * ZOOM_STEP
        } else {
            0.0
        };

        if zoom_delta != 0.0 {
            // Zoom toward the mouse position, or the center if it is outside.
            let size = window.inner_size();
            let (mx, my) = (self.mouse_pos.0 as f32, self.mouse_pos.1 as f32);
            let anchor = if mx >= 0.0 && mx <= size.width as f32 && my >= 0.0 && my <= size.height as f32
            {
                Some((mx, my))
            } else {
                None
            };
            self.view.zoom_by(zoom_delta, anchor);
        }

        // ------------------------------------------------------------------
        // File operations
        // ------------------------------------------------------------------
        if self.is_key_pressed_named(NamedKey::Delete) {
            self.delete_current(window);
        }
        if self.is_key_pressed_named(NamedKey::F2) {
            self.begin_rename();
        }
        if self.is_char_pressed('o') {
            self.open_dialog(window);
        }

        self.end_frame();
        false
    }

    fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.chars_pressed.clear();
        self.wheel_y = 0.0;
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Render into the softbuffer framebuffer (u32 per pixel, 0x00RRGGBB).
    pub fn render(&self, frame: &mut [u32], fb_w: u32, fb_h: u32) {
        let bg = rgb(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]);
        frame.fill(bg);

        let text_scale: u32 = 2;
        let line_h = (7 * text_scale + 4) as i32;

        match (self.current.as_ref(), self.view.draw_rect()) {
            (Some(dec), Some((x0, y0, scale))) => {
                blit_scaled(
                    frame,
                    fb_w,
                    fb_h,
                    &dec.rgba_bytes,
                    dec.width,
                    dec.height,
                    x0,
                    y0,
                    scale,
                );

                if self.show_info {
                    let count = self.browser.len();
                    let position = self.browser.current_index().map_or(0, |i| i + 1);
                    let filename = self
                        .browser
                        .current_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();

                    let line1 = format!("[{}/{}]", position, count);
                    let line2 = filename;
                    let line3 = format!(
                        "{}x{} | {} | {:.1} KB | zoom {:.0}%",
                        dec.width,
                        dec.height,
                        dec.format_name,
                        dec.file_size as f64 / 1024.0,
                        self.view.zoom() * 100.0,
                    );

                    let bar_h = (line_h * 3 + 8) as u32;
                    fill_rect(frame, fb_w, fb_h, 0, 0, fb_w, bar_h, (0, 0, 0, 178));
                    let white = (255, 255, 255, 255);
                    draw_text(frame, fb_w, fb_h, &line1, 10, 4, text_scale, white);
                    draw_text(frame, fb_w, fb_h, &line2, 10, 4 + line_h, text_scale, white);
                    draw_text(frame, fb_w, fb_h, &line3, 10, 4 + line_h * 2, text_scale, white);
                }
            }
            _ => {
                if self.error_message.is_none() {
                    let hint = "No image - press 'o' to open or drop a file here";
                    let tx = (fb_w as i32 - hint.len() as i32 * (6 * text_scale) as i32) / 2;
                    draw_text(
                        frame,
                        fb_w,
                        fb_h,
                        hint,
                        tx.max(10),
                        fb_h as i32 / 2,
                        text_scale,
                        (200, 200, 200, 255),
                    );
                }
            }
        }

        if let Some(ref err) = self.error_message {
            draw_text(
                frame,
                fb_w,
                fb_h,
                err,
                20,
                fb_h as i32 / 2,
                text_scale,
                (255, 80, 80, 255),
            );
        } else if let Some(ref status) = self.status_message {
            let bar_y = fb_h as i32 - line_h - 8;
            fill_rect(frame, fb_w, fb_h, 0, bar_y, fb_w, (line_h + 8) as u32, (0, 0, 0, 178));
            draw_text(
                frame,
                fb_w,
                fb_h,
                status,
                10,
                bar_y + 4,
                text_scale,
                (255, 255, 255, 255),
            );
        }

        if let Some(ref input) = self.rename_input {
            let prompt = format!("New name: {}_", input);
            let bar_y = fb_h as i32 - line_h - 8;
            fill_rect(frame, fb_w, fb_h, 0, bar_y, fb_w, (line_h + 8) as u32, (0, 0, 0, 220));
            draw_text(
                frame,
                fb_w,
                fb_h,
                &prompt,
                10,
                bar_y + 4,
                text_scale,
                (255, 255, 255, 255),
            );
        }

        if self.show_help {
            fill_rect(frame, fb_w, fb_h, 0, 0, fb_w, fb_h, (0, 0, 0, 200));
            let mut y = 20;
            for line in HELP_KEYS.lines() {
                draw_text(frame, fb_w, fb_h, line, 20, y, text_scale, (255, 255, 255, 255));
                y += 24;
            }
        }
    }
}
