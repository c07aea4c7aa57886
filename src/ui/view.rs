// ---------------------------------------------------------------------------
// View transform: zoom, pan, fit
// ---------------------------------------------------------------------------

pub const MIN_ZOOM: f32 = 0.01;
pub const MAX_ZOOM: f32 = 50.0;
pub const ZOOM_STEP: f32 = 0.25;

/// Zoom changes below this are dropped to avoid redundant layout churn.
const ZOOM_EPSILON: f32 = 0.001;

/// Zoom factor and pan offset for the displayed image.
///
/// Pan is the top-left corner of the scaled image in viewport coordinates.
/// After every mutation the pan is clamped: an axis where the scaled image
/// fits inside the viewport is centered exactly; on an axis where it
/// overflows, the image edges never pull inside the viewport edges.
///
/// With no image loaded (or no viewport yet) every operation is a no-op.
#[derive(Debug, Clone)]
pub struct ViewState {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
    image_w: u32,
    image_h: u32,
    viewport_w: u32,
    viewport_h: u32,
    /// While set, a resize recomputes the fit instead of keeping the zoom.
    fit_mode: bool,
    /// Fit requested against a zero-area viewport; consumed by the next
    /// viewport update.
    pending_fit: bool,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            image_w: 0,
            image_h: 0,
            viewport_w: 0,
            viewport_h: 0,
            fit_mode: true,
            pending_fit: false,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan(&self) -> (f32, f32) {
        (self.pan_x, self.pan_y)
    }

    pub fn is_fit_mode(&self) -> bool {
        self.fit_mode
    }

    pub fn has_image(&self) -> bool {
        self.image_w > 0 && self.image_h > 0
    }

    fn has_viewport(&self) -> bool {
        self.viewport_w > 0 && self.viewport_h > 0
    }

    pub fn scaled_size(&self) -> (f32, f32) {
        (
            self.image_w as f32 * self.zoom,
            self.image_h as f32 * self.zoom,
        )
    }

    /// Top-left corner and scale for the renderer; `None` while no image is
    /// loaded.
    pub fn draw_rect(&self) -> Option<(f32, f32, f32)> {
        if !self.has_image() {
            return None;
        }
        Some((self.pan_x, self.pan_y, self.zoom))
    }

    /// A new bitmap is displayed: remember its dimensions and refit.
    pub fn set_image(&mut self, width: u32, height: u32) {
        self.image_w = width;
        self.image_h = height;
        self.request_fit();
    }

    pub fn clear_image(&mut self) {
        self.image_w = 0;
        self.image_h = 0;
        self.pending_fit = false;
        self.fit_mode = true;
    }

    /// The display surface changed size. Consumes a pending fit; refits while
    /// in fit mode, otherwise re-clamps the pan against the new bounds.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport_w = width;
        self.viewport_h = height;
        if !self.has_image() || !self.has_viewport() {
            return;
        }
        if self.pending_fit || self.fit_mode {
            self.fit_to_window();
        } else {
            self.clamp_pan();
        }
    }

    /// Request fit-to-window. Deferred until a non-zero viewport is known;
    /// the caller retries by feeding the next layout through `set_viewport`.
    pub fn request_fit(&mut self) {
        self.fit_mode = true;
        if self.has_image() && self.has_viewport() {
            self.fit_to_window();
        } else {
            self.pending_fit = true;
        }
    }

    pub fn has_pending_fit(&self) -> bool {
        self.pending_fit
    }

    fn fit_to_window(&mut self) {
        let zoom = fit_scale(
            self.image_w as f32,
            self.image_h as f32,
            self.viewport_w as f32,
            self.viewport_h as f32,
        );
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan_x = (self.viewport_w as f32 - self.image_w as f32 * self.zoom) / 2.0;
        self.pan_y = (self.viewport_h as f32 - self.image_h as f32 * self.zoom) / 2.0;
        self.fit_mode = true;
        self.pending_fit = false;
    }

    /// Set an absolute zoom level, keeping the image point under `anchor`
    /// (viewport coordinates, defaults to the viewport center) stationary.
    pub fn set_zoom(&mut self, target: f32, anchor: Option<(f32, f32)>) {
        if !self.has_image() || !self.has_viewport() {
            return;
        }
        let target = target.clamp(MIN_ZOOM, MAX_ZOOM);
        if (target - self.zoom).abs() < ZOOM_EPSILON {
            return;
        }
        let (ax, ay) = anchor.unwrap_or((
            self.viewport_w as f32 / 2.0,
            self.viewport_h as f32 / 2.0,
        ));

        // Image-space point under the anchor stays under it after the zoom.
        let img_x = (ax - self.pan_x) / self.zoom;
        let img_y = (ay - self.pan_y) / self.zoom;
        self.zoom = target;
        self.pan_x = ax - img_x * target;
        self.pan_y = ay - img_y * target;
        self.fit_mode = false;
        self.clamp_pan();
    }

    pub fn zoom_by(&mut self, delta: f32, anchor: Option<(f32, f32)>) {
        self.set_zoom(self.zoom + delta, anchor);
    }

    /// Toggle between 1:1 pixels and fit-to-window.
    pub fn toggle_actual_size(&mut self) {
        if !self.has_image() || !self.has_viewport() {
            return;
        }
        if self.fit_mode || (self.zoom - 1.0).abs() >= ZOOM_EPSILON {
            self.set_zoom(1.0, None);
            self.fit_mode = false;
        } else {
            self.request_fit();
        }
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if !self.has_image() || !self.has_viewport() {
            return;
        }
        self.pan_x += dx;
        self.pan_y += dy;
        self.clamp_pan();
    }

    /// Absolute pan target, used by mouse dragging.
    pub fn set_pan(&mut self, x: f32, y: f32) {
        if !self.has_image() || !self.has_viewport() {
            return;
        }
        self.pan_x = x;
        self.pan_y = y;
        self.clamp_pan();
    }

    fn clamp_pan(&mut self) {
        let (scaled_w, scaled_h) = self.scaled_size();
        self.pan_x = clamp_axis(self.pan_x, scaled_w, self.viewport_w as f32);
        self.pan_y = clamp_axis(self.pan_y, scaled_h, self.viewport_h as f32);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fit zoom: the image's larger-relative-to-viewport axis exactly fills the
/// viewport, never upscaling past 100%.
pub fn fit_scale(img_w: f32, img_h: f32, win_w: f32, win_h: f32) -> f32 {
    (win_w / img_w).min(win_h / img_h).min(1.0)
}

fn clamp_axis(pan: f32, scaled: f32, viewport: f32) -> f32 {
    if scaled <= viewport {
        (viewport - scaled) / 2.0
    } else {
        pan.clamp(viewport - scaled, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(img: (u32, u32), viewport: (u32, u32)) -> ViewState {
        let mut v = ViewState::new();
        v.set_viewport(viewport.0, viewport.1);
        v.set_image(img.0, img.1);
        v
    }

    #[test]
    fn fit_halves_an_image_twice_the_viewport() {
        let v = view((1600, 1200), (800, 600));
        assert_eq!(v.zoom(), 0.5);
        assert_eq!(v.pan(), (0.0, 0.0));
    }

    #[test]
    fn fit_never_upscales() {
        let v = view((100, 100), (800, 600));
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.pan(), (350.0, 250.0));
    }

    #[test]
    fn small_image_is_centered_exactly() {
        let v = view((400, 300), (800, 600));
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.pan(), (200.0, 150.0));
    }

    #[test]
    fn fit_is_deferred_until_a_viewport_exists() {
        let mut v = ViewState::new();
        v.set_image(1600, 1200);
        assert!(v.has_pending_fit());

        v.set_viewport(800, 600);
        assert!(!v.has_pending_fit());
        assert_eq!(v.zoom(), 0.5);
        assert_eq!(v.pan(), (0.0, 0.0));
    }

    #[test]
    fn zoom_is_clamped_to_the_valid_range() {
        let mut v = view((1600, 1200), (800, 600));
        v.set_zoom(100.0, None);
        assert_eq!(v.zoom(), MAX_ZOOM);
        v.set_zoom(0.0001, None);
        assert_eq!(v.zoom(), MIN_ZOOM);
    }

    #[test]
    fn tiny_zoom_changes_are_dropped() {
        let mut v = view((1600, 1200), (800, 600));
        let before = (v.zoom(), v.pan());
        v.set_zoom(v.zoom() + 0.0005, Some((10.0, 10.0)));
        assert_eq!((v.zoom(), v.pan()), before);
    }

    #[test]
    fn anchor_point_is_invariant_across_consecutive_zooms() {
        let mut v = view((2000, 1500), (800, 600));
        let anchor = (100.0, 100.0);

        let image_point = |v: &ViewState| {
            let (px, py) = v.pan();
            ((anchor.0 - px) / v.zoom(), (anchor.1 - py) / v.zoom())
        };

        v.set_zoom(2.0, Some(anchor));
        let first = image_point(&v);

        v.set_zoom(5.0, Some(anchor));
        let second = image_point(&v);

        assert!((first.0 - second.0).abs() < 1e-2);
        assert!((first.1 - second.1).abs() < 1e-2);
    }

    #[test]
    fn zoom_without_anchor_keeps_the_viewport_center() {
        let mut v = view((2000, 1500), (800, 600));
        let center = (400.0, 300.0);

        let center_point = |v: &ViewState| {
            let (px, py) = v.pan();
            ((center.0 - px) / v.zoom(), (center.1 - py) / v.zoom())
        };

        v.set_zoom(2.0, None);
        let first = center_point(&v);
        v.set_zoom(3.0, None);
        let second = center_point(&v);

        assert!((first.0 - second.0).abs() < 1e-2);
        assert!((first.1 - second.1).abs() < 1e-2);
    }

    #[test]
    fn pan_is_clamped_to_the_viewport_edges() {
        let mut v = view((2000, 1500), (800, 600));
        v.set_zoom(2.0, None); // scaled 4000x3000

        v.set_pan(50.0, 50.0);
        assert_eq!(v.pan(), (0.0, 0.0));

        v.set_pan(-1e9, -1e9);
        assert_eq!(v.pan(), (800.0 - 4000.0, 600.0 - 3000.0));
    }

    #[test]
    fn pan_centers_a_fitting_axis_after_zoom() {
        // Wide image: at zoom 1.0 it overflows horizontally but fits
        // vertically, so the vertical axis must center exactly.
        let mut v = view((1600, 300), (800, 600));
        v.set_zoom(1.0, None);
        let (_, py) = v.pan();
        assert_eq!(py, (600.0 - 300.0) / 2.0);
    }

    #[test]
    fn toggle_switches_between_actual_size_and_fit() {
        let mut v = view((1600, 1200), (800, 600));
        assert!(v.is_fit_mode());

        v.toggle_actual_size();
        assert_eq!(v.zoom(), 1.0);
        assert!(!v.is_fit_mode());

        v.toggle_actual_size();
        assert!(v.is_fit_mode());
        assert_eq!(v.zoom(), 0.5);
    }

    #[test]
    fn resize_refits_while_in_fit_mode() {
        let mut v = view((1600, 1200), (800, 600));
        v.set_viewport(400, 300);
        assert_eq!(v.zoom(), 0.25);
    }

    #[test]
    fn resize_keeps_a_manual_zoom_and_reclamps() {
        let mut v = view((1600, 1200), (800, 600));
        v.set_zoom(1.0, None);
        v.set_viewport(400, 300);
        assert_eq!(v.zoom(), 1.0);
        let (px, py) = v.pan();
        assert!((400.0 - 1600.0..=0.0).contains(&px));
        assert!((300.0 - 1200.0..=0.0).contains(&py));
    }

    #[test]
    fn operations_without_an_image_are_no_ops() {
        let mut v = ViewState::new();
        v.set_viewport(800, 600);
        v.set_zoom(2.0, None);
        v.pan_by(10.0, 10.0);
        v.toggle_actual_size();
        assert_eq!(v.zoom(), 1.0);
        assert_eq!(v.pan(), (0.0, 0.0));
        assert!(v.draw_rect().is_none());
    }
}
