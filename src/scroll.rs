/// Maps accumulated wheel input to a damped, normalized offset in `[0, 1]`.
///
/// The scrollable range spans `pages - 1` viewport heights. The published
/// offset chases the clamped target with damped smoothing so the camera
/// glides instead of stepping; consumers read it once per frame.
pub struct ScrollController {
    offset: f32,
    target: f32,
    damping: f32,
    pages: f32,
    viewport_height: f32,
}

impl ScrollController {
    pub fn new(pages: f32, viewport_height: f32) -> Self {
        Self {
            offset: 0.0,
            target: 0.0,
            damping: 0.1,
            pages,
            viewport_height: viewport_height.max(1.0),
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    /// Scrolling down (negative wheel delta) advances the offset. Clamped
    /// here so downstream consumers never see an out-of-range value.
    pub fn on_wheel_pixels(&mut self, dy: f32) {
        let range = self.viewport_height * (self.pages - 1.0);
        self.target = (self.target - dy / range).clamp(0.0, 1.0);
    }

    pub fn update(&mut self, delta: f32) {
        let step = (delta / self.damping).min(1.0);
        self.offset += (self.target - self.offset) * step;
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_input_is_clamped_to_the_page_range() {
        let mut scroll = ScrollController::new(2.0, 720.0);

        scroll.on_wheel_pixels(-1_000_000.0);
        for _ in 0..600 {
            scroll.update(1.0 / 60.0);
            assert!((0.0..=1.0).contains(&scroll.offset()));
        }
        assert!((scroll.offset() - 1.0).abs() < 1e-3);

        scroll.on_wheel_pixels(1_000_000.0);
        for _ in 0..600 {
            scroll.update(1.0 / 60.0);
            assert!((0.0..=1.0).contains(&scroll.offset()));
        }
        assert!(scroll.offset() < 1e-3);
    }

    #[test]
    fn offset_converges_without_overshoot() {
        let mut scroll = ScrollController::new(2.0, 720.0);
        scroll.on_wheel_pixels(-360.0); // half the scrollable range

        let mut last = scroll.offset();
        for _ in 0..300 {
            scroll.update(1.0 / 60.0);
            assert!(scroll.offset() >= last);
            assert!(scroll.offset() <= 0.5 + 1e-6);
            last = scroll.offset();
        }
        assert!((scroll.offset() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn a_long_frame_lands_exactly_on_the_target() {
        let mut scroll = ScrollController::new(2.0, 720.0);
        scroll.on_wheel_pixels(-720.0);

        scroll.update(1.0);
        assert_eq!(scroll.offset(), 1.0);
    }
}
