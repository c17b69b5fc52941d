use crate::game::line::LineTransform;
use cgmath::{Angle, Deg, Rad};

// -----------------------------------------------------------------------------
// Logical design space
// -----------------------------------------------------------------------------
#[inline(always)] pub const fn logical_height() -> f32 { 480.0 }
#[inline(always)] pub const fn design_width_16_9() -> f32 { 854.0 }

// -----------------------------------------------------------------------------
// Metrics (world space, origin at the center, y up)
// -----------------------------------------------------------------------------
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    pub left:   f32,
    pub right:  f32,
    pub top:    f32,
    pub bottom: f32,
}

impl Metrics {
    #[inline(always)] pub fn width(&self)  -> f32 { self.right - self.left }
    #[inline(always)] pub fn height(&self) -> f32 { self.top - self.bottom }
}

// -----------------------------------------------------------------------------
// Metrics for a given display (pixels → world space, clamped ≤ 16:9)
// -----------------------------------------------------------------------------
#[inline(always)]
pub fn metrics_for_window(px_w: u32, px_h: u32) -> Metrics {
    let aspect = if px_h == 0 { 1.0 } else { px_w as f32 / px_h as f32 };
    let h = logical_height();
    let unclamped_w = h * aspect;
    let w = unclamped_w.min(design_width_16_9());
    let half_w = 0.5 * w;
    let half_h = 0.5 * h;

    Metrics {
        left: -half_w, right: half_w,
        bottom: -half_h, top: half_h,
    }
}

// -----------------------------------------------------------------------------
// Stage: chart coordinates (fractions, bottom-left origin) → world
// -----------------------------------------------------------------------------
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stage {
    metrics: Metrics,
}

impl Stage {
    pub fn for_display(px_w: u32, px_h: u32) -> Self {
        Self { metrics: metrics_for_window(px_w, px_h) }
    }

    #[inline(always)] pub fn width(&self)   -> f32 { self.metrics.width() }
    #[inline(always)] pub fn height(&self)  -> f32 { self.metrics.height() }

    #[inline(always)]
    pub fn to_world(&self, x_frac: f64, y_frac: f64) -> [f32; 2] {
        let m = self.metrics;
        [
            (m.left as f64 + x_frac * m.width() as f64) as f32,
            (m.bottom as f64 + y_frac * m.height() as f64) as f32,
        ]
    }

    /// World point `lane_frac` stage widths along the line and `normal` world
    /// units off it (positive is the line's "above" side).
    pub fn line_point(&self, line: &LineTransform, lane_frac: f64, normal: f64) -> [f32; 2] {
        let origin = self.to_world(line.x, line.y);
        let (sin, cos) = Rad::from(Deg(line.rotation)).sin_cos();
        let lx = lane_frac * self.width() as f64;
        [
            origin[0] + (cos * lx - sin * normal) as f32,
            origin[1] + (sin * lx + cos * normal) as f32,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 2], b: [f32; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-3 && (a[1] - b[1]).abs() < 1e-3
    }

    #[test]
    fn wide_displays_clamp_to_16_9() {
        let m = metrics_for_window(3440, 1440);
        assert_eq!(m.width(), 854.0);
        assert_eq!(m.height(), 480.0);
        let m = metrics_for_window(640, 480);
        assert!((m.width() - 640.0).abs() < 1e-3);
    }

    #[test]
    fn stage_center_is_world_origin() {
        let stage = Stage::for_display(854, 480);
        assert!(close(stage.to_world(0.5, 0.5), [0.0, 0.0]));
        assert!(close(stage.to_world(0.0, 0.0), [-427.0, -240.0]));
    }

    #[test]
    fn line_point_follows_rotation() {
        let stage = Stage::for_display(854, 480);
        let flat = LineTransform::default();
        assert!(close(stage.line_point(&flat, 0.1, 20.0), [85.4, 20.0]));

        let upright = LineTransform { rotation: 90.0, ..LineTransform::default() };
        // Along-line axis now points up; "above" points left.
        assert!(close(stage.line_point(&upright, 0.1, 20.0), [-20.0, 85.4]));
    }
}
