//! Drawable surface bookkeeping.

use tracing::debug;

/// Logical size and pixel ratio of the drawing surface.
///
/// Zero-sized surfaces are legal (a collapsed container); every derived
/// quantity clamps its divisor to at least one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl Surface {
    /// A surface of `width` by `height` CSS pixels; bogus ratios count as 1.
    #[must_use]
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self { width, height, pixel_ratio: sanitize_ratio(pixel_ratio) }
    }

    /// Applies a new logical size and pixel ratio.
    ///
    /// Returns `false` without touching anything when nothing changed, so
    /// callers can skip reconfiguring the pipeline.
    pub fn resize(&mut self, width: u32, height: u32, pixel_ratio: f32) -> bool {
        let next = Self::new(width, height, pixel_ratio);
        if next == *self {
            return false;
        }

        debug!(width, height, pixel_ratio = next.pixel_ratio, "surface resized");
        *self = next;
        true
    }

    /// Logical size in CSS pixels.
    #[must_use]
    pub fn logical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Device pixels per CSS pixel.
    #[must_use]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Backing-store size in device pixels, each axis at least 1.
    #[must_use]
    pub fn physical_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.pixel_ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }

    /// Width over height with both clamped to at least 1.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// `true` when either logical side is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Caps the device pixel ratio; missing or bogus ratios count as 1.
#[must_use]
pub fn effective_pixel_ratio(device_ratio: f64, max_ratio: f32) -> f32 {
    let device = if device_ratio.is_finite() && device_ratio > 0.0 { device_ratio as f32 } else { 1.0 };
    device.min(max_ratio)
}

fn sanitize_ratio(ratio: f32) -> f32 {
    if ratio.is_finite() && ratio > 0.0 { ratio } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_is_idempotent() {
        let mut surface = Surface::new(800, 600, 1.0);
        assert!(!surface.resize(800, 600, 1.0));
        assert!(surface.resize(1024, 600, 1.0));
        assert!(!surface.resize(1024, 600, 1.0));
    }

    #[test]
    fn test_zero_size_clamps() {
        let mut surface = Surface::new(800, 600, 2.0);
        assert!(surface.resize(0, 0, 2.0));
        assert!(surface.is_empty());
        assert_eq!(surface.physical_size(), (1, 1));
        assert_eq!(surface.aspect(), 1.0);

        assert!(surface.resize(800, 600, 2.0));
        assert_eq!(surface.physical_size(), (1600, 1200));
        assert!((surface.aspect() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_fractional_ratio_rounds() {
        let surface = Surface::new(101, 33, 1.75);
        assert_eq!(surface.physical_size(), (177, 58));
    }

    #[test]
    fn test_effective_pixel_ratio() {
        assert_eq!(effective_pixel_ratio(3.0, 1.75), 1.75);
        assert_eq!(effective_pixel_ratio(1.25, 1.75), 1.25);
        assert_eq!(effective_pixel_ratio(f64::NAN, 1.75), 1.0);
        assert_eq!(effective_pixel_ratio(0.0, 1.75), 1.0);
    }
}
