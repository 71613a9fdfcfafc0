/// Highest device pixel ratio the drawing buffer is allowed to use.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Provides the current viewport dimensions in logical pixels.
pub trait ViewportProvider {
    fn viewport_size(&self) -> (u32, u32);
}

/// Output size and density of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    pixel_ratio: f64,
}

/// Result of a resize, ready to be applied to the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    /// Density reported by the platform, before capping.
    pub device_pixel_ratio: f64,
    pub pixel_ratio: f64,
    pub aspect: f32,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            width: 0,
            height: 0,
            pixel_ratio: 1.0,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Applies new logical dimensions and device density immediately.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> Resize {
        self.width = width;
        self.height = height;
        self.pixel_ratio = capped_pixel_ratio(device_pixel_ratio);
        let (buffer_width, buffer_height) = self.buffer_size();
        Resize {
            width,
            height,
            device_pixel_ratio,
            pixel_ratio: self.pixel_ratio,
            aspect: self.aspect(),
            buffer_width,
            buffer_height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Width over height; a zero height is treated as one pixel.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Drawing-buffer dimensions in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.pixel_ratio).floor() as u32,
            (self.height as f64 * self.pixel_ratio).floor() as u32,
        )
    }
}

impl Resize {
    /// Whether the device is denser than the drawing buffer is allowed to be.
    pub fn is_density_capped(&self) -> bool {
        self.device_pixel_ratio > self.pixel_ratio
    }
}

impl ViewportProvider for Viewport {
    fn viewport_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Device density clamped to [`MAX_PIXEL_RATIO`]; non-finite or
/// non-positive readings fall back to 1.
pub fn capped_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_sets_exact_size_and_aspect() {
        let mut viewport = Viewport::new(800, 600, 1.0);
        let resize = viewport.resize(1920, 1080, 1.0);
        assert_eq!(viewport.viewport_size(), (1920, 1080));
        assert_eq!(resize.aspect, 1920.0 / 1080.0);
        assert_eq!((resize.buffer_width, resize.buffer_height), (1920, 1080));
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        assert_eq!(capped_pixel_ratio(0.5), 0.5);
        assert_eq!(capped_pixel_ratio(1.5), 1.5);
        assert_eq!(capped_pixel_ratio(2.0), 2.0);
        assert_eq!(capped_pixel_ratio(3.0), 2.0);
        assert_eq!(capped_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn buffer_scales_with_density() {
        let viewport = Viewport::new(1001, 500, 3.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
        assert_eq!(viewport.buffer_size(), (2002, 1000));

        let viewport = Viewport::new(1001, 501, 1.5);
        assert_eq!(viewport.buffer_size(), (1501, 751));
    }

    #[test]
    fn resize_reports_when_density_is_capped() {
        let mut viewport = Viewport::new(800, 600, 1.0);
        let resize = viewport.resize(800, 600, 3.0);
        assert!(resize.is_density_capped());
        assert_eq!(resize.device_pixel_ratio, 3.0);
        assert_eq!(resize.pixel_ratio, 2.0);

        assert!(!viewport.resize(800, 600, 2.0).is_density_capped());
        assert!(!viewport.resize(800, 600, 0.5).is_density_capped());
        assert!(!viewport.resize(800, 600, f64::NAN).is_density_capped());
    }

    #[test]
    fn zero_height_keeps_aspect_finite() {
        let viewport = Viewport::new(640, 0, 1.0);
        assert_eq!(viewport.aspect(), 640.0);
    }
}
