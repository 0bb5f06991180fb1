//! Threshold-and-buffer activation for transform deltas.
//!
//! Until a gesture is "transforming", per-frame movement is summed into
//! buffers and nothing is reported. The frame on which a buffer crosses the
//! pixel threshold reports the whole buffered total at once, and every frame
//! after that reports only its own instantaneous delta.

use glam::Vec2;
use log::debug;

/// Inches per centimetre.
pub const CM_TO_INCH: f32 = 0.393_700_787;

pub const DEFAULT_DPI: f32 = 96.0;

/// Screen pixels per centimetre for a display of `dpi`.
pub fn dots_per_centimeter(dpi: f32) -> f32 {
    dpi * CM_TO_INCH
}

/// A physical distance and its size in screen pixels, squared and cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenDistance {
    centimeters: f32,
    dots_per_cm: f32,
    pixels: f32,
    pixels_squared: f32,
}

impl ScreenDistance {
    pub fn new(centimeters: f32, dots_per_cm: f32) -> Self {
        let mut d = Self {
            centimeters,
            dots_per_cm,
            pixels: 0.0,
            pixels_squared: 0.0,
        };
        d.recompute();
        d
    }

    pub fn from_dpi(centimeters: f32, dpi: f32) -> Self {
        Self::new(centimeters, dots_per_centimeter(dpi))
    }

    /// A distance given directly in pixels.
    pub fn from_pixels(pixels: f32) -> Self {
        Self::new(pixels, 1.0)
    }

    pub fn set_centimeters(&mut self, centimeters: f32) {
        self.centimeters = centimeters;
        self.recompute();
    }

    pub fn set_dots_per_cm(&mut self, dots_per_cm: f32) {
        self.dots_per_cm = dots_per_cm;
        self.recompute();
    }

    pub fn centimeters(&self) -> f32 {
        self.centimeters
    }

    pub fn dots_per_cm(&self) -> f32 {
        self.dots_per_cm
    }

    pub fn pixels(&self) -> f32 {
        self.pixels
    }

    pub fn pixels_squared(&self) -> f32 {
        self.pixels_squared
    }

    /// Whether a scalar displacement reaches this distance.
    pub fn is_reached_by(&self, displacement: f32) -> bool {
        displacement * displacement >= self.pixels_squared
    }

    pub fn is_reached_by_vec(&self, displacement: Vec2) -> bool {
        displacement.length_squared() >= self.pixels_squared
    }

    fn recompute(&mut self) {
        self.pixels = self.centimeters * self.dots_per_cm;
        self.pixels_squared = self.pixels * self.pixels;
    }
}

/// Outcome of feeding one frame of translation to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TranslationStep {
    /// Still under the threshold; report nothing.
    Buffered,
    /// Crossed the threshold this frame; report the whole buffered vector.
    Snapped(Vec2),
    /// Already transforming; report this frame's movement.
    Live,
}

/// Per-gesture buffers for sub-threshold movement.
///
/// A single `is_transforming` latch is shared by all axes: once any axis
/// crosses the threshold, every axis reports live deltas.
#[derive(Debug, Clone)]
pub struct DeltaAccumulator {
    threshold: ScreenDistance,
    translation_buffer: Vec2,
    rotation_pixel_buffer: f32,
    angle_buffer: f32,
    scaling_pixel_buffer: f32,
    scale_buffer: f32,
    is_transforming: bool,
}

impl DeltaAccumulator {
    pub fn new(threshold: ScreenDistance) -> Self {
        Self {
            threshold,
            translation_buffer: Vec2::ZERO,
            rotation_pixel_buffer: 0.0,
            angle_buffer: 0.0,
            scaling_pixel_buffer: 0.0,
            scale_buffer: 1.0,
            is_transforming: false,
        }
    }

    pub fn threshold(&self) -> &ScreenDistance {
        &self.threshold
    }

    pub fn threshold_mut(&mut self) -> &mut ScreenDistance {
        &mut self.threshold
    }

    pub fn is_transforming(&self) -> bool {
        self.is_transforming
    }

    pub fn translation_buffer(&self) -> Vec2 {
        self.translation_buffer
    }

    pub fn angle_buffer(&self) -> f32 {
        self.angle_buffer
    }

    pub fn scale_buffer(&self) -> f32 {
        self.scale_buffer
    }

    /// Back to identity: empty buffers, not transforming.
    pub fn reset(&mut self) {
        self.translation_buffer = Vec2::ZERO;
        self.rotation_pixel_buffer = 0.0;
        self.angle_buffer = 0.0;
        self.scaling_pixel_buffer = 0.0;
        self.scale_buffer = 1.0;
        self.is_transforming = false;
    }

    /// Feeds one frame of rotation and returns the angle to report.
    ///
    /// `pixel_displacement` is how far the tracked point moved across the
    /// rotation radius on screen; `angle` is this frame's angle in degrees.
    pub fn rotation(&mut self, pixel_displacement: f32, angle: f32) -> f32 {
        if self.is_transforming {
            return angle;
        }
        self.rotation_pixel_buffer += pixel_displacement;
        self.angle_buffer += angle;
        if self.threshold.is_reached_by(self.rotation_pixel_buffer) {
            self.is_transforming = true;
            debug!(
                "rotation crossed threshold ({:.2}px), snapping {:.3} deg",
                self.rotation_pixel_buffer, self.angle_buffer
            );
            return self.angle_buffer;
        }
        0.0
    }

    /// Feeds one frame of scaling and returns the ratio to report.
    ///
    /// `pixel_displacement` is the signed change in distance on screen;
    /// `ratio` is this frame's scale factor. Ratios buffer as a product.
    pub fn scaling(&mut self, pixel_displacement: f32, ratio: f32) -> f32 {
        if self.is_transforming {
            return ratio;
        }
        self.scaling_pixel_buffer += pixel_displacement;
        self.scale_buffer *= ratio;
        if self.threshold.is_reached_by(self.scaling_pixel_buffer) {
            self.is_transforming = true;
            debug!(
                "scaling crossed threshold ({:.2}px), snapping x{:.4}",
                self.scaling_pixel_buffer, self.scale_buffer
            );
            return self.scale_buffer;
        }
        1.0
    }

    /// Feeds one frame of screen translation.
    pub fn translation(&mut self, delta: Vec2) -> TranslationStep {
        if self.is_transforming {
            return TranslationStep::Live;
        }
        self.translation_buffer += delta;
        if self.threshold.is_reached_by_vec(self.translation_buffer) {
            self.is_transforming = true;
            debug!(
                "translation crossed threshold, snapping ({:.2}, {:.2})",
                self.translation_buffer.x, self.translation_buffer.y
            );
            return TranslationStep::Snapped(self.translation_buffer);
        }
        TranslationStep::Buffered
    }
}
