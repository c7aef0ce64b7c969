//! Rendering surface abstraction.
//!
//! Scenes draw into an RGBA8 framebuffer owned by a [`RenderSurface`]. The
//! scheduler clears and presents the surface and polls it for quit requests.
//! [`HeadlessSurface`] keeps everything in memory and is what the CLI host
//! and the tests drive.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bytes per framebuffer pixel (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

/// Optional capabilities a scene may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceFeature {
    DepthTexture,
    FloatTexture,
    VertexTextureFetch,
}

impl std::fmt::Display for SurfaceFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthTexture => write!(f, "depth-texture"),
            Self::FloatTexture => write!(f, "float-texture"),
            Self::VertexTextureFetch => write!(f, "vertex-texture-fetch"),
        }
    }
}

/// A line of overlay text in normalized surface coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub position: (f32, f32),
    pub size: f32,
}

/// Text drawn on top of a scene frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub stats: Option<TextItem>,
    pub title: Option<TextItem>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.stats.is_none() && self.title.is_none()
    }
}

/// Surface a scene renders into.
pub trait RenderSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Driver vendor string, used for telemetry layout detection.
    fn vendor(&self) -> &str;

    /// Whether an optional capability is available.
    fn supports(&self, _feature: SurfaceFeature) -> bool {
        true
    }

    /// Clear the framebuffer before a frame.
    fn clear(&mut self);

    /// Present the current frame.
    fn update(&mut self);

    /// Whether the host asked the run to stop.
    fn should_quit(&self) -> bool;

    /// Recreate the surface between scenes.
    fn reset(&mut self);

    /// RGBA8 framebuffer, row-major, `width * height * 4` bytes.
    fn framebuffer_mut(&mut self) -> &mut [u8];

    /// Copy of the current framebuffer contents.
    fn read_pixels(&self) -> Vec<u8>;

    /// Draw decoration text over the current frame.
    fn draw_overlay(&mut self, _overlay: &Overlay) {}
}

/// In-memory surface with no window system behind it.
#[derive(Debug)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    vendor: String,
    unsupported: Vec<SurfaceFeature>,
    quit_after_frames: Option<u64>,
    quit_flag: Option<Arc<AtomicBool>>,
    frames_presented: u64,
    resets: u32,
    overlay: Option<Overlay>,
}

impl HeadlessSurface {
    /// Create a new surface with every feature available.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            vendor: "gpuload headless".to_string(),
            unsupported: Vec::new(),
            quit_after_frames: None,
            quit_flag: None,
            frames_presented: 0,
            resets: 0,
            overlay: None,
        }
    }

    /// Report `vendor` as the driver vendor string.
    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Mark a feature as unavailable.
    #[must_use]
    pub fn without_feature(mut self, feature: SurfaceFeature) -> Self {
        self.unsupported.push(feature);
        self
    }

    /// Request quit once `frames` frames have been presented.
    #[must_use]
    pub fn quit_after_frames(mut self, frames: u64) -> Self {
        self.quit_after_frames = Some(frames);
        self
    }

    /// Request quit whenever `flag` is set.
    #[must_use]
    pub fn with_quit_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.quit_flag = Some(flag);
        self
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    /// Overlay drawn on the most recent frame, if any.
    pub fn last_overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }
}

impl RenderSurface for HeadlessSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn supports(&self, feature: SurfaceFeature) -> bool {
        !self.unsupported.contains(&feature)
    }

    fn clear(&mut self) {
        self.pixels.fill(0);
        self.overlay = None;
    }

    fn update(&mut self) {
        self.frames_presented += 1;
    }

    fn should_quit(&self) -> bool {
        let flagged = self
            .quit_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst));
        let exhausted = self
            .quit_after_frames
            .is_some_and(|limit| self.frames_presented >= limit);
        flagged || exhausted
    }

    fn reset(&mut self) {
        self.pixels.fill(0);
        self.overlay = None;
        self.resets += 1;
    }

    fn framebuffer_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    fn read_pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        self.overlay = Some(overlay.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_framebuffer_size() {
        let mut surface = HeadlessSurface::new(4, 3);
        assert_eq!(surface.framebuffer_mut().len(), 4 * 3 * BYTES_PER_PIXEL);
        assert_eq!(surface.read_pixels().len(), 48);
    }

    #[test]
    fn test_headless_features() {
        let surface = HeadlessSurface::new(1, 1).without_feature(SurfaceFeature::DepthTexture);
        assert!(!surface.supports(SurfaceFeature::DepthTexture));
        assert!(surface.supports(SurfaceFeature::FloatTexture));
    }

    #[test]
    fn test_headless_quit_after_frames() {
        let mut surface = HeadlessSurface::new(1, 1).quit_after_frames(2);
        assert!(!surface.should_quit());
        surface.update();
        assert!(!surface.should_quit());
        surface.update();
        assert!(surface.should_quit());
    }

    #[test]
    fn test_headless_quit_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let surface = HeadlessSurface::new(1, 1).with_quit_flag(Arc::clone(&flag));
        assert!(!surface.should_quit());
        flag.store(true, Ordering::SeqCst);
        assert!(surface.should_quit());
    }

    #[test]
    fn test_clear_and_reset() {
        let mut surface = HeadlessSurface::new(2, 2);
        surface.framebuffer_mut()[0] = 255;
        surface.draw_overlay(&Overlay::default());
        assert!(surface.last_overlay().is_some());

        surface.clear();
        assert_eq!(surface.read_pixels()[0], 0);
        assert!(surface.last_overlay().is_none());

        surface.reset();
        assert_eq!(surface.resets(), 1);
    }
}
