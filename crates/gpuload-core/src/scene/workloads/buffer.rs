//! Replay of frames captured earlier in the run.

use crate::scene::{FrameRecord, Scene, SceneState};
use crate::surface::{BYTES_PER_PIXEL, RenderSurface};

/// Streams captured frames back into the framebuffer.
///
/// The main loop attaches the run's captured frame records before setup.
/// Frames whose size doesn't match the surface are skipped; with nothing to
/// replay the scene streams a generated gradient instead.
pub struct BufferScene {
    state: SceneState,
    clips: Vec<FrameRecord>,
    frames: Vec<Vec<u8>>,
    update_fraction: f64,
}

impl BufferScene {
    /// Create a new buffer scene.
    pub fn new() -> Self {
        let mut state = SceneState::new("buffer");
        state.options.add(
            "update-fraction",
            "1.0",
            "The fraction of the buffer rows to refresh each frame",
        );
        state.options.add_with_values(
            "update-method",
            "map",
            "Which method to use to update buffer contents",
            &["map", "subdata"],
        );

        Self {
            state,
            clips: Vec::new(),
            frames: Vec::new(),
            update_fraction: 1.0,
        }
    }

    /// Frames loaded for the current run.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn load_frames(&mut self, width: u32, height: u32) {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        self.frames = self
            .clips
            .iter()
            .filter(|clip| clip.width == width && clip.height == height)
            .filter_map(|clip| match std::fs::read(&clip.file) {
                Ok(bytes) if bytes.len() == expected => Some(bytes),
                Ok(_) => {
                    tracing::debug!("Skipping truncated clip {}", clip.file.display());
                    None
                }
                Err(e) => {
                    tracing::debug!("Skipping clip {}: {}", clip.file.display(), e);
                    None
                }
            })
            .collect();

        if self.frames.is_empty() {
            self.frames.push(gradient(width, height));
        }
    }
}

impl Default for BufferScene {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, (x ^ y) as u8, 255]);
        }
    }
    pixels
}

impl Scene for BufferScene {
    fn state(&self) -> &SceneState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    fn attach_clips(&mut self, clips: &[FrameRecord]) {
        self.clips = clips.to_vec();
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, now_us: u64) -> bool {
        self.update_fraction = self
            .state
            .options
            .get_f64("update-fraction")
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        self.load_frames(surface.width(), surface.height());

        let supported = self.supported(&*surface, true);
        self.state.begin_run(now_us, supported)
    }

    fn teardown(&mut self) {
        self.frames.clear();
        self.state.set_running(false);
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(&mut self, surface: &mut dyn RenderSurface) {
        if self.frames.is_empty() {
            return;
        }

        let frame_index = self.state.current_frame() as usize;
        let source = &self.frames[frame_index % self.frames.len()];
        let height = surface.height() as usize;
        let row_bytes = surface.width() as usize * BYTES_PER_PIXEL;
        if height == 0 || row_bytes == 0 {
            return;
        }

        let rows = ((height as f64 * self.update_fraction).ceil() as usize).min(height);
        let first = (frame_index * rows) % height;
        let target = surface.framebuffer_mut();

        for i in 0..rows {
            let row = (first + i) % height;
            let range = row * row_bytes..(row + 1) * row_bytes;
            target[range.clone()].copy_from_slice(&source[range]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;

    #[test]
    fn test_replays_matching_clips() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("build0_2_2.rgb");
        std::fs::write(&good, [7u8; 16]).unwrap();
        let wrong_size = dir.path().join("build0_4_4.rgb");
        std::fs::write(&wrong_size, [9u8; 64]).unwrap();

        let mut scene = BufferScene::new();
        scene.attach_clips(&[
            FrameRecord { file: good, width: 2, height: 2 },
            FrameRecord { file: wrong_size, width: 4, height: 4 },
            FrameRecord { file: dir.path().join("missing.rgb"), width: 2, height: 2 },
        ]);

        let mut surface = HeadlessSurface::new(2, 2);
        assert!(scene.setup(&mut surface, 0));
        assert_eq!(scene.frame_count(), 1);

        scene.draw(&mut surface);
        assert_eq!(surface.read_pixels(), vec![7u8; 16]);
    }

    #[test]
    fn test_falls_back_to_gradient() {
        let mut scene = BufferScene::new();
        let mut surface = HeadlessSurface::new(3, 2);
        scene.setup(&mut surface, 0);
        assert_eq!(scene.frame_count(), 1);

        scene.draw(&mut surface);
        assert_eq!(surface.read_pixels(), gradient(3, 2));
    }

    #[test]
    fn test_partial_update() {
        let mut scene = BufferScene::new();
        scene.set_option("update-fraction", "0.5");
        let mut surface = HeadlessSurface::new(2, 4);
        scene.setup(&mut surface, 0);
        scene.draw(&mut surface);

        let pixels = surface.read_pixels();
        let row_bytes = 2 * BYTES_PER_PIXEL;
        // Only the first two rows are written on frame 0
        assert!(pixels[..2 * row_bytes].iter().any(|&b| b != 0));
        assert!(pixels[2 * row_bytes..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_teardown_drops_frames() {
        let mut scene = BufferScene::new();
        let mut surface = HeadlessSurface::new(2, 2);
        scene.setup(&mut surface, 0);
        scene.teardown();
        assert_eq!(scene.frame_count(), 0);
        assert!(!scene.running());
    }
}
