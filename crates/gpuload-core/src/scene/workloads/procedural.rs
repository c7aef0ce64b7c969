//! Table-driven procedural workloads.

use crate::scene::{Scene, SceneState};
use crate::surface::{BYTES_PER_PIXEL, RenderSurface, SurfaceFeature};

/// Upper bound for the per-pixel step count.
const MAX_STEPS: u32 = 64;

/// Scene-specific option declaration.
#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
    pub name: &'static str,
    pub default_value: &'static str,
    pub description: &'static str,
    pub allowed: &'static [&'static str],
}

impl OptionDef {
    pub const fn new(
        name: &'static str,
        default_value: &'static str,
        description: &'static str,
        allowed: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            default_value,
            description,
            allowed,
        }
    }
}

/// Pixel pattern a workload rasterises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Mesh,
    Texture,
    Lighting,
    Bump,
    Kernel,
    Pulsar,
    Desktop,
    Steps,
    Waves,
}

/// Static description of a procedural workload.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadDef {
    pub name: &'static str,
    pub pattern: Pattern,
    pub options: &'static [OptionDef],
    /// Option whose integer value sets the per-pixel work.
    pub steps_option: Option<&'static str>,
    pub requires: &'static [SurfaceFeature],
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    index: u32,
    width: u32,
    height: u32,
    steps: u32,
    seed: u32,
}

impl Pattern {
    /// Palette index of pixel `(x, y)`.
    #[allow(clippy::cast_possible_truncation)]
    fn intensity(self, x: u32, y: u32, frame: &Frame) -> u8 {
        let t = frame.index;
        match self {
            Self::Mesh => {
                let cell = (x / 16 + y / 16 + t) & 1 == 1;
                if (x % 16 > y % 16) ^ cell { 200 } else { 60 }
            }
            Self::Texture => (x ^ y).wrapping_add(t) as u8,
            Self::Lighting => {
                let cx = t.wrapping_mul(4) % frame.width.max(1);
                let cy = frame.height / 2;
                let dist = x.abs_diff(cx) + y.abs_diff(cy);
                let span = (frame.width + frame.height).max(1);
                255 - (dist.min(span) * 255 / span) as u8
            }
            Self::Bump => (x.wrapping_mul(y).wrapping_add(t.wrapping_mul(3)) >> 4) as u8,
            Self::Kernel => x.wrapping_add(y.wrapping_mul(2)).wrapping_add(t) as u8,
            Self::Pulsar => {
                let quads = frame.steps.max(1);
                let cell = (x / 32 + y / 32) % quads;
                cell.wrapping_mul(40).wrapping_add(t.wrapping_mul(5)) as u8
            }
            Self::Desktop => {
                let window = (frame.width / 4).max(1);
                let row = (frame.height / 4).max(1);
                if (x.wrapping_add(t) % window) < window / 2 && (y / row) % 2 == 0 {
                    220
                } else {
                    40
                }
            }
            Self::Steps => {
                let mut v = x ^ frame.seed;
                for _ in 0..frame.steps {
                    v = v.wrapping_mul(31).wrapping_add(y) ^ t;
                }
                (v >> 3) as u8
            }
            Self::Waves => {
                (x.wrapping_mul(x)
                    .wrapping_add(y.wrapping_mul(y))
                    .wrapping_add(t.wrapping_mul(17))
                    >> 5) as u8
            }
        }
    }
}

/// A workload described by a [`WorkloadDef`].
pub struct ProceduralScene {
    state: SceneState,
    def: &'static WorkloadDef,
    palette: Option<Vec<[u8; 4]>>,
    steps: u32,
    seed: u32,
}

impl ProceduralScene {
    /// Create a new scene with the common options plus those of `def`.
    pub fn new(def: &'static WorkloadDef) -> Self {
        let mut state = SceneState::new(def.name);
        for option in def.options {
            state.options.add_with_values(
                option.name,
                option.default_value,
                option.description,
                option.allowed,
            );
        }

        Self {
            state,
            def,
            palette: None,
            steps: 1,
            seed: 0,
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.def.pattern
    }

    /// Hash of the scene name and its workload-specific option values.
    fn option_seed(&self) -> u32 {
        let mut hash: u32 = 0x811c_9dc5;
        let values = self
            .def
            .options
            .iter()
            .filter_map(|option| self.state.options.get(option.name));
        for byte in self.def.name.bytes().chain(values.flat_map(str::bytes)) {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        hash
    }
}

fn build_palette(seed: u32) -> Vec<[u8; 4]> {
    let [s0, s1, s2, _] = seed.to_le_bytes();
    (0..=255u8)
        .map(|i| {
            [
                i.wrapping_add(s0),
                i.wrapping_mul(2).wrapping_add(s1),
                255u8.wrapping_sub(i).wrapping_add(s2),
                255,
            ]
        })
        .collect()
}

impl Scene for ProceduralScene {
    fn state(&self) -> &SceneState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    fn supported(&self, surface: &dyn RenderSurface, show_errors: bool) -> bool {
        match self.def.requires.iter().find(|f| !surface.supports(**f)) {
            Some(missing) => {
                if show_errors {
                    tracing::warn!("Scene '{}' requires unsupported {}", self.def.name, missing);
                }
                false
            }
            None => true,
        }
    }

    fn load(&mut self) -> bool {
        self.palette = Some(build_palette(self.option_seed()));
        true
    }

    fn unload(&mut self) {
        self.palette = None;
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, now_us: u64) -> bool {
        self.seed = self.option_seed();
        self.steps = self
            .def
            .steps_option
            .and_then(|name| self.state.options.get_u32(name))
            .unwrap_or(1)
            .min(MAX_STEPS);
        self.palette = Some(build_palette(self.seed));

        let supported = self.supported(&*surface, true);
        self.state.begin_run(now_us, supported)
    }

    fn draw(&mut self, surface: &mut dyn RenderSurface) {
        let Some(palette) = self.palette.as_ref() else {
            return;
        };

        let frame = Frame {
            index: self.state.current_frame(),
            width: surface.width(),
            height: surface.height(),
            steps: self.steps,
            seed: self.seed,
        };
        let pattern = self.def.pattern;
        let width = frame.width as usize;
        if width == 0 {
            return;
        }

        let row_bytes = width * BYTES_PER_PIXEL;
        for (y, row) in surface.framebuffer_mut().chunks_exact_mut(row_bytes).enumerate() {
            for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let value = pattern.intensity(x as u32, y as u32, &frame);
                pixel.copy_from_slice(&palette[usize::from(value)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::workloads::WORKLOADS;
    use crate::surface::HeadlessSurface;

    fn def(name: &str) -> &'static WorkloadDef {
        WORKLOADS.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn test_first_frame_is_deterministic() {
        let mut a = ProceduralScene::new(def("shading"));
        let mut b = ProceduralScene::new(def("shading"));
        let mut surface_a = HeadlessSurface::new(32, 16);
        let mut surface_b = HeadlessSurface::new(32, 16);

        for (scene, surface) in [(&mut a, &mut surface_a), (&mut b, &mut surface_b)] {
            scene.load();
            scene.setup(surface, 0);
            scene.draw(surface);
        }

        assert_eq!(surface_a.read_pixels(), surface_b.read_pixels());
        assert!(surface_a.read_pixels().iter().any(|&b| b != 0));
    }

    #[test]
    fn test_options_change_output() {
        let mut surface = HeadlessSurface::new(16, 16);
        let mut scene = ProceduralScene::new(def("shading"));
        scene.load();
        scene.setup(&mut surface, 0);
        scene.draw(&mut surface);
        let gouraud = surface.read_pixels();

        scene.set_option("shading", "phong");
        scene.setup(&mut surface, 0);
        scene.draw(&mut surface);
        assert_ne!(gouraud, surface.read_pixels());
    }

    #[test]
    fn test_required_features() {
        let scene = ProceduralScene::new(def("shadow"));
        let full = HeadlessSurface::new(4, 4);
        let limited = HeadlessSurface::new(4, 4).without_feature(SurfaceFeature::DepthTexture);

        assert!(scene.supported(&full, false));
        assert!(!scene.supported(&limited, false));
    }

    #[test]
    fn test_unsupported_setup_does_not_run() {
        let mut scene = ProceduralScene::new(def("terrain"));
        let mut surface = HeadlessSurface::new(4, 4).without_feature(SurfaceFeature::FloatTexture);
        scene.load();
        assert!(!scene.setup(&mut surface, 0));
        assert!(!scene.running());
    }

    #[test]
    fn test_steps_are_capped() {
        let mut scene = ProceduralScene::new(def("loop"));
        let mut surface = HeadlessSurface::new(4, 4);
        scene.set_option("fragment-steps", "100000");
        scene.setup(&mut surface, 0);
        assert_eq!(scene.steps, MAX_STEPS);
    }

    #[test]
    fn test_workload_options_registered() {
        let scene = ProceduralScene::new(def("build"));
        let options = &scene.state().options;
        assert_eq!(options.get("use-vbo"), Some("true"));
        assert!(options.contains("duration"));
        assert_eq!(scene.pattern(), Pattern::Mesh);
    }
}
