//! Built-in workloads.
//!
//! Each workload rasterises a deterministic pattern into the surface
//! framebuffer. The pattern depends only on the frame index and the scene's
//! options, so the first frame of a run is reproducible for validation.

mod buffer;
mod clear;
mod procedural;

pub use buffer::BufferScene;
pub use clear::ClearScene;
pub use procedural::{OptionDef, Pattern, ProceduralScene, WorkloadDef};

use super::Scene;
use crate::surface::SurfaceFeature;

const NO_FEATURES: &[SurfaceFeature] = &[];

const BOOL: &[&str] = &["false", "true"];

/// Catalogue of the procedural workloads.
pub const WORKLOADS: &[WorkloadDef] = &[
    WorkloadDef {
        name: "build",
        pattern: Pattern::Mesh,
        options: &[
            OptionDef::new("use-vbo", "true", "Whether to use VBOs for rendering", BOOL),
            OptionDef::new("interleave", "false", "Whether to interleave vertex attribute data", BOOL),
            OptionDef::new("model", "horse", "Which model to use", &[]),
        ],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "texture",
        pattern: Pattern::Texture,
        options: &[
            OptionDef::new(
                "texture-filter",
                "nearest",
                "The texture filter to use",
                &["nearest", "linear", "mipmap"],
            ),
            OptionDef::new("texgen", "false", "Whether to generate texcoords in the shader", BOOL),
        ],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "shading",
        pattern: Pattern::Lighting,
        options: &[
            OptionDef::new(
                "shading",
                "gouraud",
                "Which shading method to use",
                &["gouraud", "blinn-phong-inf", "phong", "cel"],
            ),
            OptionDef::new("num-lights", "1", "The number of lights applied to the scene", &[]),
        ],
        steps_option: Some("num-lights"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "conditionals",
        pattern: Pattern::Steps,
        options: &[
            OptionDef::new("fragment-steps", "1", "The number of computational steps in the fragment shader", &[]),
            OptionDef::new("fragment-conditionals", "true", "Whether each computational step includes an if-else clause", BOOL),
            OptionDef::new("vertex-steps", "0", "The number of computational steps in the vertex shader", &[]),
            OptionDef::new("vertex-conditionals", "true", "Whether each computational step includes an if-else clause", BOOL),
        ],
        steps_option: Some("fragment-steps"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "function",
        pattern: Pattern::Steps,
        options: &[
            OptionDef::new("fragment-steps", "1", "The number of computational steps in the fragment shader", &[]),
            OptionDef::new("fragment-complexity", "low", "The complexity of each computational step", &["low", "medium"]),
            OptionDef::new("vertex-steps", "1", "The number of computational steps in the vertex shader", &[]),
            OptionDef::new("vertex-complexity", "low", "The complexity of each computational step", &["low", "medium"]),
        ],
        steps_option: Some("fragment-steps"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "loop",
        pattern: Pattern::Steps,
        options: &[
            OptionDef::new("fragment-steps", "5", "The number of computational steps in the fragment shader", &[]),
            OptionDef::new("fragment-loop", "true", "Whether to execute the steps in the fragment shader using a for loop", BOOL),
            OptionDef::new("vertex-steps", "5", "The number of computational steps in the vertex shader", &[]),
            OptionDef::new("fragment-uniform", "true", "Whether to use a uniform for the step count", BOOL),
        ],
        steps_option: Some("fragment-steps"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "bump",
        pattern: Pattern::Bump,
        options: &[OptionDef::new(
            "bump-render",
            "off",
            "How to render bumps",
            &["off", "normals", "normals-tangent", "height", "high-poly"],
        )],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "effect2d",
        pattern: Pattern::Kernel,
        options: &[
            OptionDef::new("kernel", "0,0,0;0,1,0;0,0,0", "The convolution kernel matrix to use", &[]),
            OptionDef::new("normalize", "true", "Whether to normalize the supplied convolution kernel", BOOL),
        ],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "pulsar",
        pattern: Pattern::Pulsar,
        options: &[
            OptionDef::new("quads", "5", "Number of quads to render", &[]),
            OptionDef::new("texture", "false", "Enable texturing", BOOL),
            OptionDef::new("light", "false", "Enable lighting", BOOL),
            OptionDef::new("random", "false", "Enable random rotation speeds", BOOL),
        ],
        steps_option: Some("quads"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "desktop",
        pattern: Pattern::Desktop,
        options: &[
            OptionDef::new("windows", "4", "The number of windows", &[]),
            OptionDef::new("window-size", "0.35", "The window size as a percentage of the screen", &[]),
            OptionDef::new("passes", "1", "The number of effect passes", &[]),
            OptionDef::new("blur-radius", "5", "The blur radius in pixels", &[]),
            OptionDef::new("effect", "blur", "The effect to use", &["blur", "shadow"]),
        ],
        steps_option: Some("passes"),
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "ideas",
        pattern: Pattern::Waves,
        options: &[OptionDef::new(
            "speed",
            "duration",
            "Time coefficient (1.0 is about real-time, 'duration' fits the scene duration)",
            &[],
        )],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "jellyfish",
        pattern: Pattern::Waves,
        options: &[],
        steps_option: None,
        requires: NO_FEATURES,
    },
    WorkloadDef {
        name: "terrain",
        pattern: Pattern::Bump,
        options: &[
            OptionDef::new("repeat-overlay", "6.0", "How many times to repeat the terrain texture", &[]),
            OptionDef::new("bloom", "true", "Use bloom post-processing effect", BOOL),
        ],
        steps_option: None,
        requires: &[SurfaceFeature::VertexTextureFetch, SurfaceFeature::FloatTexture],
    },
    WorkloadDef {
        name: "shadow",
        pattern: Pattern::Lighting,
        options: &[OptionDef::new("shadow-size", "1024", "The size of the shadow map", &[])],
        steps_option: None,
        requires: &[SurfaceFeature::DepthTexture],
    },
    WorkloadDef {
        name: "refract",
        pattern: Pattern::Texture,
        options: &[
            OptionDef::new("index", "1.2", "Index of refraction of the medium", &[]),
            OptionDef::new("use-vbo", "true", "Whether to use VBOs for rendering", BOOL),
        ],
        steps_option: None,
        requires: &[SurfaceFeature::DepthTexture],
    },
];

/// Every built-in scene, one instance each.
pub fn builtin_scenes() -> Vec<Box<dyn Scene>> {
    let mut scenes: Vec<Box<dyn Scene>> = WORKLOADS
        .iter()
        .map(|def| Box::new(ProceduralScene::new(def)) as Box<dyn Scene>)
        .collect();
    scenes.push(Box::new(BufferScene::new()));
    scenes.push(Box::new(ClearScene::new()));
    scenes
}
