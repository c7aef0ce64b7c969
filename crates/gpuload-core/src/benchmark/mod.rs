//! Benchmark descriptors.
//!
//! A descriptor is parsed from `scene_name(:option=value)*` and pairs a scene
//! from the [`SceneRegistry`] with option overrides applied on every setup.

mod collection;
pub mod defaults;

pub use collection::{ANNOTATE_DESCRIPTOR, BenchmarkCollection};

use crate::scene::{Scene, SceneRegistry};
use crate::surface::RenderSurface;

/// What a descriptor's scene name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneRef {
    /// A registered scene.
    Scene(String),
    /// Empty name: the options change defaults on every scene.
    DefaultOptions,
    /// Name not found in the registry; behaves as an inert placeholder.
    Unresolved(String),
}

/// A scene reference plus ordered option overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkDescriptor {
    scene: SceneRef,
    options: Vec<(String, String)>,
}

impl BenchmarkDescriptor {
    /// Parse a descriptor string against `registry`.
    ///
    /// Tokens are separated by `:`; each option token splits on its first
    /// `=`. Tokens without `=` are logged and dropped.
    pub fn parse(description: &str, registry: &SceneRegistry) -> Self {
        let description = description.trim();
        let mut tokens = description.split(':');
        let name = tokens.next().unwrap_or_default();

        let scene = if name.is_empty() {
            SceneRef::DefaultOptions
        } else if registry.contains(name) {
            SceneRef::Scene(name.to_string())
        } else {
            tracing::warn!("Unknown scene '{}' in benchmark '{}'", name, description);
            SceneRef::Unresolved(name.to_string())
        };

        let mut options = Vec::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) => options.push((key.to_string(), value.to_string())),
                None => tracing::warn!(
                    "Ignoring invalid option string '{}' in benchmark description '{}'",
                    token,
                    description
                ),
            }
        }

        Self { scene, options }
    }

    pub fn scene_ref(&self) -> &SceneRef {
        &self.scene
    }

    /// Name of the scene this descriptor runs; empty for option-setting and
    /// unresolved descriptors.
    pub fn scene_name(&self) -> &str {
        match &self.scene {
            SceneRef::Scene(name) => name,
            SceneRef::DefaultOptions | SceneRef::Unresolved(_) => "",
        }
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// Whether the overlay is needed to honour this descriptor's options.
    pub fn needs_decoration(&self) -> bool {
        self.options.iter().any(|(key, value)| {
            (key == "show-stats" && value == "true") || (key == "title" && !value.is_empty())
        })
    }

    /// Prepare the referenced scene for a run.
    ///
    /// Resets the scene's options, applies this descriptor's overrides, loads
    /// the scene if it isn't loaded and runs its setup. Option-setting
    /// descriptors apply their defaults to every scene and return `None`, as
    /// do unresolved ones.
    pub fn setup_scene<'r>(
        &self,
        registry: &'r mut SceneRegistry,
        surface: &mut dyn RenderSurface,
        now_us: u64,
    ) -> Option<&'r mut dyn Scene> {
        let name = match &self.scene {
            SceneRef::Scene(name) => name,
            SceneRef::DefaultOptions => {
                registry.apply_default_options(&self.options);
                return None;
            }
            SceneRef::Unresolved(_) => return None,
        };

        let scene = registry.get_mut(name)?;
        scene.reset_options();
        self.load_options(scene);

        if !scene.state().is_loaded() {
            if !scene.load() {
                tracing::warn!("Scene '{}' failed to load", name);
                scene.set_running(false);
                return Some(scene);
            }
            scene.state_mut().set_loaded(true);
        }

        scene.setup(surface, now_us);
        Some(scene)
    }

    /// Tear down and unload the referenced scene.
    pub fn teardown_scene(&self, registry: &mut SceneRegistry) {
        if let SceneRef::Scene(name) = &self.scene
            && let Some(scene) = registry.get_mut(name)
        {
            scene.teardown();
            scene.unload();
            scene.state_mut().set_loaded(false);
        }
    }

    fn load_options(&self, scene: &mut dyn Scene) {
        for (name, value) in &self.options {
            if scene.set_option(name, value) {
                continue;
            }

            if scene.state().options.contains(name) {
                tracing::warn!(
                    "Scene '{}' doesn't accept value '{}' for option '{}'",
                    scene.name(),
                    value,
                    name
                );
            } else {
                tracing::warn!("Scene '{}' doesn't accept option '{}'", scene.name(), name);
            }
        }
    }
}
