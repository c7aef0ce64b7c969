//! Name-keyed table of scene instances.

use super::Scene;
use super::workloads;
use std::collections::BTreeMap;

/// Owns every scene for the lifetime of a run.
///
/// Descriptors and the main loop look scenes up by name; nothing else holds
/// a scene across scheduler steps.
#[derive(Default)]
pub struct SceneRegistry {
    scenes: BTreeMap<String, Box<dyn Scene>>,
}

impl SceneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in workload.
    pub fn with_builtin_scenes() -> Self {
        let mut registry = Self::new();
        for scene in workloads::builtin_scenes() {
            registry.register(scene);
        }
        registry
    }

    /// Add a scene, replacing any scene with the same name.
    pub fn register(&mut self, scene: Box<dyn Scene>) {
        let name = scene.name().to_string();
        if name.is_empty() {
            tracing::warn!("Refusing to register a scene with an empty name");
            return;
        }
        self.scenes.insert(name, scene);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Scene> {
        self.scenes.get(name).map(AsRef::as_ref)
    }

    // `Option::map` can't shorten the boxed object's lifetime; the match can.
    #[allow(clippy::manual_map)]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut dyn Scene> {
        match self.scenes.get_mut(name) {
            Some(scene) => Some(scene.as_mut()),
            None => None,
        }
    }

    /// Registered scene names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Scene> {
        self.scenes.values().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Change option defaults on every scene.
    ///
    /// Scenes that don't know an option are skipped silently; a scene that
    /// knows it but rejects the value is warned about.
    pub fn apply_default_options(&mut self, options: &[(String, String)]) {
        for scene in self.scenes.values_mut() {
            for (name, value) in options {
                let known = scene.state().options.contains(name);
                if !scene.set_option_default(name, value) && known {
                    tracing::warn!(
                        "Scene '{}' doesn't accept default value '{}' for option '{}'",
                        scene.name(),
                        value,
                        name
                    );
                }
            }
        }
    }
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .finish()
    }
}
