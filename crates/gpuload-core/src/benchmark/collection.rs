use super::BenchmarkDescriptor;
use crate::config::Config;
use crate::scene::SceneRegistry;
use std::path::PathBuf;

/// Descriptor prepended with `annotate`: overlay stats and the info title on every scene.
pub const ANNOTATE_DESCRIPTOR: &str = ":show-stats=true:title=#info#";

/// Ordered list of benchmark descriptors for one run.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkCollection {
    benchmarks: Vec<BenchmarkDescriptor>,
}

impl BenchmarkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the collection from the configuration.
    ///
    /// Order: the annotation descriptor, explicit benchmarks, then benchmark
    /// files. When none of those names a real scene, the selected mode's
    /// built-in list is appended.
    pub fn populate(&mut self, config: &Config, registry: &SceneRegistry) {
        if config.annotate {
            self.add([ANNOTATE_DESCRIPTOR], registry);
        }

        self.add(&config.benchmarks, registry);
        self.add_from_files(&config.benchmark_files, registry);

        if !self.contains_normal_scenes() {
            tracing::debug!("No named scenes, using mode '{}'", config.selected_mode);
            self.add(config.selected_benchmarks(), registry);
        }
    }

    /// Parse and append each descriptor string.
    pub fn add<I, S>(&mut self, descriptions: I, registry: &SceneRegistry)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for description in descriptions {
            self.benchmarks
                .push(BenchmarkDescriptor::parse(description.as_ref(), registry));
        }
    }

    /// Append the descriptors listed one per line in `files`.
    ///
    /// Blank lines are skipped. Unreadable files are logged and skipped.
    pub fn add_from_files(&mut self, files: &[PathBuf], registry: &SceneRegistry) {
        for file in files {
            let contents = match std::fs::read_to_string(file) {
                Ok(contents) => contents,
                Err(e) => {
                    tracing::error!("Cannot open benchmark file {}: {}", file.display(), e);
                    continue;
                }
            };

            let lines = contents.lines().map(str::trim).filter(|line| !line.is_empty());
            self.add(lines, registry);
        }
    }

    /// Whether any descriptor refers to a named scene.
    pub fn contains_normal_scenes(&self) -> bool {
        self.benchmarks.iter().any(|b| !b.scene_name().is_empty())
    }

    pub fn needs_decoration(&self) -> bool {
        self.benchmarks.iter().any(BenchmarkDescriptor::needs_decoration)
    }

    pub fn benchmarks(&self) -> &[BenchmarkDescriptor] {
        &self.benchmarks
    }

    pub fn get(&self, index: usize) -> Option<&BenchmarkDescriptor> {
        self.benchmarks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BenchmarkDescriptor> {
        self.benchmarks.iter()
    }

    pub fn len(&self) -> usize {
        self.benchmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.benchmarks.is_empty()
    }
}

impl<'a> IntoIterator for &'a BenchmarkCollection {
    type Item = &'a BenchmarkDescriptor;
    type IntoIter = std::slice::Iter<'a, BenchmarkDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.benchmarks.iter()
    }
}
