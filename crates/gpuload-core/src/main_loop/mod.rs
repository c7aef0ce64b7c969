//! The benchmark scheduler.
//!
//! [`MainLoop::step`] is driven once per frame by the host. Each call does a
//! bounded amount of work: set up the next scene, draw one frame, or finish
//! the active scene and record its result. It never blocks; telemetry is
//! sampled synchronously inside the frame when the sampling interval allows.
//!
//! The loop runs in one of three [`LoopMode`]s:
//!
//! - `Benchmark`: frames are timed and sampled, FPS feeds the score.
//! - `Decorated`: as `Benchmark`, plus the stats/title overlay.
//! - `Validation`: one frame per scene, then a golden-frame comparison.

mod decoration;

pub use decoration::{Decoration, STATS_REFRESH_US, stats_text};

use crate::benchmark::BenchmarkCollection;
use crate::clock::Clock;
use crate::config::Config;
use crate::results::format::format_frame_time;
use crate::results::{ResultAggregator, SceneResult};
use crate::scene::{FrameRecord, Scene, SceneRegistry, Validation};
use crate::surface::RenderSurface;
use crate::telemetry::TelemetrySampler;
use serde::Serialize;
use std::path::Path;

/// How the active scene's setup went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStatus {
    Unknown,
    Success,
    Failure,
    Unsupported,
}

impl std::fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
            Self::Unsupported => write!(f, "Unsupported"),
        }
    }
}

/// Where the scheduler currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// No active scene.
    Idle,
    SettingUp,
    /// Frames are being drawn.
    Running,
    Finishing,
    /// The collection is exhausted.
    Done,
}

/// Frame behaviour of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Benchmark,
    Decorated,
    Validation,
}

impl LoopMode {
    /// Validation when requested, otherwise decorated if any descriptor asks for the overlay.
    pub fn select(validate: bool, collection: &BenchmarkCollection) -> Self {
        if validate {
            Self::Validation
        } else if collection.needs_decoration() {
            Self::Decorated
        } else {
            Self::Benchmark
        }
    }
}

/// Device state the host reports on every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStatus {
    /// Battery level in percent.
    pub battery: u32,
    pub power_save_mode: bool,
    pub low_power_standby: bool,
    pub sustained_performance: bool,
}

/// Cooperative scheduler over a [`BenchmarkCollection`].
pub struct MainLoop<'a> {
    mode: LoopMode,
    surface: &'a mut dyn RenderSurface,
    registry: &'a mut SceneRegistry,
    collection: &'a BenchmarkCollection,
    config: &'a mut Config,
    clock: &'a dyn Clock,
    sampler: TelemetrySampler,
    aggregator: ResultAggregator,
    decoration: Decoration,
    /// Index of the descriptor whose scene is active.
    active: Option<usize>,
    setup_status: SetupStatus,
    /// Index of the next descriptor to consider.
    next_index: usize,
    phase: LoopPhase,
    host: HostStatus,
    /// Frames captured by validation during this run.
    clip_storage: Vec<FrameRecord>,
}

impl<'a> MainLoop<'a> {
    pub fn new(
        mode: LoopMode,
        surface: &'a mut dyn RenderSurface,
        registry: &'a mut SceneRegistry,
        collection: &'a BenchmarkCollection,
        config: &'a mut Config,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            mode,
            surface,
            registry,
            collection,
            config,
            clock,
            sampler: TelemetrySampler::new(clock.now_us()),
            aggregator: ResultAggregator::new(),
            decoration: Decoration::default(),
            active: None,
            setup_status: SetupStatus::Unknown,
            next_index: 0,
            phase: LoopPhase::Idle,
            host: HostStatus::default(),
            clip_storage: Vec::new(),
        }
    }

    /// Rewind to the first benchmark and drop all results.
    ///
    /// An active scene is torn down first. The overall test duration starts
    /// counting again from now.
    pub fn reset(&mut self) {
        if let Some(index) = self.active.take()
            && let Some(descriptor) = self.collection.get(index)
        {
            descriptor.teardown_scene(&mut *self.registry);
        }

        self.setup_status = SetupStatus::Unknown;
        self.aggregator.reset();
        self.decoration.clear();
        self.next_index = 0;
        self.phase = LoopPhase::Idle;
        self.clip_storage.clear();
        self.sampler.restart(self.clock.now_us());
    }

    /// Advance the run by one unit of work.
    ///
    /// Returns `false` once the collection is exhausted or the surface asked
    /// to quit.
    pub fn step(&mut self, host: HostStatus) -> bool {
        self.host = host;

        if self.active.is_none() {
            let Some(index) = self.find_next_scene() else {
                self.phase = LoopPhase::Done;
                return false;
            };
            self.start_scene(index);
        }

        let Some(index) = self.active else {
            return false;
        };
        let collection = self.collection;
        let Some(descriptor) = collection.get(index) else {
            return false;
        };
        let name = descriptor.scene_name();

        let should_quit = self.surface.should_quit();
        if self.scene_running(name) && !should_quit {
            self.draw(name);
        }

        // Drawing may have stopped the scene
        if !self.scene_running(name) || should_quit {
            self.finish_scene(index);
        }

        !should_quit
    }

    /// Average FPS over the scenes that set up successfully.
    pub fn score(&self) -> u32 {
        self.aggregator.score()
    }

    pub fn benchmarks_run(&self) -> u32 {
        self.aggregator.benchmarks_run()
    }

    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    pub fn clip_storage(&self) -> &[FrameRecord] {
        &self.clip_storage
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn setup_status(&self) -> SetupStatus {
        self.setup_status
    }

    pub fn sampler(&self) -> &TelemetrySampler {
        &self.sampler
    }

    pub fn config(&self) -> &Config {
        &*self.config
    }

    /// The scene currently being run.
    pub fn active_scene(&self) -> Option<&dyn Scene> {
        let descriptor = self.collection.get(self.active?)?;
        self.registry.get(descriptor.scene_name())
    }

    fn scene_running(&self, name: &str) -> bool {
        self.registry.get(name).is_some_and(|scene| scene.running())
    }

    fn next_benchmark(&mut self) {
        self.next_index += 1;
        if self.next_index >= self.collection.len() && self.config.run_forever {
            self.next_index = 0;
        }
    }

    /// Find the next descriptor naming a real scene.
    ///
    /// Option-setting and unresolved descriptors on the way are set up for
    /// their side effects and skipped.
    fn find_next_scene(&mut self) -> Option<usize> {
        let collection = self.collection;
        let mut skipped = 0;

        while let Some(descriptor) = collection.get(self.next_index) {
            if !descriptor.scene_name().is_empty() {
                return Some(self.next_index);
            }

            let now = self.clock.now_us();
            descriptor.setup_scene(&mut *self.registry, &mut *self.surface, now);
            self.next_benchmark();

            // With run_forever a collection without named scenes would wrap endlessly
            skipped += 1;
            if skipped >= collection.len() {
                return None;
            }
        }

        None
    }

    fn start_scene(&mut self, index: usize) {
        let collection = self.collection;
        let Some(descriptor) = collection.get(index) else {
            return;
        };
        let name = descriptor.scene_name();
        self.phase = LoopPhase::SettingUp;
        self.active = Some(index);

        self.decoration.clear();
        if let Some(scene) = self.registry.get_mut(name) {
            scene.attach_clips(&self.clip_storage);
        }
        if !self.config.reuse_context {
            self.surface.reset();
        }

        let now = self.clock.now_us();
        self.setup_status = match descriptor.setup_scene(&mut *self.registry, &mut *self.surface, now)
        {
            Some(scene) if scene.running() => SetupStatus::Success,
            Some(scene) if !scene.supported(&*self.surface, false) => SetupStatus::Unsupported,
            Some(_) | None => SetupStatus::Failure,
        };

        if let Some(scene) = self.registry.get(name) {
            if self.mode == LoopMode::Decorated {
                self.decoration
                    .configure(scene, &self.host, self.config.show_all_options, now);
            }
            tracing::info!("{}", scene.info_string(self.config.show_all_options));
        }
        self.phase = LoopPhase::Running;
    }

    fn draw(&mut self, name: &str) {
        let Some(scene) = self.registry.get_mut(name) else {
            return;
        };
        let now = self.clock.now_us();
        self.surface.clear();

        if self.mode == LoopMode::Validation {
            // Only the first frame is drawn
            scene.draw(&mut *self.surface);
            self.surface.update();
            scene.set_running(false);
            return;
        }

        if let Some(sample) = self.sampler.stats_run(
            false,
            &mut *self.config,
            self.surface.vendor(),
            scene.state_mut(),
            now,
        ) {
            self.aggregator.record_sample(&sample, &self.config.thresholds);
        }

        scene.draw(&mut *self.surface);
        scene.match_frame(&*self.surface);
        scene.update(now);

        if self.mode == LoopMode::Decorated {
            self.decoration.refresh(&*scene, &self.host, now);
            let overlay = self.decoration.overlay();
            if !overlay.is_empty() {
                self.surface.draw_overlay(overlay);
            }
        }

        self.surface.update();
    }

    fn finish_scene(&mut self, index: usize) {
        self.phase = LoopPhase::Finishing;
        let collection = self.collection;
        let Some(descriptor) = collection.get(index) else {
            return;
        };

        if let Some(scene) = self.registry.get_mut(descriptor.scene_name()) {
            let validation = log_scene_result(
                self.mode,
                self.setup_status,
                scene,
                &*self.surface,
                &self.config.storage_dir,
                self.config.show_all_options,
            );
            if let Some(record) = &validation.record {
                self.clip_storage.push(record.clone());
            }

            let result = SceneResult::new(
                &*scene,
                self.setup_status,
                &validation,
                self.config.show_all_options,
            );
            self.aggregator.record_scene(result);
            tracing::info!("gpuload Test {}", self.aggregator.verdict());
        }

        descriptor.teardown_scene(&mut *self.registry);
        self.decoration.clear();
        self.active = None;
        self.phase = LoopPhase::Idle;
        self.next_benchmark();
    }
}

/// Log the result line of a finished scene and run its validation.
///
/// Benchmark runs log FPS and frame time, or why the scene didn't run, and
/// validate only when the scene's `validate` option is on. Validation runs
/// always validate and log the outcome.
fn log_scene_result(
    mode: LoopMode,
    status: SetupStatus,
    scene: &mut dyn Scene,
    surface: &dyn RenderSurface,
    storage_dir: &Path,
    show_all_options: bool,
) -> Validation {
    let info = scene.info_string(show_all_options);

    if mode == LoopMode::Validation {
        let validation = scene.validate(surface, storage_dir);
        tracing::info!("{} Validation: {}", info, validation.result);
        return validation;
    }

    match status {
        SetupStatus::Success => {
            let fps = scene.average_fps();
            tracing::info!("{} FPS: {} FrameTime: {}", info, fps, format_frame_time(fps));
        }
        SetupStatus::Unsupported => tracing::info!("{} Unsupported", info),
        SetupStatus::Failure | SetupStatus::Unknown => tracing::info!("{} Set up failed", info),
    }

    if status == SetupStatus::Success && scene.state().options.get_bool("validate") {
        let validation = scene.validate(surface, storage_dir);
        tracing::info!("{} Validation: {}", info, validation.result);
        validation
    } else {
        Validation::unknown()
    }
}
