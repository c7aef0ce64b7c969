//! Scenes: the units of GPU work the scheduler sequences.
//!
//! Every scene carries a [`SceneState`] holding its option table, its run
//! timing and the latest telemetry snapshot. The [`Scene`] trait provides the
//! lifecycle with defaults built on that state, so a workload only overrides
//! the hooks it needs.

mod options;
mod registry;
mod validate;
pub mod workloads;

pub use options::{OptionSet, SceneOption};
pub use registry::SceneRegistry;
pub use validate::{FrameRecord, Validation, ValidationResult, validate_frame};

use crate::surface::RenderSurface;
use crate::telemetry::energy::PowerDomain;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default per-scene duration in seconds.
pub const DEFAULT_SCENE_DURATION: &str = "20.0";

/// Latest telemetry values stored on the active scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Current GPU frequency in kHz.
    pub gpu_frequency_khz: u64,
    /// Position of the current frequency between min and max, 0-100.
    pub gpu_frequency_percent: f64,
    pub gpu_utilization: u32,
    pub gpu_temperature_c: i64,
    /// Derived power per tracked rail domain.
    pub power_by_domain: BTreeMap<PowerDomain, f64>,
}

/// Option table, timing and telemetry shared by all scenes.
#[derive(Debug, Clone)]
pub struct SceneState {
    name: String,
    pub options: OptionSet,
    start_us: u64,
    last_update_us: u64,
    current_frame: u32,
    running: bool,
    duration_s: f64,
    max_frames: u32,
    pub telemetry: TelemetrySnapshot,
    capture_count: u32,
    last_validation: ValidationResult,
    loaded: bool,
}

impl SceneState {
    /// Create the state for a scene with the common option table.
    pub fn new(name: &str) -> Self {
        let mut options = OptionSet::new();
        options.add(
            "duration",
            DEFAULT_SCENE_DURATION,
            "The duration of each benchmark in seconds",
        );
        options.add("nframes", "", "The number of frames to render");
        options.add_with_values("show-stats", "false", "Show live stats counter", &["false", "true"]);
        options.add("stats-pos", "-1.0,-1.0", "The position on screen where to show stats");
        options.add("stats-size", "0.03", "The width of each glyph for the stats");
        options.add("title", "", "The scene title to show");
        options.add("title-pos", "-0.7,-1.0", "The position on screen where to show the title");
        options.add("title-size", "0.03", "The width of each glyph in the title");
        options.add_with_values("show-power", "false", "Show power stats counter", &["false", "true"]);
        options.add_with_values(
            "validate",
            "false",
            "Compare the rendered frame against a stored reference",
            &["false", "true"],
        );

        Self {
            name: name.to_string(),
            options,
            start_us: 0,
            last_update_us: 0,
            current_frame: 0,
            running: false,
            duration_s: 0.0,
            max_frames: 0,
            telemetry: TelemetrySnapshot::default(),
            capture_count: 0,
            last_validation: ValidationResult::Unknown,
            loaded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a benchmark run at `now_us`.
    ///
    /// Reads the `duration` and `nframes` options, resets the frame counters
    /// and marks the scene running when `supported` is true. Returns the new
    /// running state.
    pub fn begin_run(&mut self, now_us: u64, supported: bool) -> bool {
        self.duration_s = self.options.get_f64("duration").unwrap_or_else(|| {
            tracing::warn!(
                "Scene '{}' has an invalid duration, using {}",
                self.name,
                DEFAULT_SCENE_DURATION
            );
            DEFAULT_SCENE_DURATION.parse().unwrap_or(0.0)
        });
        self.max_frames = self.options.get_u32("nframes").unwrap_or(0);
        self.current_frame = 0;
        self.start_us = now_us;
        self.last_update_us = now_us;
        self.capture_count = 0;
        self.last_validation = ValidationResult::Unknown;
        self.running = supported;
        self.running
    }

    /// Count a frame and stop once the duration or frame limit is reached.
    pub fn advance(&mut self, now_us: u64) {
        self.current_frame += 1;
        self.last_update_us = now_us;

        if self.elapsed_secs() >= self.duration_s {
            self.running = false;
        }
        if self.max_frames > 0 && self.current_frame >= self.max_frames {
            self.running = false;
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_s
    }

    /// Seconds between run start and the last update.
    pub fn elapsed_secs(&self) -> f64 {
        self.last_update_us.saturating_sub(self.start_us) as f64 / 1_000_000.0
    }

    /// Frames per second over the run so far; 0 before the first timed frame.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn average_fps(&self) -> u32 {
        let elapsed = self.elapsed_secs();
        if self.current_frame == 0 || elapsed <= 0.0 {
            return 0;
        }
        (f64::from(self.current_frame) / elapsed) as u32
    }

    pub fn last_validation(&self) -> ValidationResult {
        self.last_validation
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub(crate) fn next_capture_index(&mut self) -> u32 {
        let index = self.capture_count;
        self.capture_count += 1;
        index
    }

    pub(crate) fn record_validation(&mut self, result: ValidationResult) {
        self.last_validation = result;
    }

    /// Options summary: `k=v:` for each explicitly set option, or every
    /// option with `show_all`. `<default>:` when nothing qualifies.
    pub fn construct_title(&self, show_all: bool) -> String {
        let title: String = self
            .options
            .iter()
            .filter(|(_, option)| show_all || option.set)
            .map(|(name, option)| format!("{name}={}:", option.value))
            .collect();

        if title.is_empty() {
            "<default>:".to_string()
        } else {
            title
        }
    }

    /// `[name] ` followed by the options summary.
    pub fn info_string(&self, show_all: bool) -> String {
        format!("[{}] {}", self.name, self.construct_title(show_all))
    }
}

/// A GPU workload.
///
/// Concrete scenes expose their [`SceneState`] and override the lifecycle
/// hooks they care about. `update` and `draw` are each called exactly once per
/// scheduler step while the scene runs.
pub trait Scene {
    fn state(&self) -> &SceneState;

    fn state_mut(&mut self) -> &mut SceneState;

    fn name(&self) -> &str {
        self.state().name()
    }

    /// Whether the surface offers everything this scene needs.
    fn supported(&self, _surface: &dyn RenderSurface, _show_errors: bool) -> bool {
        true
    }

    /// Acquire heavy resources. Called once until the next `unload`.
    fn load(&mut self) -> bool {
        true
    }

    fn unload(&mut self) {}

    /// Prepare a benchmark run.
    fn setup(&mut self, surface: &mut dyn RenderSurface, now_us: u64) -> bool {
        let supported = self.supported(&*surface, true);
        self.state_mut().begin_run(now_us, supported)
    }

    /// Release per-run resources. Leaves the scene stopped.
    fn teardown(&mut self) {
        self.state_mut().set_running(false);
    }

    fn update(&mut self, now_us: u64) {
        self.state_mut().advance(now_us);
    }

    fn draw(&mut self, _surface: &mut dyn RenderSurface) {}

    /// Post-draw inspection of the rendered frame.
    fn match_frame(&mut self, _surface: &dyn RenderSurface) {}

    /// Compare the current frame against the stored reference.
    fn validate(&mut self, surface: &dyn RenderSurface, storage_dir: &Path) -> Validation {
        validate_frame(self.state_mut(), surface, storage_dir)
    }

    /// Frames captured earlier in the run, for scenes that replay them.
    fn attach_clips(&mut self, _clips: &[FrameRecord]) {}

    fn running(&self) -> bool {
        self.state().running()
    }

    fn set_running(&mut self, running: bool) {
        self.state_mut().set_running(running);
    }

    fn average_fps(&self) -> u32 {
        self.state().average_fps()
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        self.state_mut().options.set(name, value)
    }

    fn set_option_default(&mut self, name: &str, value: &str) -> bool {
        self.state_mut().options.set_default(name, value)
    }

    fn reset_options(&mut self) {
        self.state_mut().options.reset();
    }

    fn info_string(&self, show_all: bool) -> String {
        self.state().info_string(show_all)
    }
}
