//! Result aggregation and report export.

pub mod format;
pub mod threshold;

use crate::config::Config;
use crate::error::ReportError;
use crate::main_loop::SetupStatus;
use crate::scene::{Scene, TelemetrySnapshot, Validation, ValidationResult};
use crate::telemetry::TelemetrySample;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use threshold::{Parameter, StatusCount, Thresholds};

/// Outcome of one scene run.
#[derive(Debug, Clone, Serialize)]
pub struct SceneResult {
    pub name: String,
    /// `[name] k=v:` options summary.
    pub info: String,
    pub status: SetupStatus,
    pub fps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_time_ms: Option<f64>,
    pub frames: u32,
    pub validation: ValidationResult,
    /// Captured or compared frame, when validation ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<PathBuf>,
    /// Last telemetry values seen during the run.
    pub telemetry: TelemetrySnapshot,
}

impl SceneResult {
    pub fn new(
        scene: &dyn Scene,
        status: SetupStatus,
        validation: &Validation,
        show_all_options: bool,
    ) -> Self {
        let fps = if status == SetupStatus::Success {
            scene.average_fps()
        } else {
            0
        };

        Self {
            name: scene.name().to_string(),
            info: scene.info_string(show_all_options),
            status,
            fps,
            frame_time_ms: format::frame_time_ms(fps),
            frames: scene.state().current_frame(),
            validation: validation.result,
            capture: validation.record.as_ref().map(|r| r.file.clone()),
            telemetry: scene.state().telemetry.clone(),
        }
    }

    /// A failed setup or a validation mismatch.
    pub fn failed(&self) -> bool {
        self.status == SetupStatus::Failure || self.validation == ValidationResult::Failure
    }
}

/// Running totals of a test run.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    score_total: u64,
    benchmarks_run: u32,
    scenes: Vec<SceneResult>,
    parameters: BTreeMap<Parameter, StatusCount>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Add a finished scene. Only successfully set up scenes count toward the score.
    pub fn record_scene(&mut self, result: SceneResult) {
        if result.status == SetupStatus::Success {
            self.score_total += u64::from(result.fps);
            self.benchmarks_run += 1;
        }
        self.scenes.push(result);
    }

    /// Check a telemetry sample against `thresholds` and tally the outcome.
    pub fn record_sample(&mut self, sample: &TelemetrySample, thresholds: &Thresholds) {
        for (parameter, passed) in thresholds.check(sample) {
            self.parameters.entry(parameter).or_default().record(passed);
        }
    }

    /// Average FPS over the successfully run scenes.
    pub fn score(&self) -> u32 {
        let score = if self.benchmarks_run > 0 {
            self.score_total / u64::from(self.benchmarks_run)
        } else {
            self.score_total
        };
        u32::try_from(score).unwrap_or(u32::MAX)
    }

    pub fn benchmarks_run(&self) -> u32 {
        self.benchmarks_run
    }

    pub fn scenes(&self) -> &[SceneResult] {
        &self.scenes
    }

    /// Pass/fail tally of a parameter; zero when it was never sampled.
    pub fn parameter_count(&self, parameter: Parameter) -> StatusCount {
        self.parameters.get(&parameter).copied().unwrap_or_default()
    }

    /// No scene failed setup or validation so far.
    pub fn passed(&self) -> bool {
        !self.scenes.iter().any(SceneResult::failed)
    }

    pub fn verdict(&self) -> &'static str {
        if self.passed() { "Passed" } else { "Failed" }
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub platform: String,
    pub gpuload_version: String,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_vendor: Option<String>,
    pub surface: String,
    pub duration_s: u64,
    pub interval_ms: u64,
}

/// Threshold outcome of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterReport {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,
    pub pass: u64,
    pub fail: u64,
}

/// Full JSON report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub metadata: ReportMetadata,
    pub score: u32,
    pub benchmarks_run: u32,
    pub passed: bool,
    pub scenes: Vec<SceneResult>,
    pub thresholds: Vec<ParameterReport>,
}

impl RunReport {
    pub fn new(aggregator: &ResultAggregator, config: &Config, surface: (u32, u32)) -> Self {
        let thresholds = Parameter::ALL
            .iter()
            .map(|&parameter| {
                let range = config.thresholds.get(parameter);
                let count = aggregator.parameter_count(parameter);
                ParameterReport {
                    parameter,
                    min: range.min,
                    max: range.max,
                    pass: count.pass,
                    fail: count.fail,
                }
            })
            .collect();

        Self {
            metadata: ReportMetadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
                gpuload_version: env!("CARGO_PKG_VERSION").to_string(),
                mode: config.selected_mode.clone(),
                gpu_vendor: config.gpu_vendor.map(|v| v.name().to_string()),
                surface: format!("{}x{}", surface.0, surface.1),
                duration_s: config.duration_s,
                interval_ms: config.interval_ms,
            },
            score: aggregator.score(),
            benchmarks_run: aggregator.benchmarks_run(),
            passed: aggregator.passed(),
            scenes: aggregator.scenes().to_vec(),
            thresholds,
        }
    }
}

/// Export a run report to a JSON file
pub fn export_json(report: &RunReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}
