//! Terminal output for scene listings and run summaries.

use gpuload_core::results::format::{format_frame_time, format_pass_fail};
use gpuload_core::results::threshold::Parameter;
use gpuload_core::{LoopMode, ResultAggregator, SceneRegistry, SceneResult, SetupStatus};
use owo_colors::OwoColorize;
use std::io::{self, Write};

const RULE: &str = "=======================================================";

/// Formats and prints gpuload output.
pub struct ResultPrinter {
    /// Whether color output is enabled.
    color: bool,
}

impl ResultPrinter {
    /// Create a new printer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn print_banner(&self, mode: LoopMode, benchmarks: usize, size: (u32, u32)) {
        let stdout = io::stdout();
        if let Err(e) = self.write_banner(&mut stdout.lock(), mode, benchmarks, size) {
            tracing::debug!("Failed to print banner: {}", e);
        }
    }

    pub fn print_scene_list(&self, registry: &SceneRegistry) {
        let stdout = io::stdout();
        if let Err(e) = self.write_scene_list(&mut stdout.lock(), registry) {
            tracing::debug!("Failed to print scene list: {}", e);
        }
    }

    pub fn print_summary(&self, aggregator: &ResultAggregator) {
        let stdout = io::stdout();
        if let Err(e) = self.write_summary(&mut stdout.lock(), aggregator) {
            tracing::debug!("Failed to print summary: {}", e);
        }
    }

    /// Example output:
    /// ```text
    /// gpuload: 5 benchmarks on 800x600 (benchmark)
    /// ```
    pub fn write_banner(
        &self,
        out: &mut impl Write,
        mode: LoopMode,
        benchmarks: usize,
        size: (u32, u32),
    ) -> io::Result<()> {
        let mode = match mode {
            LoopMode::Benchmark => "benchmark",
            LoopMode::Decorated => "decorated",
            LoopMode::Validation => "validation",
        };

        writeln!(out)?;
        if self.color {
            writeln!(
                out,
                "{}: {} benchmarks on {}x{} ({})",
                "gpuload".cyan().bold(),
                benchmarks,
                size.0,
                size.1,
                mode.dimmed()
            )?;
        } else {
            writeln!(
                out,
                "gpuload: {} benchmarks on {}x{} ({})",
                benchmarks, size.0, size.1, mode
            )?;
        }
        writeln!(out)
    }

    /// Every scene with its options.
    ///
    /// Example output:
    /// ```text
    /// [Scene] build
    ///   [Option] use-vbo
    ///     Description: Whether to use VBOs for rendering
    ///     Default Value: true
    ///     Acceptable Values: false,true
    /// ```
    pub fn write_scene_list(&self, out: &mut impl Write, registry: &SceneRegistry) -> io::Result<()> {
        for scene in registry.iter() {
            if self.color {
                writeln!(out, "{} {}", "[Scene]".bold(), scene.name().cyan().bold())?;
            } else {
                writeln!(out, "[Scene] {}", scene.name())?;
            }

            for (name, option) in scene.state().options.iter() {
                if self.color {
                    writeln!(out, "  {} {}", "[Option]".bold(), name.green())?;
                } else {
                    writeln!(out, "  [Option] {name}")?;
                }
                writeln!(out, "    Description: {}", option.description)?;
                writeln!(out, "    Default Value: {}", option.default_value)?;
                if !option.allowed.is_empty() {
                    writeln!(out, "    Acceptable Values: {}", option.allowed.join(","))?;
                }
            }
        }
        Ok(())
    }

    /// Per-scene results, the score and the threshold tallies.
    ///
    /// Example output:
    /// ```text
    /// [build] duration=2: FPS: 60 FrameTime: 16.667 ms
    /// [shadow] <default>: Unsupported
    /// =======================================================
    ///                                   gpuload Score: 60
    /// =======================================================
    /// Frequency - Pass/Fail Count: 10/0
    /// gpuload Test Passed
    /// ```
    pub fn write_summary(&self, out: &mut impl Write, aggregator: &ResultAggregator) -> io::Result<()> {
        for scene in aggregator.scenes() {
            self.write_scene_result(out, scene)?;
        }

        let score = format!("gpuload Score: {}", aggregator.score());
        writeln!(out, "{RULE}")?;
        if self.color {
            writeln!(out, "{:>52}", score.bold())?;
        } else {
            writeln!(out, "{score:>52}")?;
        }
        writeln!(out, "{RULE}")?;

        for parameter in Parameter::ALL {
            let count = aggregator.parameter_count(parameter);
            if count.total() == 0 {
                continue;
            }
            let tally = format_pass_fail(count.pass, count.fail);
            if self.color && count.fail > 0 {
                writeln!(out, "{parameter} - Pass/Fail Count: {}", tally.red())?;
            } else {
                writeln!(out, "{parameter} - Pass/Fail Count: {tally}")?;
            }
        }

        let verdict = format!("gpuload Test {}", aggregator.verdict());
        if !self.color {
            writeln!(out, "{verdict}")
        } else if aggregator.passed() {
            writeln!(out, "{}", verdict.green().bold())
        } else {
            writeln!(out, "{}", verdict.red().bold())
        }
    }

    fn write_scene_result(&self, out: &mut impl Write, scene: &SceneResult) -> io::Result<()> {
        let outcome = match scene.status {
            SetupStatus::Success => {
                format!("FPS: {} FrameTime: {}", scene.fps, format_frame_time(scene.fps))
            }
            SetupStatus::Unsupported => "Unsupported".to_string(),
            SetupStatus::Failure | SetupStatus::Unknown => "Set up failed".to_string(),
        };

        if self.color {
            let outcome = match scene.status {
                SetupStatus::Success => outcome.cyan().to_string(),
                SetupStatus::Unsupported => outcome.yellow().to_string(),
                SetupStatus::Failure | SetupStatus::Unknown => outcome.red().to_string(),
            };
            writeln!(out, "{} {}", scene.info.bold(), outcome)
        } else {
            writeln!(out, "{} {}", scene.info, outcome)
        }
    }
}
