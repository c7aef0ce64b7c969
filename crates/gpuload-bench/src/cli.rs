//! Command-line interface for the gpuload host.

// Allow CLI-specific patterns
#![allow(clippy::struct_excessive_bools)]

use anyhow::{Result, bail};
use clap::Parser;
use gpuload_core::Config;
use std::path::PathBuf;

/// Surface size used for validation runs, matching the stored references.
pub const VALIDATION_SIZE: (u32, u32) = (800, 600);

/// GPU stress harness: runs benchmark scenes, samples GPU telemetry and
/// reports a score.
///
/// Benchmarks are descriptors of the form `scene:option=value:...`. With no
/// benchmark given, the selected mode's built-in list is run.
#[derive(Parser, Debug)]
#[command(name = "gpuload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Benchmark to run.
    ///
    /// Can be specified multiple times. A descriptor with an empty scene name
    /// (e.g. ":duration=5") changes the option defaults of every scene.
    #[arg(short = 'b', long = "benchmark", value_name = "DESCRIPTOR")]
    pub benchmarks: Vec<String>,

    /// File holding one benchmark descriptor per line.
    #[arg(short = 'f', long = "benchmark-file", value_name = "PATH")]
    pub benchmark_files: Vec<PathBuf>,

    /// Run each scene for a single frame and compare it against a stored reference.
    #[arg(long)]
    pub validate: bool,

    /// Show the stats overlay and the scene title on every scene.
    #[arg(long)]
    pub annotate: bool,

    /// Start over with the first benchmark once the last one finished.
    #[arg(long)]
    pub run_forever: bool,

    /// Keep the rendering surface between scenes.
    #[arg(long)]
    pub reuse_context: bool,

    /// List every option, not only the explicitly set ones, in scene titles.
    #[arg(long)]
    pub show_all_options: bool,

    /// List the available scenes and their options, then exit.
    #[arg(short = 'l', long)]
    pub list_scenes: bool,

    /// Surface size as WIDTHxHEIGHT. Validation always uses 800x600.
    #[arg(short = 's', long, default_value = "800x600", value_name = "WxH")]
    pub size: String,

    /// `key = value` configuration file.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// JSON side-config with the mode selection and test definitions.
    #[arg(long, value_name = "PATH")]
    pub json_config: Option<PathBuf>,

    /// Test mode whose benchmark list runs when no benchmark is given.
    ///
    /// Built-in modes: tiles, throttle, cpu, stress, shader, pow
    #[arg(short = 'm', long)]
    pub mode: Option<String>,

    /// Overall test duration in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,

    /// Telemetry sampling interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Temperature node, in millidegrees Celsius.
    #[arg(long, value_name = "PATH")]
    pub temp_node: Option<PathBuf>,

    /// Directory holding the validation reference frames.
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Prefix applied to every telemetry path.
    #[arg(long, value_name = "DIR")]
    pub sysfs_root: Option<PathBuf>,

    /// Export the run report to a JSON file.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, conflicts_with = "color")]
    pub no_color: bool,

    /// Force colored output (even when not a TTY).
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Everything the host needs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: Config,
    pub size: (u32, u32),
    pub validate: bool,
    pub list_scenes: bool,
    pub json: Option<PathBuf>,
    pub color: bool,
}

impl Cli {
    /// Build the run configuration.
    ///
    /// Starts from the defaults or the conf file, merges the JSON side-config
    /// and applies command-line overrides last. Unreadable configuration
    /// files are logged and skipped.
    pub fn into_config(self) -> Result<RunOptions> {
        let mut config = match &self.config {
            Some(path) => Config::load_or_default(path),
            None => Config::default(),
        };

        if let Some(path) = &self.json_config
            && let Err(e) = config.apply_json_file(path)
        {
            tracing::warn!("Ignoring JSON config {}: {}", path.display(), e);
        }

        if let Some(mode) = self.mode {
            if !config.test_definitions.contains_key(&mode) {
                bail!(
                    "Unknown mode: {mode}. Valid options: {}",
                    config
                        .test_definitions
                        .keys()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            config.selected_mode = mode;
        }
        if let Some(duration) = self.duration {
            config.duration_s = duration;
        }
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
        if let Some(node) = self.temp_node {
            config.temperature_node = node;
        }
        if let Some(dir) = self.storage_dir {
            config.storage_dir = dir;
        }
        if let Some(root) = self.sysfs_root {
            config.sysfs_root = root;
        }

        config.benchmarks = self.benchmarks;
        config.benchmark_files = self.benchmark_files;
        config.annotate = self.annotate;
        config.run_forever = self.run_forever;
        config.reuse_context = self.reuse_context;
        config.show_all_options = self.show_all_options;

        let mut size = parse_size(&self.size)?;
        if self.validate && size != VALIDATION_SIZE {
            tracing::info!(
                "Validation runs at {}x{}, ignoring --size {}",
                VALIDATION_SIZE.0,
                VALIDATION_SIZE.1,
                self.size
            );
            size = VALIDATION_SIZE;
        }

        // Check color support (--color forces it on, --no-color forces it off)
        let color = self.color || (!self.no_color && supports_color());

        Ok(RunOptions {
            config,
            size,
            validate: self.validate,
            list_scenes: self.list_scenes,
            json: self.json,
            color,
        })
    }
}

/// Parse a `WIDTHxHEIGHT` surface size.
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let Some((width, height)) = s.trim().to_lowercase().split_once('x').map(|(w, h)| {
        (w.trim().parse::<u32>(), h.trim().parse::<u32>())
    }) else {
        bail!("Invalid size: {s}. Expected WIDTHxHEIGHT, e.g. 800x600");
    };

    match (width, height) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => Ok((width, height)),
        _ => bail!("Invalid size: {s}. Expected WIDTHxHEIGHT, e.g. 800x600"),
    }
}

/// Check if the terminal supports colors.
fn supports_color() -> bool {
    // Check NO_COLOR environment variable (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        unsafe { libc::isatty(std::io::stdout().as_raw_fd()) != 0 }
    }

    #[cfg(not(unix))]
    {
        true
    }
}
