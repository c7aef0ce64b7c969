//! Configuration for a gpuload run.
//!
//! A [`Config`] is built once at startup from the built-in defaults, an
//! optional `key = value` conf file, an optional JSON side-config and finally
//! command-line overrides. After that it is read-only, except for
//! [`Config::gpu_vendor`] which the telemetry sampler detects lazily.

use crate::benchmark::defaults;
use crate::error::ConfigError;
use crate::results::threshold::Thresholds;
use crate::telemetry::energy::PowerDomain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default telemetry sampling interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 200;
/// Default overall test duration in seconds.
pub const DEFAULT_DURATION_S: u64 = 180;
/// Default thermal zone read for the GPU temperature.
pub const DEFAULT_TEMPERATURE_NODE: &str = "/sys/class/thermal/thermal_zone22/temp";
/// Mode selected when nothing else is configured.
pub const DEFAULT_MODE: &str = "stress";
/// Rail carrying the GPU supply on the reference boards.
pub const DEFAULT_GPU_RAIL: &str = "S2S_VDD_GPU";

/// GPU sysfs layout, detected from the driver vendor string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    /// Mali-style layout: plain integer files under the mali platform device.
    Mali,
    /// PowerVR-style layout: devfreq files plus the `/proc/pvr/status` report.
    PowerVr,
}

impl GpuVendor {
    /// Pick a layout from the driver vendor string.
    ///
    /// Only Imagination drivers select the PowerVR layout; every other vendor
    /// string falls back to the Mali layout.
    pub fn detect(vendor: &str) -> Self {
        if vendor.contains("Imag") {
            Self::PowerVr
        } else {
            Self::Mali
        }
    }

    /// Numeric id used in logs and reports (1 = Mali, 2 = PowerVR).
    pub fn id(self) -> u8 {
        match self {
            Self::Mali => 1,
            Self::PowerVr => 2,
        }
    }

    /// Get the display name for this vendor.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mali => "Mali",
            Self::PowerVr => "PowerVR",
        }
    }
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-metric enable switches (`power = enable` etc. in the conf file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetricToggles {
    pub frequency: bool,
    pub temperature: bool,
    pub utilization: bool,
    pub power: bool,
}

impl Default for MetricToggles {
    fn default() -> Self {
        Self {
            frequency: true,
            temperature: true,
            utilization: true,
            power: true,
        }
    }
}

/// Process-wide run configuration.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Minimum spacing between two telemetry samples.
    pub interval_ms: u64,
    /// Overall test duration; sampling stops and scenes end after it.
    pub duration_s: u64,
    /// Temperature node, in millidegrees Celsius.
    pub temperature_node: PathBuf,
    /// Detected once by the sampler, then cached.
    pub gpu_vendor: Option<GpuVendor>,
    /// Mode whose test definition is used when no explicit benchmark is given.
    pub selected_mode: String,
    /// Benchmark descriptor lists per mode.
    pub test_definitions: BTreeMap<String, Vec<String>>,
    /// Explicit benchmark descriptors.
    pub benchmarks: Vec<String>,
    /// Files holding one benchmark descriptor per line.
    pub benchmark_files: Vec<PathBuf>,
    /// Prepend the overlay descriptor to the collection.
    pub annotate: bool,
    /// Wrap around to the first benchmark instead of finishing.
    pub run_forever: bool,
    /// Keep the rendering surface between scenes.
    pub reuse_context: bool,
    /// List every option (not only explicitly set ones) in scene titles.
    pub show_all_options: bool,
    /// Directory holding golden frames for validation.
    pub storage_dir: PathBuf,
    /// Prefix applied to every absolute telemetry path.
    pub sysfs_root: PathBuf,
    /// Override for the vendor current-frequency node.
    pub frequency_node: Option<PathBuf>,
    /// Override for the vendor utilization node.
    pub utilization_node: Option<PathBuf>,
    /// Energy counter files, scanned in order.
    pub energy_nodes: Vec<PathBuf>,
    /// Tracked power rails and the domain each one reports.
    pub power_rails: BTreeMap<String, PowerDomain>,
    pub metrics: MetricToggles,
    pub thresholds: Thresholds,
    /// Conf keys this crate does not interpret, kept for other tools.
    pub extra: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            duration_s: DEFAULT_DURATION_S,
            temperature_node: PathBuf::from(DEFAULT_TEMPERATURE_NODE),
            gpu_vendor: None,
            selected_mode: DEFAULT_MODE.to_string(),
            test_definitions: defaults::builtin_test_definitions(),
            benchmarks: Vec::new(),
            benchmark_files: Vec::new(),
            annotate: false,
            run_forever: false,
            reuse_context: false,
            show_all_options: false,
            storage_dir: PathBuf::from("gpuload-frames"),
            sysfs_root: PathBuf::from("/"),
            frequency_node: None,
            utilization_node: None,
            energy_nodes: vec![
                PathBuf::from("/sys/bus/iio/devices/iio:device0/energy_value"),
                PathBuf::from("/sys/bus/iio/devices/iio:device1/energy_value"),
            ],
            power_rails: BTreeMap::from([(DEFAULT_GPU_RAIL.to_string(), PowerDomain::Gpu)]),
            metrics: MetricToggles::default(),
            thresholds: Thresholds::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Build a configuration from `key = value` conf text on top of the defaults.
    pub fn from_conf_str(contents: &str) -> Self {
        let mut config = Self::default();
        config.apply_conf_str(contents);
        config
    }

    /// Load a `key = value` conf file.
    pub fn load_conf(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(Self::from_conf_str(&contents))
    }

    /// Load a conf file, falling back to defaults when it cannot be read.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_conf(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config, {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Apply conf text to this configuration.
    ///
    /// Comment lines, blank lines and lines without `=` are skipped. A bad
    /// value keeps whatever the field held before.
    pub fn apply_conf_str(&mut self, contents: &str) {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!("Ignoring malformed config line: {}", line);
                continue;
            };

            if let Err(e) = self.apply_conf_entry(key.trim(), value.trim()) {
                tracing::warn!("{}", e);
            }
        }
    }

    /// Apply a single conf entry.
    pub fn apply_conf_entry(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "interval" | "log_interval" => self.interval_ms = parse_number(key, value)?,
            "duration" => self.duration_s = parse_number(key, value)?,
            "node_path_for_temperature" | "temptNode" => {
                self.temperature_node = PathBuf::from(value);
            }
            "node_path_for_frequency" => self.frequency_node = Some(PathBuf::from(value)),
            "node_path_for_utilization" => self.utilization_node = Some(PathBuf::from(value)),
            "node_path_for_power" => self.energy_nodes = vec![PathBuf::from(value)],
            "gpu_power_rail" => {
                self.power_rails.retain(|_, domain| *domain != PowerDomain::Gpu);
                self.power_rails.insert(value.to_string(), PowerDomain::Gpu);
            }
            "output_directory_path" => self.storage_dir = PathBuf::from(value),
            "selected" => self.selected_mode = value.to_string(),
            "frequency" => self.metrics.frequency = parse_toggle(key, value)?,
            "temperature" => self.metrics.temperature = parse_toggle(key, value)?,
            "utilization" => self.metrics.utilization = parse_toggle(key, value)?,
            "power" => self.metrics.power = parse_toggle(key, value)?,
            _ => {
                tracing::debug!("Forwarding unknown config key {} = {}", key, value);
                self.extra.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Load the JSON side-config on top of the defaults.
    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_json_file(path)?;
        Ok(config)
    }

    /// Merge a JSON side-config file into this configuration.
    pub fn apply_json_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let json: JsonConfig = serde_json::from_str(&contents)?;
        self.apply_json(json);
        tracing::info!("Loaded test definitions from {}", path.display());
        Ok(())
    }

    /// Merge an already parsed JSON side-config.
    pub fn apply_json(&mut self, json: JsonConfig) {
        if let Some(selected) = json.selected {
            self.selected_mode = selected;
        }
        if let Some(duration) = json.duration {
            self.duration_s = duration;
        }
        if let Some(interval) = json.interval {
            self.interval_ms = interval;
        }
        if let Some(node) = json.tempt_node {
            self.temperature_node = node;
        }
        for (mode, definition) in json.test {
            self.test_definitions.insert(mode, definition.gpu);
        }
    }

    /// Write the current mode selection and test definitions as a JSON side-config.
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&JsonConfig::from(self))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Benchmark descriptors for the selected mode.
    ///
    /// An unknown mode falls back to the stress list.
    pub fn selected_benchmarks(&self) -> Vec<String> {
        if let Some(list) = self.test_definitions.get(&self.selected_mode) {
            return list.clone();
        }

        tracing::warn!(
            "Unknown mode: {}. Valid options: {}",
            self.selected_mode,
            self.test_definitions.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        self.test_definitions
            .get(DEFAULT_MODE)
            .cloned()
            .unwrap_or_else(|| defaults::mode_benchmarks(DEFAULT_MODE))
    }

    /// Resolve an absolute telemetry path against [`Config::sysfs_root`].
    pub fn sysfs_path(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("/") {
            Ok(relative) => self.sysfs_root.join(relative),
            Err(_) => path.to_path_buf(),
        }
    }
}

/// On-disk shape of the JSON side-config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(default, rename = "temptNode", skip_serializing_if = "Option::is_none")]
    pub tempt_node: Option<PathBuf>,
    #[serde(default)]
    pub test: BTreeMap<String, TestDefinition>,
}

/// Descriptor list of one mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default)]
    pub gpu: Vec<String>,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            selected: Some(config.selected_mode.clone()),
            duration: Some(config.duration_s),
            interval: Some(config.interval_ms),
            tempt_node: Some(config.temperature_node.clone()),
            test: config
                .test_definitions
                .iter()
                .map(|(mode, gpu)| (mode.clone(), TestDefinition { gpu: gpu.clone() }))
                .collect(),
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_toggle(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "enable" | "enabled" | "true" | "1" => Ok(true),
        "disable" | "disabled" | "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
