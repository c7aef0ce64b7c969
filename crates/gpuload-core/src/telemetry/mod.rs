//! GPU telemetry sampling.
//!
//! [`TelemetrySampler::stats_run`] is called from the render path once per
//! frame. It is time-gated: at most one sampling pass per configured
//! interval, and none at all once the overall test duration has passed.
//! A pass reads frequency, utilization, temperature and rail energy from
//! sysfs, stores the converted values on the active scene and returns the
//! raw sample. Unreadable nodes are skipped; the scene keeps the previous
//! value for that metric.

pub mod energy;
pub mod sysfs;

use crate::config::{Config, GpuVendor};
use crate::scene::{SceneState, TelemetrySnapshot};
use energy::{PowerDomain, PowerTracker};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MALI_DEVICE: &str = "/sys/devices/platform/1f000000.mali";
const POWERVR_DEVFREQ: &str = "/sys/devices/platform/34f00000.gpu0/devfreq/34f00000.gpu0";
const POWERVR_STATUS: &str = "/proc/pvr/status";
/// Header lines preceding the utilisation entry in the PowerVR status report.
const POWERVR_STATUS_SKIP: usize = 4;
const POWERVR_UTILISATION_LABEL: &str = "GPU Utilisation";

/// Raw values read in one sampling pass. `None` marks a node that couldn't be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub timestamp_us: u64,
    /// Current GPU frequency as reported by the driver (Hz).
    pub gpu_frequency_raw: Option<u64>,
    pub utilization_percent: Option<u32>,
    pub temperature_millideg: Option<i64>,
    /// Accumulated energy counter per tracked rail.
    pub energy_by_rail: BTreeMap<String, u64>,
    /// Power derived since the previous sample, per rail domain.
    pub power_by_domain: BTreeMap<PowerDomain, f64>,
}

impl TelemetrySample {
    /// Temperature in whole degrees Celsius.
    pub fn temperature_c(&self) -> Option<i64> {
        self.temperature_millideg.map(|t| t / 1000)
    }
}

#[derive(Debug, Clone)]
enum UtilizationNode {
    /// A file holding the percentage.
    Direct(PathBuf),
    /// A status report with the percentage after a label.
    Status {
        path: PathBuf,
        skip_lines: usize,
        label: &'static str,
    },
}

/// Node paths for one vendor layout, resolved against the sysfs root.
#[derive(Debug, Clone)]
struct VendorNodes {
    cur_freq: PathBuf,
    min_freq: PathBuf,
    max_freq: PathBuf,
    utilization: UtilizationNode,
}

impl VendorNodes {
    fn resolve(config: &Config, vendor: GpuVendor) -> Self {
        let base = match vendor {
            GpuVendor::Mali => Path::new(MALI_DEVICE),
            GpuVendor::PowerVr => Path::new(POWERVR_DEVFREQ),
        };

        let cur_freq = config
            .frequency_node
            .clone()
            .unwrap_or_else(|| base.join("cur_freq"));
        let utilization = match (&config.utilization_node, vendor) {
            (Some(path), _) => UtilizationNode::Direct(config.sysfs_path(path)),
            (None, GpuVendor::Mali) => {
                UtilizationNode::Direct(config.sysfs_path(&base.join("utilization")))
            }
            (None, GpuVendor::PowerVr) => UtilizationNode::Status {
                path: config.sysfs_path(Path::new(POWERVR_STATUS)),
                skip_lines: POWERVR_STATUS_SKIP,
                label: POWERVR_UTILISATION_LABEL,
            },
        };

        Self {
            cur_freq: config.sysfs_path(&cur_freq),
            min_freq: config.sysfs_path(&base.join("min_freq")),
            max_freq: config.sysfs_path(&base.join("max_freq")),
            utilization,
        }
    }

    fn read_utilization(&self) -> Option<u32> {
        match &self.utilization {
            UtilizationNode::Direct(path) => {
                sysfs::read_u64(path).and_then(|v| u32::try_from(v).ok())
            }
            UtilizationNode::Status {
                path,
                skip_lines,
                label,
            } => sysfs::read_labelled_value(path, *skip_lines, label),
        }
    }
}

/// Time-gated sysfs sampler for one test run.
#[derive(Debug, Clone)]
pub struct TelemetrySampler {
    run_start_us: u64,
    last_sample_us: Option<u64>,
    /// Frequency bounds, read on first use.
    frequency_range: Option<(u64, u64)>,
    power: PowerTracker,
    passes: u64,
}

impl TelemetrySampler {
    /// Create a sampler whose overall duration counts from `run_start_us`.
    pub fn new(run_start_us: u64) -> Self {
        Self {
            run_start_us,
            last_sample_us: None,
            frequency_range: None,
            power: PowerTracker::new(),
            passes: 0,
        }
    }

    /// Start a new test run at `run_start_us`.
    pub fn restart(&mut self, run_start_us: u64) {
        *self = Self::new(run_start_us);
    }

    /// Number of sampling passes performed so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Time after which sampling stops and scenes are ended.
    pub fn deadline_us(&self, config: &Config) -> u64 {
        self.run_start_us
            .saturating_add(config.duration_s.saturating_mul(1_000_000))
    }

    /// Sample telemetry onto `scene` if the interval gate allows it.
    ///
    /// Detects the GPU layout from `vendor` on first use and caches it in
    /// the configuration. Once the overall duration has elapsed no sample is
    /// taken and the scene is stopped. Returns the sample when a pass ran.
    pub fn stats_run(
        &mut self,
        show_full: bool,
        config: &mut Config,
        vendor: &str,
        scene: &mut SceneState,
        now_us: u64,
    ) -> Option<TelemetrySample> {
        let gpu_vendor = *config.gpu_vendor.get_or_insert_with(|| {
            let detected = GpuVendor::detect(vendor);
            tracing::info!(
                "GPU vendor '{}' uses the {} layout ({})",
                vendor,
                detected,
                detected.id()
            );
            detected
        });

        if now_us >= self.deadline_us(config) {
            scene.set_running(false);
            return None;
        }

        if let Some(last) = self.last_sample_us
            && now_us.saturating_sub(last) < config.interval_ms.saturating_mul(1000)
        {
            return None;
        }

        let sample = self.sample_pass(config, gpu_vendor, &mut scene.telemetry, now_us);
        self.last_sample_us = Some(now_us);
        self.passes += 1;

        let snapshot = &scene.telemetry;
        if show_full {
            tracing::debug!(
                "{} utilization: {} cur_freq: {} ({:.1}%) temp: {} power: {:?}",
                scene.name(),
                snapshot.gpu_utilization,
                snapshot.gpu_frequency_khz,
                snapshot.gpu_frequency_percent,
                snapshot.gpu_temperature_c,
                snapshot.power_by_domain
            );
        } else {
            tracing::trace!(
                "utilization: {} cur_freq: {} temp: {}",
                snapshot.gpu_utilization,
                snapshot.gpu_frequency_khz,
                snapshot.gpu_temperature_c
            );
        }

        Some(sample)
    }

    fn sample_pass(
        &mut self,
        config: &Config,
        vendor: GpuVendor,
        snapshot: &mut TelemetrySnapshot,
        now_us: u64,
    ) -> TelemetrySample {
        let nodes = VendorNodes::resolve(config, vendor);
        let mut sample = TelemetrySample {
            timestamp_us: now_us,
            ..TelemetrySample::default()
        };

        if config.metrics.utilization
            && let Some(utilization) = nodes.read_utilization()
        {
            snapshot.gpu_utilization = utilization;
            sample.utilization_percent = Some(utilization);
        }

        if config.metrics.frequency
            && let Some(cur) = sysfs::read_u64(&nodes.cur_freq)
        {
            if let Some(percent) = self.frequency_percent(&nodes, cur) {
                snapshot.gpu_frequency_percent = percent;
            }
            snapshot.gpu_frequency_khz = cur / 1000;
            sample.gpu_frequency_raw = Some(cur);
        }

        if config.metrics.temperature
            && let Some(temp) = sysfs::read_i64(&config.sysfs_path(&config.temperature_node))
        {
            snapshot.gpu_temperature_c = temp / 1000;
            sample.temperature_millideg = Some(temp);
        }

        if config.metrics.power {
            self.sample_energy(config, &mut sample, snapshot);
        }

        sample
    }

    #[allow(clippy::cast_precision_loss)]
    fn frequency_percent(&mut self, nodes: &VendorNodes, cur: u64) -> Option<f64> {
        if self.frequency_range.is_none() {
            let min = sysfs::read_u64(&nodes.min_freq)?;
            let max = sysfs::read_u64(&nodes.max_freq)?;
            self.frequency_range = Some((min, max));
        }

        let (min, max) = self.frequency_range?;
        if max <= min {
            return None;
        }
        Some(cur.saturating_sub(min) as f64 * 100.0 / (max - min) as f64)
    }

    fn sample_energy(
        &mut self,
        config: &Config,
        sample: &mut TelemetrySample,
        snapshot: &mut TelemetrySnapshot,
    ) {
        for node in &config.energy_nodes {
            let path = config.sysfs_path(node);
            let records = match energy::read_energy_node(&path) {
                Ok(records) => records,
                Err(e) => {
                    tracing::trace!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            for record in records {
                let Some(domain) = config.power_rails.get(&record.rail) else {
                    continue;
                };
                sample.energy_by_rail.insert(record.rail.clone(), record.energy);
                if let Some(power) = self.power.record(&record) {
                    sample.power_by_domain.insert(*domain, power);
                    snapshot.power_by_domain.insert(*domain, power);
                }
            }
        }
    }
}
