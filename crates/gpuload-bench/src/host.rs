//! Host device state reported to the main loop on every step.

use gpuload_core::config::Config;
use gpuload_core::telemetry::sysfs;
use gpuload_core::HostStatus;
use std::path::{Path, PathBuf};

const BATTERY_CAPACITY: &str = "/sys/class/power_supply/battery/capacity";

/// Minimum spacing between two battery reads.
const REFRESH_US: u64 = 1_000_000;

/// Polls the battery level at most once per second.
///
/// Only the battery level has a sysfs source here; the power mode flags stay
/// off.
#[derive(Debug, Clone)]
pub struct HostMonitor {
    capacity_node: PathBuf,
    last_read_us: Option<u64>,
    status: HostStatus,
}

impl HostMonitor {
    pub fn new(config: &Config) -> Self {
        Self::with_capacity_node(config.sysfs_path(Path::new(BATTERY_CAPACITY)))
    }

    pub fn with_capacity_node(capacity_node: PathBuf) -> Self {
        Self {
            capacity_node,
            last_read_us: None,
            status: HostStatus::default(),
        }
    }

    /// Current host status; the battery is re-read once the refresh period passed.
    pub fn status(&mut self, now_us: u64) -> HostStatus {
        let due = self
            .last_read_us
            .is_none_or(|last| now_us.saturating_sub(last) >= REFRESH_US);

        if due {
            // A board without a battery reports 0
            self.status.battery = sysfs::read_u64(&self.capacity_node)
                .and_then(|level| u32::try_from(level).ok())
                .unwrap_or(0);
            self.last_read_us = Some(now_us);
        }

        self.status
    }
}
