//! Power-rail energy counters.
//!
//! Energy nodes report one accumulating counter per rail, one rail per line:
//!
//! ```text
//! t=176090328
//! CH42(T=176090328)[S2S_VDD_GPU], 168620176
//! ```
//!
//! Power is the energy delta over the timestamp delta between two
//! consecutive samples of the same rail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Overlay group a tracked rail reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerDomain {
    Gpu,
    Ddr,
    Camera,
    Display,
}

impl PowerDomain {
    /// All domains in overlay order.
    pub const ALL: [Self; 4] = [Self::Gpu, Self::Ddr, Self::Camera, Self::Display];

    /// Short label used in the power overlay.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gpu => "gpu",
            Self::Ddr => "ddr",
            Self::Camera => "cam",
            Self::Display => "disp",
        }
    }
}

impl std::fmt::Display for PowerDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gpu => "GPU",
            Self::Ddr => "DDR",
            Self::Camera => "Camera",
            Self::Display => "Display",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PowerDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gpu" => Ok(Self::Gpu),
            "ddr" => Ok(Self::Ddr),
            "camera" | "cam" => Ok(Self::Camera),
            "display" | "disp" => Ok(Self::Display),
            _ => Err(format!(
                "Unknown power domain: {s}. Valid options: gpu, ddr, camera, display"
            )),
        }
    }
}

/// One `CH<n>(T=<timestamp>)[<rail>], <energy>` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergySample {
    pub channel: u32,
    pub timestamp: u64,
    pub rail: String,
    pub energy: u64,
}

impl EnergySample {
    /// Parse a single counter line. Returns `None` for anything else.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix("CH")?;
        let (channel, rest) = rest.split_once("(T=")?;
        let (timestamp, rest) = rest.split_once(")[")?;
        let (rail, rest) = rest.split_once(']')?;
        let energy = rest.trim_start().strip_prefix(',')?.trim();

        if rail.is_empty() {
            return None;
        }

        Some(Self {
            channel: channel.parse().ok()?,
            timestamp: timestamp.parse().ok()?,
            rail: rail.to_string(),
            energy: energy.parse().ok()?,
        })
    }
}

/// Read every counter record of an energy node.
///
/// The first line is a header and is skipped, as are lines that don't parse.
pub fn read_energy_node(path: &Path) -> std::io::Result<Vec<EnergySample>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.lines().skip(1).filter_map(EnergySample::parse).collect())
}

#[derive(Debug, Clone, Copy)]
struct RailReading {
    timestamp: u64,
    energy: u64,
}

/// Previous reading per rail, for deriving power.
#[derive(Debug, Clone, Default)]
pub struct PowerTracker {
    previous: BTreeMap<String, RailReading>,
}

impl PowerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample and return the rail's power since its previous one.
    ///
    /// `None` for the first sample of a rail, when the timestamp didn't move
    /// forward, or when the counter went backwards.
    #[allow(clippy::cast_precision_loss)]
    pub fn record(&mut self, sample: &EnergySample) -> Option<f64> {
        let current = RailReading {
            timestamp: sample.timestamp,
            energy: sample.energy,
        };
        let previous = self.previous.insert(sample.rail.clone(), current)?;

        let elapsed = current.timestamp.checked_sub(previous.timestamp)?;
        let consumed = current.energy.checked_sub(previous.energy)?;
        if elapsed == 0 {
            return None;
        }

        Some(consumed as f64 / elapsed as f64)
    }

    /// Forget every rail.
    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let sample = EnergySample::parse("CH42(T=176090328)[S2S_VDD_GPU], 168620176").unwrap();
        assert_eq!(
            sample,
            EnergySample {
                channel: 42,
                timestamp: 176_090_328,
                rail: "S2S_VDD_GPU".to_string(),
                energy: 168_620_176,
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(EnergySample::parse("t=176090328").is_none());
        assert!(EnergySample::parse("CHx(T=1)[A], 2").is_none());
        assert!(EnergySample::parse("CH1(T=1)[], 2").is_none());
        assert!(EnergySample::parse("CH1(T=1)[A] 2").is_none());
        assert!(EnergySample::parse("").is_none());
    }

    #[test]
    fn test_power_between_samples() {
        let mut tracker = PowerTracker::new();
        let first = EnergySample::parse("CH42(T=176090328)[S2S_VDD_GPU], 168620176").unwrap();
        let second = EnergySample::parse("CH42(T=176091328)[S2S_VDD_GPU], 168720176").unwrap();

        assert_eq!(tracker.record(&first), None);
        let power = tracker.record(&second).unwrap();
        assert!((power - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_power_undefined_cases() {
        let mut tracker = PowerTracker::new();
        let sample = |t, e| EnergySample {
            channel: 1,
            timestamp: t,
            rail: "VDD_MIF".to_string(),
            energy: e,
        };

        tracker.record(&sample(100, 500));
        // Same timestamp
        assert_eq!(tracker.record(&sample(100, 600)), None);
        // Counter reset
        assert_eq!(tracker.record(&sample(200, 10)), None);
        assert_eq!(tracker.record(&sample(300, 110)), Some(1.0));

        tracker.reset();
        assert_eq!(tracker.record(&sample(400, 210)), None);
    }

    #[test]
    fn test_read_energy_node_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy_value");
        std::fs::write(
            &path,
            "t=176090328\n\
             CH0(T=176090328)[S2S_VDD_GPU], 168620176\n\
             CH1(T=176090328)[VDD_MIF], 9000\n\
             garbage\n",
        )
        .unwrap();

        let samples = read_energy_node(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].rail, "VDD_MIF");
    }

    #[test]
    fn test_domain_from_str() {
        assert_eq!("GPU".parse::<PowerDomain>(), Ok(PowerDomain::Gpu));
        assert_eq!("cam".parse::<PowerDomain>(), Ok(PowerDomain::Camera));
        assert!("cpu".parse::<PowerDomain>().is_err());
        assert_eq!(PowerDomain::Display.label(), "disp");
        assert_eq!(PowerDomain::Ddr.to_string(), "DDR");
    }
}
