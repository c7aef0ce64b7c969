//! Pass/fail ranges for sampled telemetry.

use crate::telemetry::TelemetrySample;
use serde::{Deserialize, Serialize};

/// Checked telemetry parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Frequency,
    Temperature,
    Utilization,
    Power,
}

impl Parameter {
    pub const ALL: [Self; 4] = [
        Self::Frequency,
        Self::Temperature,
        Self::Utilization,
        Self::Power,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Frequency => "Frequency",
            Self::Temperature => "Temperature",
            Self::Utilization => "Utilization",
            Self::Power => "Power",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterThreshold {
    pub min: f64,
    pub max: f64,
}

impl ParameterThreshold {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ranges for every checked parameter.
///
/// Minimums are idle values, maximums are full-load values. Frequency is in
/// Hz as reported by the driver, temperature in degrees Celsius, utilization
/// in percent and power in energy units per counter tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub frequency: ParameterThreshold,
    pub temperature: ParameterThreshold,
    pub utilization: ParameterThreshold,
    pub power: ParameterThreshold,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            frequency: ParameterThreshold::new(19_800_000.0, 1_094_000_000.0),
            temperature: ParameterThreshold::new(30.0, 90.0),
            utilization: ParameterThreshold::new(0.0, 100.0),
            power: ParameterThreshold::new(0.0, 4000.0),
        }
    }
}

impl Thresholds {
    pub fn get(&self, parameter: Parameter) -> ParameterThreshold {
        match parameter {
            Parameter::Frequency => self.frequency,
            Parameter::Temperature => self.temperature,
            Parameter::Utilization => self.utilization,
            Parameter::Power => self.power,
        }
    }

    /// Check every value present in `sample`.
    ///
    /// Metrics that weren't read are not checked. Power is checked once per
    /// domain with a derived value.
    #[allow(clippy::cast_precision_loss)]
    pub fn check(&self, sample: &TelemetrySample) -> Vec<(Parameter, bool)> {
        let mut values = Vec::new();
        if let Some(freq) = sample.gpu_frequency_raw {
            values.push((Parameter::Frequency, freq as f64));
        }
        if let Some(temp) = sample.temperature_millideg {
            values.push((Parameter::Temperature, temp as f64 / 1000.0));
        }
        if let Some(util) = sample.utilization_percent {
            values.push((Parameter::Utilization, f64::from(util)));
        }
        for power in sample.power_by_domain.values() {
            values.push((Parameter::Power, *power));
        }

        values
            .into_iter()
            .map(|(parameter, value)| {
                let range = self.get(parameter);
                let ok = range.contains(value);
                if ok {
                    tracing::debug!(
                        "{}: {:.2} is within the range {:.2} to {:.2}",
                        parameter,
                        value,
                        range.min,
                        range.max
                    );
                } else {
                    tracing::debug!(
                        "{}: {:.2} is not within the range {:.2} to {:.2}",
                        parameter,
                        value,
                        range.min,
                        range.max
                    );
                }
                (parameter, ok)
            })
            .collect()
    }
}

/// Pass and fail tallies of one parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub pass: u64,
    pub fail: u64,
}

impl StatusCount {
    pub fn record(&mut self, passed: bool) {
        if passed {
            self.pass += 1;
        } else {
            self.fail += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.pass + self.fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::energy::PowerDomain;

    #[test]
    fn test_range_is_inclusive() {
        let range = ParameterThreshold::new(30.0, 90.0);
        assert!(range.contains(30.0));
        assert!(range.contains(90.0));
        assert!(!range.contains(29.9));
        assert!(!range.contains(90.1));
    }

    #[test]
    fn test_check_sample() {
        let mut sample = TelemetrySample {
            gpu_frequency_raw: Some(848_000_000),
            temperature_millideg: Some(95_000),
            utilization_percent: None,
            ..TelemetrySample::default()
        };
        sample.power_by_domain.insert(PowerDomain::Gpu, 100.0);

        let results = Thresholds::default().check(&sample);
        assert_eq!(
            results,
            vec![
                (Parameter::Frequency, true),
                (Parameter::Temperature, false),
                (Parameter::Power, true),
            ]
        );
    }

    #[test]
    fn test_status_count() {
        let mut count = StatusCount::default();
        count.record(true);
        count.record(true);
        count.record(false);
        assert_eq!(count, StatusCount { pass: 2, fail: 1 });
        assert_eq!(count.total(), 3);
    }
}
