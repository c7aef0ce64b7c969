//! String-keyed scene options.
//!
//! Options mirror the descriptor grammar: names and values are free-form text
//! validated at runtime against the scene's declared option table.

use std::collections::BTreeMap;

/// One scene option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneOption {
    pub value: String,
    pub default_value: String,
    pub description: String,
    /// Acceptable values; empty means anything goes.
    pub allowed: Vec<String>,
    /// Set explicitly by a descriptor since the last reset.
    pub set: bool,
}

impl SceneOption {
    /// Create a new option holding its default value.
    pub fn new(default_value: &str, description: &str, allowed: &[&str]) -> Self {
        Self {
            value: default_value.to_string(),
            default_value: default_value.to_string(),
            description: description.to_string(),
            allowed: allowed.iter().map(|s| (*s).to_string()).collect(),
            set: false,
        }
    }

    /// Whether `value` passes this option's allowed-value check.
    pub fn accepts(&self, value: &str) -> bool {
        self.allowed.is_empty() || self.allowed.iter().any(|a| a == value)
    }
}

/// Ordered option table of a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    options: BTreeMap<String, SceneOption>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option.
    pub fn add(&mut self, name: &str, default_value: &str, description: &str) {
        self.add_with_values(name, default_value, description, &[]);
    }

    /// Declare an option restricted to `allowed` values.
    pub fn add_with_values(
        &mut self,
        name: &str,
        default_value: &str,
        description: &str,
        allowed: &[&str],
    ) {
        self.options.insert(
            name.to_string(),
            SceneOption::new(default_value, description, allowed),
        );
    }

    /// Set the current value of an option.
    ///
    /// Fails without touching anything when the name is unknown or the value
    /// is not acceptable.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.options.get_mut(name) {
            Some(option) if option.accepts(value) => {
                option.value = value.to_string();
                option.set = true;
                true
            }
            _ => false,
        }
    }

    /// Change the default value of an option. The current value is untouched.
    pub fn set_default(&mut self, name: &str, value: &str) -> bool {
        match self.options.get_mut(name) {
            Some(option) if option.accepts(value) => {
                option.default_value = value.to_string();
                true
            }
            _ => false,
        }
    }

    /// Restore every option to its default and clear the explicit-set marks.
    pub fn reset(&mut self) {
        for option in self.options.values_mut() {
            option.value.clone_from(&option.default_value);
            option.set = false;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option(&self, name: &str) -> Option<&SceneOption> {
        self.options.get(name)
    }

    /// Current value of an option.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(|o| o.value.as_str())
    }

    /// `true` only for the literal value `"true"`.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name) == Some("true")
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        self.get(name).and_then(|v| v.trim().parse().ok())
    }

    /// Parse a `"x,y"` value. Missing components are 0.
    pub fn get_pair(&self, name: &str) -> (f32, f32) {
        let Some(value) = self.get(name) else {
            return (0.0, 0.0);
        };

        let mut parts = value.split(',').map(|p| p.trim().parse::<f32>().unwrap_or(0.0));
        let x = parts.next().unwrap_or(0.0);
        let y = parts.next().unwrap_or(0.0);
        (x, y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SceneOption)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OptionSet {
        let mut options = OptionSet::new();
        options.add("duration", "10.0", "The duration of each benchmark in seconds");
        options.add_with_values("show-stats", "false", "Show statistics", &["false", "true"]);
        options
    }

    #[test]
    fn test_set_known_option() {
        let mut options = sample();
        assert!(options.set("duration", "5"));
        assert_eq!(options.get("duration"), Some("5"));
        assert!(options.option("duration").unwrap().set);
    }

    #[test]
    fn test_set_rejects_unknown_and_disallowed() {
        let mut options = sample();
        let before = options.clone();

        assert!(!options.set("no-such-option", "1"));
        assert!(!options.set("show-stats", "maybe"));
        assert_eq!(options, before);
    }

    #[test]
    fn test_set_default_then_reset() {
        let mut options = sample();
        assert!(options.set_default("show-stats", "true"));
        // Current value only changes on reset
        assert_eq!(options.get("show-stats"), Some("false"));
        assert!(!options.option("show-stats").unwrap().set);

        options.set("duration", "1");
        options.reset();
        assert!(options.get_bool("show-stats"));
        assert_eq!(options.get_f64("duration"), Some(10.0));
        assert!(options.iter().all(|(_, o)| !o.set));
    }

    #[test]
    fn test_get_pair() {
        let mut options = OptionSet::new();
        options.add("pos", "-1.0,-0.5", "Position");
        options.add("half", "0.25", "Half position");
        assert_eq!(options.get_pair("pos"), (-1.0, -0.5));
        assert_eq!(options.get_pair("half"), (0.25, 0.0));
        assert_eq!(options.get_pair("missing"), (0.0, 0.0));
    }
}
