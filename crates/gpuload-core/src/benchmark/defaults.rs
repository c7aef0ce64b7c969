//! Built-in benchmark lists per test mode.

use std::collections::BTreeMap;

/// Built-in test modes.
pub const MODES: &[&str] = &["tiles", "throttle", "cpu", "stress", "shader", "pow"];

const TILES: &[&str] = &[
    "jellyfish:duration=5:validate=true",
    "ideas:duration=5:validate=true",
    "shading:duration=5:validate=true",
    "bump:duration=5:validate=true",
    "shadow:duration=5:validate=true",
    "build:duration=5:validate=true",
    "terrain:duration=5:validate=true",
    "conditionals:duration=5:validate=true",
    "buffer:duration=20:validate=true",
];

const THROTTLE: &[&str] = &[
    "refract:duration=20:show-stats=false",
    "jellyfish:duration=20:show-stats=false",
    "build:duration=20:show-stats=false",
    "buffer:duration=20:show-stats=false",
    "refract:duration=20:show-stats=false",
    "jellyfish:duration=20:show-stats=false",
    "build:duration=20:show-stats=false",
    "buffer:duration=20:show-stats=false",
];

const STRESS: &[&str] = &[
    "build:duration=20:show-stats=false",
    "refract:duration=20:show-stats=false",
    "jellyfish:duration=20:show-stats=false",
    "refract:duration=20:show-stats=false:show-power=false",
    "jellyfish:duration=20:show-stats=false:show-power=false",
];

const SHADER: &[&str] = &["shading:duration=20:show-stats=false"];

const POW: &[&str] = &["terrain:duration=30"];

/// Built-in descriptor list for `mode`; empty for an unknown mode.
pub fn mode_benchmarks(mode: &str) -> Vec<String> {
    let list: &[&str] = match mode {
        "tiles" => TILES,
        "throttle" => THROTTLE,
        // The CPU mode runs the stress list alongside an external CPU load
        "cpu" | "stress" => STRESS,
        "shader" => SHADER,
        "pow" => POW,
        _ => &[],
    };
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Every built-in mode with its descriptor list.
pub fn builtin_test_definitions() -> BTreeMap<String, Vec<String>> {
    MODES
        .iter()
        .map(|mode| ((*mode).to_string(), mode_benchmarks(mode)))
        .collect()
}
