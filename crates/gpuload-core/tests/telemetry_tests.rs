//! Telemetry sampling against a fake sysfs tree.

use gpuload_core::results::threshold::Parameter;
use gpuload_core::telemetry::energy::{EnergySample, PowerDomain, PowerTracker, read_energy_node};
use gpuload_core::{
    BenchmarkCollection, Config, GpuVendor, HeadlessSurface, HostStatus, LoopMode, MainLoop,
    ManualClock, SceneRegistry, SceneState, TelemetrySampler,
};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MALI: &str = "sys/devices/platform/1f000000.mali";
const TEMP: &str = "sys/class/thermal/thermal_zone22/temp";
const ENERGY: &str = "sys/bus/iio/devices/iio:device0/energy_value";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A Mali board at 45.5 C, 600 MHz and 80% utilization.
fn mali_board() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), &format!("{MALI}/cur_freq"), "600000000\n");
    write(dir.path(), &format!("{MALI}/min_freq"), "200000000\n");
    write(dir.path(), &format!("{MALI}/max_freq"), "1000000000\n");
    write(dir.path(), &format!("{MALI}/utilization"), "80\n");
    write(dir.path(), TEMP, "45500\n");
    dir
}

fn board_config(board: &TempDir) -> Config {
    Config {
        sysfs_root: board.path().to_path_buf(),
        storage_dir: board.path().join("frames"),
        ..Config::default()
    }
}

// =============================================================================
// Energy Counters
// =============================================================================

#[test]
fn test_energy_line_and_power() {
    let first = EnergySample::parse("CH42(T=176090328)[S2S_VDD_GPU], 168620176").unwrap();
    assert_eq!(
        first,
        EnergySample {
            channel: 42,
            timestamp: 176_090_328,
            rail: "S2S_VDD_GPU".to_string(),
            energy: 168_620_176,
        }
    );

    let second = EnergySample::parse("CH42(T=176091328)[S2S_VDD_GPU], 168720176").unwrap();
    let mut tracker = PowerTracker::new();
    assert_eq!(tracker.record(&first), None);
    let power = tracker.record(&second).unwrap();
    assert!((power - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_energy_node_with_header() {
    let board = tempfile::tempdir().unwrap();
    write(
        board.path(),
        ENERGY,
        "t=176090328\n\
         CH0(T=176090328)[VDD_MIF], 1200\n\
         not a counter line\n\
         CH42(T=176090328)[S2S_VDD_GPU], 168620176\n",
    );

    let records = read_energy_node(&board.path().join(ENERGY)).unwrap();
    let rails: Vec<_> = records.iter().map(|r| r.rail.as_str()).collect();
    assert_eq!(rails, vec!["VDD_MIF", "S2S_VDD_GPU"]);
    assert!(read_energy_node(&board.path().join("missing")).is_err());
}

// =============================================================================
// Sampling Gate
// =============================================================================

proptest! {
    #[test]
    fn prop_one_pass_per_interval(
        interval_ms in 1u64..1_000,
        offsets in prop::collection::vec(0u64..1_000_000, 1..50),
    ) {
        let board = tempfile::tempdir().unwrap();
        let mut config = Config {
            interval_ms,
            ..board_config(&board)
        };
        let mut scene = SceneState::new("build");
        let mut sampler = TelemetrySampler::new(0);
        let window = interval_ms * 1000;

        let mut times: Vec<u64> = offsets.into_iter().map(|o| o % window).collect();
        times.sort_unstable();
        for now in times {
            sampler.stats_run(false, &mut config, "ARM", &mut scene, now);
        }
        prop_assert_eq!(sampler.passes(), 1);
    }
}

#[test]
fn test_sampling_resumes_after_interval() {
    let board = mali_board();
    let mut config = board_config(&board);
    let mut scene = SceneState::new("build");
    let mut sampler = TelemetrySampler::new(0);

    let times = [0, 150_000, 199_999, 200_000, 250_000, 400_000];
    let sampled: Vec<bool> = times
        .iter()
        .map(|&now| {
            sampler
                .stats_run(false, &mut config, "ARM", &mut scene, now)
                .is_some()
        })
        .collect();

    assert_eq!(sampled, vec![true, false, false, true, false, true]);
    assert_eq!(scene.telemetry.gpu_frequency_khz, 600_000);
    assert!((scene.telemetry.gpu_frequency_percent - 50.0).abs() < 1e-9);
}

// =============================================================================
// Sampling Inside The Main Loop
// =============================================================================

#[test]
fn test_main_loop_tallies_thresholds() {
    let board = mali_board();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let mut collection = BenchmarkCollection::new();
    collection.add(["build:duration=1"], &registry);
    let mut surface = HeadlessSurface::new(8, 8).with_vendor("ARM");
    let mut config = Config {
        interval_ms: 100,
        ..board_config(&board)
    };
    // Tighten the temperature range so every sample fails it
    config.thresholds.temperature.max = 40.0;
    let clock = ManualClock::with_step(0, 50_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &collection,
        &mut config,
        &clock,
    );
    while main_loop.step(HostStatus::default()) {}

    let samples = main_loop.sampler().passes();
    assert!(samples > 1);
    let aggregator = main_loop.aggregator();
    let temperature = aggregator.parameter_count(Parameter::Temperature);
    assert_eq!(temperature.pass, 0);
    assert_eq!(temperature.fail, samples);
    assert_eq!(aggregator.parameter_count(Parameter::Frequency).pass, samples);
    assert_eq!(aggregator.parameter_count(Parameter::Utilization).pass, samples);
    // No energy node on this board
    assert_eq!(aggregator.parameter_count(Parameter::Power).total(), 0);

    let telemetry = &aggregator.scenes()[0].telemetry;
    assert_eq!(telemetry.gpu_temperature_c, 45);
    assert_eq!(telemetry.gpu_utilization, 80);
    assert_eq!(main_loop.config().gpu_vendor, Some(GpuVendor::Mali));
}

#[test]
fn test_main_loop_tracks_gpu_power() {
    let board = mali_board();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let mut collection = BenchmarkCollection::new();
    collection.add(["clear:nframes=2"], &registry);
    let mut surface = HeadlessSurface::new(4, 4);
    let mut config = Config {
        interval_ms: 0,
        ..board_config(&board)
    };
    let clock = ManualClock::with_step(0, 10_000);

    write(board.path(), ENERGY, "t=1000\nCH42(T=1000)[S2S_VDD_GPU], 5000\n");
    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &collection,
        &mut config,
        &clock,
    );
    assert!(main_loop.step(HostStatus::default()));

    write(board.path(), ENERGY, "t=1500\nCH42(T=1500)[S2S_VDD_GPU], 6000\n");
    assert!(main_loop.step(HostStatus::default()));

    let telemetry = &main_loop.aggregator().scenes()[0].telemetry;
    assert_eq!(telemetry.power_by_domain.get(&PowerDomain::Gpu), Some(&2.0));
}
