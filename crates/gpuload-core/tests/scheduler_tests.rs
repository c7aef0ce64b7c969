//! End-to-end tests for descriptor parsing, collection building and the main loop.
//!
//! These drive the public API only: a registry of built-in scenes, a headless
//! surface and a manual clock stand in for the host.

use gpuload_core::benchmark::ANNOTATE_DESCRIPTOR;
use gpuload_core::surface::SurfaceFeature;
use gpuload_core::{
    BenchmarkCollection, BenchmarkDescriptor, Config, HeadlessSurface, HostStatus, LoopMode,
    LoopPhase, MainLoop, ManualClock, RunReport, SceneRef, SceneRegistry, SetupStatus,
    ValidationResult, export_json,
};
use std::path::Path;
use tempfile::TempDir;

/// Config whose telemetry reads land in an empty directory.
fn isolated_config(sysfs: &TempDir) -> Config {
    Config {
        sysfs_root: sysfs.path().to_path_buf(),
        storage_dir: sysfs.path().join("frames"),
        ..Config::default()
    }
}

fn collection_of(registry: &SceneRegistry, descriptors: &[&str]) -> BenchmarkCollection {
    let mut collection = BenchmarkCollection::new();
    collection.add(descriptors, registry);
    collection
}

fn run_to_end(main_loop: &mut MainLoop<'_>) -> usize {
    let mut steps = 0;
    while main_loop.step(HostStatus::default()) {
        steps += 1;
        assert!(steps < 100_000, "main loop did not terminate");
    }
    steps
}

// =============================================================================
// Descriptor Parsing
// =============================================================================

#[test]
fn test_parse_scene_with_option() {
    let registry = SceneRegistry::with_builtin_scenes();
    let descriptor = BenchmarkDescriptor::parse("build:use-vbo=true", &registry);

    assert_eq!(descriptor.scene_ref(), &SceneRef::Scene("build".to_string()));
    assert_eq!(
        descriptor.options(),
        &[("use-vbo".to_string(), "true".to_string())]
    );
    assert!(!descriptor.needs_decoration());
}

#[test]
fn test_parse_drops_malformed_token_only() {
    let registry = SceneRegistry::with_builtin_scenes();
    let descriptor = BenchmarkDescriptor::parse("texture:broken:texture-filter=linear", &registry);

    assert_eq!(descriptor.scene_name(), "texture");
    assert_eq!(
        descriptor.options(),
        &[("texture-filter".to_string(), "linear".to_string())]
    );
}

#[test]
fn test_parse_annotation_descriptor() {
    let registry = SceneRegistry::with_builtin_scenes();
    let descriptor = BenchmarkDescriptor::parse(ANNOTATE_DESCRIPTOR, &registry);

    assert_eq!(descriptor.scene_ref(), &SceneRef::DefaultOptions);
    assert_eq!(descriptor.scene_name(), "");
    assert!(descriptor.needs_decoration());
}

// =============================================================================
// Collection Building
// =============================================================================

#[test]
fn test_populate_falls_back_to_selected_mode() {
    let registry = SceneRegistry::with_builtin_scenes();
    let config = Config::default();
    let mut collection = BenchmarkCollection::new();
    collection.populate(&config, &registry);

    assert!(!collection.is_empty());
    assert!(collection.contains_normal_scenes());
    for descriptor in &collection {
        assert!(!descriptor.scene_name().is_empty());
    }
}

#[test]
fn test_populate_with_annotation_keeps_defaults() {
    let registry = SceneRegistry::with_builtin_scenes();
    let config = Config {
        annotate: true,
        selected_mode: "shader".to_string(),
        ..Config::default()
    };
    let mut collection = BenchmarkCollection::new();
    collection.populate(&config, &registry);

    // The annotation alone names no scene, so the mode list is still appended
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.get(0).unwrap().scene_ref(), &SceneRef::DefaultOptions);
    assert_eq!(collection.get(1).unwrap().scene_name(), "shading");
    assert!(collection.needs_decoration());
}

#[test]
fn test_populate_from_benchmark_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("benchmarks.txt");
    std::fs::write(&file, "build:duration=1\n\nclear:nframes=4\n").unwrap();

    let registry = SceneRegistry::with_builtin_scenes();
    let config = Config {
        benchmark_files: vec![file, dir.path().join("missing.txt")],
        ..Config::default()
    };
    let mut collection = BenchmarkCollection::new();
    collection.populate(&config, &registry);

    let names: Vec<_> = collection.iter().map(BenchmarkDescriptor::scene_name).collect();
    assert_eq!(names, vec!["build", "clear"]);
}

// =============================================================================
// Scene Lifecycle
// =============================================================================

#[test]
fn test_setup_then_teardown_leaves_scene_stopped() {
    let mut registry = SceneRegistry::with_builtin_scenes();
    let mut surface = HeadlessSurface::new(16, 16);
    let descriptor = BenchmarkDescriptor::parse("jellyfish:duration=1", &registry);

    let scene = descriptor.setup_scene(&mut registry, &mut surface, 0).unwrap();
    assert!(scene.running());

    descriptor.teardown_scene(&mut registry);
    let scene = registry.get("jellyfish").unwrap();
    assert!(!scene.running());
    assert_eq!(scene.average_fps(), 0);
    assert!(!scene.state().is_loaded());
}

// =============================================================================
// Main Loop
// =============================================================================

#[test]
fn test_unsupported_scene_does_not_stop_the_run() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(
        &registry,
        &["build:duration=2", "shadow:duration=2", "texture:duration=1"],
    );
    let mut surface = HeadlessSurface::new(16, 16).without_feature(SurfaceFeature::DepthTexture);
    let mut config = isolated_config(&sysfs);
    let clock = ManualClock::with_step(0, 50_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &benchmarks,
        &mut config,
        &clock,
    );
    run_to_end(&mut main_loop);

    let scenes = main_loop.aggregator().scenes();
    let statuses: Vec<_> = scenes.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![SetupStatus::Success, SetupStatus::Unsupported, SetupStatus::Success]
    );
    assert_eq!(scenes[1].fps, 0);
    assert_eq!(main_loop.benchmarks_run(), 2);
    assert_eq!(main_loop.score(), (scenes[0].fps + scenes[2].fps) / 2);
    assert!(main_loop.aggregator().passed());
    assert_eq!(main_loop.phase(), LoopPhase::Done);
}

#[test]
fn test_overall_duration_ends_scenes() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(&registry, &["build", "texture"]);
    let mut surface = HeadlessSurface::new(8, 8);
    let mut config = Config {
        duration_s: 1,
        ..isolated_config(&sysfs)
    };
    let clock = ManualClock::with_step(0, 100_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &benchmarks,
        &mut config,
        &clock,
    );
    let steps = run_to_end(&mut main_loop);

    // Both scenes ask for 20 seconds but the run is capped at one
    assert!(steps < 30);
    let scenes = main_loop.aggregator().scenes();
    assert_eq!(scenes.len(), 2);
    assert!(scenes[0].frames < 20);
    assert_eq!(scenes[1].frames, 1);
}

#[test]
fn test_annotation_descriptor_is_applied_not_run() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(&registry, &[ANNOTATE_DESCRIPTOR, "clear:nframes=2"]);
    let mut surface = HeadlessSurface::new(8, 8);
    let mut config = isolated_config(&sysfs);
    let clock = ManualClock::with_step(0, 10_000);
    let mode = LoopMode::select(false, &benchmarks);
    assert_eq!(mode, LoopMode::Decorated);

    let mut main_loop = MainLoop::new(
        mode,
        &mut surface,
        &mut registry,
        &benchmarks,
        &mut config,
        &clock,
    );
    assert!(main_loop.step(HostStatus::default()));
    assert_eq!(main_loop.active_scene().unwrap().name(), "clear");
    run_to_end(&mut main_loop);

    let scenes = main_loop.aggregator().scenes();
    assert_eq!(scenes.len(), 1);
    assert_eq!(scenes[0].name, "clear");
    drop(main_loop);

    // The title default from the annotation named the scene by its info string
    let overlay = surface.last_overlay().unwrap();
    assert!(overlay.title.as_ref().unwrap().text.starts_with("[clear] "));
}

#[test]
fn test_run_forever_wraps_around() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(&registry, &["clear:nframes=1"]);
    let mut surface = HeadlessSurface::new(4, 4);
    let mut config = Config {
        run_forever: true,
        ..isolated_config(&sysfs)
    };
    let clock = ManualClock::with_step(0, 10_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &benchmarks,
        &mut config,
        &clock,
    );
    for _ in 0..10 {
        assert!(main_loop.step(HostStatus::default()));
    }
    assert_eq!(main_loop.benchmarks_run(), 10);
}

// =============================================================================
// Validation
// =============================================================================

fn validate_once(config: &mut Config, descriptors: &[&str]) -> Vec<ValidationResult> {
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(&registry, descriptors);
    let mut surface = HeadlessSurface::new(32, 24);
    let clock = ManualClock::with_step(0, 1_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Validation,
        &mut surface,
        &mut registry,
        &benchmarks,
        config,
        &clock,
    );
    run_to_end(&mut main_loop);
    main_loop
        .aggregator()
        .scenes()
        .iter()
        .map(|s| s.validation)
        .collect()
}

fn reference_path(config: &Config, name: &str) -> std::path::PathBuf {
    config.storage_dir.join(format!("{name}0_32_24.rgb"))
}

#[test]
fn test_validation_round_trip() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut config = isolated_config(&sysfs);
    let descriptors = ["shading:validate=true", "build:validate=true"];

    // First run stores the references
    assert_eq!(
        validate_once(&mut config, &descriptors),
        vec![ValidationResult::Success, ValidationResult::Success]
    );
    let stored = reference_path(&config, "shading");
    assert!(stored.exists());
    assert_eq!(std::fs::metadata(&stored).unwrap().len(), 32 * 24 * 4);

    // Second run compares against them
    assert_eq!(
        validate_once(&mut config, &descriptors),
        vec![ValidationResult::Success, ValidationResult::Success]
    );
}

#[test]
fn test_validation_detects_changed_frame() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut config = isolated_config(&sysfs);
    validate_once(&mut config, &["shading:validate=true"]);

    let stored = reference_path(&config, "shading");
    let mut reference = std::fs::read(&stored).unwrap();
    reference[0] ^= 0xff;
    std::fs::write(&stored, &reference).unwrap();

    assert_eq!(
        validate_once(&mut config, &["shading:validate=true"]),
        vec![ValidationResult::Failure]
    );
}

#[test]
fn test_validation_disabled_is_unknown() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut config = isolated_config(&sysfs);

    assert_eq!(
        validate_once(&mut config, &["shading"]),
        vec![ValidationResult::Unknown]
    );
    assert!(!reference_path(&config, "shading").exists());
}

// =============================================================================
// Report Export
// =============================================================================

#[test]
fn test_report_of_full_run() {
    let sysfs = tempfile::tempdir().unwrap();
    let mut registry = SceneRegistry::with_builtin_scenes();
    let benchmarks = collection_of(&registry, &["clear:nframes=3", "nosuchscene", "build:nframes=2"]);
    let mut surface = HeadlessSurface::new(8, 8);
    let mut config = isolated_config(&sysfs);
    let clock = ManualClock::with_step(0, 20_000);

    let mut main_loop = MainLoop::new(
        LoopMode::Benchmark,
        &mut surface,
        &mut registry,
        &benchmarks,
        &mut config,
        &clock,
    );
    run_to_end(&mut main_loop);

    let report = RunReport::new(main_loop.aggregator(), main_loop.config(), (8, 8));
    let path = sysfs.path().join("report.json");
    export_json(&report, &path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(Path::new(&path)).unwrap()).unwrap();
    assert_eq!(json["benchmarks_run"], 2);
    assert_eq!(json["passed"], true);
    assert_eq!(json["scenes"].as_array().unwrap().len(), 2);
    assert_eq!(json["scenes"][0]["name"], "clear");
    assert_eq!(json["scenes"][1]["info"], "[build] nframes=2:");
    assert_eq!(json["metadata"]["gpu_vendor"], "Mali");
}
