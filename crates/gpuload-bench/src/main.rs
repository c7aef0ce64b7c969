//! gpuload - GPU stress harness.

// Use mimalloc for reduced allocation latency (enabled by default).
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use gpuload_bench::{Cli, HostMonitor, ResultPrinter, signal};
use gpuload_core::{
    BenchmarkCollection, Clock, HeadlessSurface, LoopMode, MainLoop, RunReport, SceneRegistry,
    SystemClock, export_json,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise use default based on verbose flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Ctrl+C ends the active scene and still prints the partial score
    if let Err(e) = signal::install_signal_handler() {
        tracing::warn!("Failed to install signal handler: {}", e);
    }

    let options = cli.into_config().context("Failed to create run configuration")?;
    let printer = ResultPrinter::new(options.color);
    let mut registry = SceneRegistry::with_builtin_scenes();

    if options.list_scenes {
        printer.print_scene_list(&registry);
        return Ok(());
    }

    if options.validate {
        registry.apply_default_options(&[("validate".to_string(), "true".to_string())]);
    }

    let mut config = options.config;
    let mut collection = BenchmarkCollection::new();
    collection.populate(&config, &registry);
    tracing::info!("Created {} benchmarks", collection.len());

    let mode = LoopMode::select(options.validate, &collection);
    let (width, height) = options.size;
    let mut surface = HeadlessSurface::new(width, height).with_quit_flag(signal::quit_flag());
    let clock = SystemClock::new();
    let mut host = HostMonitor::new(&config);

    printer.print_banner(mode, collection.len(), options.size);

    let report = {
        let mut main_loop = MainLoop::new(
            mode,
            &mut surface,
            &mut registry,
            &collection,
            &mut config,
            &clock,
        );
        while main_loop.step(host.status(clock.now_us())) {}

        tracing::info!("gpuload Score: {}", main_loop.score());
        printer.print_summary(main_loop.aggregator());
        RunReport::new(main_loop.aggregator(), main_loop.config(), options.size)
    };

    if let Some(path) = options.json {
        export_json(&report, &path).context("Failed to export JSON")?;
        println!("Results exported to: {}", path.display());
    }

    if signal::shutdown_requested() {
        eprintln!("\nBenchmark interrupted.");
        std::process::exit(130); // Standard exit code for SIGINT (128 + 2)
    }

    Ok(())
}
