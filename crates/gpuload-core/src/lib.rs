//! Core of the gpuload GPU stress harness.
//!
//! This crate sequences GPU workloads ("scenes") and measures them:
//!
//! - [`benchmark`]: descriptor strings (`scene:opt=value:...`) and the
//!   ordered collection built from configuration.
//! - [`scene`]: the scene trait, its option system, golden-frame validation
//!   and the built-in workloads.
//! - [`telemetry`]: time-gated sysfs sampling of GPU frequency, utilization,
//!   temperature and rail energy.
//! - [`main_loop`]: the cooperative scheduler the host drives once per frame.
//! - [`results`]: score, per-scene results, threshold tallies and the JSON report.
//!
//! # Example
//!
//! ```
//! use gpuload_core::{
//!     BenchmarkCollection, Config, HeadlessSurface, HostStatus, LoopMode, MainLoop,
//!     ManualClock, SceneRegistry,
//! };
//!
//! let mut registry = SceneRegistry::with_builtin_scenes();
//! let mut config = Config {
//!     benchmarks: vec!["clear:nframes=3".to_string()],
//!     ..Config::default()
//! };
//! let mut collection = BenchmarkCollection::new();
//! collection.populate(&config, &registry);
//!
//! let mut surface = HeadlessSurface::new(64, 64);
//! let clock = ManualClock::with_step(0, 10_000);
//! let mut main_loop = MainLoop::new(
//!     LoopMode::Benchmark,
//!     &mut surface,
//!     &mut registry,
//!     &collection,
//!     &mut config,
//!     &clock,
//! );
//! while main_loop.step(HostStatus::default()) {}
//! assert_eq!(main_loop.benchmarks_run(), 1);
//! ```

pub mod benchmark;
pub mod clock;
pub mod config;
pub mod error;
pub mod main_loop;
pub mod results;
pub mod scene;
pub mod surface;
pub mod telemetry;

pub use benchmark::{BenchmarkCollection, BenchmarkDescriptor, SceneRef};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, GpuVendor, JsonConfig};
pub use error::{ConfigError, ReportError};
pub use main_loop::{HostStatus, LoopMode, LoopPhase, MainLoop, SetupStatus};
pub use results::{ResultAggregator, RunReport, SceneResult, export_json};
pub use scene::{Scene, SceneRegistry, SceneState, ValidationResult};
pub use surface::{HeadlessSurface, RenderSurface};
pub use telemetry::{TelemetrySample, TelemetrySampler};
