//! Command-line host for the gpuload GPU stress harness.
//!
//! The binary builds the scene registry, the benchmark collection and the
//! configuration, then drives [`gpuload_core::MainLoop::step`] once per frame
//! on a headless surface until the collection is exhausted or a signal
//! arrives.
//!
//! # Usage
//!
//! ```text
//! gpuload [OPTIONS]
//!
//! Options:
//!   -b, --benchmark <DESCRIPTOR>   Benchmark to run (repeatable)
//!   -f, --benchmark-file <PATH>    File with one benchmark per line (repeatable)
//!   -m, --mode <MODE>              Built-in test mode (default: stress)
//!   -s, --size <WxH>               Surface size (default: 800x600)
//!   -c, --config <PATH>            key = value conf file
//!       --validate                 Compare the first frame of each scene to a reference
//!       --json <PATH>              Export the run report as JSON
//!   -l, --list-scenes              List scenes and their options
//!   -v, --verbose                  Verbose output
//!   -h, --help                     Print help
//! ```

pub mod cli;
pub mod host;
pub mod printer;
pub mod signal;

pub use cli::{Cli, RunOptions};
pub use host::HostMonitor;
pub use printer::ResultPrinter;
