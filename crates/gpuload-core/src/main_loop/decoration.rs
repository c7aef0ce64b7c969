//! On-screen stats and title overlay.

use super::HostStatus;
use crate::results::format::format_power;
use crate::scene::{OptionSet, Scene};
use crate::surface::{Overlay, TextItem};
use crate::telemetry::energy::PowerDomain;

/// Refresh period of the stats line.
pub const STATS_REFRESH_US: u64 = 500_000;

const DEFAULT_GLYPH_SIZE: f32 = 0.03;

/// Overlay state for the active scene.
///
/// Configured from the scene's `show-stats` and `title` options right after
/// setup. The stats line is rebuilt at most once per [`STATS_REFRESH_US`].
#[derive(Debug, Clone, Default)]
pub struct Decoration {
    overlay: Overlay,
    last_fps: u32,
    stats_timestamp_us: u64,
}

impl Decoration {
    pub fn clear(&mut self) {
        self.overlay = Overlay::default();
    }

    /// Build the overlay for a freshly set up scene.
    pub fn configure(
        &mut self,
        scene: &dyn Scene,
        host: &HostStatus,
        show_all_options: bool,
        now_us: u64,
    ) {
        self.clear();
        let options = &scene.state().options;

        if options.get_bool("show-stats") {
            self.overlay.stats = Some(TextItem {
                text: stats_text(scene, self.last_fps, host),
                position: options.get_pair("stats-pos"),
                size: glyph_size(options, "stats-size"),
            });
            self.stats_timestamp_us = now_us;
        }

        let title = options.get("title").unwrap_or_default();
        if !title.is_empty() {
            let text = match title {
                "#info#" => scene.info_string(show_all_options),
                "#name#" => scene.name().to_string(),
                literal => literal.to_string(),
            };
            self.overlay.title = Some(TextItem {
                text,
                position: options.get_pair("title-pos"),
                size: glyph_size(options, "title-size"),
            });
        }
    }

    /// Rebuild the stats line if the refresh period has passed.
    pub fn refresh(&mut self, scene: &dyn Scene, host: &HostStatus, now_us: u64) {
        let Some(stats) = self.overlay.stats.as_mut() else {
            return;
        };

        if now_us.saturating_sub(self.stats_timestamp_us) >= STATS_REFRESH_US {
            self.last_fps = scene.average_fps();
            stats.text = stats_text(scene, self.last_fps, host);
            self.stats_timestamp_us = now_us;
        }
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// FPS shown by the last stats refresh.
    pub fn last_fps(&self) -> u32 {
        self.last_fps
    }
}

fn glyph_size(options: &OptionSet, name: &str) -> f32 {
    options
        .get(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_GLYPH_SIZE)
}

/// Stats line for `scene`: the rail power breakdown with `show-power`,
/// otherwise frame rate, GPU state and host state.
pub fn stats_text(scene: &dyn Scene, fps: u32, host: &HostStatus) -> String {
    let state = scene.state();
    let telemetry = &state.telemetry;
    let power = |domain: PowerDomain| {
        format_power(telemetry.power_by_domain.get(&domain).copied().unwrap_or(0.0))
    };

    if state.options.get_bool("show-power") {
        PowerDomain::ALL
            .iter()
            .map(|&domain| format!("{}: {}", domain.label(), power(domain)))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        format!(
            "FPS: {} usg: {} clk: {} temp: {} bat:{} lpm: {} eng: {}",
            fps,
            telemetry.gpu_utilization,
            telemetry.gpu_frequency_khz,
            telemetry.gpu_temperature_c,
            host.battery,
            u8::from(host.power_save_mode),
            power(PowerDomain::Gpu)
        )
    }
}
