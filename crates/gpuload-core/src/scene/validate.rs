//! Golden-frame validation.
//!
//! The first validation of a scene at a given resolution stores the frame as
//! the reference; later runs compare against it byte for byte.

use super::SceneState;
use crate::surface::RenderSurface;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of a frame validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationResult {
    Success,
    Failure,
    Unknown,
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Location and size of a captured frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Result of [`Scene::validate`](super::Scene::validate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub result: ValidationResult,
    /// Frame the result refers to; `None` when nothing was captured.
    pub record: Option<FrameRecord>,
}

impl Validation {
    pub fn unknown() -> Self {
        Self {
            result: ValidationResult::Unknown,
            record: None,
        }
    }
}

/// Validate the current framebuffer of `surface` for the scene in `state`.
///
/// Returns `Unknown` unless the scene's `validate` option is `"true"`. The
/// reference file is `<storage_dir>/<name><index>_<w>_<h>.rgb`, where `index`
/// counts validations within the current run. A missing reference is written
/// and counts as `Success`.
pub fn validate_frame(
    state: &mut SceneState,
    surface: &dyn RenderSurface,
    storage_dir: &Path,
) -> Validation {
    if !state.options.get_bool("validate") {
        return Validation::unknown();
    }

    let width = surface.width();
    let height = surface.height();
    let index = state.next_capture_index();
    let file = storage_dir.join(format!("{}{index}_{width}_{height}.rgb", state.name()));
    let pixels = surface.read_pixels();

    let result = match std::fs::read(&file) {
        Ok(reference) => {
            if frames_match(&pixels, &reference) {
                ValidationResult::Success
            } else {
                ValidationResult::Failure
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if let Err(e) = write_reference(&file, &pixels) {
                tracing::warn!("Failed to store reference frame {}: {}", file.display(), e);
                state.record_validation(ValidationResult::Unknown);
                return Validation::unknown();
            }
            tracing::debug!("Stored reference frame {}", file.display());
            ValidationResult::Success
        }
        Err(e) => {
            tracing::warn!("Failed to read reference frame {}: {}", file.display(), e);
            ValidationResult::Unknown
        }
    };

    state.record_validation(result);
    Validation {
        result,
        record: Some(FrameRecord {
            file,
            width,
            height,
        }),
    }
}

/// Byte comparison that tolerates a difference in the final byte.
fn frames_match(current: &[u8], reference: &[u8]) -> bool {
    if current.len() != reference.len() {
        return false;
    }
    let compared = current.len().saturating_sub(1);
    current[..compared] == reference[..compared]
}

fn write_reference(file: &Path, pixels: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file, pixels)
}
