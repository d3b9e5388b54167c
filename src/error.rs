//! Error types for the fallible edges of the crate
//!
//! The simulation itself never fails: deaths and level clears are events.
//! Errors only come from loading data (level layouts, settings files).

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::Rect;

/// Level layout loading and validation errors
#[derive(Error, Debug)]
pub enum LevelError {
    /// No built-in stage with this number
    #[error("Unknown stage {index}: built-in stages are 1..={count}")]
    UnknownStage {
        /// Requested stage
        index: u32,
        /// Number of built-in stages
        count: u32,
    },

    /// A layout must have exactly one real exit door
    #[error("Layout has {found} exit doors, expected exactly one")]
    ExitDoorCount {
        /// Number of non-fake doors found
        found: usize,
    },

    /// Rectangle with zero or negative size
    #[error("Degenerate {what} rectangle {rect:?}")]
    DegenerateRect {
        /// What the rectangle belongs to ("platform", "trap", ...)
        what: &'static str,
        /// Offending rectangle
        rect: Rect,
    },

    /// World narrower than one screen
    #[error("World width {world_w} is narrower than the screen ({min})")]
    WorldTooNarrow {
        /// Layout width
        world_w: i32,
        /// Minimum allowed width
        min: i32,
    },

    /// Malformed layout JSON
    #[error("Invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Layout file could not be read
    #[error("Failed to read layout {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read or written
    #[error("Settings file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed settings JSON
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Baseline heart rate outside the accepted range
    #[error("Baseline bpm {value} outside [{min}, {max}]")]
    BaselineOutOfRange {
        /// Rejected value
        value: i32,
        /// Minimum accepted
        min: i32,
        /// Maximum accepted
        max: i32,
    },

    /// Simulation frame rate of zero
    #[error("Frame rate must be positive")]
    ZeroFrameRate,
}
