//! Workout notation heuristics.
//!
//! - [`detector`] classifies the dominant format of a text (EMOM, AMRAP, ...).
//! - [`cues`] extracts explicit notation such as `3x10`, `@ 80%` or `15+5+5`.
//!
//! Both are best-effort and only inform adapter instructions; neither decides
//! the structure of a plan on its own.

pub mod cues;
pub mod detector;

pub use cues::{NotationCue, scan_notation};
pub use detector::{WorkoutFormat, WorkoutFormatParseError, detect_workout_format};
