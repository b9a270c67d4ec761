//! Workout-plan normalization, structuring and validation.
//!
//! The pipeline for one call:
//!
//! 1. [`normalize`] expands shorthand with a [`dictionary::Dictionary`].
//! 2. [`notation`] detects the workout format and explicit notation.
//! 3. An [`adapter::PlanAdapter`] asks a [`llm::StructuredModel`] for a plan
//!    that fits the [`plan`] schema.
//! 4. [`validate`] checks the plan; [`retry`] feeds errors back once and
//!    writes the audit record.

pub mod adapter;
pub mod dictionary;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod notation;
pub mod plan;
pub mod profile;
pub mod retry;
pub mod validate;
