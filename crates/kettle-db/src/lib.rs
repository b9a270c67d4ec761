//! PostgreSQL persistence for the generation audit log.
//!
//! The only table is `generation_log`: one row per generation cycle, written
//! best-effort after the retry loop accepts or exhausts a plan.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
