//! Query functions, one module per table.

pub mod generation_log;
