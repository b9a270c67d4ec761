//! Structured-output model interface.
//!
//! This module defines the [`StructuredModel`] trait every model backend
//! implements, the request/response types passed across it, and the
//! [`GeminiModel`] backend.
//!
//! # Architecture
//!
//! ```text
//! PlanAdapter (parse / generate)
//!     |
//!     |  ModelRequest { system_instructions, content, response_schema, ... }
//!     v
//! &dyn StructuredModel --generate--> ModelOutput { text, model, usage }
//!     |                                   |
//!     |                                   v
//!     |                         extract_json -> decode_plan
//!     v
//! ModelError { Upstream(category) | EmptyResponse | SchemaRejected }
//! ```

pub mod gemini;
pub mod trait_def;
pub mod types;

pub use gemini::{FAST_MODEL, GEMINI_API_KEY_ENV, GeminiModel, QUALITY_MODEL};
pub use trait_def::StructuredModel;
pub use types::{ContentPart, ModelError, ModelOutput, ModelRequest, TokenUsage, UpstreamCategory};
