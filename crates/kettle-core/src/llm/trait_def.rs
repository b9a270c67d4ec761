//! The `StructuredModel` trait -- the interface to schema-bound model backends.
//!
//! The trait is object-safe so adapters can hold `&dyn StructuredModel` or
//! `Arc<dyn StructuredModel>` and tests can swap in stubs.

use async_trait::async_trait;

use super::types::{ModelError, ModelOutput, ModelRequest};

/// A black-box `(instructions, content, schema) -> text` function.
///
/// Implementors only transport the call. Turning the returned text into a
/// plan, and rejecting it when it does not fit the schema, is the caller's
/// job.
#[async_trait]
pub trait StructuredModel: Send + Sync {
    /// Backend name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Run one structured-output call.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelOutput, ModelError>;
}

// Compile-time assertion: StructuredModel must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn StructuredModel) {}
};
