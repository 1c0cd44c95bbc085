use async_trait::async_trait;

use super::types::{ChatRequest, ProviderFault};

/// One provider backend. Adapters translate the uniform request into the
/// provider's wire shape and extract plain text from its response.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderFault>;

    /// Provider label for logging and fault messages.
    fn name(&self) -> &'static str;
}
