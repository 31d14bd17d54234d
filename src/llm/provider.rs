use async_trait::async_trait;

use crate::errors::GruntyResult;
use crate::llm::types::{AssistantResponse, MessageRequest};

/// The remote model call. One attempt per invocation, no retries.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    async fn create_message(&self, request: &MessageRequest) -> GruntyResult<AssistantResponse>;
}
