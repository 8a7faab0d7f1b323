//! OpenAI SSE stream to text fragments.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] to the ordered
//! text fragments of the first choice. Empty fragments (role headers,
//! finish chunks) are skipped.

use std::pin::Pin;

use async_openai::types::chat::ChatCompletionResponseStream;
use futures_util::{Stream, StreamExt};

use adabrain_types::error::AgentError;

/// Ordered content fragments of a streamed reply.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, AgentError>> + Send + 'static>>;

/// Map a chat completion stream to its non-empty content fragments.
pub fn map_chat_stream(stream: ChatCompletionResponseStream) -> FragmentStream {
    Box::pin(async_stream::try_stream! {
        let mut stream = stream;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(|e| AgentError::Stream(e.to_string()))?;

            for choice in chunk.choices {
                if choice.index != 0 {
                    continue;
                }
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        yield text;
                    }
                }
            }
        }
    })
}
