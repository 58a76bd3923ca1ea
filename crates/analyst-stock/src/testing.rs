//! Test doubles for the provider seam

use analyst_llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Chat model that answers from a script
pub struct ScriptedModel {
    script: Mutex<VecDeque<CompletionResponse>>,
    pub seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        self.seen.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::UnexpectedResponse("no scripted answer left".into()))
    }

    fn name(&self) -> &str {
        "scripted-model"
    }
}

pub fn says(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

pub fn calls(tool: &str, input: Value) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant_blocks(vec![ContentBlock::ToolUse {
            id: format!("call_{tool}"),
            name: tool.to_string(),
            input,
        }]),
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage::default(),
    }
}
