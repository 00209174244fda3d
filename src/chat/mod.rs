// src/chat/mod.rs
// Conversational driver: one language-model turn that may propose function
// calls, a dispatch round, then a final grounded answer.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::CONFIG;
use crate::llm::{ChatModel, Message, MessageRequest};
use crate::tools::{FunctionCall, ToolExecutor, context_document};

static FUNCTION_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<function_call>(.*?)</function_call>").unwrap());

/// One turn of the running conversation, kept across queries so the model
/// sees prior exchanges in its context document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Pull every `<function_call>` block out of a model response. Each block
/// parses independently; callers decide what to do with the failures.
pub fn extract_function_calls(text: &str) -> Vec<Result<FunctionCall, serde_json::Error>> {
    FUNCTION_CALL_RE
        .captures_iter(text)
        .map(|cap| serde_json::from_str(cap[1].trim()))
        .collect()
}

pub struct Agent {
    model: Arc<dyn ChatModel>,
    executor: Arc<ToolExecutor>,
    messages: Vec<ChatMessage>,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, executor: Arc<ToolExecutor>) -> Self {
        Self {
            model,
            executor,
            messages: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Run one user query through the model. If the first response proposes
    /// function calls, dispatch them all and ask the model again with the
    /// results; otherwise the first response is the answer.
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        self.messages.push(ChatMessage::user(query));
        let context = context_document(Some(&self.messages));

        let first = self.complete(&build_prompt(query, &context)).await?;

        let calls: Vec<FunctionCall> = extract_function_calls(&first)
            .into_iter()
            .filter_map(|parsed| match parsed {
                Ok(call) => Some(call),
                Err(e) => {
                    debug!(error = %e, "skipping malformed function call block");
                    None
                }
            })
            .collect();

        if calls.is_empty() {
            self.messages.push(ChatMessage::assistant(first.clone()));
            return Ok(first);
        }

        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let envelope = self.executor.call(&call.name, &call.parameters).await;
            results.push(json!({
                "function": call.name,
                "result": envelope,
            }));
        }

        let final_text = self
            .complete(&build_prompt_with_results(query, &context, &results))
            .await?;
        self.messages.push(ChatMessage::assistant(final_text.clone()));
        Ok(final_text)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = MessageRequest {
            model: CONFIG.anthropic_model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: CONFIG.anthropic_max_tokens,
            temperature: None,
            system: None,
        };
        let response = self.model.create_message(request).await?;
        Ok(response.get_text())
    }
}

fn build_prompt(query: &str, context: &Value) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
    format!(
        "You are an AI assistant that helps users access and analyze USGS water data.\n\
         \n\
         CONTEXT:\n\
         {context_json}\n\
         \n\
         INSTRUCTIONS:\n\
         1. If you need to access water data, use the functions defined in the context.\n\
         2. Format function calls as JSON objects inside <function_call></function_call> tags.\n\
         3. Explain to the user what you're doing and provide insights about the data.\n\
         \n\
         USER QUERY:\n\
         {query}\n\
         \n\
         Your response:"
    )
}

fn build_prompt_with_results(query: &str, context: &Value, results: &[Value]) -> String {
    let context_json = serde_json::to_string_pretty(context).unwrap_or_default();
    let results_json =
        serde_json::to_string_pretty(&Value::Array(results.to_vec())).unwrap_or_default();
    format!(
        "You are an AI assistant that helps users access and analyze USGS water data.\n\
         \n\
         CONTEXT:\n\
         {context_json}\n\
         \n\
         FUNCTION CALL RESULTS:\n\
         {results_json}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Based on the function call results, provide a helpful response to the user's query.\n\
         2. Explain the data and provide insights where possible.\n\
         3. If the data shows any interesting patterns or anomalies, point them out.\n\
         4. If there were any errors in the function calls, explain them to the user.\n\
         \n\
         USER QUERY:\n\
         {query}\n\
         \n\
         Your response:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::NwisError;
    use crate::llm::MessageResponse;
    use crate::llm::anthropic::{ContentBlock, Usage};
    use crate::nwis::{ServiceRequest, WaterDataProvider};
    use crate::table::Table;

    /// Replays scripted replies and records every prompt it was sent.
    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn create_message(&self, request: MessageRequest) -> Result<MessageResponse> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("model called more times than scripted");
            Ok(MessageResponse {
                id: "msg_test".to_string(),
                content: vec![ContentBlock::Text { text }],
                model: request.model,
                role: "assistant".to_string(),
                stop_reason: Some("end_turn".to_string()),
                usage: Usage {
                    input_tokens: 0,
                    output_tokens: 0,
                },
            })
        }
    }

    struct StaticProvider {
        calls: Mutex<Vec<ServiceRequest>>,
    }

    impl StaticProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WaterDataProvider for StaticProvider {
        async fn fetch(&self, request: ServiceRequest) -> Result<Table, NwisError> {
            self.calls.lock().unwrap().push(request);
            Ok(Table::new(
                vec!["site_no".to_string()],
                vec![vec![serde_json::json!("09380000")]],
            ))
        }
    }

    fn agent(model: Arc<ScriptedModel>, provider: Arc<StaticProvider>) -> Agent {
        Agent::new(model, Arc::new(ToolExecutor::new(provider)))
    }

    #[tokio::test]
    async fn one_tool_round_then_the_model_answers_from_the_results() {
        let first = "Looking it up.\n\
                     <function_call>this block is broken</function_call>\n\
                     <function_call>{\"name\": \"get_site_data\", \
                     \"parameters\": {\"site_code\": \"09380000\"}}</function_call>";
        let model = ScriptedModel::new(&[first, "That site is Lees Ferry."]);
        let provider = StaticProvider::new();
        let mut agent = agent(model.clone(), provider.clone());

        let answer = agent.process_query("Tell me about site 09380000").await.unwrap();

        assert_eq!(answer, "That site is Lees Ferry.");
        // Malformed block skipped; exactly one dispatch, exactly two model turns.
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("FUNCTION CALL RESULTS"));
        assert!(prompts[1].contains("\"function\": \"get_site_data\""));

        let history = agent.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
        assert_eq!(history[1].content, "That site is Lees Ferry.");
    }

    #[tokio::test]
    async fn plain_answers_skip_the_tool_round_entirely() {
        let model = ScriptedModel::new(&["Water quality varies by site and season."]);
        let provider = StaticProvider::new();
        let mut agent = agent(model.clone(), provider.clone());

        let answer = agent.process_query("What affects water quality?").await.unwrap();

        assert_eq!(answer, "Water quality varies by site and season.");
        assert!(provider.calls.lock().unwrap().is_empty());
        assert_eq!(model.prompts().len(), 1);
        assert_eq!(agent.history().len(), 2);
    }

    #[test]
    fn extracts_a_single_call_with_parameters() {
        let text = "Let me look that up.\n<function_call>\n{\"name\": \"get_site_data\", \
                    \"parameters\": {\"site_code\": \"09380000\"}}\n</function_call>";
        let calls = extract_function_calls(text);
        assert_eq!(calls.len(), 1);
        let call = calls[0].as_ref().unwrap();
        assert_eq!(call.name, "get_site_data");
        assert_eq!(call.parameters["site_code"], "09380000");
    }

    #[test]
    fn extracts_multiline_json_across_the_tag_body() {
        let text = "<function_call>\n{\n  \"name\": \"get_water_use\",\n  \"parameters\": {\n    \
                    \"state\": \"PA\",\n    \"years\": \"2015\"\n  }\n}\n</function_call>";
        let calls = extract_function_calls(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].as_ref().unwrap().name, "get_water_use");
    }

    #[test]
    fn malformed_blocks_surface_as_errors_without_dropping_valid_ones() {
        let text = "<function_call>not json</function_call>\
                    <function_call>{\"name\": \"what_sites\"}</function_call>";
        let calls = extract_function_calls(text);
        assert_eq!(calls.len(), 2);
        assert!(calls[0].is_err());
        let ok = calls[1].as_ref().unwrap();
        assert_eq!(ok.name, "what_sites");
        assert_eq!(ok.parameters, serde_json::json!({}));
    }

    #[test]
    fn plain_text_yields_no_calls() {
        assert!(extract_function_calls("No data needed for this one.").is_empty());
    }
}
