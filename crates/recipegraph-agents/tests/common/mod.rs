#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use recipegraph_ai::{GenerationConfig, LLMProvider, LLMResponse, LLMResult, Message};
use recipegraph_parser::RuleBasedAnalyzer;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const RECIPE: &str = "Preheat the oven to 350F. In a large bowl, whisk the flour and sugar. \
Pour the batter into a pan. Bake for 30 minutes.";

pub enum Reply {
    Text(String),
    Fail(String),
    /// Built from the conversation so far
    With(Box<dyn Fn(&[Message]) -> String + Send + Sync>),
}

/// In-memory provider that replays scripted replies in order.
pub struct ScriptedProvider {
    model: String,
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Self::with_model("scripted-model", replies)
    }

    pub fn with_model(model: &str, replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            model: model.to_string(),
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Reply::Text(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn conversations(&self) -> Vec<Vec<Message>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(messages.to_vec());

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail("script exhausted".to_string()));
        match reply {
            Reply::Text(content) => Ok(LLMResponse {
                content,
                total_tokens: Some(10),
                finish_reason: Some("stop".to_string()),
                model: self.model.clone(),
            }),
            Reply::Fail(message) => Err(anyhow::anyhow!(message)),
            Reply::With(build) => Ok(LLMResponse {
                content: build(messages),
                total_tokens: None,
                finish_reason: Some("stop".to_string()),
                model: self.model.clone(),
            }),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

pub fn analyzer() -> Arc<RuleBasedAnalyzer> {
    Arc::new(RuleBasedAnalyzer::started().unwrap())
}

pub fn extraction_reply() -> String {
    r#"Sure! Here is the recipe:
```json
{
  "ingredients": [
    {"name": "flour", "amount": 2, "unit": "cups", "modifiers": ["all-purpose"]},
    {"name": "sugar", "amount": "1/2", "unit": "cup", "modifiers": null}
  ],
  "equipment": [
    {"name": "oven", "required": true},
    {"name": "bowl", "modifiers": "large"},
    {"name": "pan"}
  ],
  "basic_actions": [
    {"verb": "preheat", "sentence": "Preheat the oven to 350F.", "sentence_index": 0},
    {"verb": "whisk", "sentence": "In a large bowl, whisk the flour and sugar.", "sentence_index": 1},
    {"verb": "bake", "sentence": "Bake for 30 minutes.", "sentence_index": 3}
  ]
}
```"#
        .to_string()
}

pub fn tool_call(tool: &str, parameters: serde_json::Value) -> String {
    serde_json::json!({
        "reasoning": format!("calling {tool}"),
        "tool_call": {"tool_name": tool, "parameters": parameters},
        "is_final": false
    })
    .to_string()
}

pub fn final_answer(answer: serde_json::Value) -> String {
    serde_json::json!({
        "reasoning": "done",
        "tool_call": null,
        "is_final": true,
        "final_answer": answer
    })
    .to_string()
}

/// `name -> id` for one catalog section of the linking task.
pub fn catalog_from_task(task: &str, header: &str) -> HashMap<String, String> {
    let start = task.find(header).expect("catalog header") + header.len();
    let rest = &task[start..];
    let end = rest.find("\n\n").unwrap_or(rest.len());
    let entries: Vec<serde_json::Value> = serde_json::from_str(rest[..end].trim()).unwrap();
    entries
        .iter()
        .map(|e| {
            (
                e["name"].as_str().unwrap().to_string(),
                e["id"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}
