//! Scripted completion service for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ClassifyError;
use crate::prompt::batch_in_prompt;
use crate::service::CompletionService;

type Responder = Box<dyn Fn(&[String]) -> String + Send + Sync>;

/// Answers each prompt with a reply computed from the batch it carries, and
/// records every batch it was asked about.
pub struct ScriptedService {
    responder: Responder,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedService {
    pub fn new(responder: impl Fn(&[String]) -> String + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always send back the same reply.
    pub fn always(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| reply.clone())
    }

    /// Send back `replies` in order, one per call, then keep repeating the last.
    pub fn sequence(replies: Vec<&str>) -> Self {
        let replies: Vec<String> = replies.into_iter().map(String::from).collect();
        let next = Mutex::new(0usize);
        Self::new(move |_| {
            let mut i = next.lock().unwrap();
            let reply = replies[(*i).min(replies.len() - 1)].clone();
            *i += 1;
            reply
        })
    }

    /// Well-formed reply marking texts containing `needle` as environmental.
    pub fn keyword(needle: &'static str) -> Self {
        Self::new(move |batch| {
            let items: Vec<serde_json::Value> = batch
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "result": t.contains(needle),
                        "explanation": format!("mentions {needle}: {}", t.contains(needle)),
                        "stub": t.chars().take(10).collect::<String>(),
                    })
                })
                .collect();
            serde_json::Value::Array(items).to_string()
        })
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        let batch = batch_in_prompt(prompt);
        let reply = (self.responder)(&batch);
        self.calls.lock().unwrap().push(batch);
        Ok(reply)
    }
}
