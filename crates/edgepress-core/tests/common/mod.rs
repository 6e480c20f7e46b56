//! In-memory transport scripted per request, shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use edgepress::network::Transport;
use edgepress::{EdgePressError, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Bytes written by every scripted download.
pub const MODEL_BYTES: &[u8] = b"converted-model-bytes";

#[derive(Clone)]
enum Reply {
    Json(Value),
    Status(u16, String),
}

/// A recorded request: `"GET /path"`, `"POST /path"`, `"UPLOAD /path"` or
/// `"DOWNLOAD url"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub line: String,
    pub body: Option<Value>,
}

/// Replies are queued per `"METHOD path"` key. The last reply of a queue
/// is repeated for every further request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    get_delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, method: &str, path: &str, value: Value) -> Self {
        self.push(method, path, Reply::Json(value));
        self
    }

    /// Queue several replies for the same request.
    pub fn replies(self, method: &str, path: &str, values: Vec<Value>) -> Self {
        for value in values {
            self.push(method, path, Reply::Json(value));
        }
        self
    }

    pub fn fail(self, method: &str, path: &str, status: u16, message: &str) -> Self {
        self.push(method, path, Reply::Status(status, message.to_string()));
        self
    }

    /// Every GET takes `delay` before answering.
    pub fn slow_get(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    fn push(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_lines(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.line).collect()
    }

    pub fn count(&self, line: &str) -> usize {
        self.calls().iter().filter(|c| c.line == line).count()
    }

    pub fn body_of(&self, line: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .find(|c| c.line == line)
            .and_then(|c| c.body)
    }

    fn answer(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value> {
        let key = format!("{} {}", method, path);
        self.calls.lock().unwrap().push(Call {
            line: key.clone(),
            body,
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            let queue = replies
                .get_mut(&key)
                .unwrap_or_else(|| panic!("no reply scripted for {}", key));
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        };

        match reply {
            Reply::Json(value) => Ok(value),
            Reply::Status(status, message) if method == "GET" => Err(EdgePressError::Fetch {
                message,
                status_code: Some(status),
            }),
            Reply::Status(status, message) => Err(EdgePressError::Submission {
                message,
                status_code: Some(status),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.answer("GET", path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.answer("POST", path, Some(body.clone()))
    }

    async fn upload(&self, path: &str, _file: &Path, fields: &[(String, String)]) -> Result<Value> {
        let fields: serde_json::Map<String, Value> = fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.answer("UPLOAD", path, Some(Value::Object(fields)))
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        self.calls.lock().unwrap().push(Call {
            line: format!("DOWNLOAD {}", url),
            body: None,
        });
        tokio::fs::write(destination, MODEL_BYTES).await?;
        Ok(MODEL_BYTES.len() as u64)
    }
}
