//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use speech_studio::backend::{Backend, QueryRequest};
use speech_studio::messages::ChatSession;
use speech_studio::{Result, StudioError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

/// Answers every query with `echo <query>`, remembering what it was sent
#[derive(Default)]
pub struct EchoBackend {
    pub requests: Mutex<Vec<QueryRequest>>,
}

#[async_trait]
impl Backend for EchoBackend {
    async fn query(&self, request: &QueryRequest) -> Result<Value> {
        self.requests.lock().push(request.clone());
        Ok(json!({ "result": { "response": format!("echo {}", request.query) } }))
    }
}

/// Fails every query
pub struct DownBackend;

#[async_trait]
impl Backend for DownBackend {
    async fn query(&self, _request: &QueryRequest) -> Result<Value> {
        Err(StudioError::BackendError("connection refused".into()))
    }
}

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

pub fn session(backend: Arc<dyn Backend>, runtime: &Runtime) -> ChatSession {
    ChatSession::new(backend, runtime.handle().clone())
}

/// Poll `done` until it holds or two seconds pass
pub fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}
