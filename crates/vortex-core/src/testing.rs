//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::api::{response, ApiError, ApiRequest, Backend};
use crate::models::{Role, Session};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory path under the system temp dir. Not created.
pub fn scratch_dir(label: &str) -> PathBuf {
    let n = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("vortex-test-{}-{}-{}", label, std::process::id(), n))
}

/// The employee session from a successful `alice` login.
pub fn alice_session() -> Session {
    Session {
        access_token: "T1".to_string(),
        refresh_token: Some("R1".to_string()),
        username: "alice".to_string(),
        name: "Alice".to_string(),
        role: Role::Employee,
        employee_id: Some("E42".to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: ApiRequest,
    pub token: Option<String>,
}

/// Backend that replays queued responses in order and records every call.
///
/// An empty queue answers like an unreachable server.
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.push(Ok(value));
    }

    /// Queue a JSON response with the given status, interpreted the same
    /// way the HTTP client interprets real responses.
    pub fn push_status(&self, status: u16, body: Value) {
        self.push(response::interpret(status, true, &body.to_string()));
    }

    pub fn push_err(&self, err: ApiError) {
        self.push(Err(err));
    }

    fn push(&self, result: Result<Value, ApiError>) {
        self.responses.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Backend for ScriptedBackend {
    async fn send(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            token: access_token.map(str::to_string),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::InvalidResponse("no scripted response".to_string())))
    }
}
