//! Scripted in-memory gateway for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::error::TransportError;
use crate::http::{HttpGateway, HttpMethod, RawResponse, TransportParams};

/// One call the client made through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Service { endpoint: String, params: TransportParams },
    Api { method: HttpMethod, path: String, body: Option<Value> },
    Raw { endpoint: String, params: TransportParams },
    Download { url: String, path: PathBuf },
    Write { path: PathBuf, bytes: Vec<u8> },
}

/// Replies are consumed in order, one per JSON or raw call. Downloads and
/// writes always succeed unless `fail_downloads` is set.
#[derive(Default)]
pub(crate) struct FakeGateway {
    replies: RefCell<VecDeque<Result<Value, TransportError>>>,
    raw_replies: RefCell<VecDeque<Result<RawResponse, TransportError>>>,
    calls: RefCell<Vec<Call>>,
    fail_downloads: bool,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, json: Value) -> Self {
        self.replies.borrow_mut().push_back(Ok(json));
        self
    }

    pub(crate) fn fail(self, error: TransportError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    pub(crate) fn failing_downloads(mut self) -> Self {
        self.fail_downloads = true;
        self
    }

    pub(crate) fn reply_raw(self, body: &[u8]) -> Self {
        self.raw_replies.borrow_mut().push_back(Ok(RawResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_vec(),
        }));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Params of the `n`th call, which must be a service call.
    pub(crate) fn service_params(&self, n: usize) -> (String, TransportParams) {
        match &self.calls.borrow()[n] {
            Call::Service { endpoint, params } | Call::Raw { endpoint, params } => {
                (endpoint.clone(), params.clone())
            }
            other => panic!("call {n} is not a service call: {other:?}"),
        }
    }

    fn next_reply(&self) -> Result<Value, TransportError> {
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted reply")))
    }
}

impl HttpGateway for FakeGateway {
    fn service_request(&self, endpoint: &str, params: &TransportParams) -> Result<Value, TransportError> {
        self.calls.borrow_mut().push(Call::Service {
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });
        self.next_reply()
    }

    fn api_request(&self, method: HttpMethod, path: &str, body: Option<&Value>) -> Result<Value, TransportError> {
        self.calls.borrow_mut().push(Call::Api {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        self.next_reply()
    }

    fn raw_service_request(&self, endpoint: &str, params: &TransportParams) -> Result<RawResponse, TransportError> {
        self.calls.borrow_mut().push(Call::Raw {
            endpoint: endpoint.to_string(),
            params: params.clone(),
        });
        self.raw_replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted raw reply")))
    }

    fn download_file_to_path(&self, url: &str, path: &Path) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(Call::Download {
            url: url.to_string(),
            path: path.to_path_buf(),
        });
        if self.fail_downloads {
            return Err(TransportError::with_code(404, "file not found"));
        }
        Ok(())
    }

    fn write_response_body_to_path(&self, response: &RawResponse, path: &Path) -> Result<(), TransportError> {
        self.calls.borrow_mut().push(Call::Write {
            path: path.to_path_buf(),
            bytes: response.body.clone(),
        });
        Ok(())
    }
}

/// Records the level of every event emitted while installed.
struct LevelRecorder(Arc<Mutex<Vec<Level>>>);

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Ok(mut levels) = self.0.lock() {
            levels.push(*event.metadata().level());
        }
    }
}

/// Run `f` under a subscriber that captures event levels.
pub(crate) fn capture_levels<T>(f: impl FnOnce() -> T) -> (T, Vec<Level>) {
    let levels = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(LevelRecorder(Arc::clone(&levels)));
    let out = tracing::subscriber::with_default(subscriber, f);
    let captured = levels.lock().map(|l| l.clone()).unwrap_or_default();
    (out, captured)
}
