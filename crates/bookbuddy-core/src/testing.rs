//! In-memory transport and navigator for exercising client flows.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::{MemoryTokenStore, SessionManager, SessionState};
use crate::books::BookService;
use crate::navigation::Navigator;

pub(crate) const TEST_API_BASE: &str = "http://api.test";

type Responder = Box<dyn Fn(&ApiRequest) -> (StatusCode, String) + Send + Sync>;

/// Replies from a queue of canned responses, or from a responder function
/// once the queue is empty. Records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    queue: Mutex<VecDeque<Result<ApiResponse, String>>>,
    responder: Mutex<Option<Responder>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn push(&self, status: StatusCode, body: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Ok(ApiResponse::new(status, body)));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.queue.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub(crate) fn respond_with(
        &self,
        responder: impl Fn(&ApiRequest) -> (StatusCode, String) + Send + Sync + 'static,
    ) {
        *self.responder.lock().unwrap() = Some(Box::new(responder));
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        // Let concurrently running requests interleave
        tokio::task::yield_now().await;

        let queued = self.queue.lock().unwrap().pop_front();
        match queued {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(ApiError::Transport(message)),
            None => match self.responder.lock().unwrap().as_ref() {
                Some(responder) => {
                    let (status, body) = responder(request);
                    Ok(ApiResponse::new(status, body))
                }
                None => Err(ApiError::Transport(format!(
                    "no scripted response for {} {}",
                    request.method, request.path
                ))),
            },
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    locations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub(crate) fn locations(&self) -> Vec<String> {
        self.locations.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, location: &str) {
        self.locations.lock().unwrap().push(location.to_string());
    }
}

/// A fully wired client over the scripted transport.
pub(crate) struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub api: Arc<ApiClient>,
    pub session: SessionManager,
    pub books: BookService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_store(Arc::new(MemoryTokenStore::new()))
    }

    pub(crate) fn with_store(tokens: Arc<MemoryTokenStore>) -> Self {
        let transport = Arc::new(ScriptedTransport::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let api = Arc::new(ApiClient::new(
            transport.clone(),
            tokens.clone(),
            navigator.clone(),
            Arc::new(SessionState::new()),
        ));
        Self {
            session: SessionManager::new(api.clone(), TEST_API_BASE),
            books: BookService::new(api.clone()),
            transport,
            tokens,
            navigator,
            api,
        }
    }
}
