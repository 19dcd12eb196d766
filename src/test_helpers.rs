//! In-memory transport for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use reqwest::Method;
use tokio::sync::Semaphore;

use crate::error::ClientError;
use crate::net::http::{ApiRequest, HttpReply, Transport};

type Scripted = Result<HttpReply, ClientError>;

/// Scripted transport. Each `(method, path)` route replays its queue; the
/// last scripted outcome repeats once the queue is down to one entry.
/// Unrouted requests get a 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every reply waits for a permit released with [`MockTransport::release`].
    pub(crate) fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::default() }
    }

    pub(crate) fn route(&self, method: Method, path: &str, outcome: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(outcome);
    }

    pub(crate) fn reply(&self, method: Method, path: &str, status: u16, body: &str) {
        self.route(method, path, Ok(HttpReply::new(status, body)));
    }

    pub(crate) fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn next_outcome(&self, request: &ApiRequest) -> Scripted {
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&(request.method.clone(), request.path.clone())) else {
            return Ok(HttpReply::new(404, ""));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or_else(|| Ok(HttpReply::new(404, "")))
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<HttpReply, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.next_outcome(&request)
    }
}
