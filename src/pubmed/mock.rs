//! Scripted transport for testing the search pipeline without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Endpoint, Params, SearchError, Transport};

type Handler = Box<dyn Fn(&Params) -> Result<String, SearchError> + Send + Sync>;

/// One recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub endpoint: Endpoint,
    pub params: Params,
}

impl MockCall {
    /// Value of the first parameter named `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A transport that answers each endpoint with a configured handler and
/// records every call.
#[derive(Default)]
pub struct MockTransport {
    handlers: Mutex<HashMap<Endpoint, Handler>>,
    calls: Mutex<Vec<MockCall>>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `endpoint` with the result of `handler`
    pub fn on<F>(&self, endpoint: Endpoint, handler: F)
    where
        F: Fn(&Params) -> Result<String, SearchError> + Send + Sync + 'static,
    {
        let mut guard = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(endpoint, Box::new(handler));
    }

    /// Answer `endpoint` with a fixed body
    pub fn respond(&self, endpoint: Endpoint, body: impl Into<String>) {
        let body = body.into();
        self.on(endpoint, move |_| Ok(body.clone()));
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Calls made to one endpoint, in order
    pub fn calls_to(&self, endpoint: Endpoint) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, endpoint: Endpoint, params: Params) -> Result<String, SearchError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(MockCall {
                endpoint,
                params: params.clone(),
            });

        let guard = self.handlers.lock().unwrap_or_else(|e| e.into_inner());
        match guard.get(&endpoint) {
            Some(handler) => handler(&params),
            None => Err(SearchError::Transport {
                endpoint,
                message: "no mock response configured".to_string(),
            }),
        }
    }
}
