//! Shared fixtures for unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::net::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::net::types::{Role, User};
use crate::util::navigation::{NavigationIntent, Navigator};

pub fn user(id: i64, role: Role) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        first_name: String::new(),
        last_name: String::new(),
        role,
        date_joined: None,
    }
}

pub fn json_response(status: u16, body: &serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

/// Records every intent instead of navigating.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    intents: RefCell<Vec<NavigationIntent>>,
}

impl RecordingNavigator {
    pub fn intents(&self) -> Vec<NavigationIntent> {
        self.intents.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, intent: &NavigationIntent) {
        self.intents.borrow_mut().push(*intent);
    }
}

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError>>;

/// Transport answering from a closure after yielding once to the executor,
/// so concurrently issued requests genuinely interleave.
pub struct ScriptedTransport {
    handler: Handler,
    calls: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + 'static) -> Rc<Self> {
        Rc::new(Self { handler: Box::new(handler), calls: RefCell::new(Vec::new()) })
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls.borrow().iter().filter(|r| r.method == method && r.path == path).count()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.borrow_mut().push(request.clone());
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}
