//! Scripted transport for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::http::{FetchError, HttpResponse, Transport};

/// Serves canned responses keyed by full request URL and records every call.
#[derive(Default)]
pub struct FakeTransport {
    responses: HashMap<String, (u16, Vec<u8>)>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: Value) -> Self {
        self.responses
            .insert(url.to_string(), (200, body.to_string().into_bytes()));
        self
    }

    pub fn respond_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), (status, b"error".to_vec()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.get(url.as_str()) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: b"not scripted".to_vec(),
            }),
        }
    }
}
