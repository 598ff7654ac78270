//! Shared test doubles for the behaviour tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use civicdash_core::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, OpenDataConfig};
use tracing::subscriber::DefaultGuard;

pub const TEST_TOKEN: &str = "test-token";

pub fn test_config() -> OpenDataConfig {
    OpenDataConfig::default().with_app_token(TEST_TOKEN)
}

type ScriptedResult = Result<HttpResponse, HttpError>;

/// Replays canned responses keyed by request URL and records every request.
///
/// Responses registered with [`ScriptedHttpClient::respond_to_query`] win over
/// plain URL responses when the request's `$query` contains their fragment.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<HashMap<String, ScriptedResult>>,
    query_responses: Mutex<Vec<(String, String, ScriptedResult)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, response: HttpResponse) -> Self {
        self.responses
            .lock()
            .expect("response store should not be poisoned")
            .insert(url.to_owned(), Ok(response));
        self
    }

    pub fn respond_to_query(self, url: &str, fragment: &str, response: HttpResponse) -> Self {
        self.query_responses
            .lock()
            .expect("response store should not be poisoned")
            .push((url.to_owned(), fragment.to_owned(), Ok(response)));
        self
    }

    pub fn fail(self, url: &str, error: HttpError) -> Self {
        self.responses
            .lock()
            .expect("response store should not be poisoned")
            .insert(url.to_owned(), Err(error));
        self
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let by_query = self
            .query_responses
            .lock()
            .expect("response store should not be poisoned")
            .iter()
            .find(|(url, fragment, _)| {
                *url == request.url
                    && request
                        .query
                        .iter()
                        .any(|(name, value)| name == "$query" && value.contains(fragment.as_str()))
            })
            .map(|(_, _, response)| response.clone());
        let by_url = || {
            self.responses
                .lock()
                .expect("response store should not be poisoned")
                .get(&request.url)
                .cloned()
        };
        let response = by_query
            .or_else(by_url)
            .unwrap_or_else(|| {
                Err(HttpError::new(
                    HttpErrorKind::Connect,
                    format!("no scripted response for {}", request.url),
                ))
            });
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        Box::pin(async move { response })
    }
}

pub fn shared(client: ScriptedHttpClient) -> Arc<ScriptedHttpClient> {
    Arc::new(client)
}

/// A JSON array body of `count` empty records.
pub fn empty_records(count: usize) -> String {
    let mut body = String::with_capacity(count * 3 + 2);
    body.push('[');
    for index in 0..count {
        if index > 0 {
            body.push(',');
        }
        body.push_str("{}");
    }
    body.push(']');
    body
}

/// In-memory sink for log output produced while the guard is alive.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer should not be poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer should not be poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
