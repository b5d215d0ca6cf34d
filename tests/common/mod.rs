//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use licat::{CatalogClient, Licat, LicatBuilder, Result, Transport, TransportResponse};

pub const BASE: &str = "https://catalog.test/api/";
pub const LICENSES_URL: &str = "https://catalog.test/api/licenses";

/// A canned reply: status plus body chunks.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub chunks: Vec<Vec<u8>>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            chunks: vec![body.into().into_bytes()],
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            chunks: vec![b"error".to_vec()],
        }
    }

    pub fn chunks(chunks: &[&str]) -> Self {
        Self {
            status: 200,
            chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
        }
    }
}

/// In-memory transport with per-URL replies and call probes.
///
/// Each URL may have a queue of replies; the last one repeats. Unknown URLs
/// answer 404. `in_flight_max` records the highest number of concurrent
/// requests observed, with `delay` held inside every request.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<String>>,
    headers: Mutex<Vec<HeaderMap>>,
    in_flight: AtomicUsize,
    in_flight_max: AtomicUsize,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn route(self, url: &str, reply: Reply) -> Self {
        self.push(url, reply);
        self
    }

    pub fn push(&self, url: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn headers_seen(&self) -> Vec<HeaderMap> {
        self.headers.lock().unwrap().clone()
    }

    pub fn in_flight_max(&self) -> usize {
        self.in_flight_max.load(Ordering::SeqCst)
    }

    fn reply_for(&self, url: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue[0].clone(),
            None => Reply::status(404),
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<TransportResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        self.headers.lock().unwrap().push(headers.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.in_flight_max.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self.reply_for(url);
        Ok(TransportResponse::from_chunks(reply.status, reply.chunks))
    }
}

/// Detail page URL for a license id.
pub fn html_url(id: &str) -> String {
    format!("https://catalog.test/license/{id}/")
}

/// Wire JSON for one license record.
pub fn license_json(id: &str, name: &str, spdx: Option<&str>) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": id,
        "name": name,
        "approved": true,
        "stewards": [],
        "keywords": ["popular-strong-community"],
        "_links": {
            "self": {"href": format!("https://catalog.test/api/license/{id}")},
            "html": {"href": html_url(id)},
            "collection": {"href": LICENSES_URL}
        }
    });
    if let Some(spdx) = spdx {
        value["spdx_id"] = serde_json::json!(spdx);
    }
    value
}

/// Serialize records as a JSON array body.
pub fn array(records: &[serde_json::Value]) -> String {
    serde_json::Value::Array(records.to_vec()).to_string()
}

/// Detail page whose content element holds `text`.
pub fn page(text: &str) -> String {
    format!(
        "<html><body><nav>menu</nav><div class=\"license-content\">{text}</div></body></html>"
    )
}

/// Builder pointed at the stub catalog.
pub fn builder(transport: Arc<StubTransport>) -> LicatBuilder {
    Licat::builder().base_url(BASE).transport(transport)
}

pub fn client(transport: Arc<StubTransport>) -> CatalogClient {
    builder(transport).build().unwrap()
}

/// Stub serving `records` at the listing plus a page per record.
pub fn catalog(records: &[(&str, &str, Option<&str>)]) -> StubTransport {
    let body = array(
        &records
            .iter()
            .map(|(id, name, spdx)| license_json(id, name, *spdx))
            .collect::<Vec<_>>(),
    );
    let stub = StubTransport::new().route(LICENSES_URL, Reply::ok(body));
    for (id, _, _) in records {
        stub.push(&html_url(id), Reply::ok(page(&format!("{id} text"))));
    }
    stub
}
