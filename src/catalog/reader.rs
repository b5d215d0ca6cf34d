//! Remote catalog reader.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{Stream, StreamExt, stream};
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use super::decode::JsonArrayDecoder;
use crate::telemetry;
use crate::transport::{BodyStream, Transport, TransportResponse};
use crate::types::{FilterParam, License};
use crate::{LicatError, Result};

/// Stream of decoded records from the bulk listing.
///
/// Yields `Err` at most once, as the final item, when the transport fails
/// mid-body or the array is structurally broken.
pub type LicenseStream = Pin<Box<dyn Stream<Item = Result<License>> + Send>>;

/// Translates catalog requests into decoded, unenriched records.
///
/// Bulk listings can be read two ways: [`stream_all()`](Self::stream_all)
/// decodes records as the body arrives and skips individually malformed
/// ones, while [`fetch_all()`](Self::fetch_all) decodes the whole body as one
/// array and fails on any malformed record.
pub struct CatalogReader {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    licenses_url: String,
}

impl CatalogReader {
    /// Create a reader for `<base_url>/<licenses_path>`.
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: &str,
        licenses_path: &str,
        headers: HeaderMap,
    ) -> Result<Self> {
        let licenses_url = join_url(base_url, licenses_path)?;
        Ok(Self {
            transport,
            headers,
            licenses_url,
        })
    }

    /// Bulk listing URL.
    pub fn licenses_url(&self) -> &str {
        &self.licenses_url
    }

    /// Filtered listing URL, e.g. `…/licenses?spdx=gpl*`.
    pub fn filtered_url(&self, param: FilterParam, value: &str) -> String {
        format!(
            "{}?{}={}",
            self.licenses_url,
            param.as_str(),
            param.encode_value(value)
        )
    }

    /// Stream the bulk listing, decoding each record as soon as it is complete.
    pub async fn stream_all(&self) -> Result<LicenseStream> {
        let response = self.send(&self.licenses_url, "catalog").await?;
        let state = StreamState {
            body: response.into_body(),
            decoder: JsonArrayDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        };
        Ok(Box::pin(stream::unfold(state, next_record)))
    }

    /// Fetch the bulk listing and decode it as a single array.
    pub async fn fetch_all(&self) -> Result<Vec<License>> {
        self.fetch_array(&self.licenses_url, "catalog").await
    }

    /// Fetch the listing filtered server-side by one parameter.
    pub async fn fetch_filtered(&self, param: FilterParam, value: &str) -> Result<Vec<License>> {
        let url = self.filtered_url(param, value);
        self.fetch_array(&url, "filtered").await
    }

    async fn fetch_array(&self, url: &str, endpoint: &'static str) -> Result<Vec<License>> {
        let body = self.send(url, endpoint).await?.bytes().await?;
        let licenses: Vec<License> = serde_json::from_slice(&body)
            .map_err(|e| LicatError::Decode(format!("{url}: {e}")))?;
        debug!(url, count = licenses.len(), "decoded license array");
        Ok(licenses)
    }

    async fn send(&self, url: &str, endpoint: &'static str) -> Result<TransportResponse> {
        let start = Instant::now();
        let result = match self.transport.get(url, &self.headers).await {
            Ok(response) => response.error_for_status(),
            Err(e) => Err(e),
        };
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "endpoint" => endpoint)
            .record(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => endpoint, "status" => status)
            .increment(1);
        result
    }
}

struct StreamState {
    body: BodyStream,
    decoder: JsonArrayDecoder,
    pending: VecDeque<Vec<u8>>,
    done: bool,
}

async fn next_record(mut st: StreamState) -> Option<(Result<License>, StreamState)> {
    loop {
        if let Some(element) = st.pending.pop_front() {
            match serde_json::from_slice::<License>(&element) {
                Ok(license) => return Some((Ok(license), st)),
                Err(e) => {
                    warn!(error = %e, "skipping malformed license record");
                    continue;
                }
            }
        }
        if st.done {
            return None;
        }
        match st.body.next().await {
            Some(Ok(chunk)) => match st.decoder.feed(&chunk) {
                Ok(elements) => st.pending.extend(elements),
                Err(e) => {
                    st.done = true;
                    return Some((Err(e), st));
                }
            },
            Some(Err(e)) => {
                st.done = true;
                return Some((Err(e), st));
            }
            None => {
                st.done = true;
                if let Err(e) = st.decoder.finish() {
                    return Some((Err(e), st));
                }
            }
        }
    }
}

fn join_url(base_url: &str, path: &str) -> Result<String> {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_matches('/');
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };
    reqwest::Url::parse(&joined)
        .map_err(|e| LicatError::Configuration(format!("invalid base url {base_url:?}: {e}")))?;
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned chunks and records requested URLs.
    struct Canned {
        status: u16,
        chunks: Vec<Vec<u8>>,
        urls: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(status: u16, chunks: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                status,
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                urls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn get(&self, url: &str, _headers: &HeaderMap) -> Result<TransportResponse> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(TransportResponse::from_chunks(
                self.status,
                self.chunks.clone(),
            ))
        }
    }

    fn reader(transport: Arc<Canned>) -> CatalogReader {
        CatalogReader::new(
            transport,
            "https://example.test/api/",
            "licenses",
            HeaderMap::new(),
        )
        .unwrap()
    }

    #[test]
    fn urls_are_joined_and_filtered() {
        let reader = reader(Canned::new(200, &[]));
        assert_eq!(reader.licenses_url(), "https://example.test/api/licenses");
        assert_eq!(
            reader.filtered_url(FilterParam::SpdxPattern, "gpl*"),
            "https://example.test/api/licenses?spdx=gpl*"
        );
        assert_eq!(
            reader.filtered_url(FilterParam::Steward, "Free Software Foundation"),
            "https://example.test/api/licenses?steward=Free%20Software%20Foundation"
        );
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        let result = CatalogReader::new(
            Canned::new(200, &[]),
            "not a url",
            "licenses",
            HeaderMap::new(),
        );
        assert!(matches!(result, Err(LicatError::Configuration(_))));
    }

    #[tokio::test]
    async fn stream_skips_malformed_records() {
        let transport = Canned::new(
            200,
            &[
                r#"[{"id":"mit","name":"MIT License"},"#,
                r#"{"id":"","name":"Broken"},{"id":"apache","name":"Apache"}]"#,
            ],
        );
        let stream = reader(transport).stream_all().await.unwrap();
        let ids: Vec<String> = stream.map(|r| r.unwrap().id).collect().await;
        assert_eq!(ids, vec!["mit", "apache"]);
    }

    #[tokio::test]
    async fn truncated_stream_ends_with_error() {
        let transport = Canned::new(200, &[r#"[{"id":"mit","name":"MIT"},{"id":"#]);
        let items: Vec<Result<License>> = reader(transport)
            .stream_all()
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(LicatError::Decode(_))));
    }

    #[tokio::test]
    async fn array_fetch_is_strict() {
        let transport = Canned::new(
            200,
            &[r#"[{"id":"mit","name":"MIT"},{"id":"x","approval_date":"2024-01-01"}]"#],
        );
        let err = reader(transport).fetch_all().await.unwrap_err();
        assert!(matches!(err, LicatError::Decode(_)));
    }

    #[tokio::test]
    async fn server_error_fails_the_request() {
        let transport = Canned::new(500, &["oops"]);
        let err = reader(transport).fetch_all().await.unwrap_err();
        assert!(matches!(err, LicatError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn filtered_fetch_hits_filtered_url() {
        let transport = Canned::new(200, &[r#"[{"id":"gpl-2.0","name":"GPL","spdx_id":"GPL-2.0"}]"#]);
        let licenses = reader(transport.clone())
            .fetch_filtered(FilterParam::SpdxPattern, "gpl*")
            .await
            .unwrap();
        assert_eq!(licenses.len(), 1);
        assert_eq!(
            transport.urls.lock().unwrap().as_slice(),
            ["https://example.test/api/licenses?spdx=gpl*"]
        );
    }
}
