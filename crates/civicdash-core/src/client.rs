//! Open data client: data and metadata fetchers plus the extract facade.
//!
//! Every call builds its own URLs and request; the client holds no state
//! besides the transport and the immutable configuration, so a single
//! instance can be shared across concurrent extracts.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::coerce::coerce_rows;
use crate::extract::{DatasetMetadata, ExtractRequest, ExtractResult};
use crate::http_client::{
    HttpAuth, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient, ResponseHeaders,
};
use crate::table::RawRows;
use crate::{Collection, ExtractError, OpenDataConfig, OpenDataUrls};

/// Provider default page size for queries without a `LIMIT`.
pub const DEFAULT_ROW_CAP: usize = 1_000;
/// Provider hard maximum rows per query.
pub const MAX_ROW_CAP: usize = 1_000_000;

/// A row count equal to either provider cap may mean the result was cut off.
pub const fn hits_row_cap(row_count: usize) -> bool {
    row_count == DEFAULT_ROW_CAP || row_count == MAX_ROW_CAP
}

/// Raw rows plus the response headers that carry the type hints.
#[derive(Debug, Clone, PartialEq)]
pub struct DataResponse {
    pub rows: RawRows,
    pub headers: ResponseHeaders,
}

impl DataResponse {
    pub fn possibly_truncated(&self) -> bool {
        hits_row_cap(self.rows.len())
    }
}

#[derive(Clone)]
pub struct OpenDataClient {
    http_client: Arc<dyn HttpClient>,
    config: OpenDataConfig,
}

impl OpenDataClient {
    pub fn new(config: OpenDataConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: OpenDataConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Runs `query` against the dataset's row endpoint.
    pub async fn fetch_data(
        &self,
        dataset_id: &str,
        collection: Collection,
        query: &str,
    ) -> Result<DataResponse, ExtractError> {
        let urls = OpenDataUrls::new(dataset_id, collection);
        let token = self.config.app_token()?;

        let request = HttpRequest::get(&urls.data_url)
            .with_auth(&HttpAuth::app_token(token))
            .with_query_param("$query", query)
            .with_timeout(self.config.data_timeout());

        let response = self.send(request).await?;
        let rows: RawRows =
            serde_json::from_str(&response.body).map_err(|e| ExtractError::Decode {
                url: urls.data_url.clone(),
                message: format!("expected a JSON array of records: {e}"),
            })?;

        if hits_row_cap(rows.len()) {
            warn!(
                dataset = dataset_id,
                rows = rows.len(),
                "data was truncated at {} rows; increase LIMIT in query to get full data",
                rows.len()
            );
        } else {
            info!(dataset = dataset_id, rows = rows.len(), "received {} rows", rows.len());
        }

        Ok(DataResponse {
            rows,
            headers: response.headers,
        })
    }

    /// Fetches the dataset's catalog metadata. No token is sent.
    pub async fn fetch_metadata(
        &self,
        dataset_id: &str,
        collection: Collection,
    ) -> Result<DatasetMetadata, ExtractError> {
        let urls = OpenDataUrls::new(dataset_id, collection);
        let request =
            HttpRequest::get(&urls.metadata_url).with_timeout(self.config.metadata_timeout());

        let response = self.send(request).await?;
        let value: Value =
            serde_json::from_str(&response.body).map_err(|e| ExtractError::Decode {
                url: urls.metadata_url.clone(),
                message: format!("metadata is not JSON: {e}"),
            })?;

        info!(dataset = dataset_id, "received metadata");
        Ok(DatasetMetadata::new(value))
    }

    /// Fetches data and, when asked, metadata, returning them in the shape the
    /// request's flags select. Errors from either fetch are returned as is.
    pub async fn extract(&self, request: &ExtractRequest) -> Result<ExtractResult, ExtractError> {
        let response = self
            .fetch_data(&request.dataset_id, request.collection, &request.query)
            .await?;

        let result = if request.parse {
            ExtractResult::Table(coerce_rows(&response.rows, Some(&response.headers)))
        } else {
            ExtractResult::Raw(response.rows)
        };

        if !request.include_metadata {
            return Ok(result);
        }

        let metadata = self
            .fetch_metadata(&request.dataset_id, request.collection)
            .await?;
        Ok(result.with_metadata(metadata))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ExtractError> {
        let url = request.url.clone();
        let timeout = request.timeout;

        let response = self.http_client.execute(request).await.map_err(|source| {
            error!(
                url = %url,
                timeout_secs = timeout.as_secs(),
                error = %source,
                "connection error"
            );
            ExtractError::Transport {
                url: url.clone(),
                source,
            }
        })?;

        if !response.is_success() {
            let body = serde_json::from_str::<Value>(&response.body).ok();
            let rendered = body
                .as_ref()
                .map_or_else(|| String::from("null"), serde_json::Value::to_string);
            error!(
                url = %url,
                status = response.status,
                response = %rendered,
                "connection error. status code: {}",
                response.status
            );
            return Err(ExtractError::HttpStatus {
                url,
                status: response.status,
                body,
            });
        }

        Ok(response)
    }
}
