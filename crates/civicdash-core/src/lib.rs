//! # Civicdash Core
//!
//! Extract layer for the civicdash open data pipelines.
//!
//! A declarative query against NYC or NYS Open Data becomes a typed,
//! in-memory [`Table`] plus optional catalog metadata:
//!
//! ```text
//! OpenDataClient::extract
//!   ├─ OpenDataUrls::new          (collection base URL + dataset id)
//!   ├─ OpenDataConfig::app_token  (OPEN_DATA_APP_TOKEN)
//!   ├─ fetch_data                 (X-App-Token, $query, truncation check)
//!   ├─ coerce_rows                (X-SODA2-Fields / X-Soda2-Types hints)
//!   └─ fetch_metadata             (optional, unauthenticated)
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Data and metadata fetchers, extract facade |
//! | [`coerce`] | Type-hint driven column coercion |
//! | [`collection`] | Catalog selector and URL builder |
//! | [`config`] | Configuration and app token lookup |
//! | [`error`] | Error types |
//! | [`extract`] | Extract request and result shapes |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`table`] | Columnar table |
//! | [`timestamp`] | Timestamp parsing and UTC instants |
//! | [`transform`] | Reporting-period helpers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use civicdash_core::{Collection, ExtractRequest, OpenDataClient, OpenDataConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenDataClient::new(OpenDataConfig::load());
//!     let request = ExtractRequest::new("wgsj-jt5f")
//!         .with_collection(Collection::State)
//!         .with_query("SELECT * LIMIT 5")
//!         .with_metadata(true);
//!
//!     let result = client.extract(&request).await?;
//!     println!("{} rows", result.row_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Failures are never retried. A missing token is an
//! [`ExtractErrorKind::Configuration`] error raised before any request; a
//! non-success status or transport failure is
//! [`ExtractErrorKind::DataFetch`], logged with the status and any JSON error
//! body before it is returned. Missing type hints and unparsable cells are not
//! errors.

pub mod client;
pub mod coerce;
pub mod collection;
pub mod config;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod table;
pub mod timestamp;
pub mod transform;

pub use client::{hits_row_cap, DataResponse, OpenDataClient, DEFAULT_ROW_CAP, MAX_ROW_CAP};
pub use coerce::{coerce_rows, ColumnType, TypeHints};
pub use collection::{Collection, OpenDataUrls};
pub use config::OpenDataConfig;
pub use error::{ConfigError, ExtractError, ExtractErrorKind, TransformError, ValidationError};
pub use extract::{Dataset, DatasetMetadata, ExtractRequest, ExtractResult, DEFAULT_QUERY};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    ResponseHeaders,
};
pub use table::{Cell, Column, ColumnKind, RawRecord, RawRows, Table};
pub use timestamp::UtcDateTime;
pub use transform::{last_complete_period_end, PeriodFrequency};
