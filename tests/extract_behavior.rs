//! Behavior-driven tests for the extract facade.
//!
//! These tests drive `OpenDataClient::extract` end to end against a scripted
//! transport and check what callers observe: result shape, typed columns,
//! request headers, and the absence of network traffic on configuration
//! errors.

mod common;

use civicdash_core::{
    Cell, Collection, ColumnKind, ExtractErrorKind, ExtractRequest, ExtractResult, HttpResponse,
    OpenDataClient, OpenDataConfig,
};
use common::{shared, test_config, ScriptedHttpClient, TEST_TOKEN};
use serde_json::json;

const CITY_DATA_URL: &str = "https://data.cityofnewyork.us/resource/abcd-1234.json";
const CITY_METADATA_URL: &str = "https://data.cityofnewyork.us/api/views/metadata/v1/abcd-1234";
const STATE_DATA_URL: &str = "https://data.ny.gov/resource/wxyz-9876.json";
const STATE_METADATA_URL: &str = "https://data.ny.gov/api/views/metadata/v1/wxyz-9876";

fn five_row_response() -> HttpResponse {
    HttpResponse::ok_json(
        json!([
            {"borough": "BRONX", "count": "10"},
            {"borough": "BROOKLYN", "count": "20"},
            {"borough": "MANHATTAN", "count": "30"},
            {"borough": "QUEENS", "count": "40"},
            {"borough": "STATEN ISLAND", "count": "50"}
        ])
        .to_string(),
    )
    .with_header("X-SODA2-Fields", r#"["borough","count"]"#)
    .with_header("X-Soda2-Types", r#"["text","number"]"#)
}

fn metadata_response() -> HttpResponse {
    HttpResponse::ok_json(
        json!({
            "id": "abcd-1234",
            "name": "Borough counts",
            "dataUpdatedAt": "2024-05-01T12:00:00.000Z"
        })
        .to_string(),
    )
}

// ============================================================================
// Result shape
// ============================================================================

#[tokio::test]
async fn when_parse_requested_then_numeric_column_is_typed() {
    // Given: a city dataset returning five rows with one number column
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http.clone(), test_config());
    let request = ExtractRequest::new("abcd-1234").with_query("SELECT * LIMIT 5");

    // When: extracting with the default flags
    let result = client.extract(&request).await.expect("extract should succeed");

    // Then: a five-row table comes back with the number column coerced
    let table = result.table().expect("parsed result should be a table");
    assert_eq!(table.row_count(), 5);
    assert_eq!(table.column_names(), vec!["borough", "count"]);

    let counts = table.column("count").expect("count column");
    assert_eq!(counts.kind(), ColumnKind::Number);
    assert_eq!(
        counts.to_f64s(),
        vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)]
    );
    assert_eq!(
        table.column("borough").map(|column| column.kind()),
        Some(ColumnKind::Untyped)
    );
    assert!(result.metadata().is_none());
    assert_eq!(http.recorded_requests().len(), 1);
}

#[tokio::test]
async fn when_parse_disabled_then_records_are_returned_verbatim() {
    // Given: the same five-row response
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http, test_config());
    let request = ExtractRequest::new("abcd-1234")
        .with_query("SELECT * LIMIT 5")
        .with_parse(false);

    // When: extracting without parsing
    let result = client.extract(&request).await.expect("extract should succeed");

    // Then: raw records keep the provider's string values
    let rows = result.raw().expect("unparsed result should be raw rows");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].get("count"), Some(&json!("10")));
    assert!(matches!(result, ExtractResult::Raw(_)));
}

#[tokio::test]
async fn when_metadata_requested_then_result_pairs_table_and_metadata() {
    // Given: data and metadata endpoints for a city dataset
    let http = shared(
        ScriptedHttpClient::new()
            .respond(CITY_DATA_URL, five_row_response())
            .respond(CITY_METADATA_URL, metadata_response()),
    );
    let client = OpenDataClient::with_http_client(http.clone(), test_config());
    let request = ExtractRequest::new("abcd-1234")
        .with_query("SELECT * LIMIT 5")
        .with_metadata(true);

    // When: extracting with metadata
    let result = client.extract(&request).await.expect("extract should succeed");

    // Then: both parts are present and the metadata is verbatim
    let dataset = result
        .into_table_with_metadata()
        .expect("result should pair table and metadata");
    assert_eq!(dataset.data.row_count(), 5);
    assert_eq!(
        dataset.metadata.data_updated_at(),
        Some("2024-05-01T12:00:00.000Z")
    );
    assert_eq!(dataset.metadata.as_value()["name"], json!("Borough counts"));

    let urls = http
        .recorded_requests()
        .into_iter()
        .map(|request| request.url)
        .collect::<Vec<_>>();
    assert_eq!(urls, vec![CITY_DATA_URL, CITY_METADATA_URL]);
}

#[tokio::test]
async fn when_raw_and_metadata_requested_then_both_are_returned() {
    // Given: data and metadata endpoints
    let http = shared(
        ScriptedHttpClient::new()
            .respond(CITY_DATA_URL, five_row_response())
            .respond(CITY_METADATA_URL, metadata_response()),
    );
    let client = OpenDataClient::with_http_client(http, test_config());
    let request = ExtractRequest::new("abcd-1234")
        .with_parse(false)
        .with_metadata(true);

    // When: extracting
    let result = client.extract(&request).await.expect("extract should succeed");

    // Then: raw rows and metadata come back together
    assert!(matches!(result, ExtractResult::RawWithMetadata(_)));
    assert_eq!(result.row_count(), 5);
    assert!(result.metadata().is_some());
}

#[tokio::test]
async fn when_extract_repeats_then_results_are_equal() {
    // Given: a stable endpoint
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http, test_config());
    let request = ExtractRequest::new("abcd-1234").with_query("SELECT * LIMIT 5");

    // When: extracting twice
    let first = client.extract(&request).await.expect("first extract");
    let second = client.extract(&request).await.expect("second extract");

    // Then: the results are equal
    assert_eq!(first, second);
}

#[tokio::test]
async fn when_one_client_serves_concurrent_extracts_then_results_are_equal() {
    // Given: one client shared by two callers, one of them asking for metadata
    let http = shared(
        ScriptedHttpClient::new()
            .respond(CITY_DATA_URL, five_row_response())
            .respond(CITY_METADATA_URL, metadata_response()),
    );
    let client = OpenDataClient::with_http_client(http.clone(), test_config());
    let request = ExtractRequest::new("abcd-1234").with_query("SELECT * LIMIT 5");
    let with_metadata = request.clone().with_metadata(true);

    // When: both extracts run at the same time
    let (first, second, third) = tokio::join!(
        client.extract(&request),
        client.extract(&request),
        client.extract(&with_metadata)
    );

    // Then: the plain results are equal and the paired one carries the same table
    let first = first.expect("first extract");
    let second = second.expect("second extract");
    let third = third.expect("third extract");
    assert_eq!(first, second);
    assert_eq!(third.table(), first.table());
    assert!(third.metadata().is_some());
    assert_eq!(http.recorded_requests().len(), 4);
}

#[tokio::test]
async fn when_unparsable_cell_in_number_column_then_it_becomes_null() {
    // Given: a number column with one bad value
    let response = HttpResponse::ok_json(r#"[{"n":"1"},{"n":"2"},{"n":"bad"}]"#)
        .with_header("X-SODA2-Fields", r#"["n"]"#)
        .with_header("X-Soda2-Types", r#"["number"]"#);
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, response));
    let client = OpenDataClient::with_http_client(http, test_config());

    // When: extracting
    let result = client
        .extract(&ExtractRequest::new("abcd-1234"))
        .await
        .expect("bad cells should not fail the extract");

    // Then: the bad cell is a null marker
    let column = result
        .table()
        .and_then(|table| table.column("n"))
        .expect("column n");
    assert_eq!(
        column.cells(),
        &[Cell::Number(1.0), Cell::Number(2.0), Cell::Null]
    );
}

// ============================================================================
// Requests on the wire
// ============================================================================

#[tokio::test]
async fn when_fetching_data_then_token_and_query_are_sent() {
    // Given: a configured token
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http.clone(), test_config());

    // When: extracting with an explicit query
    client
        .extract(&ExtractRequest::new("abcd-1234").with_query("SELECT * LIMIT 5"))
        .await
        .expect("extract should succeed");

    // Then: the request carries the token header and the $query parameter
    let requests = http.recorded_requests();
    let request = requests.first().expect("one request");
    assert_eq!(
        request.headers.get("x-app-token").map(String::as_str),
        Some(TEST_TOKEN)
    );
    assert_eq!(
        request.query,
        vec![(String::from("$query"), String::from("SELECT * LIMIT 5"))]
    );
    assert_eq!(request.timeout, test_config().data_timeout());
}

#[tokio::test]
async fn when_no_query_given_then_default_query_is_sent() {
    // Given: a request without a query
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http.clone(), test_config());

    // When: extracting
    client
        .extract(&ExtractRequest::new("abcd-1234"))
        .await
        .expect("extract should succeed");

    // Then: the provider receives the default query
    let requests = http.recorded_requests();
    assert_eq!(requests[0].query[0].1, "SELECT * LIMIT 1000000");
}

#[tokio::test]
async fn when_fetching_metadata_then_no_token_is_sent() {
    // Given: a metadata endpoint
    let http = shared(ScriptedHttpClient::new().respond(CITY_METADATA_URL, metadata_response()));
    let client = OpenDataClient::with_http_client(http.clone(), test_config());

    // When: fetching metadata directly
    let metadata = client
        .fetch_metadata("abcd-1234", Collection::City)
        .await
        .expect("metadata should load");

    // Then: the request is unauthenticated and has no query
    assert_eq!(metadata.as_value()["id"], json!("abcd-1234"));
    let requests = http.recorded_requests();
    assert!(requests[0].headers.is_empty());
    assert!(requests[0].query.is_empty());
    assert_eq!(requests[0].timeout, test_config().metadata_timeout());
}

#[tokio::test]
async fn when_collection_is_state_then_state_catalog_is_used() {
    // Given: state endpoints
    let http = shared(
        ScriptedHttpClient::new()
            .respond(STATE_DATA_URL, five_row_response())
            .respond(STATE_METADATA_URL, metadata_response()),
    );
    let client = OpenDataClient::with_http_client(http.clone(), test_config());
    let request = ExtractRequest::new("wxyz-9876")
        .with_collection(Collection::State)
        .with_metadata(true);

    // When: extracting
    client.extract(&request).await.expect("extract should succeed");

    // Then: both calls hit the state base URL
    let urls = http
        .recorded_requests()
        .into_iter()
        .map(|request| request.url)
        .collect::<Vec<_>>();
    assert_eq!(urls, vec![STATE_DATA_URL, STATE_METADATA_URL]);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn when_token_missing_then_configuration_error_without_network() {
    // Given: no app token configured
    let http = shared(ScriptedHttpClient::new().respond(CITY_DATA_URL, five_row_response()));
    let client = OpenDataClient::with_http_client(http.clone(), OpenDataConfig::default());

    // When: extracting
    let error = client
        .extract(&ExtractRequest::new("abcd-1234").with_metadata(true))
        .await
        .expect_err("missing token must fail");

    // Then: a configuration error is raised and nothing was requested
    assert_eq!(error.kind(), ExtractErrorKind::Configuration);
    assert!(error.to_string().contains("OPEN_DATA_APP_TOKEN"));
    assert!(http.recorded_requests().is_empty());
}

#[tokio::test]
async fn when_token_is_empty_then_it_counts_as_missing() {
    // Given: an empty token
    let http = shared(ScriptedHttpClient::new());
    let client =
        OpenDataClient::with_http_client(http.clone(), OpenDataConfig::default().with_app_token(""));

    // When: fetching data
    let error = client
        .fetch_data("abcd-1234", Collection::City, "SELECT *")
        .await
        .expect_err("empty token must fail");

    // Then: it is a configuration error
    assert_eq!(error.kind(), ExtractErrorKind::Configuration);
    assert!(http.recorded_requests().is_empty());
}
