//! One-off extract rendered as JSON or CSV.

use civicdash_core::{ExtractRequest, ExtractResult, OpenDataClient, OpenDataConfig, Table};
use civicdash_pipelines::to_csv_string;
use tracing::warn;

use crate::cli::{ExtractArgs, OutputFormat};
use crate::error::CliError;

use super::{emit, to_json};

pub async fn run(args: &ExtractArgs, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let request = ExtractRequest::new(args.dataset_id.trim())
        .with_query(args.query.as_str())
        .with_collection(args.collection.into())
        .with_parse(!args.raw)
        .with_metadata(args.metadata);

    let client = OpenDataClient::new(OpenDataConfig::load());
    let result = client.extract(&request).await?;

    let payload = render(&result, format, pretty)?;
    emit(&payload, args.output.as_deref())
}

fn render(result: &ExtractResult, format: OutputFormat, pretty: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => to_json(result, pretty),
        OutputFormat::Csv => {
            if result.metadata().is_some() {
                warn!("metadata is not included in CSV output");
            }
            let table = match (result.table(), result.raw()) {
                (Some(table), _) => table.clone(),
                (None, Some(rows)) => Table::from_records(rows),
                (None, None) => Table::empty(),
            };
            Ok(to_csv_string(&table)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civicdash_core::{Dataset, DatasetMetadata, RawRows};
    use serde_json::json;

    fn raw_rows() -> RawRows {
        serde_json::from_value(json!([{"borough": "BRONX", "count": "10"}])).expect("records")
    }

    #[test]
    fn json_output_is_the_record_array() {
        let result = ExtractResult::Raw(raw_rows());
        assert_eq!(
            render(&result, OutputFormat::Json, false).expect("render"),
            r#"[{"borough":"BRONX","count":"10"}]"#
        );
    }

    #[test]
    fn json_output_pairs_data_and_metadata() {
        let result = ExtractResult::RawWithMetadata(Dataset {
            data: raw_rows(),
            metadata: DatasetMetadata::new(json!({"id": "abcd-1234"})),
        });
        let value: serde_json::Value =
            serde_json::from_str(&render(&result, OutputFormat::Json, true).expect("render"))
                .expect("valid json");
        assert_eq!(value["metadata"]["id"], "abcd-1234");
        assert_eq!(value["data"][0]["borough"], "BRONX");
    }

    #[test]
    fn csv_output_renders_raw_rows_as_a_table() {
        let result = ExtractResult::Raw(raw_rows());
        assert_eq!(
            render(&result, OutputFormat::Csv, false).expect("render"),
            "borough,count\nBRONX,10\n"
        );
    }
}
