//! JSON record decoder for changefeed ndjson lines
//!
//! ```text
//! {"after": {"a": 1, "b": "x"}, "key": [1], "updated": "1585861087210714000.0000000000"}
//! ```

use contracts::{ContractError, RecordDecoder, RowMutation, Timestamp};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ChangefeedRecord {
    #[serde(default)]
    after: Option<Value>,
    key: Value,
    updated: String,
}

/// Decodes `{"after", "key", "updated"}` records.
///
/// A missing or `null` `after` is a deletion.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordDecoder;

impl RecordDecoder for JsonRecordDecoder {
    fn decode_record(&self, line: &[u8]) -> Result<RowMutation, ContractError> {
        let record: ChangefeedRecord =
            serde_json::from_slice(line).map_err(|e| ContractError::RecordDecode {
                message: format!("invalid changefeed record: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(RowMutation {
            updated: parse_updated(&record.updated)?,
            key: record.key.to_string(),
            after: record.after.map(|after| after.to_string()),
        })
    }
}

/// `"<unix nanos>.<logical>"`; the logical part is optional
fn parse_updated(updated: &str) -> Result<Timestamp, ContractError> {
    let (nanos, logical) = updated.split_once('.').unwrap_or((updated, "0"));

    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(nanos) || !digits(logical) {
        return Err(ContractError::record_decode(format!(
            "invalid updated timestamp {updated:?}"
        )));
    }

    let nanos: i128 = nanos
        .parse()
        .map_err(|_| ContractError::record_decode(format!("updated out of range: {updated:?}")))?;
    let logical: u64 = logical
        .parse()
        .map_err(|_| ContractError::record_decode(format!("logical out of range: {updated:?}")))?;

    Ok(Timestamp::from_unix_nanos(nanos, logical)?)
}
