//! URL Classifier - changefeed cloud-storage path grammars
//!
//! ```text
//! ndjson:   {endpoint}/{YYYY-MM-DD}/{timestamp}-{session}-{node}-{sink}-{file}-{topic}-{schema}.ndjson
//! resolved: {endpoint}/{YYYY-MM-DD}/{timestamp}.RESOLVED
//! ```
//!
//! Both grammars are anchored at the end of the path; the endpoint prefix is
//! free-form. Suffixes and the session token match case-insensitively,
//! every digit is matched exactly.

use contracts::{NdjsonDescriptor, ResolvedDescriptor, Timestamp, Uniquer, WALL_TIME_LEN, WIRE_LEN};
use tracing::debug;

use crate::error::{Grammar, UnrecognizedUrl, UrlError};

const NDJSON_SUFFIX: &str = ".ndjson";
const RESOLVED_SUFFIX: &str = ".resolved";
const DATE_LEN: usize = 10;

/// Classified request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Row-mutation batch
    Ndjson(NdjsonDescriptor),
    /// Consistency checkpoint
    Resolved(ResolvedDescriptor),
}

/// Classify a request path: ndjson first, then resolved; first match wins.
///
/// # Errors
/// Returns [`UnrecognizedUrl`] carrying both grammars' errors when neither matches.
pub fn classify(path: &str) -> Result<Classified, UnrecognizedUrl> {
    let ndjson = match parse_ndjson(path) {
        Ok(descriptor) => return Ok(Classified::Ndjson(descriptor)),
        Err(e) => e,
    };

    let resolved = match parse_resolved(path) {
        Ok(descriptor) => return Ok(Classified::Resolved(descriptor)),
        Err(e) => e,
    };

    debug!(path, "URL matches neither grammar");
    Err(UnrecognizedUrl {
        path: path.to_string(),
        ndjson,
        resolved,
    })
}

/// Parse an ndjson batch path.
pub fn parse_ndjson(path: &str) -> Result<NdjsonDescriptor, UrlError> {
    let scan = Scan::new(Grammar::Ndjson, path);

    let stem = strip_suffix_ignore_case(path, NDJSON_SUFFIX)
        .ok_or_else(|| scan.mismatch("missing .ndjson suffix"))?;
    let (prefix, file) = scan.split_file(stem)?;
    let (_endpoint, date) = scan.split_date(prefix)?;
    let (timestamp, rest) = scan.take_timestamp(file)?;

    let rest = rest
        .strip_prefix('-')
        .ok_or_else(|| scan.mismatch("expected '-' after timestamp"))?;

    // session-node-sink-file-{topic-schema}; the topic itself may contain '-'
    let mut parts = rest.splitn(5, '-');
    let session = parts.next().unwrap_or_default();
    let node = parts.next().unwrap_or_default();
    let sink = parts.next().unwrap_or_default();
    let file_id = parts.next().unwrap_or_default();
    let tail = parts
        .next()
        .ok_or_else(|| scan.mismatch("expected session-node-sink-file-topic-schema"))?;

    if session.is_empty() || !session.bytes().all(is_session_byte) {
        return Err(scan.mismatch("session id must be [0-9a-g]+"));
    }
    let node_id = scan.number("node id", node)?;
    let sink_id = scan.number("sink id", sink)?;
    let file_id = scan.number("file id", file_id)?;

    let (topic, schema) = tail
        .rsplit_once('-')
        .ok_or_else(|| scan.mismatch("expected '-' before schema id"))?;
    if topic.is_empty() {
        return Err(scan.mismatch("empty topic"));
    }
    let schema_id = scan.number("schema id", schema)?;

    let descriptor = NdjsonDescriptor::new(
        date,
        timestamp,
        Uniquer::new(session, node_id, sink_id, file_id),
        topic,
        schema_id,
    );
    debug!(path, topic = %descriptor.topic(), timestamp = %timestamp, "Parsed ndjson URL");
    Ok(descriptor)
}

/// Parse a resolved checkpoint path.
pub fn parse_resolved(path: &str) -> Result<ResolvedDescriptor, UrlError> {
    let scan = Scan::new(Grammar::Resolved, path);

    let stem = strip_suffix_ignore_case(path, RESOLVED_SUFFIX)
        .ok_or_else(|| scan.mismatch("missing .RESOLVED suffix"))?;
    let (prefix, file) = scan.split_file(stem)?;
    let (endpoint, date) = scan.split_date(prefix)?;
    let (timestamp, rest) = scan.take_timestamp(file)?;
    if !rest.is_empty() {
        return Err(scan.mismatch("unexpected characters after timestamp"));
    }

    let descriptor = ResolvedDescriptor::new(endpoint, date, timestamp);
    debug!(path, endpoint = descriptor.endpoint(), timestamp = %timestamp, "Parsed resolved URL");
    Ok(descriptor)
}

/// Error context for one grammar attempt
struct Scan<'a> {
    grammar: Grammar,
    path: &'a str,
}

impl<'a> Scan<'a> {
    fn new(grammar: Grammar, path: &'a str) -> Self {
        Self { grammar, path }
    }

    fn mismatch(&self, reason: &'static str) -> UrlError {
        UrlError::Mismatch {
            grammar: self.grammar,
            path: self.path.to_string(),
            reason,
        }
    }

    /// `…/file` -> (`…`, `file`)
    fn split_file<'s>(&self, stem: &'s str) -> Result<(&'s str, &'s str), UrlError> {
        stem.rsplit_once('/')
            .ok_or_else(|| self.mismatch("expected /{date}/{file}"))
    }

    /// `{endpoint}/YYYY-MM-DD` -> (`{endpoint}`, `YYYY-MM-DD`)
    fn split_date<'s>(&self, prefix: &'s str) -> Result<(&'s str, &'s str), UrlError> {
        let (endpoint, date) = prefix
            .rsplit_once('/')
            .ok_or_else(|| self.mismatch("expected /{date}/ directory"))?;
        if !is_date_shape(date) {
            return Err(self.mismatch("date directory must be YYYY-MM-DD"));
        }
        Ok((endpoint, date))
    }

    /// Leading 33 digits, split 23 + 10 into the timestamp decoder
    fn take_timestamp<'s>(&self, file: &'s str) -> Result<(Timestamp, &'s str), UrlError> {
        let digits = file
            .get(..WIRE_LEN)
            .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| self.mismatch("expected 33-digit timestamp"))?;

        let (datetime, logical) = digits.split_at(WALL_TIME_LEN);
        let timestamp =
            Timestamp::decode(datetime, logical).map_err(|source| UrlError::Timestamp {
                grammar: self.grammar,
                path: self.path.to_string(),
                source,
            })?;

        Ok((timestamp, &file[WIRE_LEN..]))
    }

    /// Non-empty run of ASCII digits as `u64`
    fn number(&self, field: &'static str, value: &str) -> Result<u64, UrlError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(UrlError::NotDigits {
                grammar: self.grammar,
                path: self.path.to_string(),
                field,
                value: value.to_string(),
            });
        }
        value.parse().map_err(|source| UrlError::Number {
            grammar: self.grammar,
            path: self.path.to_string(),
            field,
            value: value.to_string(),
            source,
        })
    }
}

fn strip_suffix_ignore_case<'s>(s: &'s str, suffix: &str) -> Option<&'s str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

/// `dddd-dd-dd`; the calendar is not validated
fn is_date_shape(date: &str) -> bool {
    date.len() == DATE_LEN
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn is_session_byte(b: u8) -> bool {
    matches!(b.to_ascii_lowercase(), b'0'..=b'9' | b'a'..=b'g')
}
