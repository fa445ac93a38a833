//! # Ingestion
//!
//! Wire-format decoding for changefeed deliveries.
//!
//! Responsibilities:
//! - Classify a request path as an ndjson batch or a resolved checkpoint
//! - Decode the 33-digit changefeed timestamp embedded in the path
//! - Decode ndjson records into `RowMutation`s
//!
//! ## Usage Example
//!
//! ```
//! use ingestion::{classify, Classified};
//!
//! let path = "/2020-04-02/202004022058072107140000000000000-56087568dba1e6b8-1-72-00000000-_test_table_4064-1.ndjson";
//! match classify(path).unwrap() {
//!     Classified::Ndjson(batch) => assert_eq!(batch.topic().as_str(), "_test_table_4064"),
//!     Classified::Resolved(_) => unreachable!(),
//! }
//! ```

mod error;
mod record;
mod url;

// Re-exports
pub use contracts::{NdjsonDescriptor, ResolvedDescriptor, Timestamp, TimestampError};
pub use error::{Grammar, UnrecognizedUrl, UrlError};
pub use record::JsonRecordDecoder;
pub use url::{classify, parse_ndjson, parse_resolved, Classified};
