//! RowMutation - RecordDecoder output

use crate::Timestamp;

/// A single changefeed row event, ready to be staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    /// MVCC time of the change
    pub updated: Timestamp,

    /// Primary key as JSON text (e.g. `[1]`)
    pub key: String,

    /// Row image after the change as JSON text; `None` for a deletion
    pub after: Option<String>,
}

impl RowMutation {
    /// Whether this mutation deletes the row
    pub fn is_delete(&self) -> bool {
        self.after.is_none()
    }
}
