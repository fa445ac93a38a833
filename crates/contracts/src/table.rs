//! Table naming shared by the registry and the storage collaborator

use std::fmt;

use crate::TopicName;

/// `database.table`, both parts folded to lower case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedTable {
    database: String,
    table: String,
}

impl QualifiedTable {
    pub fn new(database: &str, table: &str) -> Self {
        Self {
            database: database.to_lowercase(),
            table: table.to_lowercase(),
        }
    }

    /// Staging table for `destination`, kept in the sink database as
    /// `{sink_db}.{destination_db}_{destination_table}`.
    pub fn staging_for(sink_db: &str, destination: &QualifiedTable) -> Self {
        Self::new(
            sink_db,
            &format!("{}_{}", destination.database, destination.table),
        )
    }

    /// Parse `database.table`; both parts must be non-empty
    pub fn parse(qualified: &str) -> Option<Self> {
        let (database, table) = qualified.split_once('.')?;
        if database.is_empty() || table.is_empty() || table.contains('.') {
            return None;
        }
        Some(Self::new(database, table))
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for QualifiedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// One registered sink as seen by the checkpoint collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkTarget {
    /// Changefeed source table
    pub source_table: TopicName,
    /// Table the staged mutations are applied to
    pub destination: QualifiedTable,
    /// Table holding not-yet-applied mutations
    pub staging: QualifiedTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_case_folding() {
        let t = QualifiedTable::new("DefaultDB", "Orders");
        assert_eq!(t.to_string(), "defaultdb.orders");
    }

    #[test]
    fn test_staging_name() {
        let dest = QualifiedTable::new("defaultdb", "orders");
        let staging = QualifiedTable::staging_for("_CDC_SINK", &dest);
        assert_eq!(staging.to_string(), "_cdc_sink.defaultdb_orders");
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            QualifiedTable::parse("DefaultDB.orders"),
            Some(QualifiedTable::new("defaultdb", "orders"))
        );
        for bad in ["orders", ".orders", "defaultdb.", "a.b.c", ""] {
            assert_eq!(QualifiedTable::parse(bad), None, "{bad}");
        }
    }
}
