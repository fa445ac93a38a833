//! Configuration validation
//!
//! Rules:
//! - field constraints declared on the blueprint (non-empty names, record limit above zero)
//! - database and table names are plain identifiers
//! - destination tables unique (they key the sink registry)
//! - source tables unique
//! - memory backend: `store.tables` well-formed and covering every sink destination

use std::collections::HashSet;

use ::validator::Validate;
use contracts::{ContractError, QualifiedTable, SinkerBlueprint, StoreBackend};

/// Validate a SinkerBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_identifiers(blueprint)?;
    validate_destination_keys(blueprint)?;
    validate_source_tables(blueprint)?;
    validate_store_tables(blueprint)?;
    Ok(())
}

/// Derived field constraints
fn validate_fields(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Names end up in `db.table` and `{sink_db}.{db}_{table}`
fn validate_identifiers(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    if !is_identifier(&blueprint.store.sink_db) {
        return Err(ContractError::config_validation(
            "store.sink_db",
            format!("invalid identifier '{}'", blueprint.store.sink_db),
        ));
    }

    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        for (field, value) in [
            ("source_table", &sink.source_table),
            ("destination_db", &sink.destination_db),
            ("destination_table", &sink.destination_table),
        ] {
            if !is_identifier(value) {
                return Err(ContractError::config_validation(
                    format!("sinks[{idx}].{field}"),
                    format!("invalid identifier '{value}'"),
                ));
            }
        }
    }
    Ok(())
}

/// Sinks are registered under their destination table name
fn validate_destination_keys(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(sink.destination_table.to_lowercase()) {
            return Err(ContractError::config_validation(
                format!("sinks[destination_table={}]", sink.destination_table),
                "duplicate destination_table",
            ));
        }
    }
    Ok(())
}

fn validate_source_tables(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for sink in &blueprint.sinks {
        if !seen.insert(sink.source_table.to_lowercase()) {
            return Err(ContractError::config_validation(
                format!("sinks[source_table={}]", sink.source_table),
                "duplicate source_table",
            ));
        }
    }
    Ok(())
}

/// The memory backend starts empty apart from the declared tables
fn validate_store_tables(blueprint: &SinkerBlueprint) -> Result<(), ContractError> {
    if blueprint.store.backend != StoreBackend::Memory {
        return Ok(());
    }

    let mut declared = HashSet::new();
    for (idx, table) in blueprint.store.tables.iter().enumerate() {
        let parsed = QualifiedTable::parse(table).ok_or_else(|| {
            ContractError::config_validation(
                format!("store.tables[{idx}]"),
                format!("expected 'database.table', got '{table}'"),
            )
        })?;
        declared.insert(parsed);
    }

    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        let destination = QualifiedTable::new(&sink.destination_db, &sink.destination_table);
        if !declared.contains(&destination) {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].destination_table"),
                format!("destination table {destination} not found in store.tables"),
            ));
        }
    }
    Ok(())
}
