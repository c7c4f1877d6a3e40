//! The transport seam between the engine and the row-data service.
//!
//! The engine never performs I/O itself: every suspension point is driven
//! through a `RowSource`, and exactly one request is outstanding per
//! resource (the page-load flag, the single edit slot, the single draft
//! row). State conflicts are not errors: conflicting operations decline
//! silently.

use rowdock_protocol::{Catalog, Page, RowData};

/// Errors a row source can surface.
///
/// There is no `StateConflict` variant on purpose: conflicts are resolved
/// locally by declining the operation, never by reporting failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Request could not be sent or the response never arrived.
    Connectivity(String),
    /// Server answered with a non-success outcome.
    Rejected(String),
}

impl SourceError {
    /// The user-facing message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            SourceError::Connectivity(msg) => msg,
            SourceError::Rejected(msg) => msg,
        }
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Connectivity(msg) => write!(f, "connection failed: {}", msg),
            SourceError::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// The row-data collaborator contract, transport-agnostic. Implemented
/// over HTTP by `rowdock-client` and by the in-memory fake in the test
/// harness.
pub trait RowSource {
    /// Table catalog: name -> columns + authoritative row count.
    fn list_tables(&mut self) -> Result<Catalog, SourceError>;

    /// Fetch one fixed-size page, 1-based. Page size is the server's call.
    fn fetch_page(&mut self, table: &str, page: u64) -> Result<Page, SourceError>;

    fn insert_row(&mut self, table: &str, data: &RowData) -> Result<(), SourceError>;

    fn update_cell(
        &mut self,
        table: &str,
        pk_column: &str,
        pk_value: &str,
        column: &str,
        new_value: Option<&str>,
    ) -> Result<(), SourceError>;

    /// Batched delete keyed on identity values.
    fn delete_rows(
        &mut self,
        table: &str,
        pk_column: &str,
        pk_values: &[String],
    ) -> Result<(), SourceError>;

    /// Empty a table in place, keeping its schema.
    fn truncate_table(&mut self, table: &str) -> Result<(), SourceError>;

    /// Drop a table entirely.
    fn drop_table(&mut self, table: &str) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = SourceError::Connectivity("timed out".into());
        assert_eq!(e.message(), "timed out");
        assert_eq!(e.to_string(), "connection failed: timed out");

        let e = SourceError::Rejected("data not inserted".into());
        assert_eq!(e.message(), "data not inserted");
        assert_eq!(e.to_string(), "data not inserted");
    }
}
