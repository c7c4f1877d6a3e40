//! Rowdock Row-Data Service Contract
//!
//! This crate defines the canonical request/response types exchanged with
//! the row-data service. The shapes are transport-agnostic: the engine only
//! ever sees these types, and the HTTP client maps them onto the backend's
//! endpoints.
//!
//! Cell values travel as nullable strings. SQL NULL round-trips as `None`,
//! everything else as its textual form. Column order inside a table is the
//! display order, and the column at index 0 is the row-identity (primary
//! key) column by standing convention.
//!
//! # Usage
//!
//! ```ignore
//! use rowdock_protocol::{Page, TableInfo};
//!
//! let page: Page = serde_json::from_str(&body)?;
//! for row in &page.rows {
//!     let id = row.get("id").cloned().flatten();
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row as it crosses the wire: column name -> nullable value.
pub type RowData = BTreeMap<String, Option<String>>;

/// The table catalog: table name -> schema snapshot.
pub type Catalog = BTreeMap<String, TableInfo>;

/// Credentials forwarded verbatim to the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Schema snapshot for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    /// Column names in display order; index 0 is the identity column.
    pub columns: Vec<String>,
    /// Authoritative row count at snapshot time.
    pub total_rows: u64,
}

/// One fixed-size batch of rows. Page size is chosen by the server and
/// opaque to the caller; a short or empty page means the table is drained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<RowData>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Body for row insertion. Fields the user left blank arrive as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertRequest {
    pub table: String,
    pub data: RowData,
}

/// Body for a single-cell update, addressed by identity value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub table: String,
    pub pk_column: String,
    pub pk_value: String,
    pub column: String,
    pub new_value: Option<String>,
}

/// Body for a batched delete keyed on identity values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub table: String,
    pub pk_column: String,
    pub pk_values: Vec<String>,
}

/// Server acknowledgement for a successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

/// Non-success payload. The backend reports failures as `{"detail": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_null_round_trip() {
        let json = r#"{"rows":[{"id":"1","name":null}]}"#;
        let page: Page = serde_json::from_str(json).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.rows[0].get("id"), Some(&Some("1".to_string())));
        assert_eq!(page.rows[0].get("name"), Some(&None));

        let back = serde_json::to_string(&page).unwrap();
        assert_eq!(serde_json::from_str::<Page>(&back).unwrap(), page);
    }

    #[test]
    fn test_catalog_shape() {
        let json = r#"{
            "products": {"columns": ["id", "name", "price"], "total_rows": 250},
            "users": {"columns": ["id", "email"], "total_rows": 3}
        }"#;
        let catalog: Catalog = serde_json::from_str(json).unwrap();

        assert_eq!(catalog.len(), 2);
        let products = &catalog["products"];
        assert_eq!(products.columns[0], "id");
        assert_eq!(products.total_rows, 250);
    }

    #[test]
    fn test_insert_request_keeps_nulls() {
        let mut data = RowData::new();
        data.insert("id".into(), Some("106".into()));
        data.insert("stock_level".into(), None);

        let req = InsertRequest {
            table: "products".into(),
            data,
        };
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["table"], "products");
        assert_eq!(json["data"]["id"], "106");
        assert!(json["data"]["stock_level"].is_null());
    }

    #[test]
    fn test_error_body_detail() {
        let err: ErrorBody = serde_json::from_str(r#"{"detail":"data not inserted"}"#).unwrap();
        assert_eq!(err.detail, "data not inserted");
    }

    #[test]
    fn test_delete_request_shape() {
        let req = DeleteRequest {
            table: "products".into(),
            pk_column: "id".into(),
            pk_values: vec!["101".into(), "102".into(), "105".into()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["pk_values"].as_array().unwrap().len(), 3);
    }
}
