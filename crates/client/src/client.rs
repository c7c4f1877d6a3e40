//! HTTP client for the row-data backend.
//!
//! The backend is a plain REST service: reads authenticate via query
//! parameters, writes via JSON bodies, and every failure arrives as
//! `{"detail": "..."}`. Batched deletes travel as one comma-joined `ids`
//! query parameter.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use rowdock_engine::{RowSource, SourceError};
use rowdock_protocol::{Catalog, Credentials, ErrorBody, Page, RowData};

/// Blocking client for one database on one backend.
#[derive(Clone)]
pub struct HttpRowSource {
    http: reqwest::blocking::Client,
    base_url: String,
    credentials: Credentials,
    db_name: String,
}

#[derive(Serialize)]
struct InsertBody<'a> {
    username: &'a str,
    password: &'a str,
    db_name: &'a str,
    tb_name: &'a str,
    data: &'a RowData,
}

#[derive(Serialize)]
struct UpdateBody<'a> {
    username: &'a str,
    password: &'a str,
    db_name: &'a str,
    tb_name: &'a str,
    pk_col: &'a str,
    pk_value: &'a str,
    column: &'a str,
    new_value: Option<&'a str>,
}

impl HttpRowSource {
    pub fn new(base_url: impl Into<String>, credentials: Credentials, db_name: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("rowdock/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            db_name: db_name.into(),
        }
    }

    /// Stable identifier for this source, used to key the layout store.
    pub fn source_key(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn auth_query(&self) -> [(&'static str, &str); 3] {
        [
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("db_name", self.db_name.as_str()),
        ]
    }

    fn get(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::blocking::Response, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self
            .http
            .get(&url)
            .query(&self.auth_query())
            .query(query)
            .send()
            .map_err(|e| SourceError::Connectivity(e.to_string()))?;
        check(response)
    }

    fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::blocking::Response, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| SourceError::Connectivity(e.to_string()))?;
        check(response)
    }
}

/// Map a non-success response to the `{"detail": ...}` message the backend
/// reports, falling back to the bare status code.
fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
    Err(SourceError::Rejected(message))
}

fn parse<T: serde::de::DeserializeOwned>(
    response: reqwest::blocking::Response,
) -> Result<T, SourceError> {
    response
        .json::<T>()
        .map_err(|e| SourceError::Rejected(format!("malformed response: {}", e)))
}

impl RowSource for HttpRowSource {
    fn list_tables(&mut self) -> Result<Catalog, SourceError> {
        let response = self.get("/connection/tables", &[])?;
        parse(response)
    }

    fn fetch_page(&mut self, table: &str, page: u64) -> Result<Page, SourceError> {
        let page = page.to_string();
        let response = self.get(
            "/connection/rows",
            &[("tb_name", table), ("page", page.as_str())],
        )?;
        parse(response)
    }

    fn insert_row(&mut self, table: &str, data: &RowData) -> Result<(), SourceError> {
        let body = InsertBody {
            username: &self.credentials.username,
            password: &self.credentials.password,
            db_name: &self.db_name,
            tb_name: table,
            data,
        };
        self.post_json("/edit/insert", &body)?;
        Ok(())
    }

    fn update_cell(
        &mut self,
        table: &str,
        pk_column: &str,
        pk_value: &str,
        column: &str,
        new_value: Option<&str>,
    ) -> Result<(), SourceError> {
        let body = UpdateBody {
            username: &self.credentials.username,
            password: &self.credentials.password,
            db_name: &self.db_name,
            tb_name: table,
            pk_col: pk_column,
            pk_value,
            column,
            new_value,
        };
        self.post_json("/edit/update", &body)?;
        Ok(())
    }

    fn delete_rows(
        &mut self,
        table: &str,
        pk_column: &str,
        pk_values: &[String],
    ) -> Result<(), SourceError> {
        // the backend takes the whole batch as one comma-joined parameter
        let ids = pk_values.join(",");
        self.get(
            "/edit/delete",
            &[("tb_name", table), ("pk_col", pk_column), ("ids", ids.as_str())],
        )?;
        Ok(())
    }

    fn truncate_table(&mut self, table: &str) -> Result<(), SourceError> {
        self.get("/empty/clear", &[("tb_name", table)])?;
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), SourceError> {
        self.get("/empty/drop", &[("tb_name", table)])?;
        Ok(())
    }
}
