//! Test harness: an in-memory `RowSource` with a call log.
//!
//! `FakeSource` serves pages from generated rows, applies mutations to its
//! backing store, and records every call so tests can assert the
//! no-network invariants (an unchanged commit or an absorbed load trigger
//! must leave the log untouched). A scripted `fail_next` error exercises
//! the rollback paths.

use std::collections::BTreeMap;

use rowdock_config::LayoutStore;
use rowdock_protocol::{Catalog, Page, RowData, TableInfo};

use crate::gesture::Viewport;
use crate::source::{RowSource, SourceError};
use crate::workspace::Workspace;

pub struct FakeTable {
    pub columns: Vec<String>,
    pub rows: Vec<RowData>,
}

pub struct FakeSource {
    tables: BTreeMap<String, FakeTable>,
    page_size: usize,
    fail_next: Option<SourceError>,
    calls: Vec<String>,
}

impl FakeSource {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: BTreeMap::new(),
            page_size,
            fail_next: None,
            calls: Vec::new(),
        }
    }

    /// Add a table with `count` generated rows. The first column is the
    /// identity, valued "1".."count"; other columns get "<col>-<n>".
    pub fn add_table(&mut self, name: &str, columns: &[&str], count: usize) {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = (1..=count)
            .map(|n| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        let value = if i == 0 {
                            n.to_string()
                        } else {
                            format!("{}-{}", col, n)
                        };
                        (col.clone(), Some(value))
                    })
                    .collect()
            })
            .collect();
        self.tables.insert(name.to_string(), FakeTable { columns, rows });
    }

    /// Script the next call to fail with `err`.
    pub fn fail_next(&mut self, err: SourceError) {
        self.fail_next = Some(err);
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Number of logged calls whose name starts with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn table(&self, name: &str) -> &FakeTable {
        &self.tables[name]
    }

    fn check_fail(&mut self) -> Result<(), SourceError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn lookup(&self, name: &str) -> Result<&FakeTable, SourceError> {
        self.tables
            .get(name)
            .ok_or_else(|| SourceError::Rejected(format!("no such table: {}", name)))
    }
}

impl RowSource for FakeSource {
    fn list_tables(&mut self) -> Result<Catalog, SourceError> {
        self.calls.push("list_tables".to_string());
        self.check_fail()?;
        Ok(self
            .tables
            .iter()
            .map(|(name, table)| {
                (
                    name.clone(),
                    TableInfo {
                        columns: table.columns.clone(),
                        total_rows: table.rows.len() as u64,
                    },
                )
            })
            .collect())
    }

    fn fetch_page(&mut self, table: &str, page: u64) -> Result<Page, SourceError> {
        self.calls.push(format!("fetch_page {} {}", table, page));
        self.check_fail()?;
        let data = self.lookup(table)?;
        let start = (page.saturating_sub(1) as usize) * self.page_size;
        let end = (start + self.page_size).min(data.rows.len());
        let rows = if start < data.rows.len() {
            data.rows[start..end].to_vec()
        } else {
            Vec::new()
        };
        Ok(Page { rows })
    }

    fn insert_row(&mut self, table: &str, data: &RowData) -> Result<(), SourceError> {
        self.calls.push(format!("insert_row {}", table));
        self.check_fail()?;
        self.lookup(table)?;
        if let Some(t) = self.tables.get_mut(table) {
            t.rows.push(data.clone());
        }
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
        self.calls.push(format!("update_cell {} {}", table, column));
        self.check_fail()?;
        let t = self.tables.get_mut(table).ok_or_else(|| {
            SourceError::Rejected(format!("no such table: {}", table))
        })?;
        let row = t
            .rows
            .iter_mut()
            .find(|r| r.get(pk_column).map(|v| v.as_deref()) == Some(Some(pk_value)))
            .ok_or_else(|| SourceError::Rejected("row not found".to_string()))?;
        row.insert(column.to_string(), new_value.map(str::to_string));
        Ok(())
    }

    fn delete_rows(
        &mut self,
        table: &str,
        pk_column: &str,
        pk_values: &[String],
    ) -> Result<(), SourceError> {
        self.calls
            .push(format!("delete_rows {} {}", table, pk_values.len()));
        self.check_fail()?;
        self.lookup(table)?;
        if let Some(t) = self.tables.get_mut(table) {
            t.rows.retain(|r| {
                !matches!(r.get(pk_column), Some(Some(v)) if pk_values.contains(v))
            });
        }
        Ok(())
    }

    fn truncate_table(&mut self, table: &str) -> Result<(), SourceError> {
        self.calls.push(format!("truncate {}", table));
        self.check_fail()?;
        self.lookup(table)?;
        if let Some(t) = self.tables.get_mut(table) {
            t.rows.clear();
        }
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), SourceError> {
        self.calls.push(format!("drop {}", table));
        self.check_fail()?;
        self.lookup(table)?;
        self.tables.remove(table);
        Ok(())
    }
}

pub const TEST_VIEWPORT: Viewport = Viewport {
    width: 1000.0,
    height: 700.0,
};

/// A workspace over the source's current catalog, without layout
/// persistence.
pub fn workspace(source: &mut FakeSource) -> Workspace {
    workspace_with(source, None)
}

/// Same, with a layout store for persistence tests.
pub fn workspace_with(source: &mut FakeSource, store: Option<LayoutStore>) -> Workspace {
    let catalog = source.list_tables().unwrap();
    Workspace::new("test-db", catalog, TEST_VIEWPORT, store)
}
