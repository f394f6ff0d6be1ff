//! Table tabs.
//!
//! Column typing rule: a column is `"string"` unless at least one of its
//! cells is a [`LinkCell`], in which case it is `"link"`. Every value in a
//! link column is serialized as `{url, text}` (or `null` for null cells).
//! A per-tab override map can force a column's type.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Activity, AthleteId, Tab, TabEnv, TabError, TabMeta};

pub const TABLE_TAB_TYPE: &str = "table_tab";
pub const TABLE_ARTIFACT: &str = "table.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCell {
    pub url: String,
    pub text: String,
}

impl LinkCell {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Link(LinkCell),
    Null,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn link(url: impl Into<String>, text: impl Into<String>) -> Self {
        Cell::Link(LinkCell::new(url, text))
    }

    fn is_link(&self) -> bool {
        matches!(self, Cell::Link(_))
    }

    fn display_text(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Link(link) => link.text.clone(),
            Cell::Null => String::new(),
        }
    }

    fn to_json(&self, column_type: ColumnType) -> Value {
        match (column_type, self) {
            (_, Cell::Null) => Value::Null,
            (ColumnType::Link, Cell::Link(link)) => serde_json::json!({
                "url": link.url,
                "text": link.text,
            }),
            (ColumnType::Link, other) => serde_json::json!({
                "url": "",
                "text": other.display_text(),
            }),
            (ColumnType::String, Cell::Number(n)) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            (ColumnType::String, other) => Value::String(other.display_text()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub column_name: String,
    pub column_type: ColumnType,
}

/// Named, ordered columns of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<(String, Vec<Cell>)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn with_column(mut self, name: &str, cells: Vec<Cell>) -> Self {
        self.push_column(name, cells);
        self
    }

    pub fn push_column(&mut self, name: &str, cells: Vec<Cell>) {
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = cells,
            None => self.columns.push((name.to_string(), cells)),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }
}

/// Serialized table as served to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub table_data: Map<String, Value>,
    pub show_headings: bool,
    pub columns: Vec<ColumnSpec>,
}

pub type TableFn = Box<dyn Fn(&[Activity]) -> anyhow::Result<Table> + Send + Sync>;

pub struct TableTab {
    meta: TabMeta,
    description: String,
    table_function: Option<TableFn>,
    column_types: HashMap<String, ColumnType>,
    show_headings: bool,
}

impl TableTab {
    pub fn new<F>(name: &str, detailed: bool, description: &str, table_function: F) -> Self
    where
        F: Fn(&[Activity]) -> anyhow::Result<Table> + Send + Sync + 'static,
    {
        Self {
            meta: TabMeta::new(name, detailed),
            description: description.to_string(),
            table_function: Some(Box::new(table_function)),
            column_types: HashMap::new(),
            show_headings: true,
        }
    }

    /// A table tab with no transform; its backend hook always fails.
    pub fn without_function(name: &str, detailed: bool, description: &str) -> Self {
        Self {
            meta: TabMeta::new(name, detailed),
            description: description.to_string(),
            table_function: None,
            column_types: HashMap::new(),
            show_headings: true,
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.meta.key = Some(key.to_string());
        self
    }

    pub fn with_column_type(mut self, column: &str, column_type: ColumnType) -> Self {
        self.column_types.insert(column.to_string(), column_type);
        self
    }

    pub fn with_headings(mut self, show_headings: bool) -> Self {
        self.show_headings = show_headings;
        self
    }

    pub fn get_table(&self, activities: &[Activity]) -> Result<Table, TabError> {
        let key = self.get_key();
        let table_function = self.table_function.as_ref().ok_or_else(|| {
            TabError::GenerationFailed {
                key: key.clone(),
                reason: "table tab has no function to generate a table".into(),
            }
        })?;
        table_function(activities).map_err(|e| TabError::generation(&key, &e))
    }

    pub fn get_columns(&self, table: &Table) -> Vec<ColumnSpec> {
        table
            .columns()
            .map(|(name, cells)| {
                let inferred = if cells.iter().any(Cell::is_link) {
                    ColumnType::Link
                } else {
                    ColumnType::String
                };
                ColumnSpec {
                    column_name: name.to_string(),
                    column_type: self.column_types.get(name).copied().unwrap_or(inferred),
                }
            })
            .collect()
    }

    /// Serialize a table with typed columns.
    pub fn serialize_table(&self, table: &Table) -> TableData {
        let columns = self.get_columns(table);
        let mut table_data = Map::new();
        for ((name, cells), spec) in table.columns().zip(&columns) {
            let values = cells
                .iter()
                .map(|cell| cell.to_json(spec.column_type))
                .collect();
            table_data.insert(name.to_string(), Value::Array(values));
        }

        TableData {
            table_data,
            show_headings: self.show_headings,
            columns,
        }
    }

    pub fn get_table_data(&self, activities: &[Activity]) -> Result<TableData, TabError> {
        let table = self.get_table(activities)?;
        Ok(self.serialize_table(&table))
    }
}

impl Tab for TableTab {
    fn meta(&self) -> &TabMeta {
        &self.meta
    }

    fn get_type(&self) -> &'static str {
        TABLE_TAB_TYPE
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn retrieve_frontend_data(&self, env: &TabEnv, athlete_id: AthleteId) -> Result<Value, TabError> {
        let bytes = env.load_artifact(athlete_id, &self.get_key(), TABLE_ARTIFACT)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn backend_processing_hook(
        &self,
        activities: &[Activity],
        env: &TabEnv,
        athlete_id: AthleteId,
    ) -> Result<(), TabError> {
        let table_data = self.get_table_data(activities)?;
        let bytes = serde_json::to_vec(&table_data)?;
        env.artifacts
            .save(athlete_id, &self.get_key(), TABLE_ARTIFACT, &bytes)?;
        tracing::debug!(
            key = %self.get_key(),
            athlete = %athlete_id,
            columns = table_data.columns.len(),
            "saved table"
        );
        Ok(())
    }
}
