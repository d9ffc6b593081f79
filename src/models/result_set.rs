// src/models/result_set.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single value returned by the SQL engine.
///
/// Integers and reals are both numeric for comparison purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Null => f.write_str("NULL"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(r) => write!(f, "{}", r),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Column name -> value. Names are unique within a row.
pub type Row = BTreeMap<String, Scalar>;

/// Rows returned by one query.
///
/// Serializes as a plain JSON array of row objects. `columns` keeps the
/// engine's column order for display and is empty for deserialized sets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<Row>,
    #[serde(skip)]
    columns: Vec<String>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { rows, columns }
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in display order, falling back to the first row's keys.
    pub fn columns(&self) -> Vec<String> {
        if !self.columns.is_empty() {
            let mut seen = Vec::with_capacity(self.columns.len());
            for name in &self.columns {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
            return seen;
        }
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every column name appearing in any row.
    pub fn column_set(&self) -> std::collections::BTreeSet<&str> {
        self.rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect()
    }
}
