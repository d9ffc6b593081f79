// src/checker/comparator.rs

use std::{collections::BTreeSet, fmt, str::FromStr};

use crate::models::result_set::{ResultSet, Row, Scalar};

/// Which column sets two result sets may have and still be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// Both sides must select exactly the same column names.
    Strict,
    /// The user's columns may be any non-empty subset of the reference's.
    Subset,
}

impl FromStr for ColumnPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ColumnPolicy::Strict),
            "subset" => Ok(ColumnPolicy::Subset),
            other => Err(format!("unknown column policy '{}' (expected strict or subset)", other)),
        }
    }
}

impl fmt::Display for ColumnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnPolicy::Strict => f.write_str("strict"),
            ColumnPolicy::Subset => f.write_str("subset"),
        }
    }
}

/// A scalar after numeric tolerance is applied.
///
/// Variants never compare equal across kinds, so null, false, 0 and "" stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Normalized {
    Null,
    Bool(bool),
    /// Hundredths, i.e. the value rounded to 2 decimal places.
    Number(i64),
    Text(String),
}

fn normalize(value: &Scalar) -> Normalized {
    match value {
        Scalar::Null => Normalized::Null,
        Scalar::Bool(b) => Normalized::Bool(*b),
        Scalar::Integer(i) => Normalized::Number(i.saturating_mul(100)),
        Scalar::Real(r) => Normalized::Number((r * 100.0).round() as i64),
        Scalar::Text(s) => Normalized::Text(s.clone()),
    }
}

/// Structured per-row key over a fixed column order. A missing column is null.
type Signature = Vec<Normalized>;

fn signature(row: &Row, columns: &[&str]) -> Signature {
    columns
        .iter()
        .map(|name| row.get(*name).map(normalize).unwrap_or(Normalized::Null))
        .collect()
}

/// Decides whether two result sets hold the same relational content.
#[derive(Debug, Clone, Copy)]
pub struct ResultComparator {
    policy: ColumnPolicy,
}

impl Default for ResultComparator {
    fn default() -> Self {
        Self::new(ColumnPolicy::Strict)
    }
}

impl ResultComparator {
    pub fn new(policy: ColumnPolicy) -> Self {
        Self { policy }
    }

    /// Row order is ignored; row multiplicity is not.
    pub fn equivalent(&self, user: &ResultSet, reference: &ResultSet) -> bool {
        if user.len() != reference.len() {
            return false;
        }
        if user.is_empty() {
            return true;
        }

        let user_cols = user.column_set();
        let reference_cols = reference.column_set();

        if !user_cols.is_subset(&reference_cols) {
            return false;
        }
        if self.policy == ColumnPolicy::Strict && user_cols != reference_cols {
            return false;
        }

        // BTreeSet iteration is already lexicographic.
        let common: Vec<&str> = user_cols.intersection(&reference_cols).copied().collect();
        if common.is_empty() {
            return false;
        }

        let mut user_sigs: Vec<Signature> =
            user.rows().iter().map(|row| signature(row, &common)).collect();
        let mut reference_sigs: Vec<Signature> = reference
            .rows()
            .iter()
            .map(|row| signature(row, &common))
            .collect();

        user_sigs.sort();
        reference_sigs.sort();

        user_sigs == reference_sigs
    }

    /// Reference columns the user's result does not select.
    pub fn missing_columns(&self, user: &ResultSet, reference: &ResultSet) -> Vec<String> {
        let user_cols = user.column_set();
        reference
            .column_set()
            .difference(&user_cols)
            .map(|c| c.to_string())
            .collect()
    }

    /// User columns the reference does not select.
    pub fn extra_columns(&self, user: &ResultSet, reference: &ResultSet) -> Vec<String> {
        let reference_cols: BTreeSet<&str> = reference.column_set();
        user.column_set()
            .difference(&reference_cols)
            .map(|c| c.to_string())
            .collect()
    }
}

/// Strict comparison with the default policy.
pub fn equivalent(user: &ResultSet, reference: &ResultSet) -> bool {
    ResultComparator::default().equivalent(user, reference)
}
