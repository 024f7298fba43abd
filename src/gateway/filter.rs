//! Transaction filters and amount column selection
//!
//! Filters are validated when they are built, so anything that reaches the
//! store is already a known method/status/direction.

use crate::error::{AdminError, AdminResult};
use crate::model::{TxDirection, TxMethod, TxStatus};
use std::collections::BTreeSet;

/// Which numeric column of `transaction_logs` to sum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountColumn {
    /// Integer $MINE token units (`amount`)
    Token,
    /// Fixed-scale SOL amount (`sol_amount`), summed exactly
    Sol,
}

impl AmountColumn {
    pub fn column_name(&self) -> &'static str {
        match self {
            AmountColumn::Token => "amount",
            AmountColumn::Sol => "sol_amount",
        }
    }
}

/// Row filter for transaction aggregation
///
/// An empty method set matches every method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    methods: BTreeSet<TxMethod>,
    status: Option<TxStatus>,
    direction: Option<TxDirection>,
}

impl TransactionFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn method(method: TxMethod) -> Self {
        Self::any().with_method(method)
    }

    pub fn with_method(mut self, method: TxMethod) -> Self {
        self.methods.insert(method);
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = TxMethod>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn with_status(mut self, status: TxStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_direction(mut self, direction: TxDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Build a filter from raw request values
    ///
    /// `methods` is comma-separated (`"MINING,CLAIM"`). Blank inputs mean
    /// "no constraint". Any unknown value rejects the whole filter.
    pub fn parse(
        methods: Option<&str>,
        status: Option<&str>,
        direction: Option<&str>,
    ) -> AdminResult<Self> {
        let mut filter = Self::any();

        if let Some(raw) = methods.filter(|s| !s.trim().is_empty()) {
            for part in raw.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    return Err(AdminError::InvalidFilter(format!(
                        "empty method in '{}'",
                        raw
                    )));
                }
                filter.methods.insert(part.parse()?);
            }
        }

        if let Some(raw) = status.filter(|s| !s.trim().is_empty()) {
            filter.status = Some(raw.parse()?);
        }

        if let Some(raw) = direction.filter(|s| !s.trim().is_empty()) {
            filter.direction = Some(raw.parse()?);
        }

        Ok(filter)
    }

    pub fn methods(&self) -> &BTreeSet<TxMethod> {
        &self.methods
    }

    pub fn status(&self) -> Option<TxStatus> {
        self.status
    }

    pub fn direction(&self) -> Option<TxDirection> {
        self.direction
    }

    /// SQL predicates (joined with AND) plus their positional values
    ///
    /// Column names are unqualified; callers alias nothing.
    pub fn sql_predicates(&self) -> (Vec<String>, Vec<rusqlite::types::Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if !self.methods.is_empty() {
            let placeholders = vec!["?"; self.methods.len()].join(", ");
            clauses.push(format!("method IN ({})", placeholders));
            values.extend(
                self.methods
                    .iter()
                    .map(|m| rusqlite::types::Value::Text(m.as_str().to_string())),
            );
        }

        if let Some(status) = self.status {
            clauses.push("status = ?".to_string());
            values.push(rusqlite::types::Value::Text(status.as_str().to_string()));
        }

        if let Some(direction) = self.direction {
            clauses.push("transaction_type = ?".to_string());
            values.push(rusqlite::types::Value::Text(direction.as_str().to_string()));
        }

        (clauses, values)
    }

    /// In-memory equivalent of `sql_predicates`
    pub fn matches(&self, method: TxMethod, status: TxStatus, direction: TxDirection) -> bool {
        (self.methods.is_empty() || self.methods.contains(&method))
            && self.status.map_or(true, |s| s == status)
            && self.direction.map_or(true, |d| d == direction)
    }
}
