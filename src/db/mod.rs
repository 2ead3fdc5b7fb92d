//! Runtime dataset store — seeded in-memory tables behind a lock.
//!
//! DESIGN
//! ======
//! The demo backend needs realistic row data for the model's tools to pull
//! and mutate, but nothing durable: tables live in memory, seeded once at
//! startup, and every mutation returns the refreshed dataset so the caller
//! can ship it straight back to the UI. Per-table metadata (primary key,
//! required columns, default ordering) drives validation the same way for
//! every source.

mod seed;

use std::collections::HashMap;

use serde_json::{Map, Value, json};
use tokio::sync::RwLock;

/// Dataset names served by the store, in catalog order.
pub const SOURCES: [&str; 5] = ["products", "sales", "customers", "orders", "order_items"];

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    #[error("Missing required fields for '{source_name}': {}", fields.join(", "))]
    MissingFields { source_name: String, fields: Vec<String> },

    #[error("Missing primary key fields for '{source_name}': {}", fields.join(", "))]
    MissingKeys { source_name: String, fields: Vec<String> },

    #[error("A row with this key already exists in '{0}'")]
    DuplicateKey(String),

    #[error("No matching row found in '{0}' for provided key.")]
    NoMatch(String),

    #[error("No updatable fields provided for '{0}'")]
    NoUpdatableFields(String),
}

// =============================================================================
// TABLE METADATA
// =============================================================================

struct TableMeta {
    primary_key: &'static [&'static str],
    required: &'static [&'static str],
    columns: &'static [&'static str],
    /// `(field, descending)` applied when serving rows.
    order_by: (&'static str, bool),
    /// Primary-key fields assigned by the store on insert.
    auto: &'static [&'static str],
}

fn table_meta(source: &str) -> Option<&'static TableMeta> {
    match source {
        "products" => Some(&TableMeta {
            primary_key: &["sku"],
            required: &["sku", "name", "category", "unit_price", "inventory", "status"],
            columns: &["sku", "name", "category", "unit_price", "inventory", "status"],
            order_by: ("name", false),
            auto: &[],
        }),
        "sales" => Some(&TableMeta {
            primary_key: &["date"],
            required: &["date", "total", "orders", "avg_order_value", "new_customers"],
            columns: &["date", "total", "orders", "avg_order_value", "new_customers"],
            order_by: ("date", false),
            auto: &[],
        }),
        "customers" => Some(&TableMeta {
            primary_key: &["id"],
            required: &["id", "name", "email", "segment", "city", "country", "lifetime_value", "joined_date"],
            columns: &["id", "name", "email", "segment", "city", "country", "lifetime_value", "joined_date"],
            order_by: ("joined_date", true),
            auto: &[],
        }),
        "orders" => Some(&TableMeta {
            primary_key: &["id"],
            required: &["id", "customer_id", "order_date", "status", "channel", "total"],
            columns: &["id", "customer_id", "order_date", "status", "channel", "total"],
            order_by: ("order_date", true),
            auto: &[],
        }),
        "order_items" => Some(&TableMeta {
            primary_key: &["id"],
            required: &["order_id", "product_sku", "quantity", "unit_price"],
            columns: &["id", "order_id", "product_sku", "quantity", "unit_price"],
            order_by: ("order_id", false),
            auto: &["id"],
        }),
        _ => None,
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Result of a successful insert/update/delete: a human-readable message,
/// the refreshed dataset, and (for insert/update) the affected row.
#[derive(Debug)]
pub struct MutationOutcome {
    pub message: String,
    pub dataset: Vec<Value>,
    pub row: Option<Value>,
}

pub struct RuntimeDb {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    next_item_id: RwLock<i64>,
}

impl RuntimeDb {
    /// Build a store seeded with the sample commerce catalog.
    #[must_use]
    pub fn seeded() -> Self {
        let (orders, order_items) = seed::orders_and_items();
        #[allow(clippy::cast_possible_wrap)]
        let next_item_id = order_items.len() as i64 + 1;

        let mut tables = HashMap::new();
        tables.insert("products".to_string(), seed::products());
        tables.insert("sales".to_string(), seed::sales());
        tables.insert("customers".to_string(), seed::customers());
        tables.insert("orders".to_string(), orders);
        tables.insert("order_items".to_string(), order_items);

        Self { tables: RwLock::new(tables), next_item_id: RwLock::new(next_item_id) }
    }

    /// Rows for a source in its default order. Unknown sources yield an
    /// empty vec. For `sales`, `days` trims to the most recent N days,
    /// returned in chronological order.
    pub async fn rows(&self, source: &str, days: Option<usize>) -> Vec<Value> {
        let source = source.to_lowercase();
        let Some(meta) = table_meta(&source) else {
            return Vec::new();
        };

        let tables = self.tables.read().await;
        let Some(rows) = tables.get(&source) else {
            return Vec::new();
        };

        let mut rows = rows.clone();
        sort_rows(&mut rows, meta.order_by);

        if source == "sales" {
            if let Some(days) = days {
                if days > 0 && rows.len() > days {
                    rows.drain(..rows.len() - days);
                }
            }
        }
        rows
    }

    /// Per-source row counts and field lists, for the model's orientation.
    pub async fn describe_sources(&self) -> Value {
        let tables = self.tables.read().await;
        let mut summary = Map::new();
        for source in SOURCES {
            let rows = tables.get(source).map_or(0, Vec::len);
            let fields = table_meta(source).map_or(&[][..], |meta| meta.columns);
            summary.insert(source.to_string(), json!({"rows": rows, "fields": fields}));
        }
        Value::Object(summary)
    }

    /// Insert a row. Requires every required column; rejects duplicate keys.
    ///
    /// # Errors
    ///
    /// [`DbError::UnknownSource`], [`DbError::MissingFields`], or
    /// [`DbError::DuplicateKey`].
    pub async fn insert_row(&self, source: &str, payload: &Value) -> Result<MutationOutcome, DbError> {
        let source = source.to_lowercase();
        let meta = table_meta(&source).ok_or_else(|| DbError::UnknownSource(source.clone()))?;

        let missing: Vec<String> = meta
            .required
            .iter()
            .filter(|field| field_absent(payload, field))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DbError::MissingFields { source_name: source, fields: missing });
        }

        let mut row = Map::new();
        for column in meta.columns {
            if let Some(value) = payload.get(*column) {
                row.insert((*column).to_string(), value.clone());
            }
        }
        for field in meta.auto {
            if field_absent(payload, field) {
                let mut counter = self.next_item_id.write().await;
                row.insert((*field).to_string(), json!(*counter));
                *counter += 1;
            }
        }
        let row = Value::Object(row);

        {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(source.clone()).or_default();
            if find_by_pk(rows, meta, &row).is_some() {
                return Err(DbError::DuplicateKey(source));
            }
            rows.push(row.clone());
        }

        Ok(MutationOutcome {
            message: format!("Inserted row into '{source}'"),
            dataset: self.rows(&source, None).await,
            row: Some(row),
        })
    }

    /// Update non-key columns of the row matching the payload's primary key.
    ///
    /// # Errors
    ///
    /// [`DbError::UnknownSource`], [`DbError::MissingKeys`],
    /// [`DbError::NoUpdatableFields`], or [`DbError::NoMatch`].
    pub async fn update_row(&self, source: &str, payload: &Value) -> Result<MutationOutcome, DbError> {
        let source = source.to_lowercase();
        let meta = table_meta(&source).ok_or_else(|| DbError::UnknownSource(source.clone()))?;

        let missing_keys: Vec<String> = meta
            .primary_key
            .iter()
            .filter(|field| field_absent(payload, field))
            .map(ToString::to_string)
            .collect();
        if !missing_keys.is_empty() {
            return Err(DbError::MissingKeys { source_name: source, fields: missing_keys });
        }

        let updates: Vec<(&str, Value)> = meta
            .columns
            .iter()
            .filter(|column| !meta.primary_key.contains(column))
            .filter_map(|column| payload.get(*column).map(|v| (*column, v.clone())))
            .collect();
        if updates.is_empty() {
            return Err(DbError::NoUpdatableFields(source));
        }

        let updated = {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(source.clone()).or_default();
            let index = find_by_pk(rows, meta, payload).ok_or_else(|| DbError::NoMatch(source.clone()))?;
            if let Some(obj) = rows[index].as_object_mut() {
                for (column, value) in updates {
                    obj.insert(column.to_string(), value);
                }
            }
            rows[index].clone()
        };

        Ok(MutationOutcome {
            message: format!("Updated row in '{source}'"),
            dataset: self.rows(&source, None).await,
            row: Some(updated),
        })
    }

    /// Delete the row matching the payload's primary key.
    ///
    /// # Errors
    ///
    /// [`DbError::UnknownSource`], [`DbError::MissingKeys`], or
    /// [`DbError::NoMatch`].
    pub async fn delete_row(&self, source: &str, key_fields: &Value) -> Result<MutationOutcome, DbError> {
        let source = source.to_lowercase();
        let meta = table_meta(&source).ok_or_else(|| DbError::UnknownSource(source.clone()))?;

        let missing_keys: Vec<String> = meta
            .primary_key
            .iter()
            .filter(|field| field_absent(key_fields, field))
            .map(ToString::to_string)
            .collect();
        if !missing_keys.is_empty() {
            return Err(DbError::MissingKeys { source_name: source, fields: missing_keys });
        }

        {
            let mut tables = self.tables.write().await;
            let rows = tables.entry(source.clone()).or_default();
            let index = find_by_pk(rows, meta, key_fields).ok_or_else(|| DbError::NoMatch(source.clone()))?;
            rows.remove(index);
        }

        Ok(MutationOutcome {
            message: format!("Deleted row from '{source}'"),
            dataset: self.rows(&source, None).await,
            row: None,
        })
    }

    /// Required columns for a source, for tool error messages.
    #[must_use]
    pub fn required_fields(source: &str) -> Vec<&'static str> {
        table_meta(&source.to_lowercase()).map_or_else(Vec::new, |meta| meta.required.to_vec())
    }

    /// Whether a source name is served by this store.
    #[must_use]
    pub fn is_known_source(source: &str) -> bool {
        table_meta(&source.to_lowercase()).is_some()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn field_absent(payload: &Value, field: &str) -> bool {
    match payload.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn find_by_pk(rows: &[Value], meta: &TableMeta, values: &Value) -> Option<usize> {
    rows.iter().position(|row| {
        meta.primary_key.iter().all(|field| {
            match (row.get(*field), values.get(*field)) {
                (Some(a), Some(b)) => pk_eq(a, b),
                _ => false,
            }
        })
    })
}

/// Key comparison tolerant of string/number mismatches ("1" matches 1),
/// since tool arguments arrive as loosely typed JSON.
fn pk_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => s == &n.to_string(),
        _ => false,
    }
}

fn sort_rows(rows: &mut [Value], (field, descending): (&str, bool)) {
    rows.sort_by(|a, b| {
        let ordering = compare_field(a.get(field), b.get(field));
        if descending { ordering.reverse() } else { ordering }
    });
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
#[path = "db_test.rs"]
mod tests;
