// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Flattened state snapshots and the tolerant field diff.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// Numeric drift below this is not reported as a change.
const NUMERIC_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// A flattened key/value capture of a record.
///
/// Nested objects become dotted keys (`hours.balance`) and array elements
/// are keyed by index (`warnings.0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Captures any serializable record as a flattened snapshot.
    ///
    /// # Arguments
    ///
    /// * `record` - The record to capture
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized to JSON.
    pub fn capture<T: Serialize>(record: &T) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::to_value(record)?;
        let mut fields: BTreeMap<String, Value> = BTreeMap::new();
        flatten(None, value, &mut fields);
        Ok(Self { fields })
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the number of captured fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the captured fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

fn flatten(prefix: Option<&str>, value: Value, out: &mut BTreeMap<String, Value>) {
    let key_for = |segment: &str| -> String {
        prefix.map_or_else(|| segment.to_string(), |p| format!("{p}.{segment}"))
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (segment, nested) in map {
                flatten(Some(&key_for(&segment)), nested, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (idx, nested) in items.into_iter().enumerate() {
                flatten(Some(&key_for(&idx.to_string())), nested, out);
            }
        }
        other => {
            out.insert(prefix.unwrap_or("value").to_string(), other);
        }
    }
}

/// One field whose value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    /// The flattened field key.
    pub field: String,
    /// The earlier value.
    pub before: Value,
    /// The later value.
    pub after: Value,
}

/// Differences between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    /// Fields only present in the later snapshot.
    pub added: BTreeMap<String, Value>,
    /// Fields only present in the earlier snapshot.
    pub removed: BTreeMap<String, Value>,
    /// Fields present in both with different values.
    pub changed: Vec<FieldChange>,
}

impl SnapshotDiff {
    /// Returns true if the snapshots are equivalent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Returns true if `field` was added, removed or changed.
    #[must_use]
    pub fn touches(&self, field: &str) -> bool {
        self.added.contains_key(field)
            || self.removed.contains_key(field)
            || self.changed.iter().any(|c| c.field == field)
    }
}

/// Compares two snapshots field by field.
///
/// Null, a missing key and the empty string are treated as the same absent
/// value. Numbers and numeric strings are equal when they differ by no more
/// than 0.01.
#[must_use]
pub fn diff(before: &Snapshot, after: &Snapshot) -> SnapshotDiff {
    let keys: BTreeSet<&String> = before.fields.keys().chain(after.fields.keys()).collect();
    let mut result: SnapshotDiff = SnapshotDiff::default();

    for key in keys {
        let old: Option<&Value> = before.fields.get(key).filter(|v| !is_blank(v));
        let new: Option<&Value> = after.fields.get(key).filter(|v| !is_blank(v));

        match (old, new) {
            (None, None) => {}
            (None, Some(new)) => {
                result.added.insert(key.clone(), new.clone());
            }
            (Some(old), None) => {
                result.removed.insert(key.clone(), old.clone());
            }
            (Some(old), Some(new)) => {
                if !equivalent(old, new) {
                    result.changed.push(FieldChange {
                        field: key.clone(),
                        before: old.clone(),
                        after: new.clone(),
                    });
                }
            }
        }
    }

    result
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn equivalent(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (as_decimal(a), as_decimal(b)) {
        (Some(x), Some(y)) => (x - y).abs() <= NUMERIC_TOLERANCE,
        _ => false,
    }
}
