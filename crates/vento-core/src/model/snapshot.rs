use std::collections::btree_map;

use chrono::{DateTime, Utc};
use serde::Serialize;

use vento_proto::{ParameterId, ParameterMap, ParameterValue};

/// The decoded parameters of one successful poll cycle.
///
/// Snapshots are immutable; a new cycle publishes a new one. Only ids
/// the device actually returned are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    values: ParameterMap,
    received_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(values: ParameterMap, received_at: DateTime<Utc>) -> Self {
        Self {
            values,
            received_at,
        }
    }

    /// Stamp `values` with the current time.
    pub fn now(values: ParameterMap) -> Self {
        Self::new(values, Utc::now())
    }

    pub fn get(&self, id: ParameterId) -> Option<&ParameterValue> {
        self.values.get(&id)
    }

    pub fn contains(&self, id: ParameterId) -> bool {
        self.values.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> btree_map::Iter<'_, ParameterId, ParameterValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &ParameterMap {
        &self.values
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a ParameterId, &'a ParameterValue);
    type IntoIter = btree_map::Iter<'a, ParameterId, ParameterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
