use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{ForecastRecord, TideExtreme};

type Key = (String, DateTime<Utc>);

/// Rows produced by one run, keyed by (spot_id, timestamp).
///
/// Iteration is grouped by spot, then ordered by time. Inserting a row whose
/// key is already present replaces the previous row.
#[derive(Clone, Debug, Default)]
pub struct ForecastTable {
    records: BTreeMap<Key, ForecastRecord>,
    tide_extremes: BTreeMap<Key, TideExtreme>,
}

impl ForecastTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced if the key was taken.
    pub fn insert(&mut self, record: ForecastRecord) -> Option<ForecastRecord> {
        self.records.insert(record.key(), record)
    }

    pub fn insert_tide_extreme(&mut self, extreme: TideExtreme) -> Option<TideExtreme> {
        self.tide_extremes.insert(extreme.key(), extreme)
    }

    /// Move every row of `other` into this table.
    pub fn merge(&mut self, other: ForecastTable) {
        self.records.extend(other.records);
        self.tide_extremes.extend(other.tide_extremes);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ForecastRecord> {
        self.records.values()
    }

    pub fn tide_extremes(&self) -> impl Iterator<Item = &TideExtreme> {
        self.tide_extremes.values()
    }

    pub fn tide_extreme_count(&self) -> usize {
        self.tide_extremes.len()
    }

    pub fn get(&self, spot_id: &str, time: DateTime<Utc>) -> Option<&ForecastRecord> {
        self.records.get(&(spot_id.to_string(), time))
    }

    pub fn for_spot<'a>(&'a self, spot_id: &'a str) -> impl Iterator<Item = &'a ForecastRecord> {
        self.records
            .values()
            .filter(move |record| record.spot_id == spot_id)
    }

    /// Distinct spot ids present in the table, in iteration order.
    pub fn spot_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(|(id, _)| id.as_str()).collect();
        ids.dedup();
        ids
    }
}

impl FromIterator<ForecastRecord> for ForecastTable {
    fn from_iter<I: IntoIterator<Item = ForecastRecord>>(iter: I) -> Self {
        let mut table = ForecastTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}
