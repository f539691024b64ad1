//! Grouping of indicator values into row/column cells.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use metrica_formula::finite;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::IndicatorValueRecord;

/// Values sharing one `(row, column)` key, with their totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedCell {
    pub row: String,
    pub column: String,
    pub values: Vec<f64>,
    pub sum: f64,
    pub avg: f64,
    pub count: usize,
}

impl AggregatedCell {
    fn new(row: String, column: String) -> Self {
        Self {
            row,
            column,
            ..Self::default()
        }
    }

    /// Totals that overflow are reported as 0 so cells stay representable
    /// in JSON.
    fn finalize(&mut self) {
        self.count = self.values.len();
        let sum: f64 = self.values.iter().sum();
        let n = self.count as f64;
        let avg = if self.count == 0 {
            0.0
        } else if sum.is_finite() {
            sum / n
        } else {
            self.values.iter().map(|v| v / n).sum()
        };
        if !sum.is_finite() {
            tracing::warn!(row = %self.row, column = %self.column, "cell total overflowed");
        }
        self.sum = finite(sum).unwrap_or(0.0);
        self.avg = finite(avg).unwrap_or(0.0);
    }
}

/// Cells keyed by `row_key + "_" + column_key`, in first-seen order.
///
/// Serialized as a JSON object from cell key to cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    cells: Vec<(String, AggregatedCell)>,
    index: HashMap<String, usize>,
}

impl Aggregation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AggregatedCell> {
        self.index.get(key).map(|&i| &self.cells[i].1)
    }

    /// Cells with their keys, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregatedCell)> {
        self.cells.iter().map(|(key, cell)| (key.as_str(), cell))
    }

    pub fn cells(&self) -> impl Iterator<Item = &AggregatedCell> {
        self.cells.iter().map(|(_, cell)| cell)
    }

    /// Sorted distinct row keys.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        self.cells()
            .map(|c| c.row.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct column keys.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.cells()
            .map(|c| c.column.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn insert(&mut self, key: String, cell: AggregatedCell) {
        match self.index.get(&key) {
            Some(&i) => self.cells[i].1 = cell,
            None => {
                self.index.insert(key.clone(), self.cells.len());
                self.cells.push((key, cell));
            }
        }
    }

    fn entry(&mut self, row: String, column: String) -> &mut AggregatedCell {
        let key = format!("{row}_{column}");
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.cells.len();
                self.index.insert(key.clone(), i);
                self.cells.push((key, AggregatedCell::new(row, column)));
                i
            }
        };
        &mut self.cells[i].1
    }
}

impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, cell) in &self.cells {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Aggregation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AggregationVisitor;

        impl<'de> Visitor<'de> for AggregationVisitor {
            type Value = Aggregation;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of cell keys to aggregated cells")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Aggregation, A::Error> {
                let mut aggregation = Aggregation::new();
                while let Some((key, cell)) = access.next_entry::<String, AggregatedCell>()? {
                    aggregation.insert(key, cell);
                }
                Ok(aggregation)
            }
        }

        deserializer.deserialize_map(AggregationVisitor)
    }
}

/// Join a record's values at `dims` with `_`; missing values contribute "".
#[must_use]
pub fn dimension_key(record: &IndicatorValueRecord, dims: &[String]) -> String {
    dims.iter()
        .map(|dim| record.dimension(dim).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("_")
}

/// Group records into cells by their row and column dimension keys.
#[must_use]
pub fn aggregate(
    records: &[IndicatorValueRecord],
    row_dims: &[String],
    col_dims: &[String],
) -> Aggregation {
    let mut aggregation = Aggregation::new();
    for record in records {
        let row = dimension_key(record, row_dims);
        let column = dimension_key(record, col_dims);
        let cell = aggregation.entry(row, column);
        match finite(record.value) {
            Some(value) => cell.values.push(value),
            None => tracing::warn!(
                indicator = %record.indicator_name,
                period = %record.period,
                "skipping non-finite indicator value"
            ),
        }
    }
    for (_, cell) in &mut aggregation.cells {
        cell.finalize();
    }
    tracing::debug!(
        records = records.len(),
        cells = aggregation.len(),
        "aggregated indicator values"
    );
    aggregation
}
