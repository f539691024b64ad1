//! In-memory tabular dataset abstraction.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// One survey row: field name to value.
pub type Record = BTreeMap<String, Value>;

static MISSING: Value = Value::Null;

/// An ordered collection of records with a known column set.
///
/// The column set is the dataset's schema. It survives filtering, so a
/// dataset with every row filtered out still knows which fields exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Record>", into = "Vec<Record>")]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset with an explicit column order.
    #[must_use]
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Create a dataset whose columns are every field seen in `records`,
    /// in first-seen order.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in &records {
            for field in record.keys() {
                if seen.insert(field.as_str()) {
                    columns.push(field.clone());
                }
            }
        }
        Self { columns, records }
    }

    /// Column names in schema order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Values of one field across every record; absent cells read as null.
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.records
            .iter()
            .map(move |record| record.get(name).unwrap_or(&MISSING))
    }

    /// Numeric readings of one field, skipping values with no numeric reading.
    #[must_use]
    pub fn numeric_column(&self, name: &str) -> Vec<f64> {
        self.column(name).filter_map(Value::as_number).collect()
    }

    /// A new dataset with the same schema holding only matching records.
    #[must_use]
    pub fn retain(&self, mut keep: impl FnMut(&Record) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Self::from_records(records)
    }
}

impl From<Dataset> for Vec<Record> {
    fn from(dataset: Dataset) -> Self {
        dataset.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn from_records_collects_union_of_fields() {
        let dataset = Dataset::from_records(vec![
            record(&[("a", Value::from(1.0))]),
            record(&[("a", Value::from(2.0)), ("b", Value::from("x"))]),
        ]);

        assert_eq!(dataset.columns(), ["a".to_string(), "b".to_string()]);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn column_reads_absent_cells_as_null() {
        let dataset = Dataset::from_records(vec![
            record(&[("a", Value::from(1.0))]),
            record(&[("b", Value::from("x"))]),
        ]);

        let values: Vec<&Value> = dataset.column("a").collect();

        assert_eq!(values, vec![&Value::Number(1.0), &Value::Null]);
    }

    #[test]
    fn retain_keeps_schema_when_everything_is_removed() {
        let dataset = Dataset::from_records(vec![record(&[("a", Value::from(1.0))])]);

        let empty = dataset.retain(|_| false);

        assert!(empty.is_empty());
        assert!(empty.has_column("a"));
    }

    #[test]
    fn deserializes_from_json_array_of_records() {
        let dataset: Dataset =
            serde_json::from_str(r#"[{"Student ID": 1, "region": "North"}, {"region": null}]"#)
                .unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.has_column("Student ID"));
        assert!(dataset.has_column("region"));
    }
}
