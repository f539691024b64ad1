//! Equality filters applied to a dataset before formula evaluation.

use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::Dataset;
use crate::value::Value;

/// Field name to required value.
pub type FilterCriteria = BTreeMap<String, Value>;

/// Keep only records whose value equals the criterion for every criterion
/// field present in the dataset schema.
///
/// Criteria naming fields the dataset does not have are ignored rather than
/// rejected. Comparison is exact: the text `"1"` does not equal the number
/// `1`. The input dataset is left untouched.
#[must_use]
pub fn apply_filters(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    let active: Vec<(&str, &Value)> = criteria
        .iter()
        .filter(|(field, _)| {
            let known = dataset.has_column(field);
            if !known {
                debug!(field = %field, "ignoring filter on unknown field");
            }
            known
        })
        .map(|(field, value)| (field.as_str(), value))
        .collect();

    if active.is_empty() {
        return dataset.clone();
    }

    dataset.retain(|record| {
        active
            .iter()
            .all(|(field, expected)| record.get(*field).unwrap_or(&Value::Null) == *expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn survey() -> Dataset {
        let rows = [("North", 1.0), ("South", 2.0), ("North", 3.0)];
        Dataset::from_records(
            rows.iter()
                .map(|(region, score)| {
                    Record::from([
                        ("region".to_string(), Value::from(*region)),
                        ("score".to_string(), Value::from(*score)),
                    ])
                })
                .collect(),
        )
    }

    #[test]
    fn keeps_matching_records() {
        let criteria = FilterCriteria::from([("region".to_string(), Value::from("North"))]);

        let filtered = apply_filters(&survey(), &criteria);

        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn combines_criteria_with_and() {
        let criteria = FilterCriteria::from([
            ("region".to_string(), Value::from("North")),
            ("score".to_string(), Value::from(3.0)),
        ]);

        let filtered = apply_filters(&survey(), &criteria);

        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn ignores_fields_not_in_schema() {
        let criteria = FilterCriteria::from([("district".to_string(), Value::from("X"))]);

        let filtered = apply_filters(&survey(), &criteria);

        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn compares_without_type_coercion() {
        let criteria = FilterCriteria::from([("score".to_string(), Value::from("1"))]);

        let filtered = apply_filters(&survey(), &criteria);

        assert!(filtered.is_empty());
        assert!(filtered.has_column("score"));
    }

    #[test]
    fn does_not_mutate_input() {
        let dataset = survey();
        let criteria = FilterCriteria::from([("region".to_string(), Value::from("South"))]);

        let _ = apply_filters(&dataset, &criteria);

        assert_eq!(dataset.len(), 3);
    }
}
