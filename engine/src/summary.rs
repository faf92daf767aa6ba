//! Summary metrics.
//!
//! The engine has no notion of business metrics. Each screen supplies a
//! [`SummarySpec`], a list of named [`Reducer`]s, and the engine folds them
//! over the rows that survived search, filters and predicate.

use crate::value::SortKey;
use crate::{error::Result, Error, FieldName, FieldType, Predicate, Record, Schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metric name → value.
pub type Summary = BTreeMap<String, f64>;

/// A fold from rows to one number.
pub trait Reducer: Send + Sync {
    /// Starting accumulator; also the result over zero rows unless
    /// [`Reducer::finish`] says otherwise.
    fn identity(&self) -> f64;

    /// Fold one record into the accumulator.
    fn step(&self, acc: f64, record: &Record, schema: &Schema) -> f64;

    /// Whether `record` counts towards the `count` handed to
    /// [`Reducer::finish`].
    fn counts(&self, _record: &Record, _schema: &Schema) -> bool {
        true
    }

    /// Turn the final accumulator into the metric value. `count` is the
    /// number of rows [`Reducer::counts`] accepted.
    fn finish(&self, acc: f64, _count: usize) -> f64 {
        acc
    }

    /// Check field references against the schema.
    fn validate(&self, _schema: &Schema) -> Result<()> {
        Ok(())
    }
}

/// Built-in metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Metric {
    /// Number of rows
    Count,
    /// Number of rows satisfying a predicate
    CountWhere { predicate: Predicate },
    Sum { field: FieldName },
    /// Sum of `a * b` per row, e.g. cost × stock
    SumProduct { a: FieldName, b: FieldName },
    /// Mean of a field over rows where it is set; 0 when none are
    Average { field: FieldName },
    /// Smallest value; 0 over zero rows
    Min { field: FieldName },
    /// Largest value; 0 over zero rows
    Max { field: FieldName },
}

impl Metric {
    pub fn count_where(predicate: Predicate) -> Self {
        Metric::CountWhere { predicate }
    }

    pub fn sum(field: impl Into<FieldName>) -> Self {
        Metric::Sum {
            field: field.into(),
        }
    }

    pub fn sum_product(a: impl Into<FieldName>, b: impl Into<FieldName>) -> Self {
        Metric::SumProduct {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn average(field: impl Into<FieldName>) -> Self {
        Metric::Average {
            field: field.into(),
        }
    }

    pub fn min(field: impl Into<FieldName>) -> Self {
        Metric::Min {
            field: field.into(),
        }
    }

    pub fn max(field: impl Into<FieldName>) -> Self {
        Metric::Max {
            field: field.into(),
        }
    }

    fn numeric_fields(&self) -> Vec<&str> {
        match self {
            Metric::Count | Metric::CountWhere { .. } => Vec::new(),
            Metric::Sum { field }
            | Metric::Average { field }
            | Metric::Min { field }
            | Metric::Max { field } => vec![field.as_str()],
            Metric::SumProduct { a, b } => vec![a.as_str(), b.as_str()],
        }
    }
}

/// Numeric value of a field, treating blanks and non-numbers as absent.
pub fn numeric_value(record: &Record, schema: &Schema, field: &str) -> Option<f64> {
    let field_type = schema
        .field(field)
        .map_or(FieldType::Number, |def| def.field_type);
    match SortKey::new(field_type, record.field(schema, field).as_deref()) {
        SortKey::Number(n) => Some(n),
        _ => None,
    }
}

impl Reducer for Metric {
    fn identity(&self) -> f64 {
        match self {
            Metric::Min { .. } => f64::INFINITY,
            Metric::Max { .. } => f64::NEG_INFINITY,
            _ => 0.0,
        }
    }

    fn step(&self, acc: f64, record: &Record, schema: &Schema) -> f64 {
        match self {
            Metric::Count => acc + 1.0,
            Metric::CountWhere { predicate } => {
                if predicate.evaluate(schema, record) {
                    acc + 1.0
                } else {
                    acc
                }
            }
            Metric::Sum { field } | Metric::Average { field } => {
                acc + numeric_value(record, schema, field).unwrap_or(0.0)
            }
            Metric::SumProduct { a, b } => {
                let product =
                    numeric_value(record, schema, a).zip(numeric_value(record, schema, b));
                acc + product.map_or(0.0, |(x, y)| x * y)
            }
            Metric::Min { field } => {
                numeric_value(record, schema, field).map_or(acc, |n| acc.min(n))
            }
            Metric::Max { field } => {
                numeric_value(record, schema, field).map_or(acc, |n| acc.max(n))
            }
        }
    }

    fn counts(&self, record: &Record, schema: &Schema) -> bool {
        match self {
            Metric::Average { field } => numeric_value(record, schema, field).is_some(),
            _ => true,
        }
    }

    fn finish(&self, acc: f64, count: usize) -> f64 {
        match self {
            Metric::Average { .. } if count == 0 => 0.0,
            Metric::Average { .. } => acc / count as f64,
            Metric::Min { .. } | Metric::Max { .. } if !acc.is_finite() => 0.0,
            _ => acc,
        }
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        if let Metric::CountWhere { predicate } = self {
            return predicate.validate(schema);
        }
        for field in self.numeric_fields() {
            let def = schema.require(field, "metric")?;
            if !def.field_type.is_numeric() {
                return Err(Error::TypeMismatch {
                    field: field.to_string(),
                    expected: FieldType::Number.to_string(),
                    got: def.field_type.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Reducer built from closures.
pub struct FnReducer<F> {
    identity: f64,
    step: F,
}

impl<F> FnReducer<F>
where
    F: Fn(f64, &Record) -> f64 + Send + Sync,
{
    pub fn new(identity: f64, step: F) -> Self {
        Self { identity, step }
    }
}

impl<F> Reducer for FnReducer<F>
where
    F: Fn(f64, &Record) -> f64 + Send + Sync,
{
    fn identity(&self) -> f64 {
        self.identity
    }

    fn step(&self, acc: f64, record: &Record, _schema: &Schema) -> f64 {
        (self.step)(acc, record)
    }
}

/// Ordered, named reducers for one screen.
#[derive(Default)]
pub struct SummarySpec {
    metrics: Vec<(String, Box<dyn Reducer>)>,
}

impl fmt::Debug for SummarySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.metrics.iter().map(|(name, _)| name))
            .finish()
    }
}

impl SummarySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric, replacing any earlier metric of the same name.
    pub fn with(mut self, name: impl Into<String>, reducer: impl Reducer + 'static) -> Self {
        let name = name.into();
        self.metrics.retain(|(existing, _)| *existing != name);
        self.metrics.push((name, Box::new(reducer)));
        self
    }

    /// Metric names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Check every metric against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        self.metrics
            .iter()
            .try_for_each(|(_, reducer)| reducer.validate(schema))
    }

    /// Fold every metric over `rows`.
    pub fn compute<'a, I>(&self, rows: I, schema: &Schema) -> Summary
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut accs: Vec<(f64, usize)> = self
            .metrics
            .iter()
            .map(|(_, r)| (r.identity(), 0))
            .collect();

        for record in rows {
            for ((acc, count), (_, reducer)) in accs.iter_mut().zip(&self.metrics) {
                *acc = reducer.step(*acc, record, schema);
                if reducer.counts(record, schema) {
                    *count += 1;
                }
            }
        }

        self.metrics
            .iter()
            .zip(accs)
            .map(|((name, reducer), (acc, count))| (name.clone(), reducer.finish(acc, count)))
            .collect()
    }
}
