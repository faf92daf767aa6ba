//! Row predicates.
//!
//! Screens narrow their rows beyond search and categorical filters with
//! bespoke conditions: "low stock only", "unread only", a report date
//! range. [`Predicate`] expresses these as a small declarative tree that can
//! be validated against a [`Schema`] and serialized with the rest of a view
//! config. Conditions that cannot be expressed declaratively go through
//! [`Predicate::custom`].

use crate::value::{describe, is_blank, SortKey};
use crate::{error::Result, Error, FieldName, FieldType, Record, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Comparison operators for [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }
}

/// Caller-supplied record test.
#[derive(Clone)]
pub struct CustomPredicate(Arc<dyn Fn(&Record) -> bool + Send + Sync>);

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPredicate(..)")
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A condition on a single record.
///
/// `Compare` and `Between` are false when the field is blank on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Predicate {
    Compare {
        field: FieldName,
        op: CompareOp,
        value: Value,
    },
    /// Inclusive range
    Between {
        field: FieldName,
        min: Value,
        max: Value,
    },
    IsTrue {
        field: FieldName,
    },
    IsFalse {
        field: FieldName,
    },
    /// Field holds a non-blank value
    IsSet {
        field: FieldName,
    },
    /// Logical AND; empty is true
    All {
        predicates: Vec<Predicate>,
    },
    /// Logical OR; empty is false
    Any {
        predicates: Vec<Predicate>,
    },
    Not {
        predicate: Box<Predicate>,
    },
    #[serde(skip)]
    Custom(CustomPredicate),
}

impl Predicate {
    pub fn compare(field: impl Into<FieldName>, op: CompareOp, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn equals(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn not_equals(field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn between(
        field: impl Into<FieldName>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        Predicate::Between {
            field: field.into(),
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn is_true(field: impl Into<FieldName>) -> Self {
        Predicate::IsTrue {
            field: field.into(),
        }
    }

    pub fn is_false(field: impl Into<FieldName>) -> Self {
        Predicate::IsFalse {
            field: field.into(),
        }
    }

    pub fn is_set(field: impl Into<FieldName>) -> Self {
        Predicate::IsSet {
            field: field.into(),
        }
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All {
            predicates: predicates.into_iter().collect(),
        }
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any {
            predicates: predicates.into_iter().collect(),
        }
    }

    pub fn negate(predicate: Predicate) -> Self {
        Predicate::Not {
            predicate: Box::new(predicate),
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(CustomPredicate(Arc::new(f)))
    }

    /// Combine with another predicate under logical AND, flattening into an
    /// existing `All`.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All { mut predicates } => {
                predicates.push(other);
                Predicate::All { predicates }
            }
            first => Predicate::all([first, other]),
        }
    }

    /// Check every field reference and literal against the schema.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        match self {
            Predicate::Compare { field, value, .. } => {
                let def = schema.require(field, "predicate")?;
                check_literal(field, def.field_type, value)
            }
            Predicate::Between { field, min, max } => {
                let def = schema.require(field, "predicate")?;
                check_literal(field, def.field_type, min)?;
                check_literal(field, def.field_type, max)
            }
            Predicate::IsTrue { field } | Predicate::IsFalse { field } => {
                let def = schema.require(field, "predicate")?;
                if def.field_type != FieldType::Bool {
                    return Err(Error::TypeMismatch {
                        field: field.clone(),
                        expected: FieldType::Bool.to_string(),
                        got: def.field_type.to_string(),
                    });
                }
                Ok(())
            }
            Predicate::IsSet { field } => schema.require(field, "predicate").map(|_| ()),
            Predicate::All { predicates } | Predicate::Any { predicates } => {
                predicates.iter().try_for_each(|p| p.validate(schema))
            }
            Predicate::Not { predicate } => predicate.validate(schema),
            Predicate::Custom(_) => Ok(()),
        }
    }

    /// Evaluate against a record. Comparisons on fields the schema does not
    /// declare are false.
    pub fn evaluate(&self, schema: &Schema, record: &Record) -> bool {
        match self {
            Predicate::Compare { field, op, value } => {
                compare_field(schema, record, field, value).is_some_and(|ord| op.holds(ord))
            }
            Predicate::Between { field, min, max } => {
                let above = compare_field(schema, record, field, min)
                    .is_some_and(|ord| ord != Ordering::Less);
                above
                    && compare_field(schema, record, field, max)
                        .is_some_and(|ord| ord != Ordering::Greater)
            }
            Predicate::IsTrue { field } => {
                record.field(schema, field).as_deref() == Some(&Value::Bool(true))
            }
            Predicate::IsFalse { field } => {
                record.field(schema, field).as_deref() == Some(&Value::Bool(false))
            }
            Predicate::IsSet { field } => !is_blank(record.field(schema, field).as_deref()),
            Predicate::All { predicates } => predicates.iter().all(|p| p.evaluate(schema, record)),
            Predicate::Any { predicates } => predicates.iter().any(|p| p.evaluate(schema, record)),
            Predicate::Not { predicate } => !predicate.evaluate(schema, record),
            Predicate::Custom(CustomPredicate(f)) => f(record),
        }
    }
}

fn check_literal(field: &str, field_type: FieldType, literal: &Value) -> Result<()> {
    let key = SortKey::new(field_type, Some(literal));
    let fits = match field_type {
        FieldType::Number | FieldType::Currency => matches!(key, SortKey::Number(_)),
        FieldType::Date => matches!(key, SortKey::Date(_)),
        FieldType::Bool => matches!(key, SortKey::Bool(_)),
        FieldType::Text | FieldType::Enum => matches!(key, SortKey::Text(_)),
    };

    if fits {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            field: field.to_string(),
            expected: field_type.to_string(),
            got: describe(literal),
        })
    }
}

fn compare_field(schema: &Schema, record: &Record, field: &str, literal: &Value) -> Option<Ordering> {
    let field_type = schema.field(field)?.field_type;
    let actual = SortKey::new(field_type, record.field(schema, field).as_deref());
    let expected = SortKey::new(field_type, Some(literal));
    actual.compare_same_kind(&expected)
}
