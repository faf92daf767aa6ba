//! The tabular view engine.
//!
//! [`compute_view`] turns a record snapshot and a validated [`ViewConfig`]
//! into the rows a screen displays and the numbers in its stat cards:
//!
//! 1. free-text search over the configured fields
//! 2. categorical filters
//! 3. the extra predicate
//! 4. summary metrics over everything that matched
//! 5. a stable, type-aware sort on one field
//! 6. the page window
//!
//! Every step is a pure function of its inputs; the snapshot is never
//! mutated and nothing is cached between calls.

use crate::value::{is_blank, loosely_equal, search_text, SortKey};
use crate::{
    error::Result, summary::numeric_value, Error, FieldType, Page, Record, Schema, SortSpec,
    Summary, SummarySpec, ViewConfig, ViewConfigBuilder,
};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;

/// The result of a view computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView<'a> {
    /// Matching records in sort order, limited to the page window
    pub rows: Vec<Cow<'a, Record>>,
    /// Number of matching records before paging
    pub total_matches: usize,
    /// Metrics over all matching records
    pub summary: Summary,
}

impl DerivedView<'_> {
    /// Detach the view from the snapshot it borrows.
    pub fn into_owned(self) -> DerivedView<'static> {
        DerivedView {
            rows: self
                .rows
                .into_iter()
                .map(|row| Cow::Owned(row.into_owned()))
                .collect(),
            total_matches: self.total_matches,
            summary: self.summary,
        }
    }

    /// Ids of the visible rows, in order.
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Compute the derived view of `records`.
///
/// A config that matches nothing yields empty rows and identity-valued
/// metrics. The only failure is a config validated against a different
/// schema, reported as `SchemaMismatch`.
pub fn compute_view<'a>(
    records: &'a [Record],
    schema: &Schema,
    config: &ViewConfig,
    summary: &SummarySpec,
) -> Result<DerivedView<'a>> {
    config.ensure_schema(schema).inspect_err(|error| {
        tracing::warn!(schema = %schema.name, %error, "view config does not fit schema");
    })?;
    let sort_type = schema.require(&config.sort().field, "sort")?.field_type;

    // Blank terms match everything; others match as typed, case-insensitively
    let term = config.search_term();
    let needle = if term.trim().is_empty() {
        String::new()
    } else {
        term.to_lowercase()
    };

    let matches: Vec<&Record> = records
        .iter()
        .filter(|r| matches_search(r, schema, config, &needle))
        .filter(|r| matches_filters(r, schema, config))
        .filter(|r| config.predicate().map_or(true, |p| p.evaluate(schema, r)))
        .collect();

    let metrics = summary.compute(matches.iter().copied(), schema);
    let total_matches = matches.len();
    let sorted = sort_rows(matches, schema, sort_type, config.sort());
    let rows: Vec<Cow<'a, Record>> = paginate(sorted, config.page())
        .into_iter()
        .map(Cow::Borrowed)
        .collect();

    tracing::debug!(
        schema = %schema.name,
        records = records.len(),
        matches = total_matches,
        rows = rows.len(),
        "computed view"
    );

    Ok(DerivedView {
        rows,
        total_matches,
        summary: metrics,
    })
}

/// Column-header click on `field`. See [`ViewConfig::request_sort`].
pub fn request_sort(config: &ViewConfig, schema: &Schema, field: &str) -> Result<ViewConfig> {
    config.request_sort(schema, field)
}

fn matches_search(record: &Record, schema: &Schema, config: &ViewConfig, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    config.search_fields().iter().any(|field| {
        let value = record.field(schema, field);
        search_text(value.as_deref()).is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

fn matches_filters(record: &Record, schema: &Schema, config: &ViewConfig) -> bool {
    config.active_filters().all(|(field, expected)| {
        let actual = record.field(schema, field);
        loosely_equal(actual.as_deref().unwrap_or(&Value::Null), expected)
    })
}

fn sort_rows<'a>(
    rows: Vec<&'a Record>,
    schema: &Schema,
    field_type: FieldType,
    sort: &SortSpec,
) -> Vec<&'a Record> {
    let mut keyed: Vec<(SortKey, &Record)> = rows
        .into_iter()
        .map(|r| {
            let value = r.field(schema, &sort.field);
            (SortKey::new(field_type, value.as_deref()), r)
        })
        .collect();

    // slice::sort_by is stable; ties keep snapshot order in both directions
    keyed.sort_by(|(a, _), (b, _)| sort.direction.apply(a.cmp(b)));
    keyed.into_iter().map(|(_, r)| r).collect()
}

fn paginate<T>(rows: Vec<T>, page: Option<Page>) -> Vec<T> {
    match page {
        Some(page) => rows.into_iter().skip(page.offset).take(page.limit).collect(),
        None => rows,
    }
}

/// Unique non-blank values of `field`, in first-seen order. These are the
/// options of a filter dropdown.
pub fn distinct_values(records: &[Record], schema: &Schema, field: &str) -> Result<Vec<Value>> {
    schema.require(field, "distinct values")?;

    let mut seen = BTreeSet::new();
    let values: Vec<Value> = records
        .iter()
        .filter_map(|r| r.field(schema, field))
        .filter(|v| !is_blank(Some(v.as_ref())))
        .filter(|v| seen.insert(v.to_string()))
        .map(Cow::into_owned)
        .collect();
    Ok(values)
}

/// Per-group total of a numeric field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotal {
    pub key: Value,
    pub total: f64,
    pub count: usize,
}

/// Sum `value_field` per distinct `group_field` value, groups in
/// first-seen order. Records with a blank group value are skipped.
pub fn group_totals<'a, I>(
    rows: I,
    schema: &Schema,
    group_field: &str,
    value_field: &str,
) -> Result<Vec<GroupTotal>>
where
    I: IntoIterator<Item = &'a Record>,
{
    schema.require(group_field, "group")?;
    let value_def = schema.require(value_field, "group total")?;
    if !value_def.field_type.is_numeric() {
        return Err(Error::TypeMismatch {
            field: value_field.to_string(),
            expected: FieldType::Number.to_string(),
            got: value_def.field_type.to_string(),
        });
    }

    let mut groups: Vec<GroupTotal> = Vec::new();
    for record in rows {
        let Some(key) = record
            .field(schema, group_field)
            .filter(|v| !is_blank(Some(v.as_ref())))
        else {
            continue;
        };
        let amount = numeric_value(record, schema, value_field).unwrap_or(0.0);

        match groups.iter_mut().find(|g| loosely_equal(&g.key, &key)) {
            Some(group) => {
                group.total += amount;
                group.count += 1;
            }
            None => groups.push(GroupTotal {
                key: key.into_owned(),
                total: amount,
                count: 1,
            }),
        }
    }
    Ok(groups)
}

/// A schema and its summary metrics: everything one screen needs to derive
/// views from its records.
#[derive(Debug)]
pub struct ViewEngine {
    schema: Schema,
    summary: SummarySpec,
}

impl ViewEngine {
    /// Create an engine, checking the metrics against the schema.
    pub fn new(schema: Schema, summary: SummarySpec) -> Result<Self> {
        summary.validate(&schema)?;
        Ok(Self { schema, summary })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn summary_spec(&self) -> &SummarySpec {
        &self.summary
    }

    /// Validate a config against this engine's schema.
    pub fn configure(&self, builder: ViewConfigBuilder) -> Result<ViewConfig> {
        builder.build(&self.schema)
    }

    pub fn default_config(&self) -> Result<ViewConfig> {
        ViewConfig::default_for(&self.schema)
    }

    pub fn compute_view<'a>(
        &self,
        records: &'a [Record],
        config: &ViewConfig,
    ) -> Result<DerivedView<'a>> {
        compute_view(records, &self.schema, config, &self.summary)
    }

    pub fn request_sort(&self, config: &ViewConfig, field: &str) -> Result<ViewConfig> {
        config.request_sort(&self.schema, field)
    }

    pub fn distinct_values(&self, records: &[Record], field: &str) -> Result<Vec<Value>> {
        distinct_values(records, &self.schema, field)
    }

    pub fn group_totals<'a, I>(
        &self,
        rows: I,
        group_field: &str,
        value_field: &str,
    ) -> Result<Vec<GroupTotal>>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        group_totals(rows, &self.schema, group_field, value_field)
    }
}
