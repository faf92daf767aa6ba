//! View configuration.
//!
//! A [`ViewConfig`] is everything a screen's controls contribute to a view:
//! the search box, the category dropdowns, the clicked column header, the
//! extra toggles and the page window. Configs are only obtainable by
//! validating a [`ViewConfigBuilder`] against a [`Schema`]. Each config
//! remembers that schema, and the engine refuses to run it against another.

use crate::{error::Result, Error, FieldName, Predicate, Schema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Sort directive: one field, one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: FieldName,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<FieldName>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<FieldName>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<FieldName>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// Selected value of a categorical filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterValue {
    /// No constraint
    All,
    /// Field must equal this value
    Is(Value),
}

impl FilterValue {
    pub fn is_all(&self) -> bool {
        matches!(self, FilterValue::All)
    }
}

/// Page window over the sorted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// The first `limit` rows.
    pub fn first(limit: usize) -> Self {
        Self::new(0, limit)
    }

    /// The page following this one.
    pub fn next(self) -> Self {
        Self::new(self.offset.saturating_add(self.limit), self.limit)
    }
}

/// Free-text search settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Search {
    term: String,
    fields: BTreeSet<FieldName>,
}

/// Unvalidated view configuration.
///
/// Also the deserialization shape of a config: `ViewConfig::from_json`
/// parses into a builder and validates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfigBuilder {
    search_term: String,
    /// `None` searches every field the schema marks searchable
    search_fields: Option<BTreeSet<FieldName>>,
    filters: BTreeMap<FieldName, FilterValue>,
    /// `None` sorts ascending by the schema's id field
    sort: Option<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    predicate: Option<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<Page>,
}

impl ViewConfigBuilder {
    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Restrict search to `fields`.
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldName>,
    {
        self.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Require `field` to equal `value`.
    pub fn filter(mut self, field: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        self.filters
            .insert(field.into(), FilterValue::Is(value.into()));
        self
    }

    /// Set a filter explicitly, including `FilterValue::All`.
    pub fn filter_value(mut self, field: impl Into<FieldName>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn sort_by(self, field: impl Into<FieldName>, direction: SortDirection) -> Self {
        self.sort(SortSpec::new(field, direction))
    }

    /// Add a predicate; repeated calls combine under logical AND.
    pub fn predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// Validate against `schema` and produce a config.
    pub fn build(self, schema: &Schema) -> Result<ViewConfig> {
        self.resolve(schema).inspect_err(|error| {
            tracing::warn!(schema = %schema.name, %error, "rejected view config");
        })
    }

    fn resolve(self, schema: &Schema) -> Result<ViewConfig> {
        let search_fields = match self.search_fields {
            Some(fields) => {
                for name in &fields {
                    let def = schema.require(name, "search")?;
                    if !def.searchable {
                        return Err(Error::FieldNotSearchable(name.clone()));
                    }
                }
                fields
            }
            None => schema.searchable_fields().map(str::to_string).collect(),
        };

        for (name, value) in &self.filters {
            let def = schema.require(name, "filter")?;
            match value {
                FilterValue::All if def.filterable => {}
                FilterValue::All => return Err(Error::FieldNotFilterable(name.clone())),
                FilterValue::Is(v) => def.validate_filter_value(v)?,
            }
        }

        let sort = self
            .sort
            .unwrap_or_else(|| SortSpec::asc(schema.id_field.clone()));
        let sort_def = schema.require(&sort.field, "sort")?;
        if !sort_def.sortable {
            return Err(Error::InvalidSortField(sort.field));
        }

        if let Some(predicate) = &self.predicate {
            predicate.validate(schema)?;
        }

        if let Some(page) = &self.page {
            if page.limit == 0 {
                return Err(Error::InvalidConfig("page limit must be positive".into()));
            }
        }

        Ok(ViewConfig {
            schema: Arc::new(schema.clone()),
            search: Search {
                term: self.search_term,
                fields: search_fields,
            },
            filters: self.filters,
            sort,
            predicate: self.predicate,
            page: self.page,
        })
    }
}

/// A validated view configuration.
///
/// Serializes in the same shape [`ViewConfig::from_json`] reads.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Schema the config was validated against
    schema: Arc<Schema>,
    search: Search,
    filters: BTreeMap<FieldName, FilterValue>,
    sort: SortSpec,
    predicate: Option<Predicate>,
    page: Option<Page>,
}

impl ViewConfig {
    /// Start building a config.
    pub fn builder() -> ViewConfigBuilder {
        ViewConfigBuilder::default()
    }

    /// The default view of a schema: everything, sorted by id.
    pub fn default_for(schema: &Schema) -> Result<Self> {
        Self::builder().build(schema)
    }

    /// Parse and validate a config from JSON.
    pub fn from_json(schema: &Schema, json: &str) -> Result<Self> {
        let builder: ViewConfigBuilder =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        builder.build(schema)
    }

    /// Serialize to JSON. Fails when the config carries a custom predicate.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Return to the unvalidated form, e.g. to edit several settings at once.
    pub fn to_builder(&self) -> ViewConfigBuilder {
        ViewConfigBuilder {
            search_term: self.search.term.clone(),
            search_fields: Some(self.search.fields.clone()),
            filters: self.filters.clone(),
            sort: Some(self.sort.clone()),
            predicate: self.predicate.clone(),
            page: self.page,
        }
    }

    /// The schema this config was validated against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Fail with `SchemaMismatch` unless `schema` is the one this config was
    /// validated against.
    pub fn ensure_schema(&self, schema: &Schema) -> Result<()> {
        if *self.schema == *schema {
            return Ok(());
        }
        let field = self
            .referenced_fields()
            .find(|field| !schema.contains(field))
            .unwrap_or(&self.sort.field);
        Err(Error::mismatch(
            field.clone(),
            format!("view config built for schema '{}'", self.schema.name),
        ))
    }

    fn referenced_fields(&self) -> impl Iterator<Item = &FieldName> {
        std::iter::once(&self.sort.field)
            .chain(&self.search.fields)
            .chain(self.filters.keys())
    }

    pub fn search_term(&self) -> &str {
        &self.search.term
    }

    pub fn search_fields(&self) -> &BTreeSet<FieldName> {
        &self.search.fields
    }

    pub fn filters(&self) -> &BTreeMap<FieldName, FilterValue> {
        &self.filters
    }

    /// Active (non-`All`) filters.
    pub fn active_filters(&self) -> impl Iterator<Item = (&FieldName, &Value)> {
        self.filters.iter().filter_map(|(field, value)| match value {
            FilterValue::Is(v) => Some((field, v)),
            FilterValue::All => None,
        })
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn page(&self) -> Option<Page> {
        self.page
    }

    /// Column-header click: flip the direction when `field` is already the
    /// sort field, otherwise sort ascending by `field`.
    pub fn request_sort(&self, schema: &Schema, field: &str) -> Result<ViewConfig> {
        self.ensure_schema(schema)?;
        match schema.field(field) {
            Some(def) if def.sortable => {}
            _ => {
                tracing::warn!(schema = %schema.name, field, "sort requested on invalid field");
                return Err(Error::InvalidSortField(field.to_string()));
            }
        }

        let sort = if self.sort.field == field {
            SortSpec::new(field, self.sort.direction.flipped())
        } else {
            SortSpec::asc(field)
        };

        Ok(ViewConfig {
            sort,
            ..self.clone()
        })
    }

    /// Replace the search term. Any term is valid.
    pub fn with_search_term(&self, term: impl Into<String>) -> ViewConfig {
        ViewConfig {
            search: Search {
                term: term.into(),
                fields: self.search.fields.clone(),
            },
            ..self.clone()
        }
    }

    /// Replace one filter.
    pub fn with_filter(
        &self,
        schema: &Schema,
        field: &str,
        value: FilterValue,
    ) -> Result<ViewConfig> {
        self.to_builder().filter_value(field, value).build(schema)
    }

    /// Replace the predicate; `None` clears it.
    pub fn with_predicate(
        &self,
        schema: &Schema,
        predicate: Option<Predicate>,
    ) -> Result<ViewConfig> {
        let mut builder = self.to_builder();
        builder.predicate = predicate;
        builder.build(schema)
    }

    /// Replace the page window; `None` shows every row.
    pub fn with_page(&self, schema: &Schema, page: Option<Page>) -> Result<ViewConfig> {
        let mut builder = self.to_builder();
        builder.page = page;
        builder.build(schema)
    }
}

impl Serialize for ViewConfig {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_builder().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldDef;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new("inventory", "id")
            .with_field(FieldDef::number("id"))
            .with_field(FieldDef::text("name"))
            .with_field(FieldDef::text("sku"))
            .with_field(FieldDef::text("supplier").not_searchable())
            .with_field(FieldDef::enumeration("category", ["Audio", "Lighting"]))
            .with_field(FieldDef::number("stock"))
            .with_field(FieldDef::text("notes").not_sortable())
    }

    #[test]
    fn defaults_come_from_schema() {
        let config = ViewConfig::default_for(&schema()).unwrap();

        assert_eq!(config.search_term(), "");
        let fields: Vec<_> = config.search_fields().iter().map(String::as_str).collect();
        assert_eq!(fields, vec!["name", "notes", "sku"]);
        assert_eq!(config.sort(), &SortSpec::asc("id"));
        assert!(config.predicate().is_none());
        assert!(config.page().is_none());
    }

    #[test]
    fn unknown_fields_are_schema_mismatches() {
        let s = schema();

        let result = ViewConfig::builder().search_fields(["email"]).build(&s);
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "email"));

        let result = ViewConfig::builder().filter("colour", "red").build(&s);
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "colour"));

        let result = ViewConfig::builder().sort(SortSpec::asc("price")).build(&s);
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "price"));

        let result = ViewConfig::builder()
            .predicate(Predicate::lt("price", 10))
            .build(&s);
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "price"));
    }

    #[test]
    fn role_violations_are_rejected() {
        let s = schema();

        let result = ViewConfig::builder().search_fields(["supplier"]).build(&s);
        assert!(matches!(result, Err(Error::FieldNotSearchable(_))));

        let result = ViewConfig::builder().filter("stock", 4).build(&s);
        assert!(matches!(result, Err(Error::FieldNotFilterable(_))));

        let result = ViewConfig::builder().filter("category", "Gadgets").build(&s);
        assert!(matches!(result, Err(Error::InvalidFilterValue { .. })));

        let result = ViewConfig::builder().sort(SortSpec::asc("notes")).build(&s);
        assert!(matches!(result, Err(Error::InvalidSortField(f)) if f == "notes"));

        let result = ViewConfig::builder().page(Page::first(0)).build(&s);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn request_sort_toggles() {
        let s = schema();
        let config = ViewConfig::builder()
            .sort(SortSpec::asc("name"))
            .build(&s)
            .unwrap();

        let flipped = config.request_sort(&s, "name").unwrap();
        assert_eq!(flipped.sort(), &SortSpec::desc("name"));

        let back = flipped.request_sort(&s, "name").unwrap();
        assert_eq!(back.sort(), &SortSpec::asc("name"));

        let other = flipped.request_sort(&s, "stock").unwrap();
        assert_eq!(other.sort(), &SortSpec::asc("stock"));
    }

    #[test]
    fn request_sort_rejects_invalid_fields() {
        let s = schema();
        let config = ViewConfig::default_for(&s).unwrap();

        let result = config.request_sort(&s, "price");
        assert!(matches!(result, Err(Error::InvalidSortField(f)) if f == "price"));

        let result = config.request_sort(&s, "notes");
        assert!(matches!(result, Err(Error::InvalidSortField(_))));

        assert_eq!(config.sort(), &SortSpec::asc("id"));
    }

    #[test]
    fn configs_are_tied_to_their_schema() {
        let s = schema();
        let config = ViewConfig::builder()
            .sort(SortSpec::asc("stock"))
            .build(&s)
            .unwrap();
        assert_eq!(config.schema(), &s);
        assert!(config.ensure_schema(&s).is_ok());

        let other = Schema::new("customers", "id")
            .with_field(FieldDef::text("id"))
            .with_field(FieldDef::text("name"));
        let result = config.ensure_schema(&other);
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "stock"));

        let result = config.request_sort(&other, "name");
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));

        // Same name, different fields
        let changed = schema().with_field(FieldDef::text("stock"));
        assert!(config.ensure_schema(&changed).is_err());
    }

    #[test]
    fn repeated_predicates_are_anded() {
        let s = schema();
        let config = ViewConfig::builder()
            .predicate(Predicate::lt("stock", 10))
            .predicate(Predicate::gt("stock", 2))
            .build(&s)
            .unwrap();

        assert!(matches!(
            config.predicate(),
            Some(Predicate::All { predicates }) if predicates.len() == 2
        ));
    }

    #[test]
    fn active_filters_skip_all() {
        let s = schema();
        let config = ViewConfig::builder()
            .filter_value("category", FilterValue::All)
            .build(&s)
            .unwrap();
        assert_eq!(config.active_filters().count(), 0);

        let config = config
            .with_filter(&s, "category", FilterValue::Is(json!("Audio")))
            .unwrap();
        let active: Vec<_> = config.active_filters().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].1, &json!("Audio"));
    }

    #[test]
    fn with_helpers_keep_other_settings() {
        let s = schema();
        let config = ViewConfig::builder()
            .search_term("usb")
            .sort(SortSpec::desc("stock"))
            .build(&s)
            .unwrap();

        let paged = config.with_page(&s, Some(Page::first(5))).unwrap();
        assert_eq!(paged.search_term(), "usb");
        assert_eq!(paged.sort(), &SortSpec::desc("stock"));
        assert_eq!(paged.page(), Some(Page::first(5)));

        let searched = paged.with_search_term("cable");
        assert_eq!(searched.search_term(), "cable");
        assert_eq!(searched.page(), Some(Page::first(5)));

        let cleared = searched
            .with_predicate(&s, Some(Predicate::lt("stock", 10)))
            .unwrap()
            .with_predicate(&s, None)
            .unwrap();
        assert!(cleared.predicate().is_none());
    }

    #[test]
    fn json_roundtrip_validates() {
        let s = schema();
        let config = ViewConfig::builder()
            .search_term("bulb")
            .filter("category", "Lighting")
            .sort(SortSpec::desc("stock"))
            .predicate(Predicate::lt("stock", 200))
            .page(Page::first(10))
            .build(&s)
            .unwrap();

        let json = config.to_json().unwrap();
        let parsed = ViewConfig::from_json(&s, &json).unwrap();
        assert_eq!(config, parsed);

        let bad = r#"{"sort": {"field": "price", "direction": "asc"}}"#;
        assert!(matches!(
            ViewConfig::from_json(&s, bad),
            Err(Error::SchemaMismatch { .. })
        ));

        assert!(matches!(
            ViewConfig::from_json(&s, "not json"),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn custom_predicate_configs_do_not_serialize() {
        let s = schema();
        let config = ViewConfig::builder()
            .predicate(Predicate::custom(|_| true))
            .build(&s)
            .unwrap();

        assert!(matches!(config.to_json(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn page_navigation() {
        let page = Page::first(25);
        assert_eq!(page.next(), Page::new(25, 25));
        assert_eq!(Page::new(usize::MAX, 1).next().offset, usize::MAX);
    }

    #[test]
    fn direction_helpers() {
        assert_eq!(SortDirection::Asc.flipped(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(SortDirection::Asc.apply(Ordering::Less), Ordering::Less);
    }
}
