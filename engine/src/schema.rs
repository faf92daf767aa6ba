//! Schema definition and validation.
//!
//! A schema declares the fields of one record collection: their semantic
//! type and which view roles (sort, filter, search) they may play. Configs,
//! predicates and metrics are checked against it before any view is computed.

use crate::value::{describe, parse_date};
use crate::{error::Result, Error, FieldName, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    /// Numeric amount; compares like `Number`
    Currency,
    /// ISO-8601 date or date-time string
    Date,
    /// One of a fixed set of string variants
    Enum,
    Bool,
}

impl FieldType {
    /// Whether values of this type compare numerically.
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "Text"),
            FieldType::Number => write!(f, "Number"),
            FieldType::Currency => write!(f, "Currency"),
            FieldType::Date => write!(f, "Date"),
            FieldType::Enum => write!(f, "Enum"),
            FieldType::Bool => write!(f, "Bool"),
        }
    }
}

/// Definition of a field in a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name
    pub name: FieldName,
    /// Field type
    pub field_type: FieldType,
    /// Whether the field may be used as a sort key
    pub sortable: bool,
    /// Whether the field may carry a categorical filter
    pub filterable: bool,
    /// Whether the field participates in free-text search
    pub searchable: bool,
    /// Whether records must carry a non-null value
    pub required: bool,
    /// Allowed values for `Enum` fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl FieldDef {
    fn with_type(name: impl Into<FieldName>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            sortable: true,
            filterable: matches!(field_type, FieldType::Enum | FieldType::Bool),
            searchable: field_type == FieldType::Text,
            required: true,
            variants: Vec::new(),
        }
    }

    /// Free text; searchable by default.
    pub fn text(name: impl Into<FieldName>) -> Self {
        Self::with_type(name, FieldType::Text)
    }

    pub fn number(name: impl Into<FieldName>) -> Self {
        Self::with_type(name, FieldType::Number)
    }

    pub fn currency(name: impl Into<FieldName>) -> Self {
        Self::with_type(name, FieldType::Currency)
    }

    pub fn date(name: impl Into<FieldName>) -> Self {
        Self::with_type(name, FieldType::Date)
    }

    pub fn boolean(name: impl Into<FieldName>) -> Self {
        Self::with_type(name, FieldType::Bool)
    }

    /// Categorical field restricted to `variants`; filterable by default.
    pub fn enumeration<I, S>(name: impl Into<FieldName>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut def = Self::with_type(name, FieldType::Enum);
        def.variants = variants.into_iter().map(Into::into).collect();
        def
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn not_sortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Allow the field to be absent or null.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Validate a JSON value against this field definition.
    pub fn validate(&self, value: Option<&Value>) -> Result<()> {
        match value {
            None | Some(Value::Null) if self.required => {
                Err(Error::MissingRequiredField(self.name.clone()))
            }
            None | Some(Value::Null) => Ok(()),
            // Entry forms leave optional fields blank
            Some(Value::String(s)) if !self.required && s.is_empty() => Ok(()),
            Some(v) => self.validate_type(v),
        }
    }

    fn validate_type(&self, value: &Value) -> Result<()> {
        let valid = match self.field_type {
            FieldType::Text => value.is_string(),
            FieldType::Number | FieldType::Currency => value.is_number(),
            FieldType::Date => value.as_str().and_then(parse_date).is_some(),
            FieldType::Enum => value.as_str().is_some_and(|s| self.allows_variant(s)),
            FieldType::Bool => value.is_boolean(),
        };

        if valid {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                field: self.name.clone(),
                expected: self.field_type.to_string(),
                got: describe(value),
            })
        }
    }

    /// Check that `value` is something a categorical filter on this field
    /// could ever match.
    pub fn validate_filter_value(&self, value: &Value) -> Result<()> {
        if !self.filterable {
            return Err(Error::FieldNotFilterable(self.name.clone()));
        }
        if value.is_null() || self.validate_type(value).is_ok() {
            Ok(())
        } else {
            Err(Error::InvalidFilterValue {
                field: self.name.clone(),
                value: value.to_string(),
            })
        }
    }

    fn allows_variant(&self, candidate: &str) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v == candidate)
    }
}

/// Schema for one record collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Collection name, used in logs
    pub name: String,
    /// Payload field holding the stable record identifier
    pub id_field: FieldName,
    /// Field definitions in declaration order
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new(name: impl Into<String>, id_field: impl Into<FieldName>) -> Self {
        Self {
            name: name.into(),
            id_field: id_field.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, replacing any earlier definition with the same name.
    pub fn add_field(&mut self, field: FieldDef) -> &mut Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Builder-style method to add a field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.add_field(field);
        self
    }

    /// Get a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a field definition, reporting a schema mismatch for `context`
    /// when it is not declared.
    pub fn require(&self, name: &str, context: &str) -> Result<&FieldDef> {
        self.field(name).ok_or_else(|| Error::mismatch(name, context))
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Names of fields flagged searchable, in declaration order.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.searchable)
            .map(|f| f.name.as_str())
    }

    /// Validate a record against this schema.
    pub fn validate_record(&self, record: &Record) -> Result<()> {
        if record.id.is_empty() {
            return Err(Error::MissingRequiredField(self.id_field.clone()));
        }

        let obj = record
            .payload
            .as_object()
            .ok_or_else(|| Error::InvalidPayload("payload must be an object".into()))?;

        for field in &self.fields {
            field.validate(obj.get(&field.name))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_schema() -> Schema {
        Schema::new("products", "id")
            .with_field(FieldDef::number("id"))
            .with_field(FieldDef::text("name"))
            .with_field(FieldDef::enumeration("category", ["Audio", "Lighting"]))
            .with_field(FieldDef::number("stock"))
            .with_field(FieldDef::date("restocked").optional())
    }

    fn record(payload: Value) -> Record {
        Record::new("1", payload)
    }

    #[test]
    fn validate_valid_record() {
        let schema = test_schema();

        let r = record(json!({"id": 1, "name": "Earphones", "category": "Audio", "stock": 9}));
        assert!(schema.validate_record(&r).is_ok());

        let with_optional = record(json!({
            "id": 1, "name": "Earphones", "category": "Audio", "stock": 9,
            "restocked": "2023-10-01"
        }));
        assert!(schema.validate_record(&with_optional).is_ok());
    }

    #[test]
    fn validate_missing_required_field() {
        let schema = test_schema();
        let r = record(json!({"id": 1, "name": "Earphones", "category": "Audio"}));

        let result = schema.validate_record(&r);
        assert!(matches!(result, Err(Error::MissingRequiredField(f)) if f == "stock"));
    }

    #[test]
    fn validate_wrong_type() {
        let schema = test_schema();
        let r = record(json!({"id": 1, "name": "Earphones", "category": "Audio", "stock": "nine"}));

        let result = schema.validate_record(&r);
        assert!(matches!(result, Err(Error::TypeMismatch { field, .. }) if field == "stock"));
    }

    #[test]
    fn validate_unknown_enum_variant() {
        let schema = test_schema();
        let r = record(json!({"id": 1, "name": "Mouse", "category": "Gadgets", "stock": 1}));

        let result = schema.validate_record(&r);
        assert!(matches!(result, Err(Error::TypeMismatch { field, .. }) if field == "category"));
    }

    #[test]
    fn validate_bad_date() {
        let schema = test_schema();
        let r = record(json!({
            "id": 1, "name": "Mouse", "category": "Audio", "stock": 1,
            "restocked": "last tuesday"
        }));

        assert!(schema.validate_record(&r).is_err());
    }

    #[test]
    fn blank_optional_date_is_accepted() {
        let schema = test_schema();
        let r = record(json!({
            "id": 1, "name": "Mouse", "category": "Audio", "stock": 1, "restocked": ""
        }));

        assert!(schema.validate_record(&r).is_ok());
    }

    #[test]
    fn default_roles_follow_type() {
        let schema = test_schema();

        let name = schema.field("name").unwrap();
        assert!(name.searchable && name.sortable && !name.filterable);

        let category = schema.field("category").unwrap();
        assert!(category.filterable && !category.searchable);

        assert_eq!(schema.searchable_fields().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn role_toggles_override_defaults() {
        let notes = FieldDef::text("notes").not_sortable();
        assert!(!notes.sortable);
        assert!(notes.sortable().sortable);

        let stock = FieldDef::number("stock").filterable();
        assert!(stock.filterable);
        assert!(stock.validate_filter_value(&json!(4)).is_ok());

        let sku = FieldDef::text("sku").not_searchable().searchable();
        assert!(sku.searchable);
    }

    #[test]
    fn require_reports_mismatch() {
        let schema = test_schema();
        let result = schema.require("colour", "sort");
        assert!(matches!(result, Err(Error::SchemaMismatch { field, .. }) if field == "colour"));
    }

    #[test]
    fn filter_value_checks() {
        let schema = test_schema();
        let category = schema.field("category").unwrap();

        assert!(category.validate_filter_value(&json!("Audio")).is_ok());
        assert!(matches!(
            category.validate_filter_value(&json!("Gadgets")),
            Err(Error::InvalidFilterValue { .. })
        ));

        let stock = schema.field("stock").unwrap();
        assert!(matches!(
            stock.validate_filter_value(&json!(4)),
            Err(Error::FieldNotFilterable(_))
        ));
    }

    #[test]
    fn add_field_replaces_existing() {
        let mut schema = test_schema();
        schema.add_field(FieldDef::text("stock"));

        assert_eq!(schema.fields.len(), 5);
        assert_eq!(schema.field("stock").unwrap().field_type, FieldType::Text);
    }

    #[test]
    fn schema_serialization() {
        let schema = test_schema();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }
}
