//! Collection - host-side ownership of a screen's records.
//!
//! The view engine never stores records. Whoever displays a screen keeps a
//! [`Collection`], mutates it in response to form submissions and delete
//! buttons, and hands [`Collection::snapshot`] to the engine on every render.

use crate::{error::Result, DerivedView, Error, Record, RecordId, Schema, ViewConfig, ViewEngine};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Records of one schema, in insertion order.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Schema,
    records: Vec<Record>,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Create a collection from raw payloads, validating each one.
    pub fn from_payloads<I>(schema: Schema, payloads: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut collection = Self::new(schema);
        for payload in payloads {
            collection.insert_payload(payload)?;
        }
        Ok(collection)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The records as the engine consumes them.
    pub fn snapshot(&self) -> &[Record] {
        &self.records
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record after validating it.
    pub fn insert(&mut self, record: Record) -> Result<()> {
        self.check_id(&record)?;
        self.schema.validate_record(&record)?;
        if self.contains(&record.id) {
            return Err(Error::RecordAlreadyExists(record.id));
        }

        tracing::debug!(collection = %self.schema.name, id = %record.id, "inserted record");
        self.records.push(record);
        Ok(())
    }

    /// Append a record built from `payload`, returning its id.
    pub fn insert_payload(&mut self, payload: Value) -> Result<RecordId> {
        let record = Record::from_payload(&self.schema, payload)?;
        let id = record.id.clone();
        self.insert(record)?;
        Ok(id)
    }

    /// Remove a record, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Record> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        tracing::debug!(collection = %self.schema.name, id, "removed record");
        Ok(self.records.remove(index))
    }

    /// Shallow-merge `patch` into one record. The patched record must still
    /// validate; on failure the collection is unchanged.
    pub fn update(&mut self, id: &str, patch: &Value) -> Result<&Record> {
        self.check_patch(patch)?;
        let index = self
            .position(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;

        let mut updated = self.records[index].clone();
        updated.merge_patch(patch)?;
        self.schema.validate_record(&updated)?;

        self.records[index] = updated;
        Ok(&self.records[index])
    }

    /// Apply `patch` to every record, all or nothing. Returns the number of
    /// records updated.
    pub fn update_all(&mut self, patch: &Value) -> Result<usize> {
        self.check_patch(patch)?;

        let updated = self
            .records
            .iter()
            .map(|record| {
                let mut next = record.clone();
                next.merge_patch(patch)?;
                self.schema.validate_record(&next)?;
                Ok(next)
            })
            .collect::<Result<Vec<_>>>()?;

        self.records = updated;
        Ok(self.records.len())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn check_id(&self, record: &Record) -> Result<()> {
        let declared = match record.get(&self.schema.id_field) {
            None => return Ok(()),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        if declared == record.id {
            Ok(())
        } else {
            Err(Error::InvalidPayload(format!(
                "record id '{}' does not match {} '{}'",
                record.id, self.schema.id_field, declared
            )))
        }
    }

    fn check_patch(&self, patch: &Value) -> Result<()> {
        if patch.get(&self.schema.id_field).is_some() {
            return Err(Error::InvalidPayload(format!(
                "patch may not change {}",
                self.schema.id_field
            )));
        }
        Ok(())
    }
}

/// A [`Collection`] behind a read-write lock, for hosts where writers and
/// renders run on different threads.
#[derive(Debug, Clone)]
pub struct SharedCollection {
    inner: Arc<RwLock<Collection>>,
}

impl SharedCollection {
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Run `f` against a consistent snapshot under one read lock.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&[Record]) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.snapshot())
    }

    /// Compute a view under one read lock. The rows are copied out so the
    /// lock is released before returning.
    pub fn read_view(
        &self,
        engine: &ViewEngine,
        config: &ViewConfig,
    ) -> Result<DerivedView<'static>> {
        self.with_snapshot(|records| Ok(engine.compute_view(records, config)?.into_owned()))
    }

    /// Mutate the collection under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldDef, Metric, Predicate, SummarySpec};
    use serde_json::json;

    fn alert_schema() -> Schema {
        Schema::new("alerts", "id")
            .with_field(FieldDef::text("id").not_searchable())
            .with_field(FieldDef::text("title"))
            .with_field(FieldDef::enumeration("priority", ["high", "medium", "low"]))
            .with_field(FieldDef::boolean("read"))
    }

    fn alerts() -> Collection {
        Collection::from_payloads(
            alert_schema(),
            vec![
                json!({"id": "1", "title": "Low Stock Alert", "priority": "high", "read": false}),
                json!({"id": "2", "title": "New Order Received", "priority": "medium", "read": true}),
                json!({"id": "3", "title": "Special Promotion", "priority": "low", "read": false}),
            ],
        )
        .unwrap()
    }

    #[test]
    fn preserves_insertion_order() {
        let collection = alerts();
        let ids: Vec<_> = collection.snapshot().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn insert_duplicate() {
        let mut collection = alerts();
        let result = collection.insert_payload(
            json!({"id": "2", "title": "Again", "priority": "low", "read": false}),
        );
        assert!(matches!(result, Err(Error::RecordAlreadyExists(id)) if id == "2"));
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn insert_invalid() {
        let mut collection = alerts();
        let result = collection.insert_payload(
            json!({"id": "4", "title": "Bad", "priority": "urgent", "read": false}),
        );
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
        assert!(!collection.contains("4"));
    }

    #[test]
    fn insert_with_conflicting_id() {
        let mut collection = alerts();
        let record = Record::new(
            "9",
            json!({"id": "10", "title": "Mismatch", "priority": "low", "read": false}),
        );
        assert!(matches!(collection.insert(record), Err(Error::InvalidPayload(_))));
    }

    #[test]
    fn remove_record() {
        let mut collection = alerts();
        let removed = collection.remove("2").unwrap();

        assert_eq!(removed.id, "2");
        assert!(!collection.contains("2"));
        assert!(matches!(collection.remove("2"), Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn mark_one_read() {
        let mut collection = alerts();
        let record = collection.update("1", &json!({"read": true})).unwrap();
        assert_eq!(record.get("read"), Some(&json!(true)));
    }

    #[test]
    fn failed_update_leaves_record() {
        let mut collection = alerts();
        let result = collection.update("1", &json!({"priority": "urgent"}));

        assert!(result.is_err());
        assert_eq!(collection.get("1").unwrap().get("priority"), Some(&json!("high")));

        let result = collection.update("1", &json!({"id": "99"}));
        assert!(matches!(result, Err(Error::InvalidPayload(_))));

        let result = collection.update("missing", &json!({"read": true}));
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn mark_all_read() {
        let mut collection = alerts();
        assert_eq!(collection.update_all(&json!({"read": true})).unwrap(), 3);
        assert!(collection
            .snapshot()
            .iter()
            .all(|r| r.get("read") == Some(&json!(true))));
    }

    #[test]
    fn update_all_is_atomic() {
        let mut collection = alerts();
        let before = collection.snapshot().to_vec();

        assert!(collection.update_all(&json!({"read": "yes"})).is_err());
        assert_eq!(collection.snapshot(), before.as_slice());
    }

    #[test]
    fn shared_collection_views() {
        let shared = SharedCollection::new(alerts());
        let engine = ViewEngine::new(
            alert_schema(),
            SummarySpec::new().with("unread", Metric::count_where(Predicate::is_false("read"))),
        )
        .unwrap();
        let config = engine.default_config().unwrap();

        let view = shared.read_view(&engine, &config).unwrap();
        assert_eq!(view.summary["unread"], 2.0);

        shared.write(|c| c.update_all(&json!({"read": true}))).unwrap();
        let view = shared.read_view(&engine, &config).unwrap();
        assert_eq!(view.summary["unread"], 0.0);
        assert_eq!(shared.with_snapshot(|records| records.len()), 3);
    }
}
