//! Alerts screen: notifications with type, priority and read-state filters.

use super::{with_shared_settings, Screen};
use crate::config::Config;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tally_engine::{
    Collection, DerivedView, FieldDef, FilterValue, Metric, Predicate, Record, Schema,
    SharedCollection, SortSpec, Summary, SummarySpec, ViewConfig, ViewEngine,
};

pub const TYPES: [&str; 4] = ["inventory", "order", "system", "promotion"];
pub const PRIORITIES: [&str; 3] = ["high", "medium", "low"];

pub fn schema() -> Schema {
    Schema::new("alerts", "id")
        .with_field(FieldDef::text("id").not_searchable())
        .with_field(FieldDef::text("title"))
        .with_field(FieldDef::text("message"))
        .with_field(FieldDef::enumeration("type", TYPES))
        .with_field(FieldDef::enumeration("priority", PRIORITIES))
        .with_field(FieldDef::date("date"))
        .with_field(FieldDef::boolean("read"))
}

fn unread() -> Predicate {
    Predicate::is_false("read")
}

/// Alerts dated on `today`.
fn dated(today: NaiveDate) -> Predicate {
    let day = today.format("%Y-%m-%d").to_string();
    Predicate::between("date", day.clone(), format!("{day}T23:59:59.999"))
}

fn summary(today: NaiveDate) -> SummarySpec {
    SummarySpec::new()
        .with("total", Metric::Count)
        .with("unread", Metric::count_where(unread()))
        .with(
            "highPriority",
            Metric::count_where(Predicate::equals("priority", "high")),
        )
        .with("today", Metric::count_where(dated(today)))
}

fn seed() -> Vec<Value> {
    vec![
        json!({"id": "1", "title": "Low Stock Alert", "message": "Only 5 Wireless Mice left in inventory", "type": "inventory", "priority": "high", "date": "2023-11-15T09:30:00", "read": false}),
        json!({"id": "2", "title": "New Order Received", "message": "Order #10025 from Priya Patel for ₹4,500", "type": "order", "priority": "medium", "date": "2023-11-14T14:15:00", "read": true}),
        json!({"id": "3", "title": "System Maintenance", "message": "Scheduled maintenance tonight at 11 PM", "type": "system", "priority": "medium", "date": "2023-11-14T10:00:00", "read": true}),
        json!({"id": "4", "title": "Special Promotion", "message": "Diwali sale starts tomorrow - 20% off all electronics", "type": "promotion", "priority": "low", "date": "2023-11-13T16:45:00", "read": false}),
        json!({"id": "5", "title": "Critical Inventory", "message": "USB Cables out of stock!", "type": "inventory", "priority": "high", "date": "2023-11-13T08:20:00", "read": false}),
        json!({"id": "6", "title": "Order Delayed", "message": "Order #10022 delayed due to shipping issues", "type": "order", "priority": "high", "date": "2023-11-12T17:30:00", "read": true}),
    ]
}

/// Rendered alerts screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsScreen {
    pub screen: Screen,
    /// Counters over every alert
    pub stats: Summary,
    pub view: DerivedView<'static>,
}

/// Alert records and their view engine.
#[derive(Debug)]
pub struct Alerts {
    engine: ViewEngine,
    records: SharedCollection,
}

impl Alerts {
    /// `today` decides which alerts count towards the "today" counter.
    pub fn new(records: Collection, today: NaiveDate) -> Result<Self> {
        let engine = ViewEngine::new(records.schema().clone(), summary(today))?;
        Ok(Self {
            engine,
            records: SharedCollection::new(records),
        })
    }

    /// The alert list with its sample notifications.
    pub fn seeded(today: NaiveDate) -> Result<Self> {
        Self::new(Collection::from_payloads(schema(), seed())?, today)
    }

    /// Newest first.
    pub fn default_config(&self) -> Result<ViewConfig> {
        Ok(self
            .engine
            .configure(ViewConfig::builder().sort(SortSpec::desc("date")))?)
    }

    /// Select an alert type; `None` shows every type.
    pub fn filter_type(&self, config: &ViewConfig, kind: Option<&str>) -> Result<ViewConfig> {
        self.select(config, "type", kind)
    }

    /// Select a priority; `None` shows every priority.
    pub fn filter_priority(
        &self,
        config: &ViewConfig,
        priority: Option<&str>,
    ) -> Result<ViewConfig> {
        self.select(config, "priority", priority)
    }

    fn select(
        &self,
        config: &ViewConfig,
        field: &str,
        value: Option<&str>,
    ) -> Result<ViewConfig> {
        let value = value.map_or(FilterValue::All, |v| FilterValue::Is(json!(v)));
        Ok(config.with_filter(self.engine.schema(), field, value)?)
    }

    pub fn unread_only(&self, config: &ViewConfig, enabled: bool) -> Result<ViewConfig> {
        Ok(config.with_predicate(self.engine.schema(), enabled.then(unread))?)
    }

    pub fn view(&self, config: &ViewConfig) -> Result<DerivedView<'static>> {
        Ok(self.records.read_view(&self.engine, config)?)
    }

    pub fn stats(&self) -> Result<Summary> {
        Ok(self.view(&self.engine.default_config()?)?.summary)
    }

    pub fn mark_read(&self, id: &str) -> Result<Record> {
        let record = self
            .records
            .write(|records| records.update(id, &json!({"read": true})).cloned())?;
        tracing::debug!(id, "marked alert read");
        Ok(record)
    }

    /// Returns the number of alerts touched.
    pub fn mark_all_read(&self) -> Result<usize> {
        let count = self
            .records
            .write(|records| records.update_all(&json!({"read": true})))?;
        tracing::debug!(count, "marked all alerts read");
        Ok(count)
    }

    pub fn delete(&self, id: &str) -> Result<Record> {
        let removed = self.records.write(|records| records.remove(id))?;
        tracing::info!(id, "deleted alert");
        Ok(removed)
    }

    pub fn render(&self, config: &Config) -> Result<AlertsScreen> {
        let view_config = self
            .engine
            .configure(with_shared_settings(self.default_config()?.to_builder(), config))?;

        Ok(AlertsScreen {
            screen: Screen::Alerts,
            stats: self.stats()?,
            view: self.view(&view_config)?,
        })
    }
}
