//! Customers screen: the customer list with status tabs.

use super::{with_shared_settings, Screen};
use crate::config::Config;
use crate::error::Result;
use serde::Serialize;
use serde_json::{json, Value};
use tally_engine::{
    Collection, DerivedView, FieldDef, FilterValue, Metric, Page, Predicate, Record, Schema,
    SharedCollection, SortSpec, Summary, SummarySpec, ViewConfig, ViewEngine,
};

/// Rows in the "top spending customers" panel.
pub const TOP_SPENDERS: usize = 5;
/// Rows in the "recent customer activity" panel.
pub const RECENT_ACTIVITY: usize = 4;

pub fn schema() -> Schema {
    Schema::new("customers", "id")
        .with_field(FieldDef::text("id").not_searchable())
        .with_field(FieldDef::text("name"))
        .with_field(FieldDef::text("email"))
        .with_field(FieldDef::text("phone"))
        .with_field(FieldDef::number("orders"))
        .with_field(FieldDef::currency("totalSpent"))
        .with_field(FieldDef::date("lastOrder").optional())
        .with_field(FieldDef::enumeration("status", ["active", "inactive"]))
}

fn summary() -> SummarySpec {
    SummarySpec::new()
        .with("totalCustomers", Metric::Count)
        .with(
            "activeCustomers",
            Metric::count_where(Predicate::equals("status", "active")),
        )
        .with("totalRevenue", Metric::sum("totalSpent"))
}

fn seed() -> Vec<Value> {
    vec![
        json!({"id": "1", "name": "Rahul Sharma", "email": "rahul@example.com", "phone": "+91 9876543210", "orders": 5, "totalSpent": 12500, "lastOrder": "2023-10-15", "status": "active"}),
        json!({"id": "2", "name": "Priya Patel", "email": "priya@example.com", "phone": "+91 8765432109", "orders": 2, "totalSpent": 4500, "lastOrder": "2023-09-28", "status": "active"}),
        json!({"id": "3", "name": "Amit Singh", "email": "amit@example.com", "phone": "+91 7654321098", "orders": 1, "totalSpent": 2999, "lastOrder": "2023-08-10", "status": "inactive"}),
        json!({"id": "4", "name": "Neha Gupta", "email": "neha@example.com", "phone": "+91 6543210987", "orders": 8, "totalSpent": 21500, "lastOrder": "2023-10-20", "status": "active"}),
        json!({"id": "5", "name": "Vikram Joshi", "email": "vikram@example.com", "phone": "+91 9432109876", "orders": 0, "totalSpent": 0, "lastOrder": "", "status": "inactive"}),
    ]
}

/// Status tabs above the customer table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTab {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusTab {
    fn filter(self) -> FilterValue {
        match self {
            StatusTab::All => FilterValue::All,
            StatusTab::Active => FilterValue::Is(json!("active")),
            StatusTab::Inactive => FilterValue::Is(json!("inactive")),
        }
    }
}

/// Rendered customers screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomersScreen {
    pub screen: Screen,
    pub tab: StatusTab,
    /// Stat cards over every customer
    pub stats: Summary,
    pub view: DerivedView<'static>,
    pub top_spenders: DerivedView<'static>,
    pub recent_activity: DerivedView<'static>,
}

/// Customer records and their view engine.
#[derive(Debug)]
pub struct Customers {
    engine: ViewEngine,
    records: SharedCollection,
}

impl Customers {
    pub fn new(records: Collection) -> Result<Self> {
        let engine = ViewEngine::new(records.schema().clone(), summary())?;
        Ok(Self {
            engine,
            records: SharedCollection::new(records),
        })
    }

    /// The customer list with its sample customers.
    pub fn seeded() -> Result<Self> {
        Self::new(Collection::from_payloads(schema(), seed())?)
    }

    /// Every customer, in the order they were added.
    pub fn default_config(&self) -> Result<ViewConfig> {
        Ok(self.engine.default_config()?)
    }

    pub fn select_tab(&self, config: &ViewConfig, tab: StatusTab) -> Result<ViewConfig> {
        Ok(config.with_filter(self.engine.schema(), "status", tab.filter())?)
    }

    pub fn view(&self, config: &ViewConfig) -> Result<DerivedView<'static>> {
        Ok(self.records.read_view(&self.engine, config)?)
    }

    pub fn stats(&self) -> Result<Summary> {
        Ok(self.view(&self.default_config()?)?.summary)
    }

    /// The `n` biggest spenders across every customer.
    pub fn top_spenders(&self, n: usize) -> Result<DerivedView<'static>> {
        let config = self.engine.configure(
            ViewConfig::builder()
                .sort(SortSpec::desc("totalSpent"))
                .page(Page::first(n)),
        )?;
        self.view(&config)
    }

    /// The `n` most recent orderers; customers who never ordered are left out.
    pub fn recent_activity(&self, n: usize) -> Result<DerivedView<'static>> {
        let config = self.engine.configure(
            ViewConfig::builder()
                .predicate(Predicate::is_set("lastOrder"))
                .sort(SortSpec::desc("lastOrder"))
                .page(Page::first(n)),
        )?;
        self.view(&config)
    }

    pub fn delete_customer(&self, id: &str) -> Result<Record> {
        let removed = self.records.write(|records| records.remove(id))?;
        tracing::info!(id, "deleted customer");
        Ok(removed)
    }

    pub fn render(&self, config: &Config) -> Result<CustomersScreen> {
        let tab = StatusTab::default();
        let base = self.select_tab(&self.default_config()?, tab)?;
        let view_config = self
            .engine
            .configure(with_shared_settings(base.to_builder(), config))?;

        Ok(CustomersScreen {
            screen: Screen::Customers,
            tab,
            stats: self.stats()?,
            view: self.view(&view_config)?,
            top_spenders: self.top_spenders(TOP_SPENDERS)?,
            recent_activity: self.recent_activity(RECENT_ACTIVITY)?,
        })
    }
}
