//! Inventory screen: products, stock levels and the low-stock warning.

use super::{with_shared_settings, Screen};
use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tally_engine::{
    Collection, DerivedView, FieldDef, FilterValue, Metric, Predicate, Record, RecordId, Schema,
    SharedCollection, SortSpec, Summary, SummarySpec, ViewConfig, ViewEngine,
};

/// Categories offered by the add-product form.
pub const CATEGORIES: [&str; 7] = [
    "Electronics",
    "Audio",
    "Lighting",
    "Accessories",
    "Computers",
    "Mobile",
    "Home Appliances",
];

pub fn schema() -> Schema {
    Schema::new("inventory", "id")
        .with_field(FieldDef::number("id"))
        .with_field(FieldDef::text("name"))
        .with_field(FieldDef::enumeration("category", CATEGORIES))
        .with_field(FieldDef::text("sku"))
        .with_field(FieldDef::text("supplier").not_searchable())
        .with_field(FieldDef::currency("cost"))
        .with_field(FieldDef::currency("price"))
        .with_field(FieldDef::number("stock"))
}

fn low_stock(threshold: i64) -> Predicate {
    Predicate::lt("stock", threshold)
}

fn summary(threshold: i64) -> SummarySpec {
    SummarySpec::new()
        .with("totalItems", Metric::Count)
        .with("totalStockValue", Metric::sum_product("cost", "stock"))
        .with("lowStockItems", Metric::count_where(low_stock(threshold)))
}

fn seed() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "USB Cable", "category": "Accessories", "cost": 30, "price": 99, "stock": 8, "sku": "USB-CBL-01", "supplier": "TechSupplies Inc"}),
        json!({"id": 2, "name": "Wireless Mouse", "category": "Electronics", "cost": 200, "price": 459, "stock": 98, "sku": "WL-MSE-02", "supplier": "PeriTech"}),
        json!({"id": 3, "name": "Smart LED Bulb", "category": "Lighting", "cost": 120, "price": 299, "stock": 152, "sku": "LED-BLB-03", "supplier": "LumiHome"}),
        json!({"id": 4, "name": "Bluetooth Speaker", "category": "Audio", "cost": 500, "price": 999, "stock": 42, "sku": "BT-SPK-04", "supplier": "SoundMasters"}),
        json!({"id": 5, "name": "Earphones", "category": "Audio", "cost": 150, "price": 349, "stock": 9, "sku": "EAR-BUD-05", "supplier": "AudioGear"}),
        json!({"id": 6, "name": "Power Bank", "category": "Electronics", "cost": 700, "price": 1299, "stock": 4, "sku": "PWR-BNK-06", "supplier": "PowerTech"}),
    ]
}

/// Add-product form submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub category: String,
    pub sku: String,
    pub cost: f64,
    pub price: f64,
    pub stock: i64,
    #[serde(default)]
    pub supplier: String,
}

/// A SKU for `category`: its first three letters, upper-cased, and four
/// random digits, e.g. `AUD-4821`.
pub fn generate_sku(category: &str) -> String {
    let prefix: String = category.chars().take(3).collect::<String>().to_uppercase();
    let digits = 1000 + uuid::Uuid::new_v4().as_u128() % 9000;
    format!("{prefix}-{digits}")
}

fn check_new_item(item: &NewItem) -> Result<()> {
    if item.name.trim().is_empty() || item.sku.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name, sku, cost, price and stock are required".into(),
        ));
    }
    if !item.cost.is_finite() || !item.price.is_finite() || item.cost < 0.0 || item.stock < 0 {
        return Err(AppError::BadRequest(
            "cost and stock must be non-negative numbers".into(),
        ));
    }
    if item.price <= item.cost {
        return Err(AppError::BadRequest("price must be greater than cost".into()));
    }
    Ok(())
}

/// Rendered inventory screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryScreen {
    pub screen: Screen,
    /// Category dropdown options, "All" first
    pub categories: Vec<Value>,
    /// Stat cards over the whole inventory
    pub stats: Summary,
    pub low_stock_threshold: i64,
    pub view: DerivedView<'static>,
}

/// Inventory records and their view engine.
#[derive(Debug)]
pub struct Inventory {
    engine: ViewEngine,
    records: SharedCollection,
    threshold: i64,
}

impl Inventory {
    pub fn new(records: Collection, threshold: i64) -> Result<Self> {
        let engine = ViewEngine::new(records.schema().clone(), summary(threshold))?;
        Ok(Self {
            engine,
            records: SharedCollection::new(records),
            threshold,
        })
    }

    /// The inventory with its sample products.
    pub fn seeded(config: &Config) -> Result<Self> {
        let records = Collection::from_payloads(schema(), seed())?;
        Self::new(records, config.low_stock_threshold)
    }

    pub fn engine(&self) -> &ViewEngine {
        &self.engine
    }

    /// Sorted by name, every category.
    pub fn default_config(&self) -> Result<ViewConfig> {
        Ok(self
            .engine
            .configure(ViewConfig::builder().sort(SortSpec::asc("name")))?)
    }

    /// Select a category; `None` is the "All" option.
    pub fn select_category(
        &self,
        config: &ViewConfig,
        category: Option<&str>,
    ) -> Result<ViewConfig> {
        let value = match category {
            Some(category) => FilterValue::Is(json!(category)),
            None => FilterValue::All,
        };
        Ok(config.with_filter(self.engine.schema(), "category", value)?)
    }

    /// Show only items below the low-stock threshold.
    pub fn low_stock_only(&self, config: &ViewConfig, enabled: bool) -> Result<ViewConfig> {
        let predicate = enabled.then(|| low_stock(self.threshold));
        Ok(config.with_predicate(self.engine.schema(), predicate)?)
    }

    pub fn view(&self, config: &ViewConfig) -> Result<DerivedView<'static>> {
        Ok(self.records.read_view(&self.engine, config)?)
    }

    /// Stat cards: always over the whole inventory.
    pub fn stats(&self) -> Result<Summary> {
        let config = self.engine.default_config()?;
        Ok(self.view(&config)?.summary)
    }

    pub fn categories(&self) -> Result<Vec<Value>> {
        let values = self
            .records
            .with_snapshot(|records| self.engine.distinct_values(records, "category"))?;
        Ok(std::iter::once(json!("All")).chain(values).collect())
    }

    /// Add a product from the add-product form. Ids continue after the
    /// highest numeric id in the inventory.
    pub fn add_item(&self, item: NewItem) -> Result<RecordId> {
        if let Err(error) = check_new_item(&item) {
            tracing::warn!(name = %item.name, %error, "product rejected");
            return Err(error);
        }

        let id = self.records.write(|records| {
            let next = records
                .snapshot()
                .iter()
                .filter_map(|r| r.id.parse::<u64>().ok())
                .max()
                .map_or(1, |max| max + 1);
            records.insert_payload(json!({
                "id": next,
                "name": item.name.trim(),
                "category": item.category,
                "sku": item.sku.trim(),
                "supplier": item.supplier,
                "cost": item.cost,
                "price": item.price,
                "stock": item.stock,
            }))
        })?;

        tracing::info!(%id, name = %item.name, "added inventory item");
        Ok(id)
    }

    pub fn delete_item(&self, id: &str) -> Result<Record> {
        let removed = self.records.write(|records| records.remove(id))?;
        tracing::info!(id, name = ?removed.get("name"), "deleted inventory item");
        Ok(removed)
    }

    pub fn render(&self, config: &Config) -> Result<InventoryScreen> {
        let view_config = self
            .engine
            .configure(with_shared_settings(self.default_config()?.to_builder(), config))?;

        let stats = self.stats()?;
        let low = stats.get("lowStockItems").copied().unwrap_or_default();
        if low > 0.0 {
            tracing::warn!(
                count = low,
                threshold = self.threshold,
                "items below low-stock threshold"
            );
        }

        Ok(InventoryScreen {
            screen: Screen::Inventory,
            categories: self.categories()?,
            stats,
            low_stock_threshold: self.threshold,
            view: self.view(&view_config)?,
        })
    }
}
