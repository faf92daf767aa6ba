//! Sales screen: the sales entry form and the running sales log.

use super::{with_shared_settings, Screen};
use crate::config::Config;
use crate::error::{AppError, Result};
use serde::Serialize;
use serde_json::json;
use tally_engine::{
    value::parse_date, Collection, DerivedView, FieldDef, Metric, Record, RecordId, Schema,
    SharedCollection, SortSpec, Summary, SummarySpec, ViewConfig, ViewEngine,
};

/// A product offered on the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: &'static str,
    pub unit_price: f64,
}

pub const CATALOG: [CatalogItem; 6] = [
    CatalogItem { name: "Wireless Mouse", unit_price: 29.99 },
    CatalogItem { name: "Keyboard", unit_price: 49.99 },
    CatalogItem { name: "Charger", unit_price: 19.99 },
    CatalogItem { name: "Headphones", unit_price: 89.99 },
    CatalogItem { name: "Monitor", unit_price: 199.99 },
    CatalogItem { name: "Webcam", unit_price: 59.99 },
];

pub fn schema() -> Schema {
    Schema::new("sales", "id")
        .with_field(FieldDef::text("id").not_searchable())
        .with_field(
            FieldDef::enumeration("product", CATALOG.map(|item| item.name)).searchable(),
        )
        .with_field(FieldDef::number("quantity"))
        .with_field(FieldDef::date("date"))
        .with_field(FieldDef::currency("price"))
}

fn summary() -> SummarySpec {
    SummarySpec::new()
        .with("totalSales", Metric::sum("price"))
        .with("totalItems", Metric::sum("quantity"))
}

/// Round to whole cents.
fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Rendered sales screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesScreen {
    pub screen: Screen,
    pub catalog: Vec<CatalogItem>,
    pub view: DerivedView<'static>,
}

/// The sales log and its view engine.
#[derive(Debug)]
pub struct Sales {
    engine: ViewEngine,
    records: SharedCollection,
}

impl Sales {
    /// An empty sales log.
    pub fn new() -> Result<Self> {
        let schema = schema();
        let engine = ViewEngine::new(schema.clone(), summary())?;
        Ok(Self {
            engine,
            records: SharedCollection::new(Collection::new(schema)),
        })
    }

    /// Most recent sale first.
    pub fn default_config(&self) -> Result<ViewConfig> {
        Ok(self
            .engine
            .configure(ViewConfig::builder().sort(SortSpec::desc("date")))?)
    }

    /// Record a sale from the entry form. The price is the catalog unit
    /// price times `quantity`.
    pub fn add_sale(&self, product: &str, quantity: i64, date: &str) -> Result<RecordId> {
        if product.trim().is_empty() || date.trim().is_empty() || quantity <= 0 {
            tracing::warn!(product, quantity, date, "incomplete sale rejected");
            return Err(AppError::BadRequest(
                "product, date and a positive quantity are required".into(),
            ));
        }
        let item = CATALOG
            .iter()
            .find(|item| item.name == product)
            .ok_or_else(|| AppError::BadRequest(format!("unknown product: {product}")))?;
        if parse_date(date).is_none() {
            return Err(AppError::BadRequest(format!("invalid date: {date}")));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let record = Record::new(
            id.clone(),
            json!({
                "id": id,
                "product": item.name,
                "quantity": quantity,
                "date": date,
                "price": cents(item.unit_price * quantity as f64),
            }),
        );
        self.records.write(|records| records.insert(record))?;

        tracing::info!(%id, product, quantity, "recorded sale");
        Ok(id)
    }

    pub fn delete_sale(&self, id: &str) -> Result<Record> {
        Ok(self.records.write(|records| records.remove(id))?)
    }

    pub fn view(&self, config: &ViewConfig) -> Result<DerivedView<'static>> {
        Ok(self.records.read_view(&self.engine, config)?)
    }

    pub fn totals(&self) -> Result<Summary> {
        Ok(self.view(&self.engine.default_config()?)?.summary)
    }

    pub fn render(&self, config: &Config) -> Result<SalesScreen> {
        let view_config = self
            .engine
            .configure(with_shared_settings(self.default_config()?.to_builder(), config))?;

        Ok(SalesScreen {
            screen: Screen::Sales,
            catalog: CATALOG.to_vec(),
            view: self.view(&view_config)?,
        })
    }
}
