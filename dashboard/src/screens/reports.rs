//! Reports screen: sales performance over a date range.

use super::{with_shared_settings, Screen};
use crate::config::Config;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tally_engine::{
    Collection, DerivedView, FieldDef, FilterValue, GroupTotal, Metric, Page, Predicate, Schema,
    SharedCollection, SortSpec, SummarySpec, ViewConfig, ViewEngine,
};

pub fn schema() -> Schema {
    Schema::new("reports", "name")
        .with_field(FieldDef::text("name"))
        .with_field(FieldDef::enumeration(
            "category",
            ["Electronics", "Lighting", "Audio", "Accessories"],
        ))
        .with_field(FieldDef::date("date"))
        .with_field(FieldDef::number("sales"))
        .with_field(FieldDef::currency("revenue"))
        .with_field(FieldDef::currency("cost"))
        .with_field(FieldDef::currency("profit"))
}

fn summary() -> SummarySpec {
    SummarySpec::new()
        .with("totalSales", Metric::sum("sales"))
        .with("totalRevenue", Metric::sum("revenue"))
        .with("totalCost", Metric::sum("cost"))
        .with("totalProfit", Metric::sum("profit"))
}

fn seed() -> Vec<Value> {
    vec![
        json!({"name": "Wireless Mouse", "category": "Electronics", "date": "2023-10-01", "sales": 15, "revenue": 6885, "cost": 3000, "profit": 3885}),
        json!({"name": "Smart LED Bulb", "category": "Lighting", "date": "2023-10-02", "sales": 8, "revenue": 2392, "cost": 960, "profit": 1432}),
        json!({"name": "Bluetooth Speaker", "category": "Audio", "date": "2023-10-03", "sales": 5, "revenue": 4995, "cost": 2500, "profit": 2495}),
        json!({"name": "USB Cable", "category": "Accessories", "date": "2023-10-04", "sales": 23, "revenue": 2277, "cost": 690, "profit": 1587}),
        json!({"name": "Power Bank", "category": "Electronics", "date": "2023-10-05", "sales": 3, "revenue": 3897, "cost": 2100, "profit": 1797}),
        json!({"name": "Earphones", "category": "Audio", "date": "2023-10-06", "sales": 12, "revenue": 4188, "cost": 1800, "profit": 2388}),
        json!({"name": "Keyboard", "category": "Electronics", "date": "2023-10-07", "sales": 7, "revenue": 3213, "cost": 1400, "profit": 1813}),
    ]
}

/// Report selection: an inclusive date range and a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// `None` is "all"
    pub category: Option<String>,
}

impl ReportFilter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start: config.report_start,
            end: config.report_end,
            category: None,
        }
    }

    fn date_range(&self) -> Option<Predicate> {
        let day = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Predicate::between("date", day(start), day(end))),
            (Some(start), None) => Some(Predicate::ge("date", day(start))),
            (None, Some(end)) => Some(Predicate::le("date", day(end))),
            (None, None) => None,
        }
    }
}

/// Rendered reports screen.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsScreen {
    pub screen: Screen,
    pub filter: ReportFilter,
    pub categories: Vec<Value>,
    /// Rows and totals in the selected range
    pub view: DerivedView<'static>,
    pub profit_by_category: Vec<GroupTotal>,
    pub top_products: DerivedView<'static>,
}

/// Report rows and their view engine.
#[derive(Debug)]
pub struct Reports {
    engine: ViewEngine,
    records: SharedCollection,
}

impl Reports {
    pub fn new(records: Collection) -> Result<Self> {
        let engine = ViewEngine::new(records.schema().clone(), summary())?;
        Ok(Self {
            engine,
            records: SharedCollection::new(records),
        })
    }

    /// The report with its sample sales rows.
    pub fn seeded() -> Result<Self> {
        Self::new(Collection::from_payloads(schema(), seed())?)
    }

    /// Rows matching `filter`, oldest first.
    pub fn config(&self, filter: &ReportFilter) -> Result<ViewConfig> {
        let mut builder = ViewConfig::builder().sort(SortSpec::asc("date"));
        if let Some(range) = filter.date_range() {
            builder = builder.predicate(range);
        }
        if let Some(category) = &filter.category {
            builder = builder.filter_value("category", FilterValue::Is(json!(category)));
        }
        Ok(self.engine.configure(builder)?)
    }

    pub fn view(&self, config: &ViewConfig) -> Result<DerivedView<'static>> {
        Ok(self.records.read_view(&self.engine, config)?)
    }

    /// Profit per category across every row matching `config`.
    pub fn profit_by_category(&self, config: &ViewConfig) -> Result<Vec<GroupTotal>> {
        let unpaged = config.with_page(self.engine.schema(), None)?;
        let view = self.view(&unpaged)?;
        let rows = view.rows.iter().map(|row| row.as_ref());
        Ok(self.engine.group_totals(rows, "category", "profit")?)
    }

    /// The `n` most profitable rows matching `config`.
    pub fn top_products(&self, config: &ViewConfig, n: usize) -> Result<DerivedView<'static>> {
        let top = config
            .to_builder()
            .sort(SortSpec::desc("profit"))
            .page(Page::first(n));
        self.view(&self.engine.configure(top)?)
    }

    pub fn categories(&self) -> Result<Vec<Value>> {
        let values = self
            .records
            .with_snapshot(|records| self.engine.distinct_values(records, "category"))?;
        Ok(std::iter::once(json!("all")).chain(values).collect())
    }

    pub fn render(&self, config: &Config) -> Result<ReportsScreen> {
        let filter = ReportFilter::from_config(config);
        let base = self.config(&filter)?;
        let view_config = self
            .engine
            .configure(with_shared_settings(base.to_builder(), config))?;

        Ok(ReportsScreen {
            screen: Screen::Reports,
            categories: self.categories()?,
            profit_by_category: self.profit_by_category(&base)?,
            top_products: self.top_products(&base, config.top_products)?,
            view: self.view(&view_config)?,
            filter,
        })
    }
}
