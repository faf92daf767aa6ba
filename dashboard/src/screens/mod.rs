//! Back-office screens.
//!
//! Each screen owns its records and one [`ViewEngine`](tally_engine::ViewEngine)
//! and turns the dashboard [`Config`] into the JSON a front end would draw.

pub mod alerts;
pub mod customers;
pub mod inventory;
pub mod reports;
pub mod sales;

use crate::config::{Config, ConfigError};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tally_engine::{Page, ViewConfigBuilder};

/// The screens of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Inventory,
    Customers,
    Alerts,
    Sales,
    Reports,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Screen::Inventory,
        Screen::Customers,
        Screen::Alerts,
        Screen::Sales,
        Screen::Reports,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Screen::Inventory => "inventory",
            Screen::Customers => "customers",
            Screen::Alerts => "alerts",
            Screen::Sales => "sales",
            Screen::Reports => "reports",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Screen {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownScreen(s.to_string()))
    }
}

/// Apply the settings every screen shares: the search box and page size.
pub(crate) fn with_shared_settings(
    builder: ViewConfigBuilder,
    config: &Config,
) -> ViewConfigBuilder {
    let builder = builder.page(Page::first(config.page_size));
    match &config.search {
        Some(term) => builder.search_term(term.clone()),
        None => builder,
    }
}

/// Render one screen with its seed data.
pub fn render(screen: Screen, config: &Config) -> Result<Value> {
    tracing::info!(%screen, "rendering screen");

    let rendered = match screen {
        Screen::Inventory => {
            let inventory = inventory::Inventory::seeded(config)?;
            serde_json::to_value(inventory.render(config)?)?
        }
        Screen::Customers => {
            serde_json::to_value(customers::Customers::seeded()?.render(config)?)?
        }
        Screen::Alerts => {
            let today = chrono::Local::now().date_naive();
            serde_json::to_value(alerts::Alerts::seeded(today)?.render(config)?)?
        }
        Screen::Sales => serde_json::to_value(sales::Sales::new()?.render(config)?)?,
        Screen::Reports => serde_json::to_value(reports::Reports::seeded()?.render(config)?)?,
    };
    Ok(rendered)
}
