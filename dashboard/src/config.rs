//! Configuration management for the dashboard.

use crate::screens::Screen;
use chrono::NaiveDate;
use std::env;

/// Dashboard configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Stock level below which an item counts as low stock
    pub low_stock_threshold: i64,
    /// Rows per rendered page
    pub page_size: usize,
    /// Length of the reports "top products" list
    pub top_products: usize,
    /// First report day, inclusive
    pub report_start: Option<NaiveDate>,
    /// Last report day, inclusive
    pub report_end: Option<NaiveDate>,
    /// Screens to render
    pub screens: Vec<Screen>,
    /// Search term applied to every rendered screen
    pub search: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            page_size: 25,
            top_products: 5,
            report_start: None,
            report_end: None,
            screens: Screen::ALL.to_vec(),
            search: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let low_stock_threshold = match lookup("LOW_STOCK_THRESHOLD") {
            Some(raw) => parse_number("LOW_STOCK_THRESHOLD", &raw)?,
            None => defaults.low_stock_threshold,
        };

        let page_size = match lookup("PAGE_SIZE") {
            Some(raw) => parse_positive("PAGE_SIZE", &raw)?,
            None => defaults.page_size,
        };

        let top_products = match lookup("TOP_PRODUCTS") {
            Some(raw) => parse_positive("TOP_PRODUCTS", &raw)?,
            None => defaults.top_products,
        };

        let report_start = lookup("REPORT_START")
            .map(|raw| parse_day("REPORT_START", &raw))
            .transpose()?;
        let report_end = lookup("REPORT_END")
            .map(|raw| parse_day("REPORT_END", &raw))
            .transpose()?;
        if let (Some(start), Some(end)) = (report_start, report_end) {
            if start > end {
                return Err(ConfigError::InvalidReportRange { start, end });
            }
        }

        let screens = match lookup("DASHBOARD_SCREEN") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("all") => Screen::ALL.to_vec(),
            Some(raw) => raw
                .split(',')
                .map(|name| name.trim().parse())
                .collect::<Result<Vec<Screen>, _>>()?,
            None => defaults.screens,
        };

        let search = lookup("DASHBOARD_SEARCH").filter(|term| !term.trim().is_empty());

        Ok(Self {
            low_stock_threshold,
            page_size,
            top_products,
            report_start,
            report_end,
            screens,
            search,
        })
    }
}

fn parse_number(var: &'static str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}

fn parse_positive(var: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}

fn parse_day(var: &'static str, raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        var,
        value: raw.to_string(),
    })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var} value: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Invalid {var} value: {value} (expected YYYY-MM-DD)")]
    InvalidDate { var: &'static str, value: String },

    #[error("REPORT_START {start} is after REPORT_END {end}")]
    InvalidReportRange { start: NaiveDate, end: NaiveDate },

    #[error("Unknown screen: {0}")]
    UnknownScreen(String),
}
