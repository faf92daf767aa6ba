//! # Tally Engine
//!
//! A schema-driven view engine for tabular business data.
//!
//! Every screen of a small retail back office (inventory, customers, alerts,
//! sales, reports) is the same thing: a list of records, a search box, a few
//! dropdown filters, clickable column headers and a row of stat cards. This
//! crate computes that derived view in one place instead of once per screen.
//!
//! ## Design Principles
//!
//! - **No IO**: The engine never loads or stores records
//! - **Pure**: Same snapshot and config always produce the same view
//! - **Validated**: A [`ViewConfig`] only exists if it fits its [`Schema`]
//! - **Typed**: Numbers sort as numbers and dates as dates
//!
//! ## Core Concepts
//!
//! ### Schemas
//!
//! A [`Schema`] lists the fields of one record type, their [`FieldType`] and
//! whether each is sortable, filterable or searchable.
//!
//! ### View configs
//!
//! A [`ViewConfig`] holds the screen state: search term, categorical filters,
//! an optional [`Predicate`], the [`SortSpec`] and an optional [`Page`]. It is
//! built through [`ViewConfigBuilder::build`], which checks it against the
//! schema.
//!
//! ### Derived views
//!
//! [`compute_view`] runs search, filters and predicate, folds the
//! [`SummarySpec`] over every match, then sorts (stable) and pages. The
//! result is a [`DerivedView`].
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_engine::{
//!     FieldDef, Metric, Predicate, Record, Schema, SortSpec, SummarySpec, ViewConfig,
//!     ViewEngine,
//! };
//! use serde_json::json;
//!
//! // 1. Define a schema
//! let schema = Schema::new("inventory", "id")
//!     .with_field(FieldDef::number("id"))
//!     .with_field(FieldDef::text("name"))
//!     .with_field(FieldDef::number("stock"));
//!
//! // 2. Pick the stat cards
//! let summary = SummarySpec::new()
//!     .with("totalItems", Metric::Count)
//!     .with("lowStock", Metric::count_where(Predicate::lt("stock", 10)));
//! let engine = ViewEngine::new(schema, summary).unwrap();
//!
//! // 3. Describe the screen state
//! let config = engine
//!     .configure(ViewConfig::builder().sort(SortSpec::asc("stock")))
//!     .unwrap();
//!
//! // 4. Derive the view
//! let records = vec![
//!     Record::new("1", json!({"id": 1, "name": "USB Cable", "stock": 8})),
//!     Record::new("2", json!({"id": 2, "name": "Wireless Mouse", "stock": 98})),
//!     Record::new("3", json!({"id": 3, "name": "Power Bank", "stock": 4})),
//! ];
//! let view = engine.compute_view(&records, &config).unwrap();
//!
//! assert_eq!(view.ids(), vec!["3", "1", "2"]);
//! assert_eq!(view.summary["lowStock"], 2.0);
//! ```
//!
//! ## Ownership
//!
//! Records belong to the host. [`Collection`] is a convenience container with
//! validated insert, update and delete; [`SharedCollection`] puts one behind a
//! read-write lock and computes views under a single read lock.

pub mod collection;
pub mod config;
pub mod error;
pub mod predicate;
pub mod record;
pub mod schema;
pub mod summary;
pub mod value;
pub mod view;

// Re-export main types at crate root
pub use collection::{Collection, SharedCollection};
pub use config::{FilterValue, Page, SortDirection, SortSpec, ViewConfig, ViewConfigBuilder};
pub use error::Error;
pub use predicate::{CompareOp, CustomPredicate, Predicate};
pub use record::Record;
pub use schema::{FieldDef, FieldType, Schema};
pub use summary::{FnReducer, Metric, Reducer, Summary, SummarySpec};
pub use view::{
    compute_view, distinct_values, group_totals, request_sort, DerivedView, GroupTotal,
    ViewEngine,
};

/// Type aliases for clarity
pub type RecordId = String;
pub type FieldName = String;
