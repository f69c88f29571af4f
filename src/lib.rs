//! Loading and aggregation behind the ENEM results dashboard.

pub mod config;
pub mod data;
pub mod error;
pub mod geo;

pub use config::DashboardConfig;
pub use data::filter::{apply_filter, FilterSelection, FilteredSet};
pub use data::loader::load_table;
pub use data::model::ExamTable;
pub use data::views::DashboardViews;
pub use error::DashboardError;
