/// Data layer: core types, loading, filtering and the derived views.
///
/// Architecture:
/// ```text
///  enem_2018.parquet … enem_2023.parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read each yearly batch → ExamTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ ExamTable  │  Vec<ExamRecord>, distinct filter values
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  year/sex/race selection → FilteredSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  views    │  FilteredSet → DashboardViews
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod views;
