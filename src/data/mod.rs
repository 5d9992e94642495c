/// Data layer: core types, loading, row gates and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  ordered header, Vec<Vec<Value>>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop rows missing critical values
///   └──────────┘
///        │
///        ▼   (extract::*)
///   ┌──────────┐
///   │  export   │  one .csv / .parquet per table
///   └──────────┘
/// ```

pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
