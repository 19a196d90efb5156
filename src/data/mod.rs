/// Data layer: loading, dataset model, groups, selection and plot points.
///
/// Architecture:
/// ```text
///  .tsv / .tab / .txt  (optionally .gz)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Table + ID column → Dataset (row keys, sample columns)
///   └──────────┘
///        │            ┌───────────┐  ┌────────────┐
///        │◄───────────│  groups    │  │ selection  │
///        │            └───────────┘  └────────────┘
///        ▼                                  │
///   ┌──────────┐                            │
///   │  points   │◄──────────────────────────┘
///   └──────────┘  dataset × groups × selection → Vec<PlotPoint>
/// ```

pub mod error;
pub mod groups;
pub mod loader;
pub mod model;
pub mod points;
pub mod selection;
