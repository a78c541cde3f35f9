//! sales-consolidator - Consolidate sales spreadsheets into a formatted Excel report
//!
//! This crate reads every spreadsheet matching a file-name pattern in an input
//! directory, validates that each one carries the required sales columns,
//! concatenates them into a single table, and writes a multi-sheet XLSX report
//! with aggregates, a totals row of live formulas, and embedded chart images.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sales_consolidator::ConsolidatorBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // input/*.xlsx -> output/consolidated_report.xlsx
//!     let consolidator = ConsolidatorBuilder::new().build()?;
//!     let summary = consolidator.run()?;
//!
//!     println!("{} files, {} records", summary.files, summary.records);
//!     Ok(())
//! }
//! ```
//!
//! # Using the Stages Directly
//!
//! ```rust,no_run
//! use sales_consolidator::{aggregate_by, ConsolidatorBuilder, Dimension};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let consolidator = ConsolidatorBuilder::new()
//!     .with_input_dir("data")
//!     .with_pattern("sales_*.xlsx")
//!     .build()?;
//!
//! let table = consolidator.consolidate()?;
//! for total in aggregate_by(&table, Dimension::Category) {
//!     println!("{}: {:.2} ({:.1}%)", total.key, total.revenue, total.share * 100.0);
//! }
//!
//! let report = consolidator.analyze(&table);
//! println!("{}", serde_json::to_string_pretty(&report.branches)?);
//! # Ok(())
//! # }
//! ```

mod analysis;
mod api;
mod builder;
mod charts;
mod error;
mod ingest;
mod report;
mod types;

// 公開API
pub use analysis::{
    aggregate_by, analyze, branch_summary, category_summary, daily_revenue, general_stats,
    salesperson_summary, top_products, AnalysisReport, BranchStats, CategoryStats,
    DailyRevenue, DimensionTotal, GeneralStats, RankedProduct, SalespersonStats, TopProducts,
    DEFAULT_TOP_N,
};
pub use api::{Dimension, NumberFormatKind, Palette};
pub use builder::{Consolidator, ConsolidatorBuilder, RunSummary};
pub use charts::{render_charts, ChartImages};
pub use error::{ConsolidatorError, Result};
pub use ingest::{consolidate, REQUIRED_COLUMNS};
pub use report::SHEET_NAMES;
pub use types::{round2, ConsolidatedTable, SaleRecord, SourceFile};
