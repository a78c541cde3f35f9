//! Sheet Builders
//!
//! 集計結果から各シートのグリッドを組み立てるモジュール。
//! ダッシュボードのみ固定レイアウトのため、直接ワークシートに書き込みます。

use std::path::Path;

use rust_xlsxwriter::{Image, Worksheet};
use tracing::debug;

use crate::analysis::{AnalysisReport, BranchStats, GeneralStats, SalespersonStats, TopProducts};
use crate::api::NumberFormatKind;
use crate::charts::ChartImages;
use crate::error::Result;
use crate::report::grid::{write_cell, ColumnFormats, SheetGrid};
use crate::report::style::{ReportStyles, HEADER_ROW_HEIGHT};
use crate::types::{CellCoord, CellValue, ConsolidatedTable};

pub(crate) const DASHBOARD: &str = "Dashboard";
pub(crate) const CONSOLIDATED_DATA: &str = "Consolidated_Data";
pub(crate) const TOP_PRODUCTS: &str = "Top_Products";
pub(crate) const SALESPERSON_ANALYSIS: &str = "Salesperson_Analysis";
pub(crate) const BRANCH_SUMMARY: &str = "Branch_Summary";

/// 統合データシート
pub(crate) fn consolidated_data(table: &ConsolidatedTable) -> SheetGrid {
    let mut grid = SheetGrid::new(
        CONSOLIDATED_DATA,
        &[
            "Date",
            "Product",
            "Category",
            "Quantity",
            "Unit_Price",
            "Salesperson",
            "Branch",
            "Line_Total",
        ],
    )
    .with_formats(
        ColumnFormats::new()
            .with(0, NumberFormatKind::Date)
            .with(3, NumberFormatKind::Integer)
            .with(4, NumberFormatKind::Currency)
            .with(7, NumberFormatKind::Currency),
    )
    .with_table("ConsolidatedDataTable");

    for record in &table.records {
        grid.push_row(vec![
            record.date.into(),
            record.product.as_str().into(),
            record.category.as_str().into(),
            record.quantity.into(),
            record.unit_price.into(),
            record.salesperson.as_str().into(),
            record.branch.as_str().into(),
            record.line_total.into(),
        ]);
    }
    grid
}

/// 上位商品シート（数量順と売上順を左右に並べる）
pub(crate) fn top_products(top: &TopProducts) -> SheetGrid {
    let mut grid = SheetGrid::new(
        TOP_PRODUCTS,
        &["Top by Quantity", "Quantity", "", "Top by Revenue", "Revenue"],
    )
    .with_formats(
        ColumnFormats::new()
            .with(1, NumberFormatKind::Integer)
            .with(4, NumberFormatKind::Currency),
    );

    let len = top.by_quantity.len().max(top.by_revenue.len());
    for i in 0..len {
        let (qty_name, qty) = match top.by_quantity.get(i) {
            Some(p) => (CellValue::from(p.name.as_str()), CellValue::from(p.quantity)),
            None => (CellValue::Empty, CellValue::Empty),
        };
        let (rev_name, revenue) = match top.by_revenue.get(i) {
            Some(p) => (CellValue::from(p.name.as_str()), CellValue::from(p.revenue)),
            None => (CellValue::Empty, CellValue::Empty),
        };
        grid.push_row(vec![qty_name, qty, CellValue::Empty, rev_name, revenue]);
    }
    grid
}

/// 販売担当者分析シート
pub(crate) fn salesperson_analysis(people: &[SalespersonStats]) -> SheetGrid {
    let mut grid = SheetGrid::new(
        SALESPERSON_ANALYSIS,
        &["Salesperson", "Revenue", "Transactions", "Average_Ticket"],
    )
    .with_formats(
        ColumnFormats::new()
            .with(1, NumberFormatKind::Currency)
            .with(2, NumberFormatKind::Integer)
            .with(3, NumberFormatKind::Currency),
    )
    .with_table("SalespersonTable");

    for person in people {
        grid.push_row(vec![
            person.name.as_str().into(),
            person.revenue.into(),
            person.transactions.into(),
            person.average_ticket.into(),
        ]);
    }
    grid
}

/// 支店サマリーシート（末尾にTOTAL行）
pub(crate) fn branch_summary(branches: &[BranchStats]) -> SheetGrid {
    let mut grid = SheetGrid::new(
        BRANCH_SUMMARY,
        &["Branch", "Revenue", "Transactions", "Share"],
    )
    .with_formats(
        ColumnFormats::new()
            .with(1, NumberFormatKind::Currency)
            .with(2, NumberFormatKind::Integer)
            .with(3, NumberFormatKind::Percentage),
    );

    for branch in branches {
        grid.push_row(vec![
            branch.name.as_str().into(),
            branch.revenue.into(),
            branch.transactions.into(),
            branch.share.into(),
        ]);
    }
    grid.with_totals("TOTAL", &[1, 2, 3])
}

/// ダッシュボードのKPI（ラベル、値、書式）
pub(crate) fn kpis(stats: &GeneralStats) -> Vec<(&'static str, CellValue, NumberFormatKind)> {
    vec![
        ("Total Revenue", stats.total_revenue.into(), NumberFormatKind::Currency),
        ("Transactions", stats.transactions.into(), NumberFormatKind::Integer),
        (
            "Average Ticket",
            stats.average_ticket.map(CellValue::from).unwrap_or(CellValue::Empty),
            NumberFormatKind::Currency,
        ),
        ("Branches", stats.branches.into(), NumberFormatKind::Integer),
        ("Salespeople", stats.salespeople.into(), NumberFormatKind::Integer),
        ("Unique Products", stats.products.into(), NumberFormatKind::Integer),
    ]
}

/// 集計期間の表示文字列
pub(crate) fn period_line(stats: &GeneralStats) -> String {
    match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => format!(
            "Period: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => "Period: no transactions".to_string(),
    }
}

/// ダッシュボード上の配置（0始まり）
mod layout {
    use crate::types::CellCoord;

    pub const TITLE: CellCoord = CellCoord { row: 1, col: 1 };
    pub const PERIOD: CellCoord = CellCoord { row: 2, col: 1 };
    pub const FIRST_KPI_ROW: u32 = 4;
    pub const KPI_LABEL_COL: u16 = 1;
    pub const KPI_VALUE_COL: u16 = 2;

    pub const BRANCH_HEADING: CellCoord = CellCoord { row: 12, col: 1 };
    pub const BRANCH_CHART: CellCoord = CellCoord { row: 13, col: 1 };
    pub const CATEGORY_HEADING: CellCoord = CellCoord { row: 12, col: 8 };
    pub const CATEGORY_CHART: CellCoord = CellCoord { row: 13, col: 8 };
    pub const TREND_HEADING: CellCoord = CellCoord { row: 37, col: 1 };
    pub const TREND_CHART: CellCoord = CellCoord { row: 38, col: 1 };

    pub const SIDE_CHART_SCALE: f64 = 0.55;
    pub const TREND_CHART_SCALE: f64 = 0.6;

    pub const COLUMN_WIDTHS: [(u16, f64); 3] = [(0, 5.0), (1, 35.0), (2, 20.0)];
}

/// ダッシュボードシート
pub(crate) fn dashboard(
    report: &AnalysisReport,
    charts: Option<&ChartImages>,
    styles: &ReportStyles,
) -> Result<Worksheet> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(DASHBOARD)?;

    for (col, width) in layout::COLUMN_WIDTHS {
        worksheet.set_column_width(col, width)?;
    }

    worksheet.write_string_with_format(
        layout::TITLE.row,
        layout::TITLE.col,
        "Sales Consolidation Report",
        &styles.title,
    )?;
    worksheet.write_string_with_format(
        layout::PERIOD.row,
        layout::PERIOD.col,
        period_line(&report.stats),
        &styles.subtitle,
    )?;

    for (i, (label, value, kind)) in kpis(&report.stats).into_iter().enumerate() {
        let row = layout::FIRST_KPI_ROW + i as u32;
        worksheet.write_string_with_format(row, layout::KPI_LABEL_COL, label, &styles.kpi_label)?;
        write_cell(
            &mut worksheet,
            row,
            layout::KPI_VALUE_COL,
            &value,
            &styles.kpi_value(kind),
        )?;
        worksheet.set_row_height(row, HEADER_ROW_HEIGHT)?;
    }

    let sections = [
        (layout::BRANCH_HEADING, "Revenue by Branch"),
        (layout::CATEGORY_HEADING, "Revenue Share by Category"),
        (layout::TREND_HEADING, "Daily Revenue Trend"),
    ];
    for (at, heading) in sections {
        worksheet.write_string_with_format(at.row, at.col, heading, &styles.section)?;
    }

    if let Some(charts) = charts {
        insert_chart(&mut worksheet, &charts.branch_revenue, layout::BRANCH_CHART, layout::SIDE_CHART_SCALE)?;
        insert_chart(&mut worksheet, &charts.category_share, layout::CATEGORY_CHART, layout::SIDE_CHART_SCALE)?;
        insert_chart(&mut worksheet, &charts.daily_trend, layout::TREND_CHART, layout::TREND_CHART_SCALE)?;
    }

    Ok(worksheet)
}

/// 画像を配置する（ファイルがなければ何もしない）
fn insert_chart(worksheet: &mut Worksheet, path: &Path, at: CellCoord, scale: f64) -> Result<()> {
    if !path.is_file() {
        debug!("Chart image not found, skipped: {}", path.display());
        return Ok(());
    }

    let image = Image::new(path)?
        .set_scale_width(scale)
        .set_scale_height(scale);
    worksheet.insert_image(at.row, at.col, &image)?;
    debug!("Embedded {} at {}", path.display(), at.to_a1_notation());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, RankedProduct};
    use crate::api::Palette;
    use crate::types::SaleRecord;
    use chrono::NaiveDate;

    fn table() -> ConsolidatedTable {
        let d = |day| NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        ConsolidatedTable::from_records(vec![
            SaleRecord::new(d(1), "Laptop", "Tech", 1, 900.0, "Ana", "North"),
            SaleRecord::new(d(2), "Pen", "Office", 10, 2.5, "Luis", "South"),
            SaleRecord::new(d(3), "Desk", "Office", 2, 150.0, "Ana", "North"),
        ])
    }

    #[test]
    fn test_consolidated_data_rows() {
        let grid = consolidated_data(&table());
        assert_eq!(grid.name(), CONSOLIDATED_DATA);
        assert_eq!(grid.rows().len(), 3);
        assert_eq!(grid.rows()[1][7], CellValue::Number(25.0));
        assert_eq!(
            grid.rows()[0][0],
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );
    }

    #[test]
    fn test_top_products_side_by_side() {
        let top = TopProducts {
            by_quantity: vec![
                RankedProduct { name: "Pen".into(), quantity: 10, revenue: 25.0 },
                RankedProduct { name: "Desk".into(), quantity: 2, revenue: 300.0 },
            ],
            by_revenue: vec![RankedProduct { name: "Laptop".into(), quantity: 1, revenue: 900.0 }],
        };
        let grid = top_products(&top);

        assert_eq!(grid.rows().len(), 2);
        assert_eq!(grid.rows()[0][0], CellValue::from("Pen"));
        assert_eq!(grid.rows()[0][2], CellValue::Empty);
        assert_eq!(grid.rows()[0][3], CellValue::from("Laptop"));
        assert_eq!(grid.rows()[1][3], CellValue::Empty);
        assert_eq!(grid.rows()[1][1], CellValue::Number(2.0));
    }

    #[test]
    fn test_branch_summary_total_row() {
        let report = analyze(&table(), 10);
        let grid = branch_summary(&report.branches);

        assert_eq!(grid.rows().len(), 2);
        let totals = grid.totals().unwrap();
        assert_eq!(totals[0], CellValue::from("TOTAL"));
        assert_eq!(totals[1].as_raw_string(), "=SUM(B2:B3)");
        assert_eq!(totals[1].as_number(), Some(report.stats.total_revenue));
    }

    #[test]
    fn test_branch_summary_empty_has_no_totals() {
        assert!(branch_summary(&[]).totals().is_none());
    }

    #[test]
    fn test_kpis_and_period() {
        let report = analyze(&table(), 10);
        let values = kpis(&report.stats);

        assert_eq!(values.len(), 6);
        assert_eq!(values[0].1, CellValue::Number(1225.0));
        assert_eq!(values[1].1, CellValue::Number(3.0));
        assert_eq!(values[5].0, "Unique Products");
        assert_eq!(period_line(&report.stats), "Period: 2024-02-01 to 2024-02-03");

        let empty = analyze(&ConsolidatedTable::default(), 10);
        assert_eq!(kpis(&empty.stats)[2].1, CellValue::Empty);
        assert_eq!(period_line(&empty.stats), "Period: no transactions");
    }

    #[test]
    fn test_dashboard_skips_missing_images() {
        let tmp = tempfile::tempdir().unwrap();
        let report = analyze(&table(), 10);
        let styles = ReportStyles::new(&Palette::default());
        let charts = ChartImages::in_dir(tmp.path());

        let worksheet = dashboard(&report, Some(&charts), &styles).unwrap();
        assert_eq!(worksheet.name(), DASHBOARD);
    }
}
