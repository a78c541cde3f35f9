//! Report Module
//!
//! 統合テーブルと集計結果を書式付きのExcelブックとして出力するモジュール。
//!
//! シートの順序は固定です: Dashboard, Consolidated_Data, Top_Products,
//! Salesperson_Analysis, Branch_Summary。
//! ブック全体をメモリ上で組み立ててから一時ファイルに書き込み、最後に
//! 出力パスへアトミックに移動します。途中で失敗した場合、出力パスには
//! 何も書き込まれません。

mod grid;
mod sheets;
mod style;

use std::fs;
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::analysis::AnalysisReport;
use crate::api::Palette;
use crate::charts::ChartImages;
use crate::error::Result;
use crate::types::ConsolidatedTable;

use style::ReportStyles;

/// シート名（出力順）
pub const SHEET_NAMES: [&str; 5] = [
    sheets::DASHBOARD,
    sheets::CONSOLIDATED_DATA,
    sheets::TOP_PRODUCTS,
    sheets::SALESPERSON_ANALYSIS,
    sheets::BRANCH_SUMMARY,
];

/// レポートブックを組み立て、バイト列として返す
///
/// # 引数
///
/// * `table` - 統合テーブル
/// * `report` - 集計結果
/// * `charts` - ダッシュボードに埋め込むグラフ画像（存在しないファイルはスキップ）
/// * `palette` - 配色
pub(crate) fn build_report(
    table: &ConsolidatedTable,
    report: &AnalysisReport,
    charts: Option<&ChartImages>,
    palette: &Palette,
) -> Result<Vec<u8>> {
    let styles = ReportStyles::new(palette);
    let mut workbook = Workbook::new();

    workbook.push_worksheet(sheets::dashboard(report, charts, &styles)?);

    let grids = [
        sheets::consolidated_data(table),
        sheets::top_products(&report.top_products),
        sheets::salesperson_analysis(&report.salespeople),
        sheets::branch_summary(&report.branches),
    ];
    for grid in &grids {
        debug!("Writing sheet {} ({} rows)", grid.name(), grid.rows().len());
        workbook.push_worksheet(grid.to_worksheet(&styles)?);
    }

    Ok(workbook.save_to_buffer()?)
}

/// レポートを組み立てて出力パスに保存する
pub(crate) fn write_report(
    table: &ConsolidatedTable,
    report: &AnalysisReport,
    charts: Option<&ChartImages>,
    palette: &Palette,
    output: &Path,
) -> Result<()> {
    let buffer = build_report(table, report, charts, palette)?;
    save_atomically(output, &buffer)?;
    info!("Report saved: {}", output.display());
    Ok(())
}

/// 同じディレクトリの一時ファイルに書き込んでから置き換える
fn save_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::types::SaleRecord;
    use calamine::{open_workbook_auto, Data, Reader};
    use chrono::NaiveDate;

    fn table() -> ConsolidatedTable {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        ConsolidatedTable::from_records(vec![
            SaleRecord::new(d(1), "Laptop", "Tech", 1, 1200.0, "Ana", "North"),
            SaleRecord::new(d(1), "Pen", "Office", 4, 1.25, "Luis", "South"),
            SaleRecord::new(d(2), "Chair", "Office", 2, 80.0, "Ana", "Center"),
        ])
    }

    #[test]
    fn test_report_sheet_order_and_totals() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("out").join("report.xlsx");
        let table = table();
        let report = analyze(&table, 10);

        write_report(&table, &report, None, &Palette::default(), &output).unwrap();
        assert!(output.is_file());

        let mut workbook = open_workbook_auto(&output).unwrap();
        assert_eq!(workbook.sheet_names(), SHEET_NAMES.map(String::from).to_vec());

        let branches = workbook.worksheet_range("Branch_Summary").unwrap();
        assert_eq!(branches.height(), 5);
        assert_eq!(branches.get((4, 0)), Some(&Data::String("TOTAL".to_string())));
        match branches.get((4, 1)) {
            Some(Data::Float(v)) => assert!((v - report.stats.total_revenue).abs() < 0.01),
            other => panic!("Expected cached total, got {:?}", other),
        }

        let formulas = workbook.worksheet_formula("Branch_Summary").unwrap();
        let formula = formulas.get((4, 1)).cloned().unwrap_or_default();
        assert!(formula.contains("SUM(B2:B4)"), "formula was {:?}", formula);

        let data = workbook.worksheet_range("Consolidated_Data").unwrap();
        assert_eq!(data.height(), 4);
        assert_eq!(data.get((0, 7)), Some(&Data::String("Line_Total".to_string())));
    }

    #[test]
    fn test_save_atomically_replaces_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.xlsx");
        fs::write(&path, b"old").unwrap();

        save_atomically(&path, b"new").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
        let leftovers = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_empty_table_report() {
        let table = ConsolidatedTable::default();
        let report = analyze(&table, 10);
        let bytes = build_report(&table, &report, None, &Palette::default()).unwrap();
        assert!(!bytes.is_empty());
    }
}
