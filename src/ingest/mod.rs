//! Ingest Module
//!
//! 入力ディレクトリからパターンに一致するExcelファイルを探し、
//! 必須列を検証したうえで1つの統合テーブルに連結します。

mod discovery;
mod workbook;

use std::path::Path;

use tracing::{error, info};

use crate::error::Result;
use crate::types::ConsolidatedTable;

pub(crate) use discovery::find_matching_files;
pub(crate) use workbook::SalesWorkbook;

/// デフォルトの必須列
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Date",
    "Product",
    "Category",
    "Quantity",
    "Unit_Price",
    "Salesperson",
    "Branch",
];

/// ディレクトリ内のファイルを読み込み、統合テーブルを生成する
///
/// # 引数
///
/// * `dir` - 入力ディレクトリ
/// * `pattern` - ファイル名のglobパターン（例: `*.xlsx`）
/// * `required_columns` - 必須列（空の場合は検証しない）
///
/// # 戻り値
///
/// * `Ok(ConsolidatedTable)` - すべてのファイルの読み込みに成功した場合
/// * `Err(ConsolidatorError)` - いずれかのファイルで失敗した場合（部分的な成功はない）
///
/// # 使用例
///
/// ```rust,no_run
/// use std::path::Path;
/// use sales_consolidator::{consolidate, REQUIRED_COLUMNS};
///
/// # fn main() -> Result<(), sales_consolidator::ConsolidatorError> {
/// let table = consolidate(Path::new("input"), "*.xlsx", &REQUIRED_COLUMNS)?;
/// println!("{} records", table.len());
/// # Ok(())
/// # }
/// ```
pub fn consolidate(
    dir: &Path,
    pattern: &str,
    required_columns: &[&str],
) -> Result<ConsolidatedTable> {
    let files = find_matching_files(dir, pattern)?;
    info!("Found {} file(s) to process", files.len());

    let mut table = ConsolidatedTable::default();
    for path in files {
        let name = display_name(&path);
        info!("  -> Reading: {}", name);

        let records = SalesWorkbook::open(&path)
            .and_then(|mut workbook| workbook.read_records(required_columns))
            .map_err(|e| {
                error!("    x Error in {}: {}", name, e);
                e
            })?;

        info!("    {} records loaded", records.len());
        table.append(path, records);
    }

    info!("Consolidation complete: {} total records", table.len());
    Ok(table)
}

/// ログ・エラーメッセージ用のファイル名
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
