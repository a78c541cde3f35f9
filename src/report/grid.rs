//! Sheet Grid
//!
//! シートの内容を型付きセルの2次元配列として保持し、書式を適用しながら
//! `rust_xlsxwriter::Worksheet`に書き出すモジュール。
//!
//! 値の書き込みと書式の適用は同じ1回の走査で行います。表示書式は
//! `ColumnFormats`で列ごとに宣言され、セル値そのものは変更されません。

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Formula, Table, TableColumn, TableStyle, Worksheet};
use unicode_width::UnicodeWidthStr;

use crate::api::NumberFormatKind;
use crate::error::Result;
use crate::report::style::{ReportStyles, DATA_ROW_HEIGHT, HEADER_ROW_HEIGHT};
use crate::types::{round2, CellRange, CellValue};

/// 列幅の上限（文字数）
const MAX_COLUMN_WIDTH: usize = 50;
/// 最長セルに加える余白
const COLUMN_PADDING: usize = 3;

/// 列インデックス → 数値書式の対応表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ColumnFormats(BTreeMap<u16, NumberFormatKind>);

impl ColumnFormats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 列に書式を割り当てる
    pub fn with(mut self, col: u16, kind: NumberFormatKind) -> Self {
        self.0.insert(col, kind);
        self
    }

    pub fn get(&self, col: u16) -> Option<NumberFormatKind> {
        self.0.get(&col).copied()
    }
}

/// 1シート分のグリッド
///
/// 1行目がヘッダー、以降がデータ行。合計行が設定されている場合は
/// データ行の直後に書き出されます。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SheetGrid {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    formats: ColumnFormats,
    table_name: Option<String>,
    totals: Option<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            formats: ColumnFormats::new(),
            table_name: None,
            totals: None,
        }
    }

    /// データ行を追加（列数に満たない分は空セルで埋める）
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn with_formats(mut self, formats: ColumnFormats) -> Self {
        self.formats = formats;
        self
    }

    /// Excelテーブルとして登録する
    pub fn with_table(mut self, name: &str) -> Self {
        self.table_name = Some(name.to_string());
        self
    }

    /// 指定列の`=SUM()`数式を持つ合計行を追加する
    ///
    /// 数式にはキャッシュ値として現在のデータ行の合計を持たせます。
    /// データ行がない場合、合計行は追加されません。
    pub fn with_totals(mut self, label: &str, sum_columns: &[u16]) -> Self {
        if self.rows.is_empty() {
            return self;
        }

        let last_row = self.rows.len() as u32;
        let mut totals = vec![CellValue::Empty; self.headers.len()];
        if let Some(first) = totals.first_mut() {
            *first = CellValue::from(label);
        }

        for &col in sum_columns {
            let sum: f64 = self
                .rows
                .iter()
                .filter_map(|row| row.get(col as usize).and_then(CellValue::as_number))
                .sum();
            let cached = match self.formats.get(col) {
                Some(NumberFormatKind::Percentage) => sum,
                _ => round2(sum),
            };

            if let Some(cell) = totals.get_mut(col as usize) {
                *cell = CellValue::Formula {
                    expr: format!("=SUM({})", CellRange::column(col, 1, last_row).to_a1_notation()),
                    cached,
                };
            }
        }

        self.totals = Some(totals);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn totals(&self) -> Option<&[CellValue]> {
        self.totals.as_deref()
    }

    /// 各列の幅（最長の文字列表現 + 余白、上限あり）
    pub fn column_widths(&self) -> Vec<f64> {
        (0..self.headers.len())
            .map(|col| {
                let header = self.headers[col].width();
                let longest = self
                    .rows
                    .iter()
                    .chain(self.totals.iter())
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.as_raw_string().width())
                    .fold(header, usize::max);
                (longest + COLUMN_PADDING).min(MAX_COLUMN_WIDTH) as f64
            })
            .collect()
    }

    /// ワークシートに書き出す
    pub fn to_worksheet(&self, styles: &ReportStyles) -> Result<Worksheet> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(&self.name)?;

        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &styles.header)?;
        }
        worksheet.set_row_height(0, HEADER_ROW_HEIGHT)?;

        let data_formats: Vec<Format> = (0..self.headers.len())
            .map(|col| styles.data(self.formats.get(col as u16)))
            .collect();

        for (i, row) in self.rows.iter().enumerate() {
            let row_index = i as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                write_cell(&mut worksheet, row_index, col as u16, value, &data_formats[col])?;
            }
            worksheet.set_row_height(row_index, DATA_ROW_HEIGHT)?;
        }

        if let Some(totals) = self.totals() {
            let row_index = self.rows.len() as u32 + 1;
            for (col, value) in totals.iter().enumerate() {
                let format = styles.total(self.formats.get(col as u16));
                write_cell(&mut worksheet, row_index, col as u16, value, &format)?;
            }
            worksheet.set_row_height(row_index, DATA_ROW_HEIGHT)?;
        }

        for (col, width) in self.column_widths().into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width)?;
        }

        if let Some(name) = &self.table_name {
            // ヘッダーのみのテーブルは作成しない
            if !self.rows.is_empty() && !self.headers.is_empty() {
                let columns: Vec<TableColumn> = self
                    .headers
                    .iter()
                    .map(|h| {
                        TableColumn::new()
                            .set_header(h)
                            .set_header_format(styles.header.clone())
                    })
                    .collect();
                let table = Table::new()
                    .set_name(name)
                    .set_style(TableStyle::Medium9)
                    .set_columns(&columns);

                worksheet.add_table(
                    0,
                    0,
                    self.rows.len() as u32,
                    self.headers.len() as u16 - 1,
                    &table,
                )?;
            }
        }

        Ok(worksheet)
    }
}

/// 1セルを型に応じて書き込む
pub(crate) fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: &Format,
) -> Result<()> {
    match value {
        CellValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, format)?;
        }
        CellValue::String(s) => {
            worksheet.write_string_with_format(row, col, s, format)?;
        }
        CellValue::Date(d) => {
            let date = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
            worksheet.write_datetime_with_format(row, col, &date, format)?;
        }
        CellValue::Formula { expr, cached } => {
            let formula = Formula::new(expr).set_result(cached.to_string());
            worksheet.write_formula_with_format(row, col, formula, format)?;
        }
        CellValue::Empty => {
            worksheet.write_blank(row, col, format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Palette;

    fn branch_grid() -> SheetGrid {
        let mut grid = SheetGrid::new("Branch_Summary", &["Branch", "Revenue", "Transactions", "Share"])
            .with_formats(
                ColumnFormats::new()
                    .with(1, NumberFormatKind::Currency)
                    .with(2, NumberFormatKind::Integer)
                    .with(3, NumberFormatKind::Percentage),
            );
        grid.push_row(vec!["North".into(), 600.25.into(), 3usize.into(), 0.6.into()]);
        grid.push_row(vec!["South".into(), 400.17.into(), 2usize.into(), 0.4.into()]);
        grid
    }

    #[test]
    fn test_totals_row_formulas() {
        let grid = branch_grid().with_totals("TOTAL", &[1, 2, 3]);
        let totals = grid.totals().unwrap();

        assert_eq!(totals[0], CellValue::from("TOTAL"));
        assert_eq!(
            totals[1],
            CellValue::Formula {
                expr: "=SUM(B2:B3)".to_string(),
                cached: 1000.42
            }
        );
        assert_eq!(totals[2].as_raw_string(), "=SUM(C2:C3)");
        assert_eq!(totals[2].as_number(), Some(5.0));
        assert!((totals[3].as_number().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_totals_omitted_without_rows() {
        let grid = SheetGrid::new("Branch_Summary", &["Branch", "Revenue"]).with_totals("TOTAL", &[1]);
        assert!(grid.totals().is_none());
    }

    #[test]
    fn test_push_row_pads_missing_cells() {
        let mut grid = SheetGrid::new("S", &["A", "B", "C"]);
        grid.push_row(vec!["x".into()]);
        assert_eq!(grid.rows()[0].len(), 3);
        assert_eq!(grid.rows()[0][2], CellValue::Empty);
    }

    #[test]
    fn test_column_widths() {
        let mut grid = SheetGrid::new("S", &["Id", "Description"]);
        grid.push_row(vec!["short".into(), "x".repeat(80).into()]);
        grid.push_row(vec!["日本語".into(), "y".into()]);

        let widths = grid.column_widths();
        // "short" = 5, "日本語" = 6 (全角)
        assert_eq!(widths[0], 9.0);
        assert_eq!(widths[1], 50.0);
    }

    #[test]
    fn test_to_worksheet_with_table() {
        let styles = ReportStyles::new(&Palette::default());
        let grid = branch_grid().with_table("BranchTable");
        let mut worksheet = grid.to_worksheet(&styles).unwrap();
        assert_eq!(worksheet.name(), "Branch_Summary");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        workbook.push_worksheet(worksheet);
        assert!(workbook.save_to_buffer().is_ok());

        worksheet = SheetGrid::new("Empty", &["A"]).with_table("EmptyTable").to_worksheet(&styles).unwrap();
        assert_eq!(worksheet.name(), "Empty");
    }

    #[test]
    fn test_invalid_sheet_name() {
        let styles = ReportStyles::new(&Palette::default());
        let grid = SheetGrid::new("bad[name]", &["A"]);
        assert!(grid.to_worksheet(&styles).is_err());
    }
}
