//! Workbook Reader
//!
//! calamineを使用して入力ファイルの最初のシートを読み込み、
//! ヘッダー行を検証したうえで`SaleRecord`に変換します。

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{ConsolidatorError, Result};
use crate::ingest::{display_name, REQUIRED_COLUMNS};
use crate::types::SaleRecord;

/// 文字列として受け付ける日付書式
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
/// f64で正確に表現できる最大の整数（2^53）
const MAX_QUANTITY: f64 = 9_007_199_254_740_992.0;

/// 1900年3月1日のシリアル値。これより前はExcelの架空の1900年2月29日を含む
const FIRST_RELIABLE_SERIAL: f64 = 61.0;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// 入力ワークブック
///
/// calamineのラッパーとして、1ファイル分の読み込みを担当します。
/// ファイルハンドルはこの構造体のスコープ内でのみ保持されます。
pub(crate) struct SalesWorkbook {
    /// ログ・エラー用のファイル名
    name: String,
    /// calamineのワークブック（xlsx / xls / xlsb / ods）
    sheets: Sheets<BufReader<File>>,
}

/// ヘッダー行から解決した各フィールドの列インデックス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    date: usize,
    product: usize,
    category: usize,
    quantity: usize,
    unit_price: usize,
    salesperson: usize,
    branch: usize,
}

impl ColumnMap {
    /// ヘッダー行を検証して列インデックスを解決する
    ///
    /// 欠けている列は、必須列リストの順序 → レコードのフィールド順で列挙されます。
    fn resolve(file: &str, header: &[String], required: &[&str]) -> Result<Self> {
        let position = |name: &str| header.iter().position(|h| h == name);

        let mut missing: Vec<String> = required
            .iter()
            .filter(|name| position(name).is_none())
            .map(|name| name.to_string())
            .collect();
        for name in REQUIRED_COLUMNS {
            if position(name).is_none() && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }

        if !missing.is_empty() {
            return Err(ConsolidatorError::MissingColumns {
                file: file.to_string(),
                columns: missing,
            });
        }

        let index = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            date: index("Date"),
            product: index("Product"),
            category: index("Category"),
            quantity: index("Quantity"),
            unit_price: index("Unit_Price"),
            salesperson: index("Salesperson"),
            branch: index("Branch"),
        })
    }
}

impl SalesWorkbook {
    /// ワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Ok(SalesWorkbook)` - 読み込みに成功した場合
    /// * `Err(ConsolidatorError::Parse)` - 形式が不正、または読み込めない場合
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)?;
        Ok(Self {
            name: display_name(path),
            sheets,
        })
    }

    /// 最初のシートを読み込み、レコードのリストに変換する
    ///
    /// # 引数
    ///
    /// * `required_columns` - 存在しなければならない列名（完全一致）
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<SaleRecord>)` - シート上の順序を保ったレコード
    /// * `Err(ConsolidatorError::MissingColumns)` - 必須列が欠けている場合
    /// * `Err(ConsolidatorError::InvalidRecord)` - セル値を変換できない場合
    pub fn read_records(&mut self, required_columns: &[&str]) -> Result<Vec<SaleRecord>> {
        let range = self.sheets.worksheet_range_at(0).ok_or_else(|| {
            ConsolidatorError::Parse(calamine::Error::Msg("workbook contains no worksheets"))
        })??;

        parse_range(&self.name, &range, required_columns)
    }
}

/// セル範囲をレコードに変換する
fn parse_range(file: &str, range: &Range<Data>, required: &[&str]) -> Result<Vec<SaleRecord>> {
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell_to_string(cell).trim().to_string()).collect())
        .unwrap_or_default();

    let columns = ColumnMap::resolve(file, &header, required)?;

    // シート上の1始まりの行番号（範囲がA1から始まらない場合を考慮）
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0) + 1;

    let empty = Data::Empty;
    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let row_number = first_row + offset + 1;
        let invalid = |column: &str, message: String| ConsolidatorError::InvalidRecord {
            file: file.to_string(),
            row: row_number,
            column: column.to_string(),
            message,
        };
        let cell = |index: usize| row.get(index).unwrap_or(&empty);

        let date = parse_date(cell(columns.date)).map_err(|m| invalid("Date", m))?;
        let product = parse_text(cell(columns.product)).map_err(|m| invalid("Product", m))?;
        let category = parse_text(cell(columns.category)).map_err(|m| invalid("Category", m))?;
        let quantity =
            parse_quantity(cell(columns.quantity)).map_err(|m| invalid("Quantity", m))?;
        let unit_price =
            parse_price(cell(columns.unit_price)).map_err(|m| invalid("Unit_Price", m))?;
        let salesperson =
            parse_text(cell(columns.salesperson)).map_err(|m| invalid("Salesperson", m))?;
        let branch = parse_text(cell(columns.branch)).map_err(|m| invalid("Branch", m))?;

        records.push(SaleRecord::new(
            date,
            product,
            category,
            quantity,
            unit_price,
            salesperson,
            branch,
        ));
    }

    Ok(records)
}

/// セル値を文字列化（ヘッダー・テキスト列用）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("{:?}", e),
        _ => String::new(),
    }
}

fn parse_text(cell: &Data) -> std::result::Result<String, String> {
    if let Data::Error(e) = cell {
        return Err(format!("cell contains an error value ({:?})", e));
    }
    let text = cell_to_string(cell).trim().to_string();
    if text.is_empty() {
        return Err("missing value".to_string());
    }
    Ok(text)
}

fn parse_quantity(cell: &Data) -> std::result::Result<u64, String> {
    let value = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        Data::Empty => return Err("missing value".to_string()),
        other => return Err(format!("unexpected cell value {:?}", other)),
    };

    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(format!("expected a non-negative integer, got {}", value));
    }
    if value > MAX_QUANTITY {
        return Err(format!("quantity {} exceeds the supported maximum", value));
    }
    Ok(value as u64)
}

fn parse_price(cell: &Data) -> std::result::Result<f64, String> {
    let value = match cell {
        Data::Int(i) => *i as f64,
        Data::Float(f) => *f,
        Data::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s))?,
        Data::Empty => return Err("missing value".to_string()),
        other => return Err(format!("unexpected cell value {:?}", other)),
    };

    if !value.is_finite() || value < 0.0 {
        return Err(format!("expected a non-negative amount, got {}", value));
    }
    Ok(value)
}

/// 日付セルを`NaiveDate`に変換する
///
/// 時刻部分は切り捨てられます。
fn parse_date(cell: &Data) -> std::result::Result<NaiveDate, String> {
    match cell {
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Ok(datetime.date()),
            None => serial_to_date(dt.as_f64()),
        },
        Data::Float(f) => serial_to_date(*f),
        Data::Int(i) => serial_to_date(*i as f64),
        Data::String(s) | Data::DateTimeIso(s) => parse_date_str(s.trim()),
        Data::Empty => Err("missing value".to_string()),
        other => Err(format!("unexpected cell value {:?}", other)),
    }
}

fn parse_date_str(s: &str) -> std::result::Result<NaiveDate, String> {
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(datetime.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    Err(format!("'{}' is not a recognised date", s))
}

/// Excelのシリアル日付値（1900年システム）を日付に変換
///
/// 1899年12月30日起算。1900年3月1日より前のシリアル値は拒否します。
fn serial_to_date(serial: f64) -> std::result::Result<NaiveDate, String> {
    if !serial.is_finite() || serial < FIRST_RELIABLE_SERIAL {
        return Err(format!("{} is not a valid date serial", serial));
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .ok_or_else(|| "invalid epoch date".to_string())?;
    epoch
        .checked_add_signed(Duration::days(serial.floor() as i64))
        .ok_or_else(|| format!("date serial {} is out of range", serial))
}
