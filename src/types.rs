//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

/// 2桁に丸める
///
/// 集計値はすべて集計時点でこの関数を通して保存されます。
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 売上レコード（1取引 = 1行）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    /// 取引日
    pub date: NaiveDate,
    /// 商品名
    pub product: String,
    /// カテゴリ
    pub category: String,
    /// 数量
    pub quantity: u64,
    /// 単価
    pub unit_price: f64,
    /// 販売担当者
    pub salesperson: String,
    /// 支店
    pub branch: String,
    /// 行合計（数量 × 単価、2桁丸め）
    pub line_total: f64,
}

impl SaleRecord {
    /// 新しいレコードを生成し、行合計を計算する
    pub fn new(
        date: NaiveDate,
        product: impl Into<String>,
        category: impl Into<String>,
        quantity: u64,
        unit_price: f64,
        salesperson: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            date,
            product: product.into(),
            category: category.into(),
            quantity,
            unit_price,
            salesperson: salesperson.into(),
            branch: branch.into(),
            line_total: round2(quantity as f64 * unit_price),
        }
    }
}

/// 統合元ファイルの情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// ファイルパス
    pub path: PathBuf,
    /// 読み込んだレコード数
    pub rows: usize,
}

/// 統合テーブル
///
/// 全入力ファイルのレコードを、ファイル順・行順を保ったまま連結したもの。
/// 重複除去は行わず、レコードは位置（行番号）でのみ識別されます。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsolidatedTable {
    /// レコード（連続インデックス）
    pub records: Vec<SaleRecord>,
    /// 読み込んだファイルの一覧（処理順）
    pub sources: Vec<SourceFile>,
}

impl ConsolidatedTable {
    /// レコードから直接テーブルを生成（ファイル情報なし）
    pub fn from_records(records: Vec<SaleRecord>) -> Self {
        Self {
            records,
            sources: Vec::new(),
        }
    }

    /// 1ファイル分のレコードを末尾に追加
    pub(crate) fn append(&mut self, path: PathBuf, records: Vec<SaleRecord>) {
        self.sources.push(SourceFile {
            path,
            rows: records.len(),
        });
        self.records.extend(records);
    }

    /// レコード数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// レコードが空かどうか
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// セル座標（0始まり）
///
/// `rust_xlsxwriter`のネイティブなアドレス型（行: u32, 列: u16）に合わせています。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CellCoord {
    pub row: u32,
    pub col: u16,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        let col_str = Self::col_index_to_letter(self.col);
        format!("{}{}", col_str, self.row + 1)
    }

    /// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
    fn col_index_to_letter(col: u16) -> String {
        let mut col = col as u32;
        let mut result = String::new();
        loop {
            let remainder = col % 26;
            result.insert(0, (b'A' + remainder as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        result
    }
}

/// セル範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRange {
    pub start: CellCoord,
    pub end: CellCoord,
}

impl CellRange {
    /// 新しい範囲を生成
    pub fn new(start: CellCoord, end: CellCoord) -> Self {
        Self { start, end }
    }

    /// 1列分の縦方向の範囲を生成
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Self {
        Self::new(CellCoord::new(first_row, col), CellCoord::new(last_row, col))
    }

    /// A1形式の範囲文字列に変換（例: "B2:B4"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!(
            "{}:{}",
            self.start.to_a1_notation(),
            self.end.to_a1_notation()
        )
    }
}

/// レポートのセル値
///
/// 表示書式は値に焼き込まず、`ColumnFormats`で別途付与します。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 日付
    Date(NaiveDate),

    /// 数式（キャッシュされた計算結果付き）
    Formula { expr: String, cached: f64 },

    /// 空セル
    Empty,
}

impl CellValue {
    /// 値を文字列として取得（書式適用前）
    ///
    /// 列幅の自動計算に使用します。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Formula { expr, .. } => expr.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// 数値として取得（数値・数式以外はNone）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Formula { cached, .. } => Some(*cached),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u128> for CellValue {
    fn from(value: u128) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}
