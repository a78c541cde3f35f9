//! Public API Types
//!
//! 公開APIで使用する列挙型と設定値を定義するモジュール。

use serde::Serialize;

/// 集計の軸
///
/// `analysis::aggregate_by`でグループ化に使用するレコードのフィールドを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum Dimension {
    /// 支店
    Branch,
    /// 商品
    Product,
    /// 販売担当者
    Salesperson,
    /// カテゴリ
    Category,
    /// 取引日（ISO 8601形式の文字列キー）
    Date,
}

impl Dimension {
    /// 入力ファイル上の列名
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Branch => "Branch",
            Dimension::Product => "Product",
            Dimension::Salesperson => "Salesperson",
            Dimension::Category => "Category",
            Dimension::Date => "Date",
        }
    }
}

/// 列の数値書式
///
/// セル値そのものは変更せず、表示書式のみを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NumberFormatKind {
    /// 通貨（`$#,##0.00`）
    Currency,

    /// 桁区切り付き整数（`#,##0`）
    Integer,

    /// パーセント（`0.00%`）
    ///
    /// 値は0.0〜1.0の比率として保存されている必要があります。
    Percentage,

    /// 日付（`yyyy-mm-dd`）
    Date,
}

impl NumberFormatKind {
    /// Excelの書式文字列
    pub fn pattern(&self) -> &'static str {
        match self {
            NumberFormatKind::Currency => "$#,##0.00",
            NumberFormatKind::Integer => "#,##0",
            NumberFormatKind::Percentage => "0.00%",
            NumberFormatKind::Date => "yyyy-mm-dd",
        }
    }
}

/// レポートの配色（RGB 24bit）
///
/// プロセス全体で共有される不変の設定値として、書式設定とグラフ描画の両方に
/// 明示的に渡されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// タイトル・ヘッダー背景
    pub dark_blue: u32,
    /// KPI・合計行の背景
    pub light_blue: u32,
    /// 補助テキスト
    pub gray: u32,
    /// KPI値
    pub green: u32,
    /// 強調色
    pub orange: u32,
    /// ヘッダー文字色
    pub white: u32,
    /// 罫線
    pub border: u32,
    /// 円グラフの系列色
    pub series: [u32; 6],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark_blue: 0x1F4788,
            light_blue: 0xD6E4F5,
            gray: 0x7F7F7F,
            green: 0x70AD47,
            orange: 0xED7D31,
            white: 0xFFFFFF,
            border: 0xD3D3D3,
            series: [0x1F4788, 0x70AD47, 0xED7D31, 0x4472C4, 0xFFC000, 0x5B9BD5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format_patterns() {
        assert_eq!(NumberFormatKind::Currency.pattern(), "$#,##0.00");
        assert_eq!(NumberFormatKind::Integer.pattern(), "#,##0");
        assert_eq!(NumberFormatKind::Percentage.pattern(), "0.00%");
    }

    #[test]
    fn test_dimension_column_names() {
        assert_eq!(Dimension::Branch.column_name(), "Branch");
        assert_eq!(Dimension::Salesperson.column_name(), "Salesperson");
    }

    #[test]
    fn test_default_palette() {
        let palette = Palette::default();
        assert_eq!(palette.dark_blue, 0x1F4788);
        assert_eq!(palette.series[1], palette.green);
    }
}
