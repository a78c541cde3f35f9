//! Report Styles
//!
//! `Palette`から`rust_xlsxwriter::Format`を組み立てるモジュール。

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder};

use crate::api::{NumberFormatKind, Palette};

const FONT_NAME: &str = "Calibri";

/// ヘッダー行の高さ
pub(crate) const HEADER_ROW_HEIGHT: f64 = 25.0;
/// データ行の高さ
pub(crate) const DATA_ROW_HEIGHT: f64 = 20.0;

/// レポート全体で使用する書式
#[derive(Debug, Clone)]
pub(crate) struct ReportStyles {
    palette: Palette,
    pub header: Format,
    pub title: Format,
    pub subtitle: Format,
    pub section: Format,
    pub kpi_label: Format,
}

impl ReportStyles {
    pub fn new(palette: &Palette) -> Self {
        let header = Format::new()
            .set_bold()
            .set_font_name(FONT_NAME)
            .set_font_size(11)
            .set_font_color(Color::RGB(palette.white))
            .set_background_color(Color::RGB(palette.dark_blue))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(palette.border));

        let title = Format::new()
            .set_bold()
            .set_font_name(FONT_NAME)
            .set_font_size(16)
            .set_font_color(Color::RGB(palette.dark_blue));

        let subtitle = Format::new()
            .set_italic()
            .set_font_name(FONT_NAME)
            .set_font_size(10)
            .set_font_color(Color::RGB(palette.gray));

        let section = Format::new()
            .set_bold()
            .set_font_name(FONT_NAME)
            .set_font_size(12)
            .set_font_color(Color::RGB(palette.dark_blue));

        let kpi_label = Format::new()
            .set_bold()
            .set_font_name(FONT_NAME)
            .set_font_size(11)
            .set_background_color(Color::RGB(palette.light_blue))
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(palette.border));

        Self {
            palette: *palette,
            header,
            title,
            subtitle,
            section,
            kpi_label,
        }
    }

    /// データセルの書式（数値書式は任意）
    pub fn data(&self, kind: Option<NumberFormatKind>) -> Format {
        let format = Format::new()
            .set_font_name(FONT_NAME)
            .set_font_size(10)
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(Color::RGB(self.palette.border));
        with_number_format(format, kind)
    }

    /// 合計行の書式
    pub fn total(&self, kind: Option<NumberFormatKind>) -> Format {
        let format = self
            .data(None)
            .set_bold()
            .set_background_color(Color::RGB(self.palette.light_blue));
        with_number_format(format, kind)
    }

    /// KPI値の書式
    pub fn kpi_value(&self, kind: NumberFormatKind) -> Format {
        let format = self
            .kpi_label
            .clone()
            .set_font_size(12)
            .set_font_color(Color::RGB(self.palette.green))
            .set_align(FormatAlign::Right);
        with_number_format(format, Some(kind))
    }
}

fn with_number_format(format: Format, kind: Option<NumberFormatKind>) -> Format {
    match kind {
        Some(kind) => format.set_num_format(kind.pattern()),
        None => format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_format_is_applied() {
        let styles = ReportStyles::new(&Palette::default());
        assert_eq!(
            styles.data(Some(NumberFormatKind::Currency)),
            styles.data(None).set_num_format("$#,##0.00")
        );
        assert_ne!(
            styles.data(Some(NumberFormatKind::Percentage)),
            styles.data(None)
        );
    }

    #[test]
    fn test_palette_changes_header() {
        let default = ReportStyles::new(&Palette::default());
        let custom = ReportStyles::new(&Palette {
            dark_blue: 0x000000,
            ..Palette::default()
        });
        assert_ne!(default.header, custom.header);
    }
}
