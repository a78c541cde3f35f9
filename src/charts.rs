//! Charts Module
//!
//! 集計結果からダッシュボードに埋め込むPNG画像を`plotters`で描画するモジュール。
//!
//! 描画の失敗はレポート全体の失敗にはしません。失敗したグラフは警告ログを出して
//! スキップされ、埋め込み時には画像が存在しないものとして扱われます。

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisReport, BranchStats, CategoryStats, DailyRevenue};
use crate::api::Palette;
use crate::error::{ConsolidatorError, Result};

/// 画像サイズ（ピクセル）
const CHART_SIZE: (u32, u32) = (1000, 600);

/// 円グラフでパーセント表示する最小の構成比
const MIN_LABELED_SHARE: f64 = 0.03;

const FONT: &str = "sans-serif";

/// ダッシュボード用グラフ画像のパス
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImages {
    /// 支店別売上（棒グラフ）
    pub branch_revenue: PathBuf,
    /// カテゴリ別構成比（円グラフ）
    pub category_share: PathBuf,
    /// 日別売上推移（折れ線グラフ）
    pub daily_trend: PathBuf,
}

impl ChartImages {
    /// 指定ディレクトリ内の画像パスを生成
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            branch_revenue: dir.join("branch_revenue.png"),
            category_share: dir.join("category_share.png"),
            daily_trend: dir.join("daily_trend.png"),
        }
    }
}

/// すべてのグラフを描画する
///
/// 個々のグラフの失敗は`warn!`で記録するのみで、常に画像パスの一覧を返します。
/// 描画されなかった画像はファイルとして存在しません。
pub fn render_charts(report: &AnalysisReport, dir: &Path, palette: &Palette) -> ChartImages {
    let images = ChartImages::in_dir(dir);

    if let Err(e) = fs::create_dir_all(dir) {
        warn!("Could not create chart directory {}: {}", dir.display(), e);
        return images;
    }

    info!("Rendering charts into {}", dir.display());
    render_one(&images.branch_revenue, !report.branches.is_empty(), |path| {
        draw_branch_revenue(path, &report.branches, palette)
    });
    render_one(
        &images.category_share,
        !report.categories.is_empty(),
        |path| draw_category_share(path, &report.categories, palette),
    );
    render_one(&images.daily_trend, !report.daily.is_empty(), |path| {
        draw_daily_trend(path, &report.daily, palette)
    });

    images
}

fn render_one(path: &Path, has_data: bool, draw: impl FnOnce(&Path) -> Result<()>) {
    // 前回実行時の画像を埋め込まない
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove stale chart {}: {}", path.display(), e);
        }
    }

    if !has_data {
        debug!("No data for {}, skipped", path.display());
        return;
    }

    match draw(path) {
        Ok(()) => debug!("Chart written: {}", path.display()),
        Err(e) => {
            warn!("Chart {} skipped: {}", path.display(), e);
            let _ = fs::remove_file(path);
        }
    }
}

/// 支店別売上の棒グラフ
fn draw_branch_revenue(path: &Path, branches: &[BranchStats], palette: &Palette) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let y_max = axis_max(branches.iter().map(|b| b.revenue));
    let mut chart = ChartBuilder::on(&root)
        .caption("Revenue by Branch", (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(100)
        .build_cartesian_2d((0u32..branches.len() as u32).into_segmented(), 0f64..y_max)
        .map_err(chart_error)?;

    let x_label = |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => branches
            .get(*i as usize)
            .map(|b| b.name.clone())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };
    let y_label = |value: &f64| currency_label(*value);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(branches.len())
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .y_desc("Revenue")
        .draw()
        .map_err(chart_error)?;

    chart
        .draw_series(
            Histogram::vertical(&chart)
                .style(rgb(palette.dark_blue).filled())
                .margin(15)
                .data(
                    branches
                        .iter()
                        .enumerate()
                        .map(|(i, b)| (i as u32, b.revenue)),
                ),
        )
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

/// カテゴリ別構成比の円グラフ
///
/// 構成比が3%以下の扇形にはラベルを付けません。
fn draw_category_share(
    path: &Path,
    categories: &[CategoryStats],
    palette: &Palette,
) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let title = root
        .titled("Revenue Share by Category", (FONT, 28))
        .map_err(chart_error)?;
    let (pie_area, legend_area) = title.split_horizontally(650);

    let (width, height) = pie_area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = (width.min(height) as f64 / 2.0) * 0.85;

    let mut start = -std::f64::consts::FRAC_PI_2;
    for (i, category) in categories.iter().enumerate() {
        let color = rgb(palette.series[i % palette.series.len()]);
        let sweep = category.share * std::f64::consts::TAU;
        if sweep <= 0.0 {
            continue;
        }

        pie_area
            .draw(&Polygon::new(
                wedge_points(center, radius, start, sweep),
                color.filled(),
            ))
            .map_err(chart_error)?;

        if let Some(label) = slice_label(category.share) {
            let mid = start + sweep / 2.0;
            let at = polar(center, radius * 0.65, mid);
            pie_area
                .draw(&Text::new(
                    label,
                    (at.0 - 20, at.1 - 8),
                    (FONT, 18).into_font().color(&WHITE),
                ))
                .map_err(chart_error)?;
        }

        start += sweep;
    }

    draw_legend(&legend_area, categories, palette)?;
    root.present().map_err(chart_error)?;
    Ok(())
}

fn draw_legend(
    area: &DrawingArea<BitMapBackend, Shift>,
    categories: &[CategoryStats],
    palette: &Palette,
) -> Result<()> {
    for (i, category) in categories.iter().enumerate() {
        let y = 40 + i as i32 * 30;
        let color = rgb(palette.series[i % palette.series.len()]);
        area.draw(&Rectangle::new([(10, y), (28, y + 18)], color.filled()))
            .map_err(chart_error)?;
        area.draw(&Text::new(
            category.name.clone(),
            (36, y),
            (FONT, 18).into_font().color(&BLACK),
        ))
        .map_err(chart_error)?;
    }
    Ok(())
}

/// 日別売上の折れ線グラフ（マーカー付き）
fn draw_daily_trend(path: &Path, daily: &[DailyRevenue], palette: &Palette) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let y_max = axis_max(daily.iter().map(|d| d.revenue));
    let x_max = daily.len() as f64 - 0.5;
    let mut chart = ChartBuilder::on(&root)
        .caption("Daily Revenue", (FONT, 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5f64..x_max, 0f64..y_max)
        .map_err(chart_error)?;

    let x_label = |value: &f64| {
        let index = value.round();
        if (value - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        daily
            .get(index as usize)
            .map(|d| d.date.format("%m-%d").to_string())
            .unwrap_or_default()
    };
    let y_label = |value: &f64| currency_label(*value);

    chart
        .configure_mesh()
        .x_labels(daily.len().min(12))
        .x_label_formatter(&x_label)
        .y_label_formatter(&y_label)
        .y_desc("Revenue")
        .draw()
        .map_err(chart_error)?;

    let color = rgb(palette.green);
    let points: Vec<(f64, f64)> = daily
        .iter()
        .enumerate()
        .map(|(i, d)| (i as f64, d.revenue))
        .collect();

    chart
        .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
        .map_err(chart_error)?;
    chart
        .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
        .map_err(chart_error)?;

    root.present().map_err(chart_error)?;
    Ok(())
}

fn chart_error(e: impl Display) -> ConsolidatorError {
    ConsolidatorError::Chart(e.to_string())
}

fn rgb(color: u32) -> RGBColor {
    RGBColor(
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}

/// Y軸の上限（最大値の10%上）
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// `$#,###`形式の軸ラベル
fn currency_label(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn slice_label(share: f64) -> Option<String> {
    (share > MIN_LABELED_SHARE).then(|| format!("{:.1}%", share * 100.0))
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 + (radius * angle.sin()).round() as i32,
    )
}

/// 扇形を近似する多角形の頂点
fn wedge_points(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep.to_degrees() / 2.0).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let angle = start + sweep * step as f64 / steps as f64;
        points.push(polar(center, radius, angle));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_label() {
        assert_eq!(currency_label(0.0), "$0");
        assert_eq!(currency_label(999.4), "$999");
        assert_eq!(currency_label(1000.0), "$1,000");
        assert_eq!(currency_label(1234567.8), "$1,234,568");
        assert_eq!(currency_label(-2500.0), "-$2,500");
    }

    #[test]
    fn test_slice_label_threshold() {
        assert_eq!(slice_label(0.03), None);
        assert_eq!(slice_label(0.01), None);
        assert_eq!(slice_label(0.25), Some("25.0%".to_string()));
    }

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(rgb(0x1F4788), RGBColor(0x1F, 0x47, 0x88));
        assert_eq!(rgb(0xFFFFFF), RGBColor(255, 255, 255));
    }

    #[test]
    fn test_axis_max() {
        assert_eq!(axis_max(std::iter::empty()), 1.0);
        assert!((axis_max([10.0, 50.0].into_iter()) - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_wedge_points_start_at_center() {
        let points = wedge_points((100, 100), 50.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert_eq!(points[0], (100, 100));
        assert_eq!(points[1], (150, 100));
        assert_eq!(*points.last().unwrap(), (100, 150));
    }

    #[test]
    fn test_chart_paths() {
        let images = ChartImages::in_dir(Path::new("out/charts_tmp"));
        assert_eq!(
            images.branch_revenue,
            Path::new("out/charts_tmp/branch_revenue.png")
        );
        assert!(images.daily_trend.ends_with("daily_trend.png"));
    }

    #[test]
    fn test_empty_report_writes_no_images() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("charts_tmp");
        let report = crate::analysis::analyze(&Default::default(), 10);

        let images = render_charts(&report, &dir, &Palette::default());

        assert!(dir.is_dir());
        assert!(!images.branch_revenue.exists());
        assert!(!images.category_share.exists());
        assert!(!images.daily_trend.exists());
    }
}
