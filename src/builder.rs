//! Builder Module
//!
//! Fluent Builder APIを提供し、`Consolidator`インスタンスを段階的に構築する。

use std::path::{Path, PathBuf};

use globset::Glob;
use serde::Serialize;
use tracing::info;

use crate::analysis::{self, AnalysisReport, GeneralStats, DEFAULT_TOP_N};
use crate::api::Palette;
use crate::charts::{self, ChartImages};
use crate::error::{ConsolidatorError, Result};
use crate::ingest::{self, REQUIRED_COLUMNS};
use crate::report;
use crate::types::ConsolidatedTable;

/// グラフ画像を書き出すサブディレクトリ名
const CHART_DIR_NAME: &str = "charts_tmp";

/// 統合処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ConsolidationConfig {
    /// 入力ディレクトリ
    pub input_dir: PathBuf,

    /// ファイル名のglobパターン
    pub pattern: String,

    /// 必須列
    pub required_columns: Vec<String>,

    /// 出力ファイル
    pub output_path: PathBuf,

    /// グラフ画像の出力先（Noneの場合は出力ファイルと同じ階層の`charts_tmp`）
    pub chart_dir: Option<PathBuf>,

    /// 上位商品の件数
    pub top_n: usize,

    /// グラフを描画するか
    pub charts: bool,

    /// 配色
    pub palette: Palette,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            pattern: "*.xlsx".to_string(),
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            output_path: PathBuf::from("output").join("consolidated_report.xlsx"),
            chart_dir: None,
            top_n: DEFAULT_TOP_N,
            charts: true,
            palette: Palette::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use sales_consolidator::ConsolidatorBuilder;
///
/// # fn main() -> Result<(), sales_consolidator::ConsolidatorError> {
/// let consolidator = ConsolidatorBuilder::new()
///     .with_input_dir("data/2024")
///     .with_output_path("reports/q1.xlsx")
///     .with_top_n(5)
///     .build()?;
/// let summary = consolidator.run()?;
/// println!("{} records", summary.records);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConsolidatorBuilder {
    /// 内部設定（構築中）
    config: ConsolidationConfig,
}

impl Default for ConsolidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolidatorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 入力ディレクトリ: `input`
    /// - パターン: `*.xlsx`
    /// - 必須列: `Date, Product, Category, Quantity, Unit_Price, Salesperson, Branch`
    /// - 出力ファイル: `output/consolidated_report.xlsx`
    /// - 上位件数: 10
    /// - グラフ: 描画する
    pub fn new() -> Self {
        Self {
            config: ConsolidationConfig::default(),
        }
    }

    /// 入力ディレクトリを指定する
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    /// ファイル名のglobパターンを指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use sales_consolidator::ConsolidatorBuilder;
    ///
    /// let builder = ConsolidatorBuilder::new().with_pattern("sales_*.xlsx");
    /// ```
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pattern = pattern.into();
        self
    }

    /// 必須列を指定する
    ///
    /// 空のリストを指定すると列の検証を行いません。
    /// ただしレコードの構築に必要な7列は常に必要です。
    pub fn with_required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.required_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// 出力ファイルのパスを指定する
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    /// グラフ画像の出力先ディレクトリを指定する
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chart_dir = Some(dir.into());
        self
    }

    /// 上位商品ランキングの件数を指定する
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.config.top_n = n;
        self
    }

    /// グラフを描画してダッシュボードに埋め込むかを指定する
    ///
    /// # 引数
    ///
    /// * `enabled: bool`:
    ///   * `true`: 描画する（デフォルト）
    ///   * `false`: 描画せず、ダッシュボードには見出しのみを出力
    pub fn with_charts(mut self, enabled: bool) -> Self {
        self.config.charts = enabled;
        self
    }

    /// 配色を指定する
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.config.palette = palette;
        self
    }

    /// 設定を検証し、`Consolidator`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `ConsolidatorError::Config(String)`: 設定の検証に失敗した場合
    ///   * 上位件数が0
    ///   * パターンが空、または不正なglob
    ///   * 出力パスにファイル名がない
    pub fn build(self) -> Result<Consolidator> {
        // 1. 上位件数
        if self.config.top_n == 0 {
            return Err(ConsolidatorError::Config(
                "top_n must be at least 1".to_string(),
            ));
        }

        // 2. パターン
        if self.config.pattern.trim().is_empty() {
            return Err(ConsolidatorError::Config(
                "File pattern must not be empty".to_string(),
            ));
        }
        if let Err(e) = Glob::new(&self.config.pattern) {
            return Err(ConsolidatorError::Config(format!(
                "Invalid file pattern '{}': {}",
                self.config.pattern, e
            )));
        }

        // 3. 出力パス
        if self.config.output_path.file_name().is_none() {
            return Err(ConsolidatorError::Config(format!(
                "Output path has no file name: {}",
                self.config.output_path.display()
            )));
        }

        Ok(Consolidator::new(self.config))
    }
}

/// 実行結果のサマリー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// 出力ファイル
    pub output_path: PathBuf,
    /// 読み込んだファイル数
    pub files: usize,
    /// 統合したレコード数
    pub records: usize,
    /// 全体の統計値
    pub stats: GeneralStats,
}

/// 統合処理のファサード
///
/// 読み込み → 集計 → グラフ描画 → レポート出力 を1回の実行で行います。
/// 各段階は`consolidate()`と`analyze()`で個別に呼び出すこともできます。
#[derive(Debug)]
pub struct Consolidator {
    config: ConsolidationConfig,
}

impl Consolidator {
    pub(crate) fn new(config: ConsolidationConfig) -> Self {
        Self { config }
    }

    /// 出力ファイルのパス
    pub fn output_path(&self) -> &Path {
        &self.config.output_path
    }

    /// グラフ画像の出力先ディレクトリ
    pub fn chart_dir(&self) -> PathBuf {
        match &self.config.chart_dir {
            Some(dir) => dir.clone(),
            None => self
                .config
                .output_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(CHART_DIR_NAME),
        }
    }

    /// 入力ファイルを読み込み、統合テーブルを生成する
    pub fn consolidate(&self) -> Result<ConsolidatedTable> {
        let required: Vec<&str> = self
            .config
            .required_columns
            .iter()
            .map(String::as_str)
            .collect();
        ingest::consolidate(&self.config.input_dir, &self.config.pattern, &required)
    }

    /// 統合テーブルを集計する
    pub fn analyze(&self, table: &ConsolidatedTable) -> AnalysisReport {
        analysis::analyze(table, self.config.top_n)
    }

    /// 全段階を実行し、レポートを保存する
    ///
    /// # 戻り値
    ///
    /// * `Ok(RunSummary)` - レポートの保存に成功した場合
    /// * `Err(ConsolidatorError)` - いずれかの段階で失敗した場合。出力ファイルは作成されません
    pub fn run(&self) -> Result<RunSummary> {
        info!("[1/4] Consolidating files from {}", self.config.input_dir.display());
        let table = self.consolidate()?;

        info!("[2/4] Analyzing {} records", table.len());
        let report = self.analyze(&table);

        let images: Option<ChartImages> = if self.config.charts {
            let dir = self.chart_dir();
            info!("[3/4] Rendering charts");
            Some(charts::render_charts(&report, &dir, &self.config.palette))
        } else {
            info!("[3/4] Charts disabled, skipped");
            None
        };

        info!("[4/4] Writing report");
        report::write_report(
            &table,
            &report,
            images.as_ref(),
            &self.config.palette,
            &self.config.output_path,
        )?;

        Ok(RunSummary {
            output_path: self.config.output_path.clone(),
            files: table.sources.len(),
            records: table.len(),
            stats: report.stats,
        })
    }
}
