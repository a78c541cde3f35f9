//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;

use thiserror::Error;

/// sales-consolidatorクレート全体で使用するエラー型
///
/// 入力ファイルの探索・読み込み、列の検証、集計、レポート出力中に発生する
/// すべてのエラーを統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - 設定・環境エラー: `InputDirNotFound`, `NoMatchingFiles`, `Config`, `Glob`
/// - データ検証エラー: `MissingColumns`, `InvalidRecord`
/// - I/Oエラー: `Io`, `Parse`, `Xlsx`
/// - グラフ描画エラー: `Chart`（パイプラインでは警告に格下げされる）
///
/// # 使用例
///
/// ```rust,no_run
/// use sales_consolidator::{ConsolidatorBuilder, ConsolidatorError};
///
/// let result = ConsolidatorBuilder::new()
///     .with_input_dir("does/not/exist")
///     .build()
///     .and_then(|c| c.run());
///
/// if let Err(ConsolidatorError::InputDirNotFound(dir)) = result {
///     eprintln!("missing: {}", dir.display());
/// }
/// ```
#[derive(Error, Debug)]
pub enum ConsolidatorError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 入力Excelファイルの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse Excel file: {0}")]
    Parse(#[from] calamine::Error),

    /// 出力ワークブックの書き込み中に発生したエラー（rust_xlsxwriter由来）
    #[error("Failed to write Excel report: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// ファイル名パターンが不正
    #[error("Invalid file pattern: {0}")]
    Glob(#[from] globset::Error),

    /// 入力ディレクトリが存在しない
    #[error("Input directory not found: {}", .0.display())]
    InputDirNotFound(PathBuf),

    /// パターンに一致するファイルが1つもない
    #[error("No files matching '{pattern}' found in {}", .dir.display())]
    NoMatchingFiles {
        /// 探索したディレクトリ
        dir: PathBuf,
        /// 使用したパターン
        pattern: String,
    },

    /// 必須列が欠けている
    ///
    /// 欠けている列は必須列リストの順序で列挙されます。
    #[error("File {file} is missing required columns: {}", .columns.join(", "))]
    MissingColumns {
        /// 問題のあるファイル名
        file: String,
        /// 欠けている列名
        columns: Vec<String>,
    },

    /// セル値をレコードのフィールド型に変換できない
    ///
    /// `row`はシート上の1始まりの行番号（ヘッダー行 = 1）です。
    #[error("Invalid value in {file}, row {row}, column '{column}': {message}")]
    InvalidRecord {
        /// 問題のあるファイル名
        file: String,
        /// 1始まりの行番号
        row: usize,
        /// 列名
        column: String,
        /// 詳細メッセージ
        message: String,
    },

    /// グラフ画像の描画に失敗した
    #[error("Chart rendering failed: {0}")]
    Chart(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ConsolidatorBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),
}

/// クレート内で使用する`Result`のエイリアス
pub type Result<T> = std::result::Result<T, ConsolidatorError>;
