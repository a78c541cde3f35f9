//! sales-consolidator コマンド
//!
//! 実行ファイルと同じディレクトリの`input/*.xlsx`を統合し、
//! `output/consolidated_report.xlsx`を出力します。
//! ログレベルは環境変数`RUST_LOG`で変更できます（デフォルト: info）。

use std::path::{Path, PathBuf};
use std::process;

use sales_consolidator::{ConsolidatorBuilder, ConsolidatorError, RunSummary};
use tracing::error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}

/// 実行ファイルの置かれたディレクトリ
fn base_dir() -> Result<PathBuf, ConsolidatorError> {
    let exe = std::env::current_exe()?;
    Ok(exe.parent().map(Path::to_path_buf).unwrap_or_default())
}

/// `base`を起点にした既定の入出力パス
fn builder_for(base: &Path) -> ConsolidatorBuilder {
    ConsolidatorBuilder::new()
        .with_input_dir(base.join("input"))
        .with_output_path(base.join("output").join("consolidated_report.xlsx"))
}

fn run() -> Result<RunSummary, ConsolidatorError> {
    builder_for(&base_dir()?).build()?.run()
}

fn main() {
    init_logging();

    match run() {
        Ok(summary) => {
            println!("{}", "=".repeat(60));
            println!("Report generated successfully");
            println!("{}", "=".repeat(60));
            println!("  Output:       {}", summary.output_path.display());
            println!("  Files:        {}", summary.files);
            println!("  Records:      {}", summary.records);
            println!("  Total sales:  ${:.2}", summary.stats.total_revenue);
            if let (Some(first), Some(last)) = (summary.stats.first_date, summary.stats.last_date) {
                println!("  Period:       {} to {}", first, last);
            }
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", "=".repeat(60));
            eprintln!("Consolidation failed: {}", e);
            eprintln!("{}", "=".repeat(60));
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_follow_base_dir() {
        let base = Path::new("/opt/sales");
        let consolidator = builder_for(base).build().unwrap();

        assert_eq!(
            consolidator.output_path(),
            Path::new("/opt/sales/output/consolidated_report.xlsx")
        );
        assert_eq!(consolidator.chart_dir(), Path::new("/opt/sales/output/charts_tmp"));
    }

    #[test]
    fn test_base_dir_is_executable_parent() {
        let exe = std::env::current_exe().unwrap();
        assert_eq!(base_dir().unwrap(), exe.parent().unwrap());
    }
}
