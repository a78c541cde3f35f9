//! 入力ファイルの探索

use std::fs;
use std::path::{Path, PathBuf};

use globset::Glob;

use crate::error::{ConsolidatorError, Result};

/// Excelが開いている間に作成するロックファイルの接頭辞
const LOCK_FILE_PREFIX: &str = "~$";

/// パターンに一致するファイルをファイル名順で返す
///
/// パターンはファイル名のみに対して評価されます（サブディレクトリは探索しません）。
///
/// # 発生し得るエラー
///
/// * `InputDirNotFound` - ディレクトリが存在しない
/// * `Glob` - パターンが不正
/// * `NoMatchingFiles` - 一致するファイルが1つもない
pub(crate) fn find_matching_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConsolidatorError::InputDirNotFound(dir.to_path_buf()));
    }

    let matcher = Glob::new(pattern)?.compile_matcher();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.starts_with(LOCK_FILE_PREFIX) {
            continue;
        }

        if matcher.is_match(name.as_ref()) {
            files.push(entry.path());
        }
    }

    if files.is_empty() {
        return Err(ConsolidatorError::NoMatchingFiles {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    // read_dirの順序はプラットフォーム依存
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
