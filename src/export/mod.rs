pub mod excel;
pub mod json;

use crate::cli::ExportFormat;
use crate::error::Result;
use photo_capa_common::ImagePairRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 報告書の1ブロック
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    /// 1始まりの通し番号
    pub index: usize,
    pub before: PathBuf,
    pub after: PathBuf,
    pub timestamp: String,
    pub description: String,
    pub action: String,
}

impl ReportEntry {
    pub fn from_record(index: usize, record: ImagePairRecord<PathBuf>, timestamp: String) -> Self {
        Self {
            index,
            before: record.before,
            after: record.after,
            timestamp,
            description: record.description,
            action: record.action,
        }
    }
}

fn output_path_for_format(output: &Path, title: &str, extension: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.{}", file_stem_for(title), extension))
    } else {
        output.with_extension(extension)
    }
}

/// タイトルをファイル名に使える形にする
fn file_stem_for(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() || "/\\:*?\"<>|".contains(c) { '_' } else { c })
        .collect();
    if stem.is_empty() {
        "report".into()
    } else {
        stem
    }
}

/// 指定形式で出力し、書き出したファイルを返す
pub fn export_report(
    entries: &[ReportEntry],
    format: &ExportFormat,
    output_dir: &Path,
    title: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let output_path = output_path_for_format(output_dir, title, "xlsx");
        println!("- Excelを生成中...");
        excel::generate_excel(entries, &output_path, title)?;
        println!("✔ Excel出力: {}", output_path.display());
        written.push(output_path);
    }

    if matches!(format, ExportFormat::Json | ExportFormat::Both) {
        let output_path = output_path_for_format(output_dir, title, "json");
        println!("- JSONを生成中...");
        json::write_json(entries, &output_path)?;
        println!("✔ JSON出力: {}", output_path.display());
        written.push(output_path);
    }

    Ok(written)
}
