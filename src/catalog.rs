//! カタログファイルの読み込み（CSV / Excel）

use crate::error::{PhotoCapaError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use photo_capa_common::Catalog;
use std::path::Path;
use tracing::info;

/// 拡張子で形式を判定して読み込む
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.is_file() {
        return Err(PhotoCapaError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let catalog = match ext.as_str() {
        "csv" => {
            let content = std::fs::read_to_string(path)?;
            Catalog::from_csv_str(&content)?
        }
        "xlsx" | "xlsm" | "xls" | "ods" => Catalog::from_rows(&read_sheet_rows(path)?)?,
        _ => {
            return Err(PhotoCapaError::CatalogLoad(format!(
                "対応していない形式です: {}",
                path.display()
            )))
        }
    };

    if catalog.is_empty() {
        return Err(PhotoCapaError::EmptyCatalog(path.display().to_string()));
    }

    info!(path = %path.display(), entries = catalog.len(), "カタログを読み込みました");
    Ok(catalog)
}

/// 先頭シートを文字列の行として読む
fn read_sheet_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PhotoCapaError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PhotoCapaError::CatalogLoad(format!("シートがありません: {}", path.display())))?
        .map_err(|e| PhotoCapaError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
