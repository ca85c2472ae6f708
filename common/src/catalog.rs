//! CAPAカタログ
//!
//! 表形式データ（CSV / Excelの1シート）から指摘事項と是正処置のペアを構築する。
//! ヘッダー行から列の役割を判定し、判定できない場合は先頭2列を使う。

use crate::error::{Error, Result};
use crate::types::{CatalogEntry, MISSING_ACTION, MISSING_DESCRIPTION};
use std::collections::HashMap;

/// ヘッダーから判定した列の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRoles {
    pub finding: usize,
    pub action: usize,
    pub number: Option<usize>,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            finding: 0,
            action: 1,
            number: None,
        }
    }
}

const FINDING_HEADERS: &[&str] = &["before", "finding", "description", "hazard"];
const ACTION_HEADERS: &[&str] = &["capa", "corrective", "action"];
const NUMBER_HEADERS: &[&str] = &["no", "no.", "#", "id"];

impl ColumnRoles {
    /// ヘッダー行から列の役割を判定
    pub fn detect(header: &[String]) -> Self {
        let normalized: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

        let number = normalized
            .iter()
            .position(|h| NUMBER_HEADERS.contains(&h.as_str()));

        let action = normalized
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != number)
            .find(|(_, h)| ACTION_HEADERS.iter().any(|k| h.contains(k)))
            .map(|(i, _)| i);

        let finding = normalized
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != number && Some(*i) != action)
            .find(|(_, h)| FINDING_HEADERS.iter().any(|k| h.contains(k)))
            .map(|(i, _)| i);

        match (finding, action) {
            (Some(finding), Some(action)) => Self { finding, action, number },
            _ => {
                // 番号列だけは判定できていれば使う
                let mut roles = Self::default();
                if let Some(n) = number {
                    if n > 1 {
                        roles.number = Some(n);
                    }
                }
                roles
            }
        }
    }
}

/// カタログ本体
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    /// 番号列の値 → エントリ位置
    numbers: HashMap<u32, usize>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            numbers: HashMap::new(),
        }
    }

    /// 行データ（先頭行はヘッダー）から構築
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self> {
        let (header, body) = rows
            .split_first()
            .ok_or_else(|| Error::Parse("ヘッダー行がありません".into()))?;

        let roles = ColumnRoles::detect(header);
        let mut catalog = Self::default();

        for row in body {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            let finding = cell_or(row, roles.finding, MISSING_DESCRIPTION);
            let action = cell_or(row, roles.action, MISSING_ACTION);

            let index = catalog.entries.len();
            if let Some(number) = roles
                .number
                .and_then(|n| row.get(n))
                .and_then(|v| parse_number(v))
            {
                catalog.numbers.entry(number).or_insert(index);
            }
            catalog.entries.push(CatalogEntry::new(finding, action));
        }

        Ok(catalog)
    }

    /// CSV文字列から構築
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let content = content.trim_start_matches('\u{feff}');
        Self::from_rows(&parse_csv(content))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// カタログ番号でエントリを引く
    ///
    /// 番号列があればその値、なければ1始まりの行番号として扱う。
    pub fn by_number(&self, number: u32) -> Option<&CatalogEntry> {
        if self.numbers.is_empty() {
            let index = (number as usize).checked_sub(1)?;
            return self.entries.get(index);
        }
        self.numbers.get(&number).and_then(|&i| self.entries.get(i))
    }
}

/// セル値（空ならデフォルト）
fn cell_or(row: &[String], index: usize, default: &str) -> String {
    match row.get(index) {
        Some(value) if !value.trim().is_empty() && !value.trim().eq_ignore_ascii_case("nan") => {
            value.clone()
        }
        _ => default.to_string(),
    }
}

/// "12" や "12.0"（Excelの数値セル）を番号として読む
fn parse_number(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u32>() {
        return Some(n);
    }
    let f = value.parse::<f64>().ok()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// CSV全体を行・フィールドに分割
///
/// ダブルクォート内のカンマと改行は区切りとみなさない。`""` はクォート1つ。
/// 空行は読み飛ばす。
pub fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                row.push(field.trim().to_string());
                field.clear();
            }
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                row.push(field.trim().to_string());
                field.clear();
                push_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field.trim().to_string());
        push_row(&mut rows, row);
    }

    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|cell| !cell.is_empty()) {
        rows.push(row);
    }
}
