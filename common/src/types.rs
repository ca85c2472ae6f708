//! 判定・照合で使う型定義
//!
//! - Tag: 画像分類の出力（ラベル + 信頼度）
//! - CatalogEntry: 指摘事項と是正処置のペア（CAPAカタログの1行）
//! - ImagePairRecord: 最終出力（是正前/是正後 + 説明 + 処置）

use serde::{Deserialize, Serialize};

/// カタログが空のときに返すセンチネル（説明）
pub const SENTINEL_DESCRIPTION: &str = "no description";
/// カタログが空のときに返すセンチネル（処置）
pub const SENTINEL_ACTION: &str = "no action";

/// 読み込み時に空セルを置き換える値
pub const MISSING_DESCRIPTION: &str = "no description";
pub const MISSING_ACTION: &str = "no corrective action";

/// 照合結果が空だった場合のデフォルト
pub const DEFAULT_DESCRIPTION: &str = "identified hazard";
pub const DEFAULT_ACTION: &str = "apply corrective measures to eliminate hazard";

/// 分類タグ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub label: String,
    /// 信頼度（0.0-1.0、スケールは分類器依存）
    pub confidence: f32,
}

impl Tag {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// タグ列の先頭n件のラベルをスペース区切りで連結
pub fn join_top_labels(tags: &[Tag], n: usize) -> String {
    tags.iter()
        .take(n)
        .map(|t| t.label.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// カタログの1行（指摘事項, 是正処置）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub finding: String,
    pub action: String,
}

impl CatalogEntry {
    pub fn new(finding: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            finding: finding.into(),
            action: action.into(),
        }
    }

    /// 空カタログ用のセンチネル
    pub fn sentinel() -> Self {
        Self::new(SENTINEL_DESCRIPTION, SENTINEL_ACTION)
    }
}

/// 1ペアの最終出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePairRecord<P = String> {
    pub before: P,
    pub after: P,
    pub description: String,
    pub action: String,
}
