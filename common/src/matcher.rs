//! カタログ照合
//!
//! 画像の内容説明（タグの連結）とカタログの指摘事項を単語集合で比較し、
//! 最も近い1件を選ぶ。
//!
//! ## 選択順
//! 1. スコア最大のエントリ（スコアが [`MIN_ACCEPT_SCORE`] 以上）
//! 2. 最小長を満たすエントリのうち最長のもの
//! 3. カタログ全体からランダム

use crate::types::CatalogEntry;
use rand::{Rng, RngCore};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info};

/// 照合対象とする指摘事項の最小文字数（trim後）
pub const MIN_FINDING_LENGTH: usize = 5;
/// 採用する最低スコア
pub const MIN_ACCEPT_SCORE: f64 = 0.5;
/// 長さボーナスの基準文字数
pub const LENGTH_BONUS_DIVISOR: f64 = 20.0;
/// 語彙ボーナスの基準語数
pub const VOCAB_BONUS_DIVISOR: f64 = 5.0;

/// どの段階で選ばれたか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// スコア最大
    Lexical,
    /// 最長エントリ
    Longest,
    /// ランダム
    Random,
    /// カタログが空
    Sentinel,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTier::Lexical => write!(f, "lexical"),
            MatchTier::Longest => write!(f, "longest"),
            MatchTier::Random => write!(f, "random"),
            MatchTier::Sentinel => write!(f, "sentinel"),
        }
    }
}

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub entry: CatalogEntry,
    /// カタログ内の位置（センチネルの場合はNone）
    pub index: Option<usize>,
    pub tier: MatchTier,
    /// 選ばれたエントリのスコア（スコア計算対象外ならNone）
    pub score: Option<f64>,
}

/// 大文字小文字を無視した単語集合
fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// 1エントリのスコア
///
/// 共通単語数 + 長さボーナス（最大1.0） + 語彙ボーナス（最大1.0）
pub fn score_entry(content_words: &HashSet<String>, finding: &str) -> f64 {
    let entry_words = word_set(finding);
    let overlap = content_words.intersection(&entry_words).count() as f64;
    let length_bonus = (trimmed_len(finding) as f64 / LENGTH_BONUS_DIVISOR).min(1.0);
    let vocab_bonus = (entry_words.len() as f64 / VOCAB_BONUS_DIVISOR).min(1.0);
    overlap + length_bonus + vocab_bonus
}

/// 内容説明に最も合うエントリを選ぶ（段階情報付き）
pub fn select(content: &str, catalog: &[CatalogEntry], rng: &mut dyn RngCore) -> MatchOutcome {
    if catalog.is_empty() {
        info!("カタログが空のためセンチネルを返します");
        return MatchOutcome {
            entry: CatalogEntry::sentinel(),
            index: None,
            tier: MatchTier::Sentinel,
            score: None,
        };
    }

    let content_words = word_set(content);
    debug!(content, candidates = catalog.len(), "カタログ照合");

    let mut best: Option<(usize, f64)> = None;
    for (i, entry) in catalog.iter().enumerate() {
        if trimmed_len(&entry.finding) < MIN_FINDING_LENGTH {
            continue;
        }
        let score = score_entry(&content_words, &entry.finding);
        // 同点は先に出現したものを優先
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((i, score));
        }
    }

    if let Some((index, score)) = best {
        if score >= MIN_ACCEPT_SCORE {
            debug!(index, score, finding = %catalog[index].finding, "スコア最大のエントリを採用");
            return MatchOutcome {
                entry: catalog[index].clone(),
                index: Some(index),
                tier: MatchTier::Lexical,
                score: Some(score),
            };
        }
    }

    let longest = catalog
        .iter()
        .enumerate()
        .map(|(i, e)| (i, trimmed_len(&e.finding)))
        .filter(|&(_, len)| len >= MIN_FINDING_LENGTH)
        .min_by_key(|&(i, len)| (Reverse(len), i));

    if let Some((index, _)) = longest {
        info!(index, finding = %catalog[index].finding, "十分なスコアがないため最長のエントリを採用");
        return MatchOutcome {
            entry: catalog[index].clone(),
            index: Some(index),
            tier: MatchTier::Longest,
            score: best.map(|(_, s)| s),
        };
    }

    let index = rng.gen_range(0..catalog.len());
    info!(index, finding = %catalog[index].finding, "有効なエントリがないためランダムに選択");
    MatchOutcome {
        entry: catalog[index].clone(),
        index: Some(index),
        tier: MatchTier::Random,
        score: None,
    }
}

/// 内容説明に最も合うエントリを返す
pub fn match_description(
    content: &str,
    catalog: &[CatalogEntry],
    rng: &mut dyn RngCore,
) -> CatalogEntry {
    select(content, catalog, rng).entry
}
