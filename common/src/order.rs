//! 是正前/是正後の判定
//!
//! タグのラベルに含まれるキーワードを数え、多い方を採用する。
//! 同数の場合は先頭タグ（最も信頼度の高いタグ）が "before" で始まるかで決める。

use crate::types::{join_top_labels, Tag};
use crate::vocabulary::{AFTER_KEYWORDS, BEFORE_KEYWORDS};
use tracing::debug;

/// 説明文に使うタグ数
pub const DESCRIPTION_TAG_COUNT: usize = 2;

/// キーワード投票の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationVote {
    pub before: usize,
    pub after: usize,
}

impl ClassificationVote {
    /// タグ列を集計する
    ///
    /// 1つのタグは語彙ごとに最大1票（複数キーワードに一致しても1票）。
    pub fn count(tags: &[Tag]) -> Self {
        let mut vote = Self::default();
        for tag in tags {
            let label = tag.label.to_lowercase();
            if BEFORE_KEYWORDS.iter().any(|k| label.contains(k)) {
                vote.before += 1;
            }
            if AFTER_KEYWORDS.iter().any(|k| label.contains(k)) {
                vote.after += 1;
            }
        }
        vote
    }
}

/// タグ列が是正前の画像を表すか
pub fn decide_before(tags: &[Tag]) -> bool {
    let vote = ClassificationVote::count(tags);
    debug!(before = vote.before, after = vote.after, "キーワード投票");

    if vote.before > vote.after {
        true
    } else if vote.after > vote.before {
        false
    } else {
        tags.first()
            .map(|t| t.label.to_lowercase().starts_with("before"))
            .unwrap_or(false)
    }
}

/// ペアの順序判定結果
#[derive(Debug, Clone, PartialEq)]
pub struct PairOrder<T> {
    pub before: T,
    pub after: T,
    /// 是正前と判定した画像の上位2タグ
    pub content_description: String,
    /// 入力順と逆になったか
    pub swapped: bool,
    /// 両方の判定が一致したため入力順を採用したか
    pub defaulted: bool,
}

/// 2枚の画像を是正前/是正後に並べる
///
/// 両方とも同じ判定（どちらも是正前、またはどちらも是正後）の場合は
/// 入力順のまま a を是正前、b を是正後とする。同じ入力には常に同じ結果を返す。
pub fn order<T>(a: T, tags_a: &[Tag], b: T, tags_b: &[Tag]) -> PairOrder<T> {
    let a_is_before = decide_before(tags_a);
    let b_is_before = decide_before(tags_b);

    if a_is_before == b_is_before {
        debug!(a_is_before, "判定が一致したため入力順を採用");
        return PairOrder {
            before: a,
            after: b,
            content_description: join_top_labels(tags_a, DESCRIPTION_TAG_COUNT),
            swapped: false,
            defaulted: true,
        };
    }

    if a_is_before {
        PairOrder {
            before: a,
            after: b,
            content_description: join_top_labels(tags_a, DESCRIPTION_TAG_COUNT),
            swapped: false,
            defaulted: false,
        }
    } else {
        PairOrder {
            before: b,
            after: a,
            content_description: join_top_labels(tags_b, DESCRIPTION_TAG_COUNT),
            swapped: true,
            defaulted: false,
        }
    }
}
