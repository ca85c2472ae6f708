//! Photo CAPA Common Library
//!
//! 画像入出力に依存しない判定・照合ロジック:
//! - タグのキーワード投票による是正前/是正後の判定
//! - CAPAカタログとの単語集合照合
//! - 表形式データからのカタログ構築

pub mod types;
pub mod vocabulary;
pub mod order;
pub mod matcher;
pub mod catalog;
pub mod error;

pub use types::{
    join_top_labels, CatalogEntry, ImagePairRecord, Tag,
    DEFAULT_ACTION, DEFAULT_DESCRIPTION, SENTINEL_ACTION, SENTINEL_DESCRIPTION,
};
pub use order::{decide_before, order, ClassificationVote, PairOrder};
pub use matcher::{match_description, select, MatchOutcome, MatchTier};
pub use catalog::{Catalog, ColumnRoles};
pub use error::{Error, Result};
