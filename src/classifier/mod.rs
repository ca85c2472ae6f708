//! 画像内容の分類
//!
//! 分類器は [`ContentClassifier`] を実装する。通常は埋め込みモデルを使い、
//! 初期化や推論に失敗した時点で以降はずっと輝度ベースの簡易分類を使う。

pub mod embedding;
pub mod heuristic;

#[cfg(feature = "clip")]
pub mod clip;

pub use embedding::{EmbeddingClassifier, ImageTextEncoder, EMBEDDING_MAX_TAGS};
pub use heuristic::{HeuristicClassifier, ImageStats, HEURISTIC_MAX_TAGS};

use crate::config::Config;
use crate::error::{PhotoCapaError, Result};
use photo_capa_common::Tag;
use rand::RngCore;
use std::path::Path;
use tracing::{debug, info, warn};

/// 画像 → タグ列
pub trait ContentClassifier {
    /// ログ表示用の名前
    fn name(&self) -> &'static str;

    /// max_tags 未指定時のタグ数
    fn default_max_tags(&self) -> usize;

    /// 信頼度の降順でタグを返す
    ///
    /// 画像が読めない場合は `ImageRead`、モデル側の失敗は `BackendUnavailable`。
    fn classify(&self, image: &Path, max_tags: usize, rng: &mut dyn RngCore) -> Result<Vec<Tag>>;
}

type ClassifierFactory = Box<dyn FnOnce() -> Result<Box<dyn ContentClassifier>>>;

/// 分類器の保持と降格
///
/// 主分類器は最初の分類要求時に一度だけ構築する。構築失敗・推論失敗は
/// 警告を出して簡易分類へ切り替え、プロセス中は戻さない。
pub struct ClassifierBackend {
    factory: Option<ClassifierFactory>,
    primary: Option<Box<dyn ContentClassifier>>,
    fallback: HeuristicClassifier,
    max_tags: Option<usize>,
    downgraded: bool,
}

impl ClassifierBackend {
    /// 簡易分類のみ
    pub fn heuristic(max_tags: Option<usize>) -> Self {
        Self {
            factory: None,
            primary: None,
            fallback: HeuristicClassifier::new(),
            max_tags,
            downgraded: false,
        }
    }

    /// 初回利用時に factory で主分類器を構築する
    pub fn lazy<F>(factory: F, max_tags: Option<usize>) -> Self
    where
        F: FnOnce() -> Result<Box<dyn ContentClassifier>> + 'static,
    {
        Self {
            factory: Some(Box::new(factory)),
            ..Self::heuristic(max_tags)
        }
    }

    /// 構築済みの主分類器を使う
    pub fn with_classifier(classifier: Box<dyn ContentClassifier>, max_tags: Option<usize>) -> Self {
        Self {
            primary: Some(classifier),
            ..Self::heuristic(max_tags)
        }
    }

    /// 設定から組み立てる
    pub fn from_config(config: &Config) -> Self {
        if !config.use_embedding {
            return Self::heuristic(config.max_tags);
        }
        let model_dir = config.clip_model_dir.clone();
        Self::lazy(move || load_embedding_classifier(model_dir.as_deref()), config.max_tags)
    }

    /// 現在使っている分類器の名前
    pub fn active_name(&self) -> &'static str {
        match &self.primary {
            Some(primary) if !self.downgraded => primary.name(),
            _ if self.factory.is_some() && !self.downgraded => "embedding (未初期化)",
            _ => self.fallback.name(),
        }
    }

    /// 簡易分類へ降格済みか
    pub fn is_downgraded(&self) -> bool {
        self.downgraded
    }

    fn downgrade(&mut self, err: &PhotoCapaError) {
        warn!(error = %err, "埋め込み分類に失敗したため簡易分類に切り替えます");
        self.primary = None;
        self.factory = None;
        self.downgraded = true;
    }

    /// 主分類器を用意する（構築失敗なら降格）
    fn ensure_primary(&mut self) {
        if self.downgraded || self.primary.is_some() {
            return;
        }
        let Some(factory) = self.factory.take() else {
            return;
        };
        match factory() {
            Ok(classifier) => {
                info!(classifier = classifier.name(), "分類器を初期化しました");
                self.primary = Some(classifier);
            }
            Err(e) => self.downgrade(&e),
        }
    }

    /// 1枚の画像を分類
    pub fn classify(&mut self, image: &Path, rng: &mut dyn RngCore) -> Result<Vec<Tag>> {
        self.ensure_primary();

        if let Some(primary) = &self.primary {
            let max_tags = self.max_tags.unwrap_or_else(|| primary.default_max_tags());
            match primary.classify(image, max_tags, rng) {
                Ok(tags) => {
                    debug!(classifier = primary.name(), image = %image.display(), ?tags, "分類結果");
                    return Ok(tags);
                }
                Err(e) if e.is_backend_failure() => self.downgrade(&e),
                Err(e) => return Err(e),
            }
        }

        let max_tags = self.max_tags.unwrap_or_else(|| self.fallback.default_max_tags());
        let tags = self.fallback.classify(image, max_tags, rng)?;
        debug!(classifier = self.fallback.name(), image = %image.display(), ?tags, "分類結果");
        Ok(tags)
    }
}

#[cfg(feature = "clip")]
fn load_embedding_classifier(model_dir: Option<&Path>) -> Result<Box<dyn ContentClassifier>> {
    let model_dir = model_dir.ok_or_else(|| {
        PhotoCapaError::BackendUnavailable("clip_model_dir が設定されていません".into())
    })?;
    let encoder = clip::ClipEncoder::load(model_dir)?;
    let classifier = EmbeddingClassifier::with_default_vocabulary(encoder)?;
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "clip"))]
fn load_embedding_classifier(_model_dir: Option<&Path>) -> Result<Box<dyn ContentClassifier>> {
    Err(PhotoCapaError::BackendUnavailable(
        "clip 機能なしでビルドされています".into(),
    ))
}
