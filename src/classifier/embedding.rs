//! 埋め込みによるゼロショット分類
//!
//! 画像埋め込みと固定語彙のテキスト埋め込みのコサイン類似度を100倍し、
//! softmax を取った上位を返す。エンコーダ自体は [`ImageTextEncoder`] で差し替え可能。

use super::ContentClassifier;
use crate::error::{PhotoCapaError, Result};
use photo_capa_common::vocabulary::EMBEDDING_VOCABULARY;
use photo_capa_common::Tag;
use rand::RngCore;
use std::path::Path;

/// 埋め込み分類のタグ数デフォルト
pub const EMBEDDING_MAX_TAGS: usize = 3;
/// ロジットの倍率
pub const LOGIT_SCALE: f32 = 100.0;

/// 画像とテキストを同じ空間へ埋め込むモデル
pub trait ImageTextEncoder {
    /// テキスト列の埋め込み（正規化前でよい）
    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// 画像の埋め込み（正規化前でよい）
    fn encode_image(&self, image: &Path) -> Result<Vec<f32>>;
}

pub struct EmbeddingClassifier<E> {
    encoder: E,
    vocabulary: Vec<String>,
    /// 正規化済みテキスト埋め込み（vocabulary と同順）
    text_features: Vec<Vec<f32>>,
}

impl<E: ImageTextEncoder> EmbeddingClassifier<E> {
    /// 語彙を一度だけ埋め込んで保持する
    pub fn new(encoder: E, vocabulary: &[&str]) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(PhotoCapaError::BackendUnavailable("語彙が空です".into()));
        }
        let raw = encoder.encode_texts(vocabulary)?;
        if raw.len() != vocabulary.len() {
            return Err(PhotoCapaError::BackendUnavailable(format!(
                "テキスト埋め込み数が語彙数と一致しません: {} != {}",
                raw.len(),
                vocabulary.len()
            )));
        }
        let text_features = raw.into_iter().map(normalize).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            encoder,
            vocabulary: vocabulary.iter().map(|s| s.to_string()).collect(),
            text_features,
        })
    }

    pub fn with_default_vocabulary(encoder: E) -> Result<Self> {
        Self::new(encoder, EMBEDDING_VOCABULARY)
    }

    /// 画像埋め込みから語彙ごとの確率を計算
    fn probabilities(&self, image_features: Vec<f32>) -> Result<Vec<f32>> {
        let image_features = normalize(image_features)?;
        let mut logits = Vec::with_capacity(self.text_features.len());
        for text in &self.text_features {
            if text.len() != image_features.len() {
                return Err(PhotoCapaError::BackendUnavailable(format!(
                    "埋め込み次元が一致しません: {} != {}",
                    text.len(),
                    image_features.len()
                )));
            }
            logits.push(LOGIT_SCALE * dot(text, &image_features));
        }
        Ok(softmax(&logits))
    }
}

impl<E: ImageTextEncoder> ContentClassifier for EmbeddingClassifier<E> {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn default_max_tags(&self) -> usize {
        EMBEDDING_MAX_TAGS
    }

    fn classify(&self, image: &Path, max_tags: usize, _rng: &mut dyn RngCore) -> Result<Vec<Tag>> {
        let features = self.encoder.encode_image(image)?;
        let probs = self.probabilities(features)?;

        let mut ranked: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        // 安定ソート：同値は語彙順
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(ranked
            .into_iter()
            .take(max_tags)
            .map(|(i, p)| Tag::new(self.vocabulary[i].clone(), p))
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2正規化
fn normalize(v: Vec<f32>) -> Result<Vec<f32>> {
    let norm = dot(&v, &v).sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(PhotoCapaError::BackendUnavailable(
            "埋め込みベクトルのノルムが0です".into(),
        ));
    }
    Ok(v.into_iter().map(|x| x / norm).collect())
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
