//! 輝度・コントラストによる簡易分類
//!
//! 学習モデルを使わず、グレースケール化した画像の平均輝度と標準偏差から
//! タグクラスタを選ぶ。明るい画像は整理・是正後寄り、暗い画像は乱雑・是正前寄り。

use super::ContentClassifier;
use crate::error::{PhotoCapaError, Result};
use image::RgbImage;
use photo_capa_common::vocabulary::{
    BRIGHT_CLUSTER, DARK_CLUSTER, DETAILED_CLUSTER, GENERAL_TAGS, UNIFORM_CLUSTER,
};
use photo_capa_common::Tag;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::path::Path;
use tracing::debug;

/// 明るさの閾値（8bit）
pub const BRIGHTNESS_THRESHOLD: f64 = 150.0;
/// コントラストの閾値（輝度の標準偏差）
pub const CONTRAST_THRESHOLD: f64 = 50.0;
/// 簡易分類のタグ数デフォルト
pub const HEURISTIC_MAX_TAGS: usize = 5;

/// 画像統計量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    /// 平均輝度
    pub brightness: f64,
    /// 輝度の標準偏差
    pub contrast: f64,
}

impl ImageStats {
    /// RGB画像から計算
    pub fn from_rgb(image: &RgbImage) -> Self {
        let count = (image.width() as u64 * image.height() as u64) as f64;
        if count == 0.0 {
            return Self { brightness: 0.0, contrast: 0.0 };
        }

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for pixel in image.pixels() {
            let [r, g, b] = pixel.0;
            let l = luma(r, g, b) as f64;
            sum += l;
            sum_sq += l * l;
        }

        let mean = sum / count;
        let variance = (sum_sq / count - mean * mean).max(0.0);
        Self {
            brightness: mean,
            contrast: variance.sqrt(),
        }
    }

    /// 画像ファイルから計算
    pub fn from_path(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| PhotoCapaError::ImageRead(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_rgb(&image.to_rgb8()))
    }

    /// 分類規則上のクラスタ
    pub fn clusters(&self) -> HeuristicClusters {
        HeuristicClusters {
            bright: self.brightness > BRIGHTNESS_THRESHOLD,
            detailed: self.contrast > CONTRAST_THRESHOLD,
        }
    }
}

/// ITU-R 601-2 の輝度（8bit、四捨五入）
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
    l.min(255) as u8
}

/// 選ばれたクラスタ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicClusters {
    pub bright: bool,
    pub detailed: bool,
}

impl HeuristicClusters {
    /// クラスタに属するタグ（シャッフル前）
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = Vec::new();
        labels.extend_from_slice(if self.bright { BRIGHT_CLUSTER } else { DARK_CLUSTER });
        labels.extend_from_slice(if self.detailed { DETAILED_CLUSTER } else { UNIFORM_CLUSTER });
        labels.extend_from_slice(GENERAL_TAGS);
        labels
    }
}

/// 簡易分類器
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// 統計量からタグを生成
    ///
    /// タグ順は毎回シャッフルされる。信頼度は並び順による順位スコア。
    pub fn classify_stats(
        &self,
        stats: &ImageStats,
        max_tags: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Tag> {
        let mut labels = stats.clusters().labels();
        labels.shuffle(rng);
        labels.truncate(max_tags);

        let n = labels.len() as f32;
        labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| Tag::new(label, (n - i as f32) / n))
            .collect()
    }
}

impl ContentClassifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn default_max_tags(&self) -> usize {
        HEURISTIC_MAX_TAGS
    }

    fn classify(&self, image: &Path, max_tags: usize, rng: &mut dyn RngCore) -> Result<Vec<Tag>> {
        let stats = ImageStats::from_path(image)?;
        debug!(
            image = %image.display(),
            brightness = format!("{:.2}", stats.brightness),
            contrast = format!("{:.2}", stats.contrast),
            "画像統計量"
        );
        Ok(self.classify_stats(&stats, max_tags, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solid(value: u8) -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb([value, value, value]))
    }

    /// 左半分黒・右半分白
    fn split() -> RgbImage {
        RgbImage::from_fn(8, 8, |x, _| {
            if x < 4 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
    }

    #[test]
    fn test_stats_solid_gray() {
        let stats = ImageStats::from_rgb(&solid(200));
        assert!((stats.brightness - 200.0).abs() < 1e-9);
        assert!(stats.contrast.abs() < 1e-9);
    }

    #[test]
    fn test_stats_split_image() {
        let stats = ImageStats::from_rgb(&split());
        assert!((stats.brightness - 127.5).abs() < 1e-9);
        assert!((stats.contrast - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(255, 255, 255), 255);
        assert_eq!(luma(0, 0, 0), 0);
        // 緑が最も重い
        assert!(luma(0, 255, 0) > luma(255, 0, 0));
        assert!(luma(255, 0, 0) > luma(0, 0, 255));
    }

    #[test]
    fn test_threshold_is_strict() {
        let at = ImageStats { brightness: 150.0, contrast: 50.0 };
        assert_eq!(at.clusters(), HeuristicClusters { bright: false, detailed: false });

        let above = ImageStats { brightness: 150.1, contrast: 50.1 };
        assert_eq!(above.clusters(), HeuristicClusters { bright: true, detailed: true });
    }

    #[test]
    fn test_cluster_labels_composition() {
        let labels = HeuristicClusters { bright: true, detailed: false }.labels();
        assert_eq!(labels.len(), 7 + 4 + 2);
        assert!(labels.contains(&"clean workplace"));
        assert!(labels.contains(&"uniform scene"));
        assert!(labels.contains(&"workplace inspection"));
        assert!(!labels.contains(&"messy workplace"));
    }

    #[test]
    fn test_classify_stats_bounded_and_monotonic() {
        let classifier = HeuristicClassifier::new();
        let stats = ImageStats::from_rgb(&solid(40));
        let mut rng = StdRng::seed_from_u64(3);

        let tags = classifier.classify_stats(&stats, 5, &mut rng);
        assert_eq!(tags.len(), 5);
        for pair in tags.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }

        let allowed = stats.clusters().labels();
        for tag in &tags {
            assert!(allowed.contains(&tag.label.as_str()), "{}", tag.label);
        }
    }

    #[test]
    fn test_classify_stats_same_seed_same_order() {
        let classifier = HeuristicClassifier::new();
        let stats = ImageStats::from_rgb(&split());

        let a = classifier.classify_stats(&stats, 5, &mut StdRng::seed_from_u64(99));
        let b = classifier.classify_stats(&stats, 5, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_classify_stats_max_tags_larger_than_pool() {
        let classifier = HeuristicClassifier::new();
        let stats = ImageStats::from_rgb(&solid(10));
        let tags = classifier.classify_stats(&stats, 50, &mut StdRng::seed_from_u64(1));
        assert_eq!(tags.len(), 13);
    }
}
