//! レポート用の画像準備
//!
//! ペアごとに 最大サイズへの縮小 → 2枚のサイズ揃え → 透かし の順で加工し、
//! 出力フォルダへコピーを保存する。元画像は変更しない。

pub mod watermark;

pub use watermark::{draw_watermark, format_timestamp, random_timestamp};

use crate::config::Config;
use crate::error::{PhotoCapaError, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 出力画像を置くサブフォルダ
pub const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub resize: bool,
    pub max_width: u32,
    pub max_height: u32,
    pub watermark: bool,
    pub padding: u32,
    pub scale: u32,
}

impl From<&Config> for ImageOptions {
    fn from(config: &Config) -> Self {
        Self {
            resize: config.resize_images,
            max_width: config.image_max_width,
            max_height: config.image_max_height,
            watermark: config.watermark,
            padding: config.watermark_padding,
            scale: config.watermark_scale,
        }
    }
}

/// 加工済みペア
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPair {
    pub before: PathBuf,
    pub after: PathBuf,
}

pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| PhotoCapaError::ImageRead(format!("{}: {}", path.display(), e)))
}

/// 最大サイズに収まるよう縦横比を保って縮小（収まっていればそのまま）
pub fn fit_within(image: RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    if w <= max_width && h <= max_height {
        return image;
    }
    let ratio = (max_width as f64 / w as f64).min(max_height as f64 / h as f64);
    let new_w = ((w as f64 * ratio) as u32).max(1);
    let new_h = ((h as f64 * ratio) as u32).max(1);
    debug!(from = ?(w, h), to = ?(new_w, new_h), "最大サイズに縮小");
    imageops::resize(&image, new_w, new_h, FilterType::Lanczos3)
}

/// 2枚のサイズが違えば、両方を最大幅・最大高さに揃える
pub fn equalize(a: RgbImage, b: RgbImage) -> (RgbImage, RgbImage) {
    if a.dimensions() == b.dimensions() {
        return (a, b);
    }
    let width = a.width().max(b.width());
    let height = a.height().max(b.height());
    debug!(a = ?a.dimensions(), b = ?b.dimensions(), to = ?(width, height), "サイズを揃える");

    let stretch = |img: RgbImage| {
        if img.dimensions() == (width, height) {
            img
        } else {
            imageops::resize(&img, width, height, FilterType::Lanczos3)
        }
    };
    (stretch(a), stretch(b))
}

fn output_extension(source: &Path) -> String {
    match source
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("png") => "png".into(),
        Some("jpeg") => "jpeg".into(),
        _ => "jpg".into(),
    }
}

fn save(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .map_err(|e| PhotoCapaError::ImageWrite(format!("{}: {}", path.display(), e)))
}

/// ペアを加工して `<out_dir>/images/NNN_before.ext` と `NNN_after.ext` に保存
pub fn prepare_pair(
    before: &Path,
    after: &Path,
    out_dir: &Path,
    index: usize,
    timestamp: &str,
    options: &ImageOptions,
) -> Result<PreparedPair> {
    let mut first = load_rgb(before)?;
    let mut second = load_rgb(after)?;

    if options.resize {
        first = fit_within(first, options.max_width, options.max_height);
        second = fit_within(second, options.max_width, options.max_height);
        (first, second) = equalize(first, second);
    }

    if options.watermark {
        draw_watermark(&mut first, timestamp, options.padding, options.scale);
        draw_watermark(&mut second, timestamp, options.padding, options.scale);
    }

    let images_dir = out_dir.join(IMAGES_DIR);
    std::fs::create_dir_all(&images_dir)?;

    let before_out = images_dir.join(format!("{:03}_before.{}", index, output_extension(before)));
    let after_out = images_dir.join(format!("{:03}_after.{}", index, output_extension(after)));
    save(&first, &before_out)?;
    save(&second, &after_out)?;

    Ok(PreparedPair {
        before: before_out,
        after: after_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([90, 90, 90]))
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let out = fit_within(blank(400, 200), 100, 100);
        assert_eq!(out.dimensions(), (100, 50));
    }

    #[test]
    fn test_fit_within_small_image_unchanged() {
        let out = fit_within(blank(40, 20), 100, 100);
        assert_eq!(out.dimensions(), (40, 20));
    }

    #[test]
    fn test_equalize_uses_max_of_each_axis() {
        let (a, b) = equalize(blank(100, 50), blank(80, 60));
        assert_eq!(a.dimensions(), (100, 60));
        assert_eq!(b.dimensions(), (100, 60));
    }

    #[test]
    fn test_output_extension() {
        assert_eq!(output_extension(Path::new("a.PNG")), "png");
        assert_eq!(output_extension(Path::new("a.JPG")), "jpg");
        assert_eq!(output_extension(Path::new("a")), "jpg");
    }

    #[test]
    fn test_prepare_pair_writes_numbered_copies() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        blank(120, 80).save(&a).unwrap();
        blank(60, 90).save(&b).unwrap();

        let options = ImageOptions {
            resize: true,
            max_width: 100,
            max_height: 100,
            watermark: true,
            padding: 5,
            scale: 1,
        };
        let out = dir.path().join("out");
        let prepared = prepare_pair(&a, &b, &out, 3, "2024-06-03 02:07 PM", &options).unwrap();

        assert_eq!(prepared.before, out.join("images").join("003_before.png"));
        assert_eq!(prepared.after, out.join("images").join("003_after.png"));

        let before = image::open(&prepared.before).unwrap();
        let after = image::open(&prepared.after).unwrap();
        // 120x80 → 100x66、60x90 はそのまま → 100x90 に揃う
        assert_eq!((before.width(), before.height()), (100, 90));
        assert_eq!((after.width(), after.height()), (100, 90));
    }

    #[test]
    fn test_prepare_pair_missing_image() {
        let dir = TempDir::new().unwrap();
        let result = prepare_pair(
            &dir.path().join("none.jpg"),
            &dir.path().join("none2.jpg"),
            dir.path(),
            1,
            "",
            &ImageOptions::from(&Config::default()),
        );
        assert!(matches!(result, Err(PhotoCapaError::ImageRead(_))));
    }
}
