//! 撮影日時の透かし
//!
//! フォントファイルに依存しないよう、5x7 ドットの内蔵フォントで描画する。
//! 白文字に1pxの黒縁取り、右下に配置。

use crate::error::{PhotoCapaError, Result};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use image::{Rgb, RgbImage};
use rand::{Rng, RngCore};
use std::fmt::Write as _;
use tracing::debug;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// 文字間（ドット）
const GLYPH_SPACING: u32 = 1;
/// 拡大率の上限
pub const MAX_WATERMARK_SCALE: u32 = 64;

const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// 1行5ビット（MSB側が左）
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        ' ' => [0x00; 7],
        _ => return None,
    };
    Some(rows)
}

/// 描画後の文字列サイズ（縁取りを除く）
///
/// 幅・高さ・面積のいずれかが u32 に収まらなければ None。
pub fn text_size(text: &str, scale: u32) -> Option<(u32, u32)> {
    let n = u32::try_from(text.chars().count()).ok()?;
    if n == 0 {
        return Some((0, 0));
    }
    let width = n
        .checked_mul(GLYPH_WIDTH + GLYPH_SPACING)?
        .checked_sub(GLYPH_SPACING)?
        .checked_mul(scale)?;
    let height = GLYPH_HEIGHT.checked_mul(scale)?;
    width.checked_mul(height)?;
    Some((width, height))
}

/// 文字列のドットマスク（scale 適用済み）
fn render_mask(text: &str, scale: u32) -> (u32, u32, Vec<bool>) {
    let Some((width, height)) = text_size(text, scale) else {
        return (0, 0, Vec::new());
    };
    let mut mask = vec![false; width as usize * height as usize];

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else {
            debug!(char = %c, "内蔵フォントにない文字は空白で描画します");
            continue;
        };
        let origin_x = i as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * scale;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = origin_x + col * scale + dx;
                        let y = row as u32 * scale + dy;
                        mask[y as usize * width as usize + x as usize] = true;
                    }
                }
            }
        }
    }

    (width, height, mask)
}

/// 右下に透かしを描く
///
/// 画像が小さくて収まらない場合は左上に寄せ、はみ出した部分は描かない。
/// 拡大率は 1..=[`MAX_WATERMARK_SCALE`] に丸める。
pub fn draw_watermark(image: &mut RgbImage, text: &str, padding: u32, scale: u32) {
    let scale = scale.clamp(1, MAX_WATERMARK_SCALE);
    let (width, height, mask) = render_mask(text, scale);
    if width == 0 || height == 0 {
        return;
    }

    let x0 = image.width() as i64 - width as i64 - padding as i64;
    let y0 = image.height() as i64 - height as i64 - padding as i64;
    let (x0, y0) = (x0.max(0), y0.max(0));

    let lit = |x: i64, y: i64| -> bool {
        x >= 0 && y >= 0 && x < width as i64 && y < height as i64 && mask[(y * width as i64 + x) as usize]
    };

    let put = |image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>| {
        if x >= 0 && y >= 0 && x < image.width() as i64 && y < image.height() as i64 {
            image.put_pixel(x as u32, y as u32, color);
        }
    };

    // 縁取り（8近傍）
    for y in -1..=height as i64 {
        for x in -1..=width as i64 {
            if lit(x, y) {
                continue;
            }
            let near = (-1..=1).any(|dy| (-1..=1).any(|dx| lit(x + dx, y + dy)));
            if near {
                put(image, x0 + x, y0 + y, OUTLINE_COLOR);
            }
        }
    }

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            if lit(x, y) {
                put(image, x0 + x, y0 + y, TEXT_COLOR);
            }
        }
    }
}

/// 過去の作業時間帯からランダムな日時を作る
///
/// 1〜30日前、8〜17時、分はランダム、秒は0。
pub fn random_timestamp(now: NaiveDateTime, rng: &mut dyn RngCore) -> NaiveDateTime {
    let days_ago = rng.gen_range(1..=30);
    let hour = rng.gen_range(8..=17);
    let minute = rng.gen_range(0..=59);

    let date = (now - Duration::days(days_ago)).date();
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}

/// 透かし用の文字列に整形
pub fn format_timestamp(datetime: &NaiveDateTime, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", datetime.format(format))
        .map_err(|_| PhotoCapaError::Config(format!("日時フォーマットが不正です: {}", format)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_format_timestamp_default_format() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap().and_hms_opt(14, 7, 0).unwrap();
        assert_eq!(format_timestamp(&dt, "%Y-%m-%d %I:%M %p").unwrap(), "2024-06-03 02:07 PM");
    }

    #[test]
    fn test_format_timestamp_invalid_format() {
        let dt = now();
        assert!(matches!(format_timestamp(&dt, "%Q"), Err(PhotoCapaError::Config(_))));
    }

    #[test]
    fn test_random_timestamp_range() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..200 {
            let ts = random_timestamp(now(), &mut rng);
            let days = (now().date() - ts.date()).num_days();
            assert!((1..=30).contains(&days), "{}", days);
            assert!((8..=17).contains(&ts.hour()));
            assert!(ts.minute() <= 59);
            assert_eq!(ts.second(), 0);
        }
    }

    #[test]
    fn test_text_size() {
        assert_eq!(text_size("12", 1), Some((11, 7)));
        assert_eq!(text_size("12", 3), Some((33, 21)));
        assert_eq!(text_size("", 3), Some((0, 0)));
    }

    #[test]
    fn test_text_size_overflow_is_none() {
        assert_eq!(text_size("2024-06-03 02:07 PM", 5000), None);
        assert_eq!(text_size("8", u32::MAX), None);
    }

    #[test]
    fn test_huge_scale_is_clamped() {
        let mut image = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        draw_watermark(&mut image, "2024-06-03 02:07 PM", 0, 5000);
        // 上限の拡大率で左上に寄せて描かれる（"2" の1行目は2列目から点灯）
        assert_eq!(*image.get_pixel(MAX_WATERMARK_SCALE + 6, 10), TEXT_COLOR);
        assert_eq!(*image.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_all_timestamp_chars_have_glyphs() {
        for c in "0123456789-:/. APMapm".chars() {
            assert!(glyph(c).is_some(), "{}", c);
        }
    }

    #[test]
    fn test_watermark_bottom_right() {
        let mut image = RgbImage::from_pixel(100, 60, Rgb([128, 128, 128]));
        draw_watermark(&mut image, "8", 10, 2);

        // "8" は 10x14、右下から10px内側
        let (x0, y0) = (100 - 10 - 10, 60 - 14 - 10);
        // 上端中央は点灯（白）
        assert_eq!(*image.get_pixel(x0 + 4, y0), TEXT_COLOR);
        // 上端の1px上は縁取り（黒）
        assert_eq!(*image.get_pixel(x0 + 4, y0 - 1), OUTLINE_COLOR);
        // 左上隅は元のまま
        assert_eq!(*image.get_pixel(0, 0), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_watermark_larger_than_image_does_not_panic() {
        let mut image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        draw_watermark(&mut image, "2024-06-03 02:07 PM", 15, 3);
        assert!(image.pixels().any(|p| *p == TEXT_COLOR));
    }
}
