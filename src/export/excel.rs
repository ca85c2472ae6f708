//! Excel報告書
//!
//! 1シートにタイトル行、続いてペアごとのブロック
//! （番号・日時 / 是正前・是正後の写真 / 指摘事項 / 是正処置）を並べる。

use super::ReportEntry;
use crate::error::{PhotoCapaError, Result};
use rust_xlsxwriter::*;
use std::path::Path;
use tracing::warn;

/// 写真セルの大きさ（px）
const PHOTO_BOX_WIDTH: u32 = 360;
const ROW_HEIGHT_PX: u32 = 20;
const PHOTO_ROWS: u32 = 12;
const LABEL_COL_WIDTH: u32 = 130;

fn excel_err(context: &str) -> impl Fn(XlsxError) -> PhotoCapaError + '_ {
    move |e| PhotoCapaError::ExcelGeneration(format!("{}: {}", context, e))
}

/// 写真を枠に収まる倍率で埋め込む
fn insert_photo(worksheet: &mut Worksheet, row: u32, col: u16, path: &Path) -> Result<()> {
    let image = match Image::new(path) {
        Ok(image) => image,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "写真を埋め込めません");
            return Ok(());
        }
    };

    let box_height = (PHOTO_ROWS * ROW_HEIGHT_PX) as f64;
    let scale = (PHOTO_BOX_WIDTH as f64 / image.width())
        .min(box_height / image.height())
        .min(1.0);

    let image = image
        .set_scale_width(scale)
        .set_scale_height(scale)
        .set_object_movement(ObjectMovement::DontMoveOrSizeWithCells);

    worksheet
        .insert_image_with_offset(row, col, &image, 2, 2)
        .map_err(excel_err("画像埋め込みエラー"))?;
    Ok(())
}

pub fn generate_excel(entries: &[ReportEntry], output_path: &Path, title: &str) -> Result<()> {
    let mut workbook = Workbook::new();

    let title_format = Format::new()
        .set_bold()
        .set_font_size(16.0)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    let header_format = Format::new()
        .set_bold()
        .set_font_size(10.0)
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let label_format = Format::new()
        .set_bold()
        .set_font_size(9.0)
        .set_font_color(Color::RGB(0x555555))
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xAAAAAA));

    let value_format = Format::new()
        .set_font_size(11.0)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Hair)
        .set_border_color(Color::RGB(0xCCCCCC));

    let photo_cell_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xCCCCCC));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Report").map_err(excel_err("シート名設定エラー"))?;
    worksheet
        .set_column_width_pixels(0, LABEL_COL_WIDTH as u16)
        .map_err(excel_err("列幅設定エラー"))?;
    for col in 1..=2 {
        worksheet
            .set_column_width_pixels(col, (PHOTO_BOX_WIDTH + 4) as u16)
            .map_err(excel_err("列幅設定エラー"))?;
    }

    worksheet
        .merge_range(0, 0, 0, 2, title, &title_format)
        .map_err(excel_err("タイトル書き込みエラー"))?;
    worksheet
        .set_row_height_pixels(0, (ROW_HEIGHT_PX * 2) as u16)
        .map_err(excel_err("行高さ設定エラー"))?;

    let mut row: u32 = 2;
    for entry in entries {
        // 見出し
        worksheet
            .write_string_with_format(row, 0, format!("No. {}", entry.index), &header_format)
            .map_err(excel_err("見出し書き込みエラー"))?;
        worksheet
            .merge_range(row, 1, row, 2, &entry.timestamp, &header_format)
            .map_err(excel_err("見出し書き込みエラー"))?;
        row += 1;

        worksheet
            .write_string_with_format(row, 1, "Before", &label_format)
            .map_err(excel_err("ラベル書き込みエラー"))?;
        worksheet
            .write_string_with_format(row, 2, "After", &label_format)
            .map_err(excel_err("ラベル書き込みエラー"))?;
        row += 1;

        // 写真
        let photo_end = row + PHOTO_ROWS - 1;
        for r in row..=photo_end {
            worksheet
                .set_row_height_pixels(r, ROW_HEIGHT_PX as u16)
                .map_err(excel_err("行高さ設定エラー"))?;
        }
        for col in 1..=2 {
            worksheet
                .merge_range(row, col, photo_end, col, "", &photo_cell_format)
                .map_err(excel_err("セルマージエラー"))?;
        }
        insert_photo(worksheet, row, 1, &entry.before)?;
        insert_photo(worksheet, row, 2, &entry.after)?;
        row = photo_end + 1;

        // 指摘事項・是正処置
        for (label, value) in [("Finding", &entry.description), ("Corrective Action", &entry.action)] {
            worksheet
                .write_string_with_format(row, 0, label, &label_format)
                .map_err(excel_err("ラベル書き込みエラー"))?;
            worksheet
                .merge_range(row, 1, row, 2, value, &value_format)
                .map_err(excel_err("値書き込みエラー"))?;
            worksheet
                .set_row_height_pixels(row, (ROW_HEIGHT_PX * 2) as u16)
                .map_err(excel_err("行高さ設定エラー"))?;
            row += 1;
        }

        row += 1;
    }

    workbook.save(output_path).map_err(excel_err("Excel保存エラー"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_generate_excel_contains_text() {
        let dir = TempDir::new().unwrap();
        let before = dir.path().join("before.png");
        let after = dir.path().join("after.png");
        RgbImage::from_pixel(40, 30, Rgb([10, 10, 10])).save(&before).unwrap();
        RgbImage::from_pixel(40, 30, Rgb([240, 240, 240])).save(&after).unwrap();

        let entries = vec![ReportEntry {
            index: 1,
            before,
            after,
            timestamp: "2024-06-03 02:07 PM".into(),
            description: "Blocked fire exit".into(),
            action: "Remove pallets".into(),
        }];
        let output = dir.path().join("report.xlsx");
        generate_excel(&entries, &output, "Daily Report").unwrap();

        let mut workbook = open_workbook_auto(&output).unwrap();
        let range = workbook.worksheet_range("Report").unwrap();
        let texts: Vec<String> = range
            .rows()
            .flat_map(|r| r.iter())
            .filter_map(|c| match c {
                Data::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect();

        assert!(texts.contains(&"Daily Report".to_string()));
        assert!(texts.contains(&"2024-06-03 02:07 PM".to_string()));
        assert!(texts.contains(&"Blocked fire exit".to_string()));
        assert!(texts.contains(&"Remove pallets".to_string()));
    }

    #[test]
    fn test_missing_photo_is_skipped() {
        let dir = TempDir::new().unwrap();
        let entries = vec![ReportEntry {
            index: 1,
            before: dir.path().join("none.png"),
            after: dir.path().join("none2.png"),
            timestamp: String::new(),
            description: "x".into(),
            action: "y".into(),
        }];
        let output = dir.path().join("report.xlsx");
        generate_excel(&entries, &output, "T").unwrap();
        assert!(output.exists());
    }
}
