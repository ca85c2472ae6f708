use chrono::NaiveDateTime;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIFの撮影日時（"YYYY:MM:DD HH:MM:SS"）
pub fn extract_date(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut bufreader)?;

    for tag in [exif::Tag::DateTimeOriginal, exif::Tag::DateTime] {
        if let Some(field) = exif.get_field(tag, exif::In::PRIMARY) {
            if let exif::Value::Ascii(ref values) = field.value {
                if let Some(raw) = values.first() {
                    return Ok(String::from_utf8_lossy(raw).trim().to_string());
                }
            }
        }
    }

    Err("No date found in EXIF".into())
}

/// EXIF形式の日時を解釈
pub fn parse_exif_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y:%m:%d %H:%M:%S").ok()
}
