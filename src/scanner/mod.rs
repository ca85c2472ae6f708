mod exif;

pub use self::exif::parse_exif_datetime;

use crate::error::{PhotoCapaError, Result};
use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// EXIFの撮影日時（生文字列）
    pub date: Option<String>,
}

impl ImageInfo {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            file_name,
            date: exif::extract_date(path).ok(),
        }
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_exif_datetime)
    }
}

/// 入力ペア（1枚目・2枚目）
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub first: ImageInfo,
    pub second: ImageInfo,
    /// 手動モードで before ファイル名に付いていたカタログ番号
    pub catalog_no: Option<u32>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

lazy_static! {
    /// before/<id>[_<カタログ番号>].ext
    static ref BEFORE_NAME: Regex = Regex::new(r"(?i)^(\d+)(?:_(\d+))?\.(?:jpg|jpeg|png)$").unwrap();
    /// after/<id>.ext
    static ref AFTER_NAME: Regex = Regex::new(r"(?i)^(\d+)\.(?:jpg|jpeg|png)$").unwrap();
}

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| is_image_extension(&ext.to_string_lossy()))
        .unwrap_or(false)
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(PhotoCapaError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_path(e.path()))
        .map(|e| ImageInfo::from_path(e.path()))
        .collect();

    // ファイル名でソート（同名はパスで）
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name).then_with(|| a.path.cmp(&b.path)));

    debug!(folder = %folder.display(), count = images.len(), "画像をスキャン");
    Ok(images)
}

/// 連続する2枚ずつをペアにする。奇数枚なら最後の1枚は使わない
pub fn pair_sequential(images: Vec<ImageInfo>) -> Vec<ImagePair> {
    if images.len() % 2 == 1 {
        if let Some(last) = images.last() {
            warn!(file = %last.file_name, "画像が奇数枚のため最後の1枚をスキップします");
        }
    }

    let mut pairs = Vec::with_capacity(images.len() / 2);
    let mut iter = images.into_iter();
    while let (Some(first), Some(second)) = (iter.next(), iter.next()) {
        pairs.push(ImagePair {
            first,
            second,
            catalog_no: None,
        });
    }
    pairs
}

/// before/ と after/ フォルダから番号でペアを作る
///
/// どちらかのフォルダがなければ None（通常のペアリングを使う）。
pub fn scan_manual_pairs(folder: &Path) -> Result<Option<Vec<ImagePair>>> {
    let before_dir = folder.join("before");
    let after_dir = folder.join("after");
    if !before_dir.is_dir() || !after_dir.is_dir() {
        return Ok(None);
    }

    let mut befores: BTreeMap<u64, (ImageInfo, Option<u32>)> = BTreeMap::new();
    for image in scan_folder(&before_dir, false)? {
        let Some(caps) = BEFORE_NAME.captures(&image.file_name) else {
            debug!(file = %image.file_name, "命名規則に合わないためスキップ");
            continue;
        };
        let Some(id) = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) else {
            continue;
        };
        let catalog_no = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        befores.entry(id).or_insert((image, catalog_no));
    }

    let mut afters: BTreeMap<u64, ImageInfo> = BTreeMap::new();
    for image in scan_folder(&after_dir, false)? {
        let id = AFTER_NAME
            .captures(&image.file_name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok());
        match id {
            Some(id) => {
                afters.entry(id).or_insert(image);
            }
            None => debug!(file = %image.file_name, "命名規則に合わないためスキップ"),
        }
    }

    let mut pairs = Vec::new();
    for (id, (before, catalog_no)) in befores {
        match afters.remove(&id) {
            Some(after) => pairs.push(ImagePair {
                first: before,
                second: after,
                catalog_no,
            }),
            None => warn!(id, "対応する after 画像がありません"),
        }
    }
    for id in afters.keys() {
        warn!(id, "対応する before 画像がありません");
    }

    Ok(Some(pairs))
}
