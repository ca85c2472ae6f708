use crate::error::{PhotoCapaError, Result};
use crate::imaging::watermark::MAX_WATERMARK_SCALE;
use photo_capa_common::{DEFAULT_ACTION, DEFAULT_DESCRIPTION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 1画像あたりのタグ数（未指定なら分類器ごとのデフォルト）
    pub max_tags: Option<usize>,
    /// 埋め込みバックエンドを試すか
    pub use_embedding: bool,
    /// CLIPモデルのディレクトリ（model.safetensors, tokenizer.json）
    pub clip_model_dir: Option<PathBuf>,
    pub report_title: String,
    /// 照合結果が空のときの説明
    pub default_description: String,
    /// 照合結果が空のときの是正処置
    pub default_action: String,
    pub resize_images: bool,
    pub image_max_width: u32,
    pub image_max_height: u32,
    pub watermark: bool,
    /// 透かしと画像端の距離（px）
    pub watermark_padding: u32,
    /// 透かし文字の拡大率（1ドット = scale px）
    pub watermark_scale: u32,
    pub datetime_format: String,
    /// 乱数シード（指定すると結果が再現可能）
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tags: None,
            use_embedding: true,
            clip_model_dir: None,
            report_title: "Daily Report".into(),
            default_description: DEFAULT_DESCRIPTION.into(),
            default_action: DEFAULT_ACTION.into(),
            resize_images: true,
            image_max_width: 1920,
            image_max_height: 1080,
            watermark: true,
            watermark_padding: 15,
            watermark_scale: 3,
            datetime_format: "%Y-%m-%d %I:%M %p".into(),
            seed: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PhotoCapaError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("photo-capa").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_tags == Some(0) {
            return Err(PhotoCapaError::Config("max_tags は1以上にしてください".into()));
        }
        if self.image_max_width == 0 || self.image_max_height == 0 {
            return Err(PhotoCapaError::Config("最大画像サイズが0です".into()));
        }
        if self.watermark_scale == 0 || self.watermark_scale > MAX_WATERMARK_SCALE {
            return Err(PhotoCapaError::Config(format!(
                "watermark_scale は1〜{}にしてください",
                MAX_WATERMARK_SCALE
            )));
        }
        Ok(())
    }
}
