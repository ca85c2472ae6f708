//! CLIP ViT-B/32 エンコーダ（`clip` 機能）
//!
//! モデルディレクトリに `model.safetensors` と `tokenizer.json` を置く。

use super::embedding::ImageTextEncoder;
use crate::error::{PhotoCapaError, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::{info, warn};

const MODEL_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";
const PAD_TOKEN: &str = "<|endoftext|>";

fn backend_err(context: &str, e: impl std::fmt::Display) -> PhotoCapaError {
    PhotoCapaError::BackendUnavailable(format!("{}: {}", context, e))
}

/// GPU機能はビルドしないので常にCPU
fn select_device() -> Device {
    Device::Cpu
}

pub struct ClipEncoder {
    model: ClipModel,
    tokenizer: Tokenizer,
    config: ClipConfig,
    device: Device,
    pad_id: u32,
}

impl ClipEncoder {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path: PathBuf = model_dir.join(MODEL_FILE);
        let tokenizer_path: PathBuf = model_dir.join(TOKENIZER_FILE);
        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(PhotoCapaError::BackendUnavailable(format!(
                    "モデルファイルが見つかりません: {}",
                    path.display()
                )));
            }
        }

        let device = select_device();
        let config = ClipConfig::vit_base_patch32();

        // SAFETY: モデルファイルは読み込み中に変更されない前提
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&model_path], DType::F32, &device)
                .map_err(|e| backend_err("safetensors の読み込みに失敗", e))?
        };
        let model = ClipModel::new(vb, &config).map_err(|e| backend_err("CLIPモデルの構築に失敗", e))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| backend_err("トークナイザの読み込みに失敗", e))?;
        let pad_id = match tokenizer.get_vocab(true).get(PAD_TOKEN) {
            Some(&id) => id,
            None => {
                warn!("パディングトークンがありません。0 を使います");
                0
            }
        };

        info!(model = %model_path.display(), "CLIPモデルを読み込みました");
        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            pad_id,
        })
    }

    fn tokenize(&self, texts: &[&str]) -> Result<Tensor> {
        let mut rows = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self
                .tokenizer
                .encode(*text, true)
                .map_err(|e| backend_err("トークン化に失敗", e))?;
            rows.push(encoding.get_ids().to_vec());
        }

        let max_len = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut tensors = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.resize(max_len, self.pad_id);
            tensors.push(
                Tensor::new(row.as_slice(), &self.device)
                    .map_err(|e| backend_err("入力テンソルの作成に失敗", e))?,
            );
        }
        Tensor::stack(&tensors, 0).map_err(|e| backend_err("入力テンソルの作成に失敗", e))
    }

    fn load_image(&self, path: &Path) -> Result<Tensor> {
        let size = self.config.image_size;
        let img = image::open(path)
            .map_err(|e| PhotoCapaError::ImageRead(format!("{}: {}", path.display(), e)))?
            .resize_to_fill(size as u32, size as u32, image::imageops::FilterType::Triangle)
            .to_rgb8()
            .into_raw();

        Tensor::from_vec(img, (size, size, 3), &self.device)
            .and_then(|t| t.permute((2, 0, 1)))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.affine(2.0 / 255.0, -1.0))
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| backend_err("画像テンソルの作成に失敗", e))
    }
}

impl ImageTextEncoder for ClipEncoder {
    fn encode_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let input_ids = self.tokenize(texts)?;
        self.model
            .get_text_features(&input_ids)
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(|e| backend_err("テキスト埋め込みに失敗", e))
    }

    fn encode_image(&self, image: &Path) -> Result<Vec<f32>> {
        let pixels = self.load_image(image)?;
        let features = self
            .model
            .get_image_features(&pixels)
            .and_then(|t| t.to_vec2::<f32>())
            .map_err(|e| backend_err("画像埋め込みに失敗", e))?;
        features
            .into_iter()
            .next()
            .ok_or_else(|| PhotoCapaError::BackendUnavailable("画像埋め込みが空です".into()))
    }
}
