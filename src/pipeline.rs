//! 1ペア単位の処理
//!
//! 分類 → 是正前/後の判定 → カタログ照合 の順に実行し、最終レコードを返す。
//! どこで失敗しても入力順のまま既定の説明・処置を入れたレコードを返し、
//! バッチ全体は止めない。

use crate::classifier::ClassifierBackend;
use crate::config::Config;
use crate::error::Result;
use photo_capa_common::{order, select, Catalog, CatalogEntry, ImagePairRecord, MatchTier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 処理結果（ログ・表示用の付帯情報付き）
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedPair {
    pub record: ImagePairRecord<PathBuf>,
    /// 入力順を入れ替えたか
    pub swapped: bool,
    /// 照合に使った内容説明（是正前側の上位タグ、失敗時は空）
    pub content: String,
    /// 照合の段階（失敗時はNone）
    pub tier: Option<MatchTier>,
    /// 失敗により既定値のレコードになったか
    pub degraded: bool,
}

/// シード未指定ならOSの乱数で初期化
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub struct PairingPipeline {
    backend: ClassifierBackend,
    catalog: Catalog,
    rng: StdRng,
    default_description: String,
    default_action: String,
}

impl PairingPipeline {
    pub fn new(backend: ClassifierBackend, catalog: Catalog, rng: StdRng) -> Self {
        let defaults = Config::default();
        Self {
            backend,
            catalog,
            rng,
            default_description: defaults.default_description,
            default_action: defaults.default_action,
        }
    }

    /// 設定から組み立てる
    pub fn from_config(config: &Config, catalog: Catalog) -> Self {
        let rng = seeded_rng(config.seed);
        Self::new(ClassifierBackend::from_config(config), catalog, rng)
            .with_defaults(&config.default_description, &config.default_action)
    }

    pub fn with_defaults(mut self, description: &str, action: &str) -> Self {
        self.default_description = description.to_string();
        self.default_action = action.to_string();
        self
    }

    pub fn backend(&self) -> &ClassifierBackend {
        &self.backend
    }

    /// パイプラインの乱数（タイムスタンプ生成などでも共有する）
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 2枚の画像から1レコードを作る
    pub fn process(&mut self, a: &Path, b: &Path) -> ImagePairRecord<PathBuf> {
        self.process_traced(a, b).record
    }

    /// [`process`](Self::process) の付帯情報付き版
    pub fn process_traced(&mut self, a: &Path, b: &Path) -> ProcessedPair {
        match self.try_process(a, b) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(
                    a = %a.display(),
                    b = %b.display(),
                    error = %e,
                    "ペアの処理に失敗したため既定値を使います"
                );
                ProcessedPair {
                    record: ImagePairRecord {
                        before: a.to_path_buf(),
                        after: b.to_path_buf(),
                        description: self.default_description.clone(),
                        action: self.default_action.clone(),
                    },
                    swapped: false,
                    content: String::new(),
                    tier: None,
                    degraded: true,
                }
            }
        }
    }

    fn try_process(&mut self, a: &Path, b: &Path) -> Result<ProcessedPair> {
        let tags_a = self.backend.classify(a, &mut self.rng)?;
        let downgraded_before_b = self.backend.is_downgraded();
        let tags_b = self.backend.classify(b, &mut self.rng)?;

        // B の途中で降格した場合、A も同じ分類器でやり直す
        let tags_a = if !downgraded_before_b && self.backend.is_downgraded() {
            debug!(a = %a.display(), "降格後の分類器で再分類");
            self.backend.classify(a, &mut self.rng)?
        } else {
            tags_a
        };

        let ordered = order(a, &tags_a, b, &tags_b);
        debug!(
            before = %ordered.before.display(),
            content = %ordered.content_description,
            swapped = ordered.swapped,
            defaulted = ordered.defaulted,
            "順序判定"
        );

        let outcome = select(&ordered.content_description, self.catalog.entries(), &mut self.rng);
        let (description, action) = self.fill_defaults(outcome.entry);

        Ok(ProcessedPair {
            record: ImagePairRecord {
                before: ordered.before.to_path_buf(),
                after: ordered.after.to_path_buf(),
                description,
                action,
            },
            swapped: ordered.swapped,
            content: ordered.content_description,
            tier: Some(outcome.tier),
            degraded: false,
        })
    }

    /// 是正前/後が確定しているペアを処理する（分類しない）
    ///
    /// カタログ番号があればその行、なければカタログからランダムに選ぶ。
    pub fn process_manual(
        &mut self,
        before: &Path,
        after: &Path,
        catalog_no: Option<u32>,
    ) -> ImagePairRecord<PathBuf> {
        let entry = match catalog_no.and_then(|n| self.catalog.by_number(n)) {
            Some(entry) => entry.clone(),
            None => {
                if let Some(n) = catalog_no {
                    info!(catalog_no = n, "カタログ番号が見つからないためランダムに選択");
                }
                self.random_entry()
            }
        };
        let (description, action) = self.fill_defaults(entry);

        ImagePairRecord {
            before: before.to_path_buf(),
            after: after.to_path_buf(),
            description,
            action,
        }
    }

    fn random_entry(&mut self) -> CatalogEntry {
        let entries = self.catalog.entries();
        if entries.is_empty() {
            return CatalogEntry::sentinel();
        }
        let index = self.rng.gen_range(0..entries.len());
        entries[index].clone()
    }

    /// 空の文字列を既定値に置き換える
    fn fill_defaults(&self, entry: CatalogEntry) -> (String, String) {
        let description = if entry.finding.trim().is_empty() {
            self.default_description.clone()
        } else {
            entry.finding
        };
        let action = if entry.action.trim().is_empty() {
            self.default_action.clone()
        } else {
            entry.action
        };
        (description, action)
    }
}
