use chrono::Local;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use photo_capa_common::{decide_before, order, select};
use photo_capa_rust::classifier::ClassifierBackend;
use photo_capa_rust::export::ReportEntry;
use photo_capa_rust::imaging::{self, ImageOptions};
use photo_capa_rust::pipeline::{seeded_rng, PairingPipeline};
use photo_capa_rust::{catalog, cli, config, error, export, logging, scanner};
use cli::{Cli, Commands, ExportFormat};
use config::Config;
use error::{PhotoCapaError, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// カタログ表示の件数
const CATALOG_PREVIEW: usize = 5;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Run {
            images,
            catalog,
            output,
            manual,
            seed,
            max_tags,
            no_embedding,
            no_watermark,
            exif_time,
            recursive,
            format,
            title,
        } => {
            let mut config = config;
            if seed.is_some() {
                config.seed = seed;
            }
            if max_tags.is_some() {
                config.max_tags = max_tags;
            }
            if no_embedding {
                config.use_embedding = false;
            }
            if no_watermark {
                config.watermark = false;
            }
            if let Some(title) = title {
                config.report_title = title;
            }
            config.validate()?;

            let options = RunOptions {
                manual,
                exif_time,
                recursive,
                format,
            };
            run(&images, &catalog, output, &config, &options)?;
        }

        Commands::Classify {
            images,
            max_tags,
            seed,
            no_embedding,
        } => {
            let mut config = config;
            if max_tags.is_some() {
                config.max_tags = max_tags;
            }
            if no_embedding {
                config.use_embedding = false;
            }
            config.validate()?;
            classify(&images, &config, seed.or(config.seed))?;
        }

        Commands::Match { catalog, text, seed } => {
            let catalog = catalog::load_catalog(&catalog)?;
            let mut rng = seeded_rng(seed.or(config.seed));
            let outcome = select(&text, catalog.entries(), &mut rng);

            println!("段階: {}", outcome.tier);
            if let Some(score) = outcome.score {
                println!("スコア: {:.3}", score);
            }
            if let Some(index) = outcome.index {
                println!("行: {}", index + 1);
            }
            println!("指摘事項: {}", outcome.entry.finding);
            println!("是正処置: {}", outcome.entry.action);
        }

        Commands::Catalog { file } => {
            let catalog = catalog::load_catalog(&file)?;
            println!("カタログ: {} ({}件)", file.display(), catalog.len());
            for (i, entry) in catalog.entries().iter().take(CATALOG_PREVIEW).enumerate() {
                println!("  {}. {} → {}", i + 1, entry.finding, entry.action);
            }
            if catalog.len() > CATALOG_PREVIEW {
                println!("  ...");
            }
        }

        Commands::Config {
            show,
            set_seed,
            set_model_dir,
            use_embedding,
        } => {
            let mut config = config;
            let mut changed = false;

            if let Some(seed) = set_seed {
                config.seed = Some(seed);
                changed = true;
            }
            if let Some(dir) = set_model_dir {
                config.clip_model_dir = Some(dir);
                changed = true;
            }
            if let Some(flag) = use_embedding {
                config.use_embedding = flag;
                changed = true;
            }

            if changed {
                config.validate()?;
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show || !changed {
                println!("設定:");
                println!(
                    "  タグ数: {}",
                    config.max_tags.map_or("分類器のデフォルト".to_string(), |n| n.to_string())
                );
                println!("  埋め込み分類: {}", if config.use_embedding { "有効" } else { "無効" });
                println!(
                    "  モデル: {}",
                    config
                        .clip_model_dir
                        .as_ref()
                        .map_or("未設定".to_string(), |p| p.display().to_string())
                );
                println!("  最大画像サイズ: {}x{}px", config.image_max_width, config.image_max_height);
                println!("  透かし: {}", if config.watermark { "有効" } else { "無効" });
                println!("  日時フォーマット: {}", config.datetime_format);
                println!(
                    "  乱数シード: {}",
                    config.seed.map_or("未設定".to_string(), |s| s.to_string())
                );
            }
        }
    }

    Ok(())
}

struct RunOptions {
    manual: bool,
    exif_time: bool,
    recursive: bool,
    format: ExportFormat,
}

fn run(
    images: &Path,
    catalog_path: &Path,
    output: Option<PathBuf>,
    config: &Config,
    options: &RunOptions,
) -> Result<()> {
    println!("🚀 photo-capa - 報告書生成\n");

    // 1. Scan
    println!("[1/4] 写真をスキャン中...");
    let manual_pairs = if options.manual {
        let pairs = scanner::scan_manual_pairs(images)?;
        if pairs.is_none() {
            warn!("before/after フォルダがないため通常のペアリングを使います");
        }
        pairs
    } else {
        None
    };
    let manual_mode = manual_pairs.is_some();
    let pairs = match manual_pairs {
        Some(pairs) => pairs,
        None => scanner::pair_sequential(scanner::scan_folder(images, options.recursive)?),
    };
    if pairs.is_empty() {
        return Err(PhotoCapaError::NoImagesFound(images.display().to_string()));
    }
    println!(
        "✔ {}組のペアを検出{}\n",
        pairs.len(),
        if manual_mode { " (手動ペアリング)" } else { "" }
    );

    // 2. Catalog
    println!("[2/4] カタログを読み込み中...");
    let catalog = catalog::load_catalog(catalog_path)?;
    println!("✔ {}件のエントリ\n", catalog.len());

    // 3. Classify / match / prepare images
    println!("[3/4] 判定・照合中...");
    let output_dir = output.unwrap_or_else(|| images.join("output"));
    std::fs::create_dir_all(&output_dir)?;

    let image_options = ImageOptions::from(config);
    let mut pipeline = PairingPipeline::from_config(config, catalog);
    let mut entries = Vec::with_capacity(pairs.len());
    let mut degraded = 0usize;

    let bar = ProgressBar::new(pairs.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for pair in &pairs {
        bar.set_message(pair.first.file_name.clone());

        let record = if manual_mode {
            pipeline.process_manual(&pair.first.path, &pair.second.path, pair.catalog_no)
        } else {
            let processed = pipeline.process_traced(&pair.first.path, &pair.second.path);
            if processed.degraded {
                degraded += 1;
            }
            processed.record
        };

        let datetime = match pair.first.datetime().filter(|_| options.exif_time) {
            Some(dt) => dt,
            None => imaging::random_timestamp(Local::now().naive_local(), pipeline.rng_mut()),
        };
        let timestamp = imaging::format_timestamp(&datetime, &config.datetime_format)?;

        let index = entries.len() + 1;
        match imaging::prepare_pair(
            &record.before,
            &record.after,
            &output_dir,
            index,
            &timestamp,
            &image_options,
        ) {
            Ok(prepared) => {
                let mut record = record;
                record.before = prepared.before;
                record.after = prepared.after;
                entries.push(ReportEntry::from_record(index, record, timestamp));
            }
            Err(e) => {
                warn!(
                    before = %record.before.display(),
                    error = %e,
                    "画像の準備に失敗したためペアをスキップします"
                );
            }
        }

        bar.inc(1);
    }
    bar.finish_and_clear();

    println!(
        "✔ {}組を処理 (分類器: {}{})\n",
        entries.len(),
        pipeline.backend().active_name(),
        if degraded > 0 { format!(", 既定値 {}組", degraded) } else { String::new() }
    );

    if entries.is_empty() {
        return Err(PhotoCapaError::NoImagesFound(images.display().to_string()));
    }

    // 4. Export
    println!("[4/4] エクスポート中...");
    export::export_report(&entries, &options.format, &output_dir, &config.report_title)?;

    println!("\n✅ 完了");
    Ok(())
}

fn classify(images: &[PathBuf], config: &Config, seed: Option<u64>) -> Result<()> {
    let mut backend = ClassifierBackend::from_config(config);
    let mut rng = seeded_rng(seed);
    let mut results = Vec::with_capacity(images.len());

    for image in images {
        match backend.classify(image, &mut rng) {
            Ok(tags) => {
                let verdict = if decide_before(&tags) { "是正前" } else { "是正後" };
                println!("{} [{}] ({})", image.display(), verdict, backend.active_name());
                for tag in &tags {
                    println!("  {:.3}  {}", tag.confidence, tag.label);
                }
                results.push(Some(tags));
            }
            Err(e) => {
                println!("✗ {}: {}", image.display(), e);
                results.push(None);
            }
        }
    }

    if let [Some(tags_a), Some(tags_b)] = results.as_slice() {
        let ordered = order(&images[0], tags_a, &images[1], tags_b);
        println!();
        println!("是正前: {}", ordered.before.display());
        println!("是正後: {}", ordered.after.display());
        println!("内容: {}", ordered.content_description);
        if ordered.defaulted {
            println!("(判定が一致したため入力順を採用)");
        }
    } else if images.len() == 2 {
        println!("\n分類に失敗した画像があるため順序は判定できません");
    }

    Ok(())
}
