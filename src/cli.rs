use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-capa")]
#[command(about = "是正前/是正後の写真ペアから安全点検報告書を生成するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真フォルダから報告書を一括生成
    Run {
        /// 写真フォルダのパス
        #[arg(required = true)]
        images: PathBuf,

        /// CAPAカタログ（.csv / .xlsx）
        #[arg(short, long)]
        catalog: PathBuf,

        /// 出力フォルダ（デフォルト: 入力フォルダ/output）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// before/ と after/ フォルダによる手動ペアリング
        #[arg(long)]
        manual: bool,

        /// 乱数シード
        #[arg(long)]
        seed: Option<u64>,

        /// 1画像あたりのタグ数
        #[arg(long)]
        max_tags: Option<usize>,

        /// 埋め込み分類を使わない
        #[arg(long)]
        no_embedding: bool,

        /// 透かしを入れない
        #[arg(long)]
        no_watermark: bool,

        /// 透かしの日時にEXIFの撮影日時を使う
        #[arg(long)]
        exif_time: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,

        /// 出力形式 (excel/json/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 報告書タイトル
        #[arg(short, long)]
        title: Option<String>,
    },

    /// 画像を分類してタグと是正前/後の判定を表示
    Classify {
        /// 画像ファイル（2枚ならペアの順序も表示）
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// 1画像あたりのタグ数
        #[arg(long)]
        max_tags: Option<usize>,

        /// 乱数シード
        #[arg(long)]
        seed: Option<u64>,

        /// 埋め込み分類を使わない
        #[arg(long)]
        no_embedding: bool,
    },

    /// 説明文をカタログと照合
    Match {
        /// CAPAカタログ（.csv / .xlsx）
        #[arg(short, long)]
        catalog: PathBuf,

        /// 内容説明
        #[arg(required = true)]
        text: String,

        /// 乱数シード
        #[arg(long)]
        seed: Option<u64>,
    },

    /// カタログの内容を表示
    Catalog {
        /// CAPAカタログ（.csv / .xlsx）
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 乱数シードを設定
        #[arg(long)]
        set_seed: Option<u64>,

        /// CLIPモデルのディレクトリを設定
        #[arg(long)]
        set_model_dir: Option<PathBuf>,

        /// 埋め込み分類の使用 (true/false)
        #[arg(long)]
        use_embedding: Option<bool>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Json,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "json" => Ok(ExportFormat::Json),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use excel, json, or both", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Excel => write!(f, "excel"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Both => write!(f, "both"),
        }
    }
}
