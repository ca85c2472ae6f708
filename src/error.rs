use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoCapaError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    /// 画像ファイルが存在しない・デコードできない
    #[error("画像読み込みエラー: {0}")]
    ImageRead(String),

    #[error("画像保存エラー: {0}")]
    ImageWrite(String),

    /// 埋め込みバックエンドの初期化・推論に失敗
    #[error("埋め込みバックエンドが利用できません: {0}")]
    BackendUnavailable(String),

    #[error("カタログ読み込みエラー: {0}")]
    CatalogLoad(String),

    #[error("カタログにデータがありません: {0}")]
    EmptyCatalog(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] photo_capa_common::Error),
}

impl PhotoCapaError {
    /// 埋め込みバックエンドを降格させるべき失敗か
    pub fn is_backend_failure(&self) -> bool {
        matches!(self, PhotoCapaError::BackendUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, PhotoCapaError>;
