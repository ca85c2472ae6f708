use tracing_subscriber::EnvFilter;

/// ログフィルタ（RUST_LOG 未設定時）
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "photo_capa_rust=debug,photo_capa_common=debug"
    } else {
        "warn"
    }
}

/// ログ出力を初期化（stderr、RUST_LOG があればそちらを優先）
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));

    // 二重初期化（テストなど）は無視
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
