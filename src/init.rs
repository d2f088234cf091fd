use env_logger::Env;

/// 初始化 logger，預設只輸出 warn 以上以免干擾進度條，可用 `RUST_LOG` 調整
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .init();
}
