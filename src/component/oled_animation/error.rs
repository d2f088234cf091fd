use std::path::PathBuf;
use thiserror::Error;

/// 轉換流程的錯誤種類，任何一種都會中止整個轉換
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("無法開啟影片檔案: {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("第 {index} 幀處理失敗: {reason}")]
    FrameDecode { index: u64, reason: String },

    #[error("無法寫入輸出檔案 {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("幀間隔必須是大於 0 的數值: {0}")]
    InvalidInterval(f64),

    #[error("影片中沒有擷取到任何影格")]
    NoFrames,

    #[error("操作已取消")]
    Cancelled,
}

impl ConvertError {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: &anyhow::Error) -> Self {
        Self::Open {
            path: path.into(),
            reason: format!("{reason:#}"),
        }
    }

    pub(crate) fn frame_decode(index: u64, reason: impl ToString) -> Self {
        Self::FrameDecode {
            index,
            reason: reason.to_string(),
        }
    }
}
