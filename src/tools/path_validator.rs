use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// 可選取的影片副檔名
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

/// 輸出標頭檔的預設副檔名
pub const HEADER_EXTENSION: &str = "h";

pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("路徑不是檔案: {}", path.display());
    }
    Ok(())
}

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

#[must_use]
pub fn is_supported_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_VIDEO_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// 沒有副檔名時補上 `.h`
#[must_use]
pub fn with_header_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(HEADER_EXTENSION)
    }
}

/// 輸出檔所在的資料夾（相對路徑沒有上層時為目前資料夾）
#[must_use]
pub fn parent_directory(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_video() {
        assert!(is_supported_video(Path::new("/videos/clip.mp4")));
        assert!(is_supported_video(Path::new("clip.MOV")));
        assert!(is_supported_video(Path::new("a.b.avi")));
        assert!(!is_supported_video(Path::new("clip.mkv")));
        assert!(!is_supported_video(Path::new("clip")));
    }

    #[test]
    fn test_with_header_extension() {
        assert_eq!(
            with_header_extension(Path::new("out/frames")),
            PathBuf::from("out/frames.h")
        );
        assert_eq!(
            with_header_extension(Path::new("out/frames.hpp")),
            PathBuf::from("out/frames.hpp")
        );
    }

    #[test]
    fn test_parent_directory() {
        assert_eq!(parent_directory(Path::new("frames.h")), Path::new("."));
        assert_eq!(parent_directory(Path::new("/tmp/frames.h")), Path::new("/tmp"));
    }

    #[test]
    fn test_validate_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("video.mp4");
        std::fs::write(&file, b"not really a video").unwrap();

        assert!(validate_file_exists(&file).is_ok());
        assert!(validate_file_exists(dir.path()).is_err());
        assert!(validate_file_exists(&dir.path().join("missing.mp4")).is_err());
    }
}
