use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// 儲存的畫面寬度（旋轉前）
    pub width: u32,
    /// 儲存的畫面高度（旋轉前）
    pub height: u32,
    /// 顯示時需順時針旋轉的角度，已正規化到 0..360
    pub rotation: u32,
    pub frame_rate: f64,
    /// 影片總幀數，無法得知時為 0
    pub total_frames: u64,
    pub duration_seconds: Option<f64>,
}

impl VideoInfo {
    /// ffmpeg 自動旋轉後實際輸出的畫面尺寸
    ///
    /// 旋轉 90 或 270 度時寬高互換。
    #[must_use]
    pub const fn display_size(&self) -> (u32, u32) {
        if self.rotation % 180 == 90 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
    side_data_list: Option<Vec<SideData>>,
    tags: Option<StreamTags>,
}

#[derive(Deserialize)]
struct SideData {
    rotation: Option<f64>,
}

/// 舊版 ffmpeg 把旋轉角度放在 `tags.rotate`
#[derive(Deserialize)]
struct StreamTags {
    rotate: Option<String>,
}

/// 使用 ffprobe 取得影片資訊
pub fn get_video_info(ffprobe: &str, path: &Path) -> Result<VideoInfo> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ffprobe_output(&stdout).with_context(|| format!("無法解析影片資訊: {}", path.display()))
}

fn parse_ffprobe_output(json: &str) -> Result<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    // 找到視訊串流
    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流"))?;

    let width = video_stream
        .width
        .filter(|&w| w > 0)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .filter(|&h| h > 0)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片高度"))?;

    let rotation = stream_rotation(video_stream);

    // avg_frame_rate 對應實際播放速率，r_frame_rate 為備援
    let frame_rate = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .filter_map(|rate| rate.as_deref().and_then(parse_frame_rate))
        .find(|&fps| fps > 0.0)
        .ok_or_else(|| anyhow::anyhow!("無法取得有效的影片幀率"))?;

    // 取得影片長度（優先從 format，其次從 stream）
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let total_frames = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .or_else(|| duration_seconds.map(|d| (d * frame_rate).round() as u64))
        .unwrap_or(0);

    Ok(VideoInfo {
        width,
        height,
        rotation,
        frame_rate,
        total_frames,
        duration_seconds,
    })
}

/// 讀取串流的旋轉角度，正規化成 0..360 的 90 度倍數
///
/// Display Matrix 的 `rotation` 是逆時針角度，`tags.rotate` 是順時針角度。
fn stream_rotation(stream: &StreamInfo) -> u32 {
    let from_side_data = stream
        .side_data_list
        .iter()
        .flatten()
        .find_map(|data| data.rotation)
        .map(|degrees| -degrees);
    let from_tags = || {
        stream
            .tags
            .as_ref()
            .and_then(|tags| tags.rotate.as_deref())
            .and_then(|rotate| rotate.trim().parse::<f64>().ok())
    };

    from_side_data
        .or_else(from_tags)
        .filter(|degrees| degrees.is_finite())
        .map_or(0, |degrees| {
            let quarter_turns = (degrees / 90.0).round() as i64;
            (quarter_turns.rem_euclid(4) * 90) as u32
        })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
