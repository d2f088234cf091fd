use super::bit_packer::{PackedFrame, pack_bitmap};
use super::error::ConvertError;
use super::frame_sampler::{FrameSampler, SamplingParams};
use super::header_emitter::{FramesHeader, write_header};
use super::rasterizer::rasterize;
use crate::tools::{FfmpegFrameSource, FrameSource, validate_file_exists};
use chrono::Local;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// 進度回呼：(被取樣幀的來源索引, 來源總幀數, 已保存幀數)
pub type ProgressCallback<'a> = &'a mut dyn FnMut(u64, u64, usize);

/// 外部工具設定
#[derive(Debug, Clone)]
pub struct DecoderPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for DecoderPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// 一次轉換的選項
#[derive(Default)]
pub struct PipelineOptions<'a> {
    pub sampling: SamplingParams,
    pub decoder: DecoderPaths,
    pub progress: Option<ProgressCallback<'a>>,
    pub shutdown_signal: Option<&'a AtomicBool>,
}

/// 轉換成功的結果
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub frames_saved: usize,
    pub frames_read: u64,
    pub stride: u64,
    pub output_path: PathBuf,
}

/// 給呼叫端顯示的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub success: bool,
    pub message: String,
}

impl From<&Result<ConversionReport, ConvertError>> for ConversionOutcome {
    fn from(result: &Result<ConversionReport, ConvertError>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                message: format!(
                    "成功轉換 {} 幀 -> {}",
                    report.frames_saved,
                    report.output_path.display()
                ),
            },
            Err(e) => Self {
                success: false,
                message: format!("處理失敗: {e}"),
            },
        }
    }
}

/// 轉換入口：影片路徑、輸出路徑、取樣間隔，以及可選的進度回呼
///
/// 所有錯誤都在這裡轉成 `success == false` 與錯誤訊息。
pub fn process_video(
    video_path: &Path,
    output_path: &Path,
    interval: f64,
    progress: Option<ProgressCallback<'_>>,
) -> ConversionOutcome {
    let options = PipelineOptions {
        sampling: SamplingParams::new(interval),
        progress,
        ..PipelineOptions::default()
    };
    let result = convert_video(video_path, output_path, options);
    ConversionOutcome::from(&result)
}

/// 以 ffmpeg 解碼影片並產生標頭檔
///
/// 任何失敗都會在這裡記錄一次。
pub fn convert_video(
    video_path: &Path,
    output_path: &Path,
    options: PipelineOptions<'_>,
) -> Result<ConversionReport, ConvertError> {
    open_and_convert(video_path, output_path, options)
        .inspect_err(|e| error!("轉換失敗 {}: {e}", video_path.display()))
}

fn open_and_convert(
    video_path: &Path,
    output_path: &Path,
    options: PipelineOptions<'_>,
) -> Result<ConversionReport, ConvertError> {
    options.sampling.validate()?;

    let source = validate_file_exists(video_path)
        .and_then(|()| {
            FfmpegFrameSource::open(&options.decoder.ffmpeg, &options.decoder.ffprobe, video_path)
        })
        .map_err(|e| ConvertError::open(video_path, &e))?;

    let source_name = video_path
        .file_name()
        .map_or_else(|| video_path.display().to_string(), |n| n.to_string_lossy().to_string());

    convert_frames(source, &source_name, output_path, options)
}

/// 轉換核心：取樣 -> 點陣化 -> 打包 -> 輸出
///
/// `source` 在函式結束前一定會被釋放；只有在所有幀都處理完成後才會寫檔。
pub fn convert_frames<S: FrameSource>(
    source: S,
    source_name: &str,
    output_path: &Path,
    mut options: PipelineOptions<'_>,
) -> Result<ConversionReport, ConvertError> {
    let mut sampler = FrameSampler::new(source, &options.sampling)?;
    let total_frames = sampler.total_frames();
    let stride = sampler.stride();
    let frames = collect_frames(&mut sampler, total_frames, &mut options)?;
    let frames_read = sampler.frames_read();

    // 釋放影片來源後才寫檔
    drop(sampler);

    if frames.is_empty() {
        return Err(ConvertError::NoFrames);
    }

    let header = FramesHeader {
        frames: &frames,
        source_name,
        generated_at: Local::now(),
    };
    write_header(&header, output_path)?;

    info!(
        "已產生 {}: {} 幀 (讀取 {frames_read} 幀, 步長 {stride})",
        output_path.display(),
        frames.len()
    );

    Ok(ConversionReport {
        frames_saved: frames.len(),
        frames_read,
        stride,
        output_path: output_path.to_path_buf(),
    })
}

fn collect_frames<S: FrameSource>(
    sampler: &mut FrameSampler<S>,
    total_frames: u64,
    options: &mut PipelineOptions<'_>,
) -> Result<Vec<PackedFrame>, ConvertError> {
    let mut frames = Vec::new();

    loop {
        if options
            .shutdown_signal
            .is_some_and(|signal| signal.load(Ordering::SeqCst))
        {
            warn!("收到中斷信號，停止轉換");
            return Err(ConvertError::Cancelled);
        }

        let Some(sampled) = sampler.next() else {
            break;
        };
        let sampled = sampled?;

        let bitmap = rasterize(&sampled.image, sampled.source_index)?;
        let packed = pack_bitmap(&bitmap, frames.len());
        debug!(
            "取樣第 {} 幀 -> {}",
            sampled.source_index,
            packed.name()
        );
        frames.push(packed);

        if let Some(progress) = options.progress.as_mut() {
            progress(sampled.source_index, total_frames, frames.len());
        }
    }

    Ok(frames)
}
