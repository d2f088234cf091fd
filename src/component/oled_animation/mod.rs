//! 影片轉 Arduino OLED 動畫元件
//!
//! 單向流程：
//! A. 依間隔取樣影格（ffmpeg）
//! B. 縮放並抖動成 128x64 黑白點陣
//! C. 每 8 像素打包成一個位元組
//! D. 輸出 Arduino 標頭檔

mod bit_packer;
mod error;
mod frame_sampler;
mod header_emitter;
mod main;
mod pipeline;
mod rasterizer;

pub use bit_packer::{BYTES_PER_ROW, FRAME_BYTES, PackedFrame, pack_bitmap, unpack_bitmap};
pub use error::ConvertError;
pub use frame_sampler::{
    DEFAULT_INTERVAL, FrameSampler, MAX_FRAMES, MAX_INTERVAL, MIN_INTERVAL, SampledFrame,
    SamplingParams, frame_stride,
};
pub use header_emitter::{FramesHeader, write_header};
pub use main::OledAnimationGenerator;
pub use pipeline::{
    ConversionOutcome, ConversionReport, DecoderPaths, PipelineOptions, ProgressCallback,
    convert_frames, convert_video, process_video,
};
pub use rasterizer::{DISPLAY_HEIGHT, DISPLAY_WIDTH, rasterize};
