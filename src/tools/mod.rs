mod ffprobe_info;
mod frame_source;
mod path_validator;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use frame_source::{FfmpegFrameSource, FrameSource};
pub use path_validator::{
    HEADER_EXTENSION, SUPPORTED_VIDEO_EXTENSIONS, is_supported_video, parent_directory,
    validate_directory_exists, validate_file_exists, with_header_extension,
};
