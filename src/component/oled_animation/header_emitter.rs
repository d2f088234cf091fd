use super::bit_packer::PackedFrame;
use super::error::ConvertError;
use crate::tools::parent_directory;
use chrono::{DateTime, Local};
use log::debug;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 每行輸出的位元組數
const BYTES_PER_LINE: usize = 16;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Arduino 標頭檔內容
///
/// 韌體端依賴固定的名稱：`FRAMES_H`、`all_frames`、`FRAME_COUNT`。
/// 除了第一行時間戳記外，相同的幀內容一定產生相同的輸出。
pub struct FramesHeader<'a> {
    pub frames: &'a [PackedFrame],
    pub source_name: &'a str,
    pub generated_at: DateTime<Local>,
}

impl fmt::Display for FramesHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.frames.len();

        writeln!(f, "// 自动生成于 {}", self.generated_at.format(TIMESTAMP_FORMAT))?;
        writeln!(f, "// 源视频: {}", self.source_name)?;
        writeln!(f, "// 总帧数: {count}")?;
        writeln!(f)?;

        writeln!(f, "#ifndef FRAMES_H")?;
        writeln!(f, "#define FRAMES_H")?;
        writeln!(f)?;
        writeln!(f, "#include <Arduino.h>")?;
        writeln!(f, "#include <avr/pgmspace.h>")?;
        writeln!(f)?;

        for frame in self.frames {
            writeln!(f, "const PROGMEM uint8_t {}[] = {{", frame.name())?;
            for line in frame.bytes().chunks(BYTES_PER_LINE) {
                f.write_str("    ")?;
                for (i, byte) in line.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "0x{byte:02X}")?;
                }
                writeln!(f, ",")?;
            }
            writeln!(f, "}};")?;
            writeln!(f)?;
        }

        writeln!(f, "const uint8_t* const all_frames[{count}] PROGMEM = {{")?;
        f.write_str("    ")?;
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(",\n    ")?;
            }
            f.write_str(frame.name())?;
        }
        writeln!(f)?;
        writeln!(f, "}};")?;
        writeln!(f)?;

        writeln!(f, "const uint16_t FRAME_COUNT = {count};")?;
        writeln!(f, "#endif")
    }
}

/// 寫出標頭檔
///
/// 先寫到同資料夾的暫存檔，完整寫入後才改名成 `output_path`，
/// 失敗時不會留下寫到一半的檔案。
pub fn write_header(header: &FramesHeader<'_>, output_path: &Path) -> Result<(), ConvertError> {
    let write_error = |source| ConvertError::Write {
        path: output_path.to_path_buf(),
        source,
    };

    let contents = header.to_string();
    let mut temp_file = NamedTempFile::new_in(parent_directory(output_path)).map_err(write_error)?;
    temp_file
        .write_all(contents.as_bytes())
        .and_then(|()| temp_file.as_file().sync_all())
        .map_err(write_error)?;
    temp_file
        .persist(output_path)
        .map_err(|e| write_error(e.error))?;

    debug!(
        "已寫入 {} 位元組到 {}",
        contents.len(),
        output_path.display()
    );
    Ok(())
}
