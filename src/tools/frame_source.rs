use super::ffprobe_info::{VideoInfo, get_video_info};
use anyhow::{Context, Result, anyhow, bail};
use image::RgbImage;
use log::{debug, warn};
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};

/// 依序讀取彩色影格的來源
///
/// 只能由頭到尾讀一次，不支援隨機存取。
pub trait FrameSource {
    /// 原始幀率（fps）
    fn frame_rate(&self) -> f64;

    /// 來源總幀數，無法得知時為 0
    fn total_frames(&self) -> u64;

    /// 讀取下一幀，來源結束時回傳 `None`
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// 跳過下一幀而不建立影像，來源結束時回傳 `false`
    fn skip_frame(&mut self) -> Result<bool> {
        Ok(self.next_frame()?.is_some())
    }
}

/// 透過 ffmpeg 子程序解碼的影格來源
///
/// ffmpeg 以 rgb24 rawvideo 輸出到 stdout，每幀固定 `width * height * 3` 位元組。
/// ffmpeg 會依旋轉資訊自動轉正畫面，因此幀尺寸以顯示尺寸為準。
/// 被 drop 時一定會結束並回收子程序。
pub struct FfmpegFrameSource {
    info: VideoInfo,
    width: u32,
    height: u32,
    child: Child,
    stdout: ChildStdout,
    stderr_reader: Option<JoinHandle<String>>,
    frame_len: usize,
    /// 跳過的幀共用這塊緩衝區
    scratch: Vec<u8>,
    finished: bool,
}

impl FfmpegFrameSource {
    pub fn open(ffmpeg: &str, ffprobe: &str, path: &Path) -> Result<Self> {
        let info = get_video_info(ffprobe, path)?;
        let (width, height) = info.display_size();
        let frame_len = width as usize * height as usize * 3;

        debug!(
            "開啟影片 {}: {width}x{height} (旋轉 {}°) @ {:.3} fps, 約 {} 幀",
            path.display(),
            info.rotation,
            info.frame_rate,
            info.total_frames
        );

        let mut child = Command::new(ffmpeg)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-i"])
            .arg(path)
            .args([
                "-map", "0:v:0", "-an", "-sn", "-dn", "-f", "rawvideo", "-pix_fmt", "rgb24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("無法執行 ffmpeg: {}", path.display()))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            bail!("無法取得 ffmpeg 輸出");
        };

        // stderr 另開執行緒讀取，避免緩衝區滿了卡住 ffmpeg
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut stderr = String::new();
                let _ = pipe.read_to_string(&mut stderr);
                stderr
            })
        });

        Ok(Self {
            info,
            width,
            height,
            child,
            stdout,
            stderr_reader,
            frame_len,
            scratch: Vec::new(),
            finished: false,
        })
    }

    /// 等待 ffmpeg 結束並檢查結束狀態
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait().context("無法等待 ffmpeg 結束")?;
        if status.success() {
            return Ok(());
        }

        let stderr = self
            .stderr_reader
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Err(anyhow!("ffmpeg 解碼失敗 ({status}): {}", stderr.trim()))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn frame_rate(&self) -> f64 {
        self.info.frame_rate
    }

    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.frame_len];
        if !read_frame(&mut self.stdout, &mut buffer)? {
            self.finish()?;
            return Ok(None);
        }

        RgbImage::from_raw(self.width, self.height, buffer)
            .map(Some)
            .ok_or_else(|| anyhow!("無法建立 {}x{} 影格", self.width, self.height))
    }

    fn skip_frame(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }

        self.scratch.resize(self.frame_len, 0);
        if !read_frame(&mut self.stdout, &mut self.scratch)? {
            self.finish()?;
            return Ok(false);
        }
        Ok(true)
    }
}

/// 讀滿一幀；在幀邊界遇到 EOF 時回傳 `false`
fn read_frame(reader: &mut impl Read, buffer: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context("讀取 ffmpeg 輸出失敗"),
        }
    }

    match filled {
        0 => Ok(false),
        n if n == buffer.len() => Ok(true),
        n => bail!("影格資料不完整: 預期 {} 位元組，只讀到 {n}", buffer.len()),
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 提前結束（達到上限或發生錯誤）時 ffmpeg 可能還在輸出
        if let Err(e) = self.child.kill() {
            if e.kind() != ErrorKind::InvalidInput {
                warn!("無法結束 ffmpeg 子程序: {e}");
            }
        }
        if let Err(e) = self.child.wait() {
            warn!("無法回收 ffmpeg 子程序: {e}");
        }
    }
}
