use super::error::ConvertError;
use crate::tools::FrameSource;
use image::RgbImage;
use log::debug;

/// 每次轉換最多保存的幀數
pub const MAX_FRAMES: usize = 30;

pub const DEFAULT_INTERVAL: f64 = 0.1;
pub const MIN_INTERVAL: f64 = 0.05;
pub const MAX_INTERVAL: f64 = 1.0;

/// 取樣參數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// 取樣間隔（秒）
    pub interval: f64,
    /// 保存幀數上限
    pub max_frames: usize,
}

impl SamplingParams {
    #[must_use]
    pub const fn new(interval: f64) -> Self {
        Self {
            interval,
            max_frames: MAX_FRAMES,
        }
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.interval.is_finite() && self.interval > 0.0 {
            Ok(())
        } else {
            Err(ConvertError::InvalidInterval(self.interval))
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

/// 計算取樣步長：`max(1, round(fps * interval))`，剛好 .5 時取偶數
#[must_use]
pub fn frame_stride(frame_rate: f64, interval: f64) -> u64 {
    let stride = (frame_rate * interval).round_ties_even();
    if stride.is_finite() && stride >= 1.0 {
        stride as u64
    } else {
        1
    }
}

/// 被取樣的一幀
#[derive(Debug)]
pub struct SampledFrame {
    /// 此幀在來源中的索引（從 0 開始）
    pub source_index: u64,
    pub image: RgbImage,
}

/// 依固定步長從來源取樣
///
/// 會持有來源直到取樣結束，來源隨 sampler 一起 drop。
/// 達到 `max_frames` 或來源結束後不再讀取。
pub struct FrameSampler<S: FrameSource> {
    source: S,
    stride: u64,
    max_frames: usize,
    frames_read: u64,
    emitted: usize,
    done: bool,
}

impl<S: FrameSource> FrameSampler<S> {
    pub fn new(source: S, params: &SamplingParams) -> Result<Self, ConvertError> {
        params.validate()?;

        let stride = frame_stride(source.frame_rate(), params.interval);
        debug!(
            "取樣設定: fps={:.3}, interval={}s, stride={stride}, max_frames={}",
            source.frame_rate(),
            params.interval,
            params.max_frames
        );

        Ok(Self {
            source,
            stride,
            max_frames: params.max_frames,
            frames_read: 0,
            emitted: 0,
            done: false,
        })
    }

    #[must_use]
    pub const fn stride(&self) -> u64 {
        self.stride
    }

    #[must_use]
    pub fn total_frames(&self) -> u64 {
        self.source.total_frames()
    }

    /// 目前已從來源讀取的幀數（含被跳過的幀）
    #[must_use]
    pub const fn frames_read(&self) -> u64 {
        self.frames_read
    }

    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }
}

impl<S: FrameSource> Iterator for FrameSampler<S> {
    type Item = Result<SampledFrame, ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.emitted >= self.max_frames {
                self.done = true;
                break;
            }

            let index = self.frames_read;
            let sampled = index % self.stride == 0;

            // 不取樣的幀只前進，不建立影像
            let read = if sampled {
                self.source.next_frame().map(|frame| frame.map(Some))
            } else {
                self.source.skip_frame().map(|more| more.then_some(None))
            };

            match read {
                Ok(Some(image)) => {
                    self.frames_read += 1;
                    if let Some(image) = image {
                        self.emitted += 1;
                        return Some(Ok(SampledFrame {
                            source_index: index,
                            image,
                        }));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    break;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ConvertError::frame_decode(index, format!("{e:#}"))));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSource {
        frame_rate: f64,
        remaining: u64,
        reads: Rc<Cell<u64>>,
        /// 實際建立影像的次數
        decoded: Rc<Cell<u64>>,
        fail_at: Option<u64>,
    }

    impl CountingSource {
        fn new(frame_rate: f64, frames: u64) -> (Self, Rc<Cell<u64>>) {
            let reads = Rc::new(Cell::new(0));
            let source = Self {
                frame_rate,
                remaining: frames,
                reads: Rc::clone(&reads),
                decoded: Rc::new(Cell::new(0)),
                fail_at: None,
            };
            (source, reads)
        }

        fn advance(&mut self) -> anyhow::Result<bool> {
            if self.fail_at == Some(self.reads.get()) {
                anyhow::bail!("corrupt packet");
            }
            if self.remaining == 0 {
                return Ok(false);
            }
            self.remaining -= 1;
            self.reads.set(self.reads.get() + 1);
            Ok(true)
        }
    }

    impl FrameSource for CountingSource {
        fn frame_rate(&self) -> f64 {
            self.frame_rate
        }

        fn total_frames(&self) -> u64 {
            self.remaining + self.reads.get()
        }

        fn next_frame(&mut self) -> anyhow::Result<Option<RgbImage>> {
            if !self.advance()? {
                return Ok(None);
            }
            self.decoded.set(self.decoded.get() + 1);
            Ok(Some(RgbImage::new(4, 4)))
        }

        fn skip_frame(&mut self) -> anyhow::Result<bool> {
            self.advance()
        }
    }

    /// 只實作 `next_frame` 的來源，跳幀走預設實作
    struct PlainSource {
        remaining: u64,
    }

    impl FrameSource for PlainSource {
        fn frame_rate(&self) -> f64 {
            30.0
        }

        fn total_frames(&self) -> u64 {
            0
        }

        fn next_frame(&mut self) -> anyhow::Result<Option<RgbImage>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbImage::new(2, 2)))
        }
    }

    #[test]
    fn test_frame_stride() {
        assert_eq!(frame_stride(30.0, 0.1), 3);
        assert_eq!(frame_stride(30.0, 1.0), 30);
        assert_eq!(frame_stride(24.0, 0.05), 1);
        assert_eq!(frame_stride(29.97, 0.1), 3);
        // 不足 0.5 時仍至少為 1
        assert_eq!(frame_stride(5.0, 0.05), 1);
        assert_eq!(frame_stride(0.0, 0.1), 1);
    }

    #[test]
    fn test_frame_stride_ties_to_even() {
        assert_eq!(frame_stride(25.0, 0.5), 12);
        assert_eq!(frame_stride(30.0, 0.05), 2);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        for interval in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            let (source, _) = CountingSource::new(30.0, 10);
            let result = FrameSampler::new(source, &SamplingParams::new(interval));
            assert!(matches!(result, Err(ConvertError::InvalidInterval(_))));
        }
    }

    #[test]
    fn test_samples_every_stride() {
        let (source, _) = CountingSource::new(30.0, 10);
        let sampler = FrameSampler::new(source, &SamplingParams::new(0.1)).unwrap();
        let indices: Vec<u64> = sampler.map(|f| f.unwrap().source_index).collect();
        assert_eq!(indices, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_stops_at_cap_without_reading_further() {
        let (source, reads) = CountingSource::new(30.0, 300);
        let sampler = FrameSampler::new(source, &SamplingParams::new(0.1)).unwrap();
        let frames: Vec<_> = sampler.collect::<Result<_, _>>().unwrap();

        assert_eq!(frames.len(), MAX_FRAMES);
        assert_eq!(frames.last().unwrap().source_index, 87);
        // 第 30 幀（索引 87）之後立即停止
        assert_eq!(reads.get(), 88);
    }

    #[test]
    fn test_only_sampled_frames_are_decoded() {
        let (source, reads) = CountingSource::new(30.0, 300);
        let decoded = Rc::clone(&source.decoded);
        let sampler = FrameSampler::new(source, &SamplingParams::new(0.1)).unwrap();
        let frames: Vec<_> = sampler.collect::<Result<_, _>>().unwrap();

        assert_eq!(frames.len(), MAX_FRAMES);
        assert_eq!(reads.get(), 88);
        assert_eq!(decoded.get(), MAX_FRAMES as u64);
    }

    #[test]
    fn test_default_skip_frame_uses_next_frame() {
        let source = PlainSource { remaining: 7 };
        let sampler = FrameSampler::new(source, &SamplingParams::new(0.1)).unwrap();
        let indices: Vec<u64> = sampler.map(|f| f.unwrap().source_index).collect();
        assert_eq!(indices, vec![0, 3, 6]);
    }

    #[test]
    fn test_stride_larger_than_source_keeps_first_frame() {
        let (source, _) = CountingSource::new(30.0, 20);
        let sampler = FrameSampler::new(source, &SamplingParams::new(1.0)).unwrap();
        let frames: Vec<_> = sampler.collect::<Result<_, _>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].source_index, 0);
    }

    #[test]
    fn test_zero_cap_reads_nothing() {
        let (source, reads) = CountingSource::new(30.0, 20);
        let params = SamplingParams {
            interval: 0.1,
            max_frames: 0,
        };
        let mut sampler = FrameSampler::new(source, &params).unwrap();
        assert!(sampler.next().is_none());
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_saved_count_bound() {
        for (frames, interval) in [(7u64, 0.1), (100, 0.2), (1, 0.5), (61, 1.0)] {
            let (source, _) = CountingSource::new(30.0, frames);
            let stride = frame_stride(30.0, interval);
            let sampler = FrameSampler::new(source, &SamplingParams::new(interval)).unwrap();
            let saved = sampler.count() as u64;
            let bound = (MAX_FRAMES as u64).min(frames / stride + 1);
            assert!(saved <= bound, "frames={frames}, interval={interval}");
        }
    }

    #[test]
    fn test_decode_error_ends_iteration() {
        let (mut source, _) = CountingSource::new(30.0, 10);
        source.fail_at = Some(4);
        let mut sampler = FrameSampler::new(source, &SamplingParams::new(0.1)).unwrap();

        assert_eq!(sampler.next().unwrap().unwrap().source_index, 0);
        assert_eq!(sampler.next().unwrap().unwrap().source_index, 3);
        match sampler.next() {
            Some(Err(ConvertError::FrameDecode { index, reason })) => {
                assert_eq!(index, 4);
                assert!(reason.contains("corrupt packet"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(sampler.next().is_none());
    }
}
