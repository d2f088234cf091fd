use super::error::ConvertError;
use image::imageops::{self, BiLevel, FilterType};
use image::{GrayImage, RgbImage};

/// OLED 螢幕寬度（像素）
pub const DISPLAY_WIDTH: u32 = 128;
/// OLED 螢幕高度（像素）
pub const DISPLAY_HEIGHT: u32 = 64;

/// 將彩色影格轉成 128x64 的黑白點陣
///
/// 1. Lanczos3 縮放到 128x64（不保持比例，直接拉伸）
/// 2. 轉灰階後以 Floyd-Steinberg 誤差擴散抖動成黑白
///
/// 輸出的每個像素只會是 0（黑）或 255（白）。
pub fn rasterize(frame: &RgbImage, index: u64) -> Result<GrayImage, ConvertError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ConvertError::frame_decode(
            index,
            format!("影格尺寸無效: {}x{}", frame.width(), frame.height()),
        ));
    }

    let resized = imageops::resize(frame, DISPLAY_WIDTH, DISPLAY_HEIGHT, FilterType::Lanczos3);
    let mut mono = imageops::grayscale(&resized);
    imageops::dither(&mut mono, &BiLevel);

    Ok(mono)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_output_is_always_display_size() {
        for (w, h) in [(1920, 1080), (64, 64), (7, 300), (1, 1)] {
            let frame = RgbImage::from_pixel(w, h, Rgb([120, 30, 200]));
            let mono = rasterize(&frame, 0).unwrap();
            assert_eq!(mono.dimensions(), (DISPLAY_WIDTH, DISPLAY_HEIGHT));
        }
    }

    #[test]
    fn test_output_is_two_level() {
        let frame = RgbImage::from_fn(320, 240, |x, y| {
            let v = ((x + y) % 256) as u8;
            Rgb([v, v, v])
        });
        let mono = rasterize(&frame, 0).unwrap();
        assert!(mono.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_solid_black_and_white() {
        let black = rasterize(&RgbImage::from_pixel(640, 360, Rgb([0, 0, 0])), 0).unwrap();
        assert!(black.pixels().all(|p| p.0[0] == 0));

        let white = rasterize(&RgbImage::from_pixel(640, 360, Rgb([255, 255, 255])), 0).unwrap();
        assert!(white.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_left_right_split_is_preserved() {
        // 左半黑、右半白；抖動誤差可能擴散少量像素，以比例判斷
        let frame = RgbImage::from_fn(256, 128, |x, _| {
            if x < 128 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let mono = rasterize(&frame, 0).unwrap();

        let count = |columns: std::ops::Range<u32>, value: u8| {
            columns
                .flat_map(|x| (0..DISPLAY_HEIGHT).map(move |y| (x, y)))
                .filter(|&(x, y)| mono.get_pixel(x, y).0[0] == value)
                .count()
        };
        let quarter = (DISPLAY_WIDTH / 4 * DISPLAY_HEIGHT) as usize;
        assert!(count(0..32, 0) * 100 >= quarter * 95);
        assert!(count(96..128, 255) * 100 >= quarter * 95);
    }

    #[test]
    fn test_empty_frame_is_decode_error() {
        let result = rasterize(&RgbImage::new(0, 0), 7);
        assert!(matches!(
            result,
            Err(ConvertError::FrameDecode { index: 7, .. })
        ));
    }
}
