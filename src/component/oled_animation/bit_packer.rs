use super::rasterizer::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use image::{GrayImage, Luma};

/// 每列的位元組數（8 像素一個位元組）
pub const BYTES_PER_ROW: usize = DISPLAY_WIDTH as usize / 8;
/// 每幀固定 1024 位元組
pub const FRAME_BYTES: usize = BYTES_PER_ROW * DISPLAY_HEIGHT as usize;

/// 打包後的一幀
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    name: String,
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// 第 `index` 幀的陣列名稱，例如 `frame_007`
    #[must_use]
    pub fn symbol_name(index: usize) -> String {
        format!("frame_{index:03}")
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// 將黑白點陣打包成 1024 位元組
///
/// 由上而下逐列、每列由左而右每 8 像素一組，最左邊的像素放在最高位元。
/// 像素值為 0（黑）時該位元為 1。超出點陣範圍的像素視為 0。
#[must_use]
pub fn pack_bitmap(bitmap: &GrayImage, index: usize) -> PackedFrame {
    let (width, height) = bitmap.dimensions();
    let mut bytes = Vec::with_capacity(FRAME_BYTES);

    for y in 0..DISPLAY_HEIGHT {
        for x in (0..DISPLAY_WIDTH).step_by(8) {
            let mut byte = 0u8;
            for bit in 0..8 {
                let px = x + bit;
                if px < width && y < height && bitmap.get_pixel(px, y).0[0] == 0 {
                    byte |= 1 << (7 - bit);
                }
            }
            bytes.push(byte);
        }
    }

    PackedFrame {
        name: PackedFrame::symbol_name(index),
        bytes,
    }
}

/// 以相同的位元順序還原成 128x64 點陣（設定的位元還原為 0，其餘為 255）
#[must_use]
pub fn unpack_bitmap(bytes: &[u8]) -> GrayImage {
    GrayImage::from_fn(DISPLAY_WIDTH, DISPLAY_HEIGHT, |x, y| {
        let offset = y as usize * BYTES_PER_ROW + x as usize / 8;
        let set = bytes
            .get(offset)
            .is_some_and(|byte| byte & (1 << (7 - x % 8)) != 0);
        if set { Luma([0]) } else { Luma([255]) }
    })
}
