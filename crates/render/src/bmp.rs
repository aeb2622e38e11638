//! 1-bit BMP emission. The byte layout is normative: BITMAPFILEHEADER,
//! BITMAPINFOHEADER with a positive height (bottom-up rows; target
//! firmware decodes nothing else), a two-entry palette and 4-byte padded
//! rows. No compression.

use crate::frame::Frame;

const FILE_HEADER_BYTES: u32 = 14;
const INFO_HEADER_BYTES: u32 = 40;
const PALETTE_BYTES: u32 = 8;

/// Row stride padded to a 4-byte boundary.
pub fn stride(width: u32) -> u32 {
    ((width + 31) / 32) * 4
}

/// Total file size for a 1-bit image of the given geometry.
pub fn file_size(width: u32, height: u32) -> u32 {
    FILE_HEADER_BYTES + INFO_HEADER_BYTES + PALETTE_BYTES + stride(width) * height
}

pub fn encode(frame: &Frame) -> Vec<u8> {
    let width = frame.width();
    let height = frame.height();
    let stride = stride(width) as usize;
    let pixel_offset = FILE_HEADER_BYTES + INFO_HEADER_BYTES + PALETTE_BYTES;
    let total = file_size(width, height);

    let mut out = Vec::with_capacity(total as usize);

    // BITMAPFILEHEADER
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // reserved
    out.extend_from_slice(&pixel_offset.to_le_bytes());

    // BITMAPINFOHEADER, positive height = bottom-up
    out.extend_from_slice(&INFO_HEADER_BYTES.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&1u16.to_le_bytes()); // bits per pixel
    out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
    out.extend_from_slice(&0u32.to_le_bytes()); // image size (allowed 0 for BI_RGB)
    out.extend_from_slice(&2835u32.to_le_bytes()); // 72 dpi
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&2u32.to_le_bytes()); // palette entries
    out.extend_from_slice(&0u32.to_le_bytes()); // important colours

    // palette: index 0 white, index 1 black (BGRA)
    out.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0x00]);
    out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

    // pixel rows, bottom-up
    let rows = frame.to_one_bit_rows();
    for row in rows.iter().rev() {
        out.extend_from_slice(row);
        out.resize(out.len() + (stride - row.len()), 0);
    }

    debug_assert_eq!(out.len() as u32, total);
    out
}
