//! Ready-made demo screens.
//!
//! Installs the classic text-mode layout through normal CPU bus writes:
//! video matrix at 0x0000, colour cells at 0x1000, background cells at
//! 0x2000, character generator at 0x3000 and the display list at 0x3800.
//! Useful for frontends that want pixels on screen before any program
//! runs, and as an end-to-end fixture.

use crate::x65::X65;
use x65_core::device::cgia::{FRAME_CHARS, REG_BACK_COLOR, REG_PLANES, font};

pub const TEXT_MODE_VIDEO_OFFSET: u16 = 0x0000;
pub const TEXT_MODE_COLOR_OFFSET: u16 = 0x1000;
pub const TEXT_MODE_BKGND_OFFSET: u16 = 0x2000;
pub const TEXT_MODE_CHRGN_OFFSET: u16 = 0x3000;
pub const TEXT_MODE_DL_OFFSET: u16 = 0x3800;

pub const TEXT_MODE_ROWS: usize = 25;

/// 20 blank lines, scan pointer load, 25 text rows, wait for VBL.
#[rustfmt::skip]
pub static TEXT_MODE_DL: [u8; 40] = [
    0x70, 0x70, 0x30,                                     // 2x 8 + 1x 4 of empty background lines
    0xF3, 0x00, 0x00, 0x00, 0x10, 0x00, 0x20, 0x00, 0x30, // LMS + LFS + LBS + LCG
    0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A,
    0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A,
    0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A, 0x0A,
    0x0A,                                                 // 25x MODE2
    0x82, 0x00, 0x38,                                     // JMP to begin of DL and wait for VBL
];

/// Upload the text-mode demo screen and start the CGIA on plane 0.
/// `message` lands in the top row; the rest of the matrix is spaces.
pub fn install_text_demo(x65: &mut X65, message: &str) {
    // Character generator: the built-in 8x8 font.
    for at in 0..(256 * 8) as u16 {
        x65.cpu_write((TEXT_MODE_CHRGN_OFFSET + at) as u32, font::font8(at));
    }

    // Video matrix: spaces, message in the top row.
    for cell in 0..(FRAME_CHARS * TEXT_MODE_ROWS) as u16 {
        x65.cpu_write((TEXT_MODE_VIDEO_OFFSET + cell) as u32, b' ');
    }
    for (i, &ch) in message.as_bytes().iter().take(FRAME_CHARS).enumerate() {
        x65.cpu_write((TEXT_MODE_VIDEO_OFFSET + i as u16) as u32, ch);
    }

    // Colour and background cells: white on dark blue.
    for cell in 0..(FRAME_CHARS * TEXT_MODE_ROWS) as u16 {
        x65.cpu_write((TEXT_MODE_COLOR_OFFSET + cell) as u32, 0x0F);
        x65.cpu_write((TEXT_MODE_BKGND_OFFSET + cell) as u32, 0x52);
    }

    for (i, &b) in TEXT_MODE_DL.iter().enumerate() {
        x65.cpu_write((TEXT_MODE_DL_OFFSET + i as u16) as u32, b);
    }

    x65.vpu_reg_write(REG_BACK_COLOR, 0x52);
    x65.vpu_reg_write(0x52, 7); // plane 0 row height: 8-line character rows
    x65.vpu_reg_write(0x48, TEXT_MODE_DL_OFFSET as u8);
    x65.vpu_reg_write(0x49, (TEXT_MODE_DL_OFFSET >> 8) as u8);
    x65.vpu_reg_write(REG_PLANES, 0x01);
    x65.vpu_run();
}
