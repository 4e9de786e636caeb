//! Built-in 8×8 character generator.
//!
//! Serves the GET_CHARGEN device command: one byte per call, addressed as
//! `character * 8 + row`. The printable ASCII range is populated; the rest
//! of the 256-character page reads as blank until a code page is loaded.

pub const FONT8_SIZE: usize = 256 * 8;

/// Fetch one row byte of the character generator.
pub fn font8(at: u16) -> u8 {
    let at = at as usize & (FONT8_SIZE - 1);
    let ch = at >> 3;
    let row = at & 7;
    if (0x20..0x80).contains(&ch) {
        GLYPHS[ch - 0x20][row]
    } else {
        0
    }
}

/// Copy one character's 8 rows (used to seed test display lists).
pub fn glyph(ch: u8) -> [u8; 8] {
    let mut rows = [0u8; 8];
    for (row, out) in rows.iter_mut().enumerate() {
        *out = font8(((ch as u16) << 3) + row as u16);
    }
    rows
}

#[rustfmt::skip]
static GLYPHS: [[u8; 8]; 96] = [
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00], // space
    [0x18,0x18,0x18,0x18,0x18,0x00,0x18,0x00], // !
    [0x66,0x66,0x24,0x00,0x00,0x00,0x00,0x00], // "
    [0x6C,0x6C,0xFE,0x6C,0xFE,0x6C,0x6C,0x00], // #
    [0x18,0x3E,0x60,0x3C,0x06,0x7C,0x18,0x00], // $
    [0x62,0x66,0x0C,0x18,0x30,0x66,0x46,0x00], // %
    [0x3C,0x66,0x3C,0x38,0x67,0x66,0x3F,0x00], // &
    [0x18,0x18,0x30,0x00,0x00,0x00,0x00,0x00], // '
    [0x0C,0x18,0x30,0x30,0x30,0x18,0x0C,0x00], // (
    [0x30,0x18,0x0C,0x0C,0x0C,0x18,0x30,0x00], // )
    [0x00,0x66,0x3C,0xFF,0x3C,0x66,0x00,0x00], // *
    [0x00,0x18,0x18,0x7E,0x18,0x18,0x00,0x00], // +
    [0x00,0x00,0x00,0x00,0x00,0x18,0x18,0x30], // ,
    [0x00,0x00,0x00,0x7E,0x00,0x00,0x00,0x00], // -
    [0x00,0x00,0x00,0x00,0x00,0x18,0x18,0x00], // .
    [0x00,0x03,0x06,0x0C,0x18,0x30,0x60,0x00], // /
    [0x3C,0x66,0x6E,0x76,0x66,0x66,0x3C,0x00], // 0
    [0x18,0x38,0x18,0x18,0x18,0x18,0x7E,0x00], // 1
    [0x3C,0x66,0x06,0x0C,0x30,0x60,0x7E,0x00], // 2
    [0x3C,0x66,0x06,0x1C,0x06,0x66,0x3C,0x00], // 3
    [0x06,0x0E,0x1E,0x66,0x7F,0x06,0x06,0x00], // 4
    [0x7E,0x60,0x7C,0x06,0x06,0x66,0x3C,0x00], // 5
    [0x3C,0x66,0x60,0x7C,0x66,0x66,0x3C,0x00], // 6
    [0x7E,0x66,0x0C,0x18,0x18,0x18,0x18,0x00], // 7
    [0x3C,0x66,0x66,0x3C,0x66,0x66,0x3C,0x00], // 8
    [0x3C,0x66,0x66,0x3E,0x06,0x66,0x3C,0x00], // 9
    [0x00,0x00,0x18,0x18,0x00,0x18,0x18,0x00], // :
    [0x00,0x00,0x18,0x18,0x00,0x18,0x18,0x30], // ;
    [0x0E,0x18,0x30,0x60,0x30,0x18,0x0E,0x00], // <
    [0x00,0x00,0x7E,0x00,0x7E,0x00,0x00,0x00], // =
    [0x70,0x18,0x0C,0x06,0x0C,0x18,0x70,0x00], // >
    [0x3C,0x66,0x06,0x0C,0x18,0x00,0x18,0x00], // ?
    [0x3C,0x66,0x6E,0x6E,0x60,0x62,0x3C,0x00], // @
    [0x18,0x3C,0x66,0x7E,0x66,0x66,0x66,0x00], // A
    [0x7C,0x66,0x66,0x7C,0x66,0x66,0x7C,0x00], // B
    [0x3C,0x66,0x60,0x60,0x60,0x66,0x3C,0x00], // C
    [0x78,0x6C,0x66,0x66,0x66,0x6C,0x78,0x00], // D
    [0x7E,0x60,0x60,0x78,0x60,0x60,0x7E,0x00], // E
    [0x7E,0x60,0x60,0x78,0x60,0x60,0x60,0x00], // F
    [0x3C,0x66,0x60,0x6E,0x66,0x66,0x3C,0x00], // G
    [0x66,0x66,0x66,0x7E,0x66,0x66,0x66,0x00], // H
    [0x3C,0x18,0x18,0x18,0x18,0x18,0x3C,0x00], // I
    [0x1E,0x0C,0x0C,0x0C,0x0C,0x6C,0x38,0x00], // J
    [0x66,0x6C,0x78,0x70,0x78,0x6C,0x66,0x00], // K
    [0x60,0x60,0x60,0x60,0x60,0x60,0x7E,0x00], // L
    [0x63,0x77,0x7F,0x6B,0x63,0x63,0x63,0x00], // M
    [0x66,0x76,0x7E,0x7E,0x6E,0x66,0x66,0x00], // N
    [0x3C,0x66,0x66,0x66,0x66,0x66,0x3C,0x00], // O
    [0x7C,0x66,0x66,0x7C,0x60,0x60,0x60,0x00], // P
    [0x3C,0x66,0x66,0x66,0x66,0x3C,0x0E,0x00], // Q
    [0x7C,0x66,0x66,0x7C,0x78,0x6C,0x66,0x00], // R
    [0x3C,0x66,0x60,0x3C,0x06,0x66,0x3C,0x00], // S
    [0x7E,0x18,0x18,0x18,0x18,0x18,0x18,0x00], // T
    [0x66,0x66,0x66,0x66,0x66,0x66,0x3C,0x00], // U
    [0x66,0x66,0x66,0x66,0x66,0x3C,0x18,0x00], // V
    [0x63,0x63,0x63,0x6B,0x7F,0x77,0x63,0x00], // W
    [0x66,0x66,0x3C,0x18,0x3C,0x66,0x66,0x00], // X
    [0x66,0x66,0x66,0x3C,0x18,0x18,0x18,0x00], // Y
    [0x7E,0x06,0x0C,0x18,0x30,0x60,0x7E,0x00], // Z
    [0x3C,0x30,0x30,0x30,0x30,0x30,0x3C,0x00], // [
    [0x00,0x60,0x30,0x18,0x0C,0x06,0x03,0x00], // backslash
    [0x3C,0x0C,0x0C,0x0C,0x0C,0x0C,0x3C,0x00], // ]
    [0x08,0x1C,0x36,0x63,0x00,0x00,0x00,0x00], // ^
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00,0xFF], // _
    [0x30,0x18,0x0C,0x00,0x00,0x00,0x00,0x00], // `
    [0x00,0x00,0x3C,0x06,0x3E,0x66,0x3E,0x00], // a
    [0x60,0x60,0x7C,0x66,0x66,0x66,0x7C,0x00], // b
    [0x00,0x00,0x3C,0x60,0x60,0x60,0x3C,0x00], // c
    [0x06,0x06,0x3E,0x66,0x66,0x66,0x3E,0x00], // d
    [0x00,0x00,0x3C,0x66,0x7E,0x60,0x3C,0x00], // e
    [0x0E,0x18,0x3E,0x18,0x18,0x18,0x18,0x00], // f
    [0x00,0x00,0x3E,0x66,0x66,0x3E,0x06,0x7C], // g
    [0x60,0x60,0x7C,0x66,0x66,0x66,0x66,0x00], // h
    [0x18,0x00,0x38,0x18,0x18,0x18,0x3C,0x00], // i
    [0x06,0x00,0x06,0x06,0x06,0x06,0x66,0x3C], // j
    [0x60,0x60,0x66,0x6C,0x78,0x6C,0x66,0x00], // k
    [0x38,0x18,0x18,0x18,0x18,0x18,0x3C,0x00], // l
    [0x00,0x00,0x66,0x7F,0x7F,0x6B,0x63,0x00], // m
    [0x00,0x00,0x7C,0x66,0x66,0x66,0x66,0x00], // n
    [0x00,0x00,0x3C,0x66,0x66,0x66,0x3C,0x00], // o
    [0x00,0x00,0x7C,0x66,0x66,0x7C,0x60,0x60], // p
    [0x00,0x00,0x3E,0x66,0x66,0x3E,0x06,0x06], // q
    [0x00,0x00,0x7C,0x66,0x60,0x60,0x60,0x00], // r
    [0x00,0x00,0x3E,0x60,0x3C,0x06,0x7C,0x00], // s
    [0x18,0x18,0x7E,0x18,0x18,0x18,0x0E,0x00], // t
    [0x00,0x00,0x66,0x66,0x66,0x66,0x3E,0x00], // u
    [0x00,0x00,0x66,0x66,0x66,0x3C,0x18,0x00], // v
    [0x00,0x00,0x63,0x6B,0x7F,0x3E,0x36,0x00], // w
    [0x00,0x00,0x66,0x3C,0x18,0x3C,0x66,0x00], // x
    [0x00,0x00,0x66,0x66,0x66,0x3E,0x0C,0x78], // y
    [0x00,0x00,0x7E,0x0C,0x18,0x30,0x7E,0x00], // z
    [0x1C,0x30,0x30,0x60,0x30,0x30,0x1C,0x00], // {
    [0x18,0x18,0x18,0x18,0x18,0x18,0x18,0x18], // |
    [0x38,0x0C,0x0C,0x06,0x0C,0x0C,0x38,0x00], // }
    [0x33,0x7E,0xCC,0x00,0x00,0x00,0x00,0x00], // ~
    [0x00,0x00,0x00,0x00,0x00,0x00,0x00,0x00], // DEL
];
