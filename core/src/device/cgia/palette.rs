//! CGIA color palette: 256 entries of packed 0x00RRGGBB.
//!
//! Index layout is hue in the high nibble, luminance in the low nibble.
//! Hue 0 is the grayscale ramp; hues 1..15 walk the color wheel. Chroma
//! amplitude tapers toward black and white so the extremes stay neutral.

/// Palette index used for diagnostic fills (bad opcode, runaway display
/// list). Hue 14, luma 10: bright magenta.
pub const UNHANDLED_DL_COLOR: u8 = 234;

pub fn build_palette() -> [u32; 256] {
    let mut pal = [0u32; 256];
    for (i, entry) in pal.iter_mut().enumerate() {
        let hue = (i >> 4) as u32;
        let luma = (i & 0x0F) as u32;

        let y = (luma * 255 + 7) / 15;
        let (r, g, b) = if hue == 0 {
            (y, y, y)
        } else {
            // Chroma peaks at mid luminance, tapers to 0 at both ends.
            let c = {
                let d = if luma >= 8 { 15 - luma } else { luma };
                (d * 112 + 3) / 7
            };
            let angle = (hue - 1) as f64 * (std::f64::consts::TAU / 15.0);
            let u = (angle.cos() * c as f64) as i32;
            let v = (angle.sin() * c as f64) as i32;
            let r = (y as i32 + v).clamp(0, 255) as u32;
            let g = (y as i32 - (u / 3) - (v / 2)).clamp(0, 255) as u32;
            let b = (y as i32 + u).clamp(0, 255) as u32;
            (r, g, b)
        };
        *entry = (r << 16) | (g << 8) | b;
    }
    pal
}
