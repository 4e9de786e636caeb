//! Display-list opcode decoding.
//!
//! The display list is a byte stream of one-byte opcodes, some with inline
//! operands. Bit 3 clear means instruction, bit 3 set means mode row;
//! bit 7 requests a display-list interrupt after the opcode completes.
//! Operands are fetched by the interpreter, which owns the stream cursor.

pub const DL_MODE_BIT: u8 = 0b0000_1000;
pub const DL_DLI_BIT: u8 = 0b1000_0000;

/// At most this many instructions may run between two mode rows of the
/// same plane on a single scanline; a longer run is a runaway list.
pub const MAX_DL_INSTR_PER_LINE: u8 = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DlInstr {
    /// Fill `n` raster lines with the background color.
    BlankLines(u8),
    /// Repeat the previous raster buffer `n` more lines.
    DuplicateLines(u8),
    /// Reload the DL pointer from the inline u16; with the DLI bit this
    /// also stops the plane until vertical blank.
    Jmp { wait_vbl: bool },
    /// Reload scan pointers flagged in bits 4..7:
    /// memory (0x10), colour (0x20), background (0x40), chargen (0x80).
    LoadMem { mask: u8 },
    /// Store the inline u8 into plane register `idx`.
    SetReg8 { idx: u8 },
    /// Store the inline u16 into plane registers `idx`, `idx + 1`.
    SetReg16 { idx: u8 },
    /// Generate one mode row.
    ModeRow(ModeRow),
    /// Anything unassigned: diagnostic fill and forced row advance.
    Unknown(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeRow {
    Text,             // MODE2 - text/tile
    Bitmap,           // MODE3 - hi-res bitmap
    MulticolorText,   // MODE4
    MulticolorBitmap, // MODE5
    Ham,              // MODE6 - Hold-And-Modify
    Affine,           // MODE7 - affine-textured chunky
}

impl DlInstr {
    /// Decode one opcode byte. Returns the instruction and whether the
    /// DLI bit was set.
    pub fn decode(op: u8) -> (DlInstr, bool) {
        let dli = op & DL_DLI_BIT != 0;
        let instr = if op & DL_MODE_BIT == 0 {
            match op & 0b0111 {
                0x0 => DlInstr::BlankLines(op >> 4),
                0x1 => DlInstr::DuplicateLines(op >> 4),
                0x2 => DlInstr::Jmp { wait_vbl: dli },
                0x3 => DlInstr::LoadMem { mask: op & 0xF0 },
                0x4 => DlInstr::SetReg8 { idx: (op & 0xF0) >> 4 },
                0x5 => DlInstr::SetReg16 { idx: (op & 0x70) >> 3 },
                _ => DlInstr::Unknown(op),
            }
        } else {
            match op & 0b0111 {
                0x2 => DlInstr::ModeRow(ModeRow::Text),
                0x3 => DlInstr::ModeRow(ModeRow::Bitmap),
                0x4 => DlInstr::ModeRow(ModeRow::MulticolorText),
                0x5 => DlInstr::ModeRow(ModeRow::MulticolorBitmap),
                0x6 => DlInstr::ModeRow(ModeRow::Ham),
                0x7 => DlInstr::ModeRow(ModeRow::Affine),
                _ => DlInstr::Unknown(op),
            }
        };
        (instr, dli)
    }
}
