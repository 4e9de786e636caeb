//! CGIA — Color Graphics Interface Adaptor.
//!
//! A scanline-based video processor: a programmable display-list
//! interpreter walks per-scanline state machines over four parallel
//! planes, renders text, tile, bitmap, multicolor, Hold-And-Modify and
//! affine-textured rows, composites up to 8 hardware sprites per
//! sprite-plane, and emits one 32-bit RGB pixel row per horizontal sync.
//!
//! # Display list
//!
//! One-byte opcodes, bit 3 clear for instructions, set for mode rows;
//! bit 7 requests a display-list interrupt:
//!
//! | Opcode | Meaning                                             |
//! |--------|-----------------------------------------------------|
//! | 0      | blank lines, count in the high nibble               |
//! | 1      | duplicate lines (repeat previous raster buffer)     |
//! | 2      | JMP u16; with the DLI bit also waits for VBL        |
//! | 3      | load memory scans flagged in bits 4..7 (u16 each)   |
//! | 4      | set 8-bit plane register, index in the high nibble  |
//! | 5      | set 16-bit plane register pair                      |
//! | 8+2..7 | mode row: text, bitmap, mc text, mc bitmap, HAM, affine |
//!
//! # Interrupts
//!
//! VBI at the start of line 0, RSI when the raster counter reaches
//! `INT_RASTER`, DLI after any opcode carrying bit 7. `INT_STATUS` reads
//! masked; writing any value acknowledges (clears status and re-arms the
//! mask). The NMI line follows the masked status.

pub mod dl;
pub mod font;
pub mod interp;
pub mod modes;
pub mod palette;
pub mod regs;
pub mod sprite;
pub mod vram;

pub use modes::{
    CGIA_COLUMN_PX, DISPLAY_HEIGHT_LINES, DISPLAY_WIDTH_PX, FRAME_CHARS, MAX_BORDER_COLUMNS,
};
pub use palette::UNHANDLED_DL_COLOR;
pub use regs::*;

use dl::{DlInstr, MAX_DL_INSTR_PER_LINE, ModeRow};
use interp::Lane;
use modes::{LineBuffer, ModeCtx};
use sprite::{
    CGIA_SPRITES, SPRITE_MASK_MIRROR_X, SPRITE_MASK_MIRROR_Y, SPRITE_MAX_WIDTH, SpriteDescriptor,
};
use vram::{VRAM_BCKGND_SLOT, VRAM_SPRITE_SLOT, VramCache};

/// Per-plane interpreter state, reset at power-up and at the start of each
/// frame.
#[derive(Clone, Copy, Default)]
struct PlaneState {
    memory_scan: u16,
    colour_scan: u16,
    backgr_scan: u16,
    char_gen_offset: u16,
    row_line_count: u8,
    // Mode-7 texture coordinate lanes, stepped once per line.
    lanes: [Lane; 2],
    wait_vbl: bool,
    sprites_need_update: bool,
}

pub struct Cgia {
    regs: [u8; CGIA_REGS_NO],
    plane_state: [PlaneState; CGIA_PLANES],
    sprite_dscs: [[u16; CGIA_SPRITES]; CGIA_PLANES],

    // Re-arm gates for the interrupt sources: a source acked through
    // INT_STATUS stays quiet until its condition occurs again.
    int_mask: u8,

    pub vram: VramCache,
    line: LineBuffer,
    palette: [u32; 256],
}

impl Cgia {
    pub fn new() -> Self {
        let mut cgia = Self {
            regs: [0; CGIA_REGS_NO],
            plane_state: [PlaneState::default(); CGIA_PLANES],
            sprite_dscs: [[0; CGIA_SPRITES]; CGIA_PLANES],
            int_mask: 0,
            vram: VramCache::new(),
            line: LineBuffer::new(),
            palette: palette::build_palette(),
        };
        cgia.reset();
        cgia
    }

    pub fn reset(&mut self) {
        self.regs = [0; CGIA_REGS_NO];
        self.sprite_dscs = [[0; CGIA_SPRITES]; CGIA_PLANES];
        self.int_mask = 0;
        self.line.clear();
        for state in &mut self.plane_state {
            *state = PlaneState::default();
            // All planes initially wait for VBL and reload descriptors.
            state.wait_vbl = true;
            state.sprites_need_update = true;
        }
    }

    // ---- register file ----------------------------------------------

    fn int_status_masked(&self) -> u8 {
        self.regs[REG_INT_STATUS as usize] & self.regs[REG_INT_ENABLE as usize] & self.int_mask
    }

    /// NMI line to the CPU: asserted while any enabled, armed source is
    /// pending.
    pub fn nmi(&self) -> bool {
        self.int_status_masked() != 0
    }

    pub fn reg_read(&self, reg_no: u8) -> u8 {
        let reg = reg_no as usize;
        if reg >= CGIA_REGS_NO {
            return 0xFF;
        }
        match reg_no {
            REG_INT_STATUS => self.int_status_masked(),
            _ => self.regs[reg],
        }
    }

    pub fn reg_write(&mut self, reg_no: u8, value: u8) {
        let reg = reg_no as usize;
        if reg >= CGIA_REGS_NO {
            return;
        }
        self.regs[reg] = value;

        match reg_no {
            REG_BCKGND_BANK => self.vram.set_bank(VRAM_BCKGND_SLOT, value),
            REG_SPRITE_BANK => self.vram.set_bank(VRAM_SPRITE_SLOT, value),
            REG_INT_ENABLE => {
                self.regs[reg] = value & INT_FLAGS_MASK;
                self.int_mask &= !(value & INT_FLAGS_MASK);
            }
            REG_INT_STATUS => {
                // Write-to-ACK: clears status and disarms all sources
                // until their conditions recur.
                self.regs[REG_INT_STATUS as usize] = 0;
                self.int_mask = 0;
            }
            _ => {
                // A store to a sprite-plane's active register re-reads the
                // descriptor table on the next line.
                for plane in 0..CGIA_PLANES {
                    if reg == plane_base(plane) && self.plane_is_sprite(plane) {
                        self.plane_state[plane].sprites_need_update = true;
                    }
                }
            }
        }
    }

    fn reg16(&self, at: u8) -> u16 {
        u16::from_le_bytes([self.regs[at as usize], self.regs[at as usize + 1]])
    }

    fn set_reg16(&mut self, at: u8, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs[at as usize] = lo;
        self.regs[at as usize + 1] = hi;
    }

    pub fn raster(&self) -> u16 {
        self.reg16(REG_RASTER)
    }

    fn back_color(&self) -> u8 {
        self.regs[REG_BACK_COLOR as usize]
    }

    fn plane_enabled(&self, plane: usize) -> bool {
        self.regs[REG_PLANES as usize] & (1 << plane) != 0
    }

    fn plane_is_sprite(&self, plane: usize) -> bool {
        self.regs[REG_PLANES as usize] & (0x10 << plane) != 0
    }

    fn plane_offset(&self, plane: usize) -> u16 {
        self.reg16(REG_OFFSET + 2 * plane as u8)
    }

    fn set_plane_offset(&mut self, plane: usize, value: u16) {
        self.set_reg16(REG_OFFSET + 2 * plane as u8, value);
    }

    fn plane_block(&self, plane: usize) -> &[u8] {
        let base = plane_base(plane);
        &self.regs[base..base + CGIA_PLANE_REGS_NO]
    }

    // ---- rendering --------------------------------------------------

    /// The most recently rendered scanline (visible pixels, 0x00RRGGBB).
    pub fn line_pixels(&self) -> &[u32] {
        self.line.visible()
    }

    pub fn palette(&self) -> &[u32; 256] {
        &self.palette
    }

    /// Vertical blank: latch VBI. Raised at the start of line 0.
    pub fn vbi(&mut self) {
        self.int_mask |= INT_FLAG_VBI;
        if self.regs[REG_INT_ENABLE as usize] & INT_FLAG_VBI != 0 {
            self.regs[REG_INT_STATUS as usize] |= INT_FLAG_VBI;
        }
    }

    /// Render scanline `y` into the internal line buffer. Hard real-time
    /// in the reference design: one call per horizontal sync, no misses.
    pub fn render_line(&mut self, y: u16) {
        self.set_reg16(REG_RASTER, y);
        self.int_mask |= INT_FLAG_RSI;
        if y == 0 {
            self.vbi();
        }

        // Track whether a plane has already painted the full line, so
        // transparent and sprite planes get a background floor first.
        let mut line_filled = false;
        let mut trigger_dli = false;

        for plane in 0..CGIA_PLANES {
            if self.plane_is_sprite(plane) {
                self.render_sprite_plane(plane, y, &mut line_filled);
            } else {
                self.render_bckgnd_plane(plane, y, &mut line_filled, &mut trigger_dli);
            }
        }

        // Nothing painted the line: fill with the background color.
        if !line_filled {
            self.fill_full_line(self.back_color());
        }

        // Bump right after processing, so the CPU sees the next line
        // before its rasterization starts.
        let next = if (y + 1) as usize >= DISPLAY_HEIGHT_LINES { 0 } else { y + 1 };
        self.set_reg16(REG_RASTER, next);

        if self.regs[REG_INT_ENABLE as usize] & INT_FLAG_RSI != 0
            && y == self.reg16(REG_INT_RASTER)
        {
            self.regs[REG_INT_STATUS as usize] |= INT_FLAG_RSI;
        }
        if self.regs[REG_INT_ENABLE as usize] & INT_FLAG_DLI != 0 && trigger_dli {
            self.regs[REG_INT_STATUS as usize] |= INT_FLAG_DLI;
        }
    }

    fn fill_full_line(&mut self, color_idx: u8) {
        self.line.fill_back(0, FRAME_CHARS, self.palette[color_idx as usize]);
    }

    fn border_columns_clamped(raw: u8) -> u8 {
        raw.min(MAX_BORDER_COLUMNS)
    }

    fn render_sprite_plane(&mut self, plane: usize, y: u16, line_filled: &mut bool) {
        if !self.plane_enabled(plane) {
            return;
        }

        if !*line_filled {
            self.fill_full_line(self.back_color());
            *line_filled = true;
        }

        if !self.vram.synced(VRAM_SPRITE_SLOT) {
            return; // sprite bank not synced yet
        }

        if y == 0 || self.plane_state[plane].sprites_need_update {
            // Start of frame: lay descriptors 16 bytes apart from the
            // plane offset.
            let base = self.plane_offset(plane);
            for i in 0..CGIA_SPRITES {
                self.sprite_dscs[plane][i] = base.wrapping_add(16 * i as u16);
            }
            self.plane_state[plane].sprites_need_update = false;
        }

        let sprite_regs = SpritePlaneRegs::decode(self.plane_block(plane));

        // Render in reverse order so lower indices win visually.
        for index in (0..CGIA_SPRITES).rev() {
            if sprite_regs.active & (1 << index) == 0 {
                continue;
            }
            let dsc = SpriteDescriptor::fetch(self.vram.bank(VRAM_SPRITE_SLOT), self.sprite_dscs[plane][index]);

            let sprite_line = if dsc.flags & SPRITE_MASK_MIRROR_Y != 0 {
                dsc.pos_y as i32 + dsc.lines_y as i32 - 1 - y as i32
            } else {
                y as i32 - dsc.pos_y as i32
            };
            let in_window = sprite_line >= sprite_regs.start_y as i32
                && sprite_line < dsc.lines_y as i32
                && (sprite_regs.stop_y == 0 || sprite_line <= sprite_regs.stop_y as i32);
            if in_window {
                let line_bytes = dsc.width_bytes();
                let row_base = dsc.data_offset.wrapping_add((sprite_line as u16) * line_bytes as u16);

                let mut data = [0u8; SPRITE_MAX_WIDTH];
                let bank = self.vram.bank(VRAM_SPRITE_SLOT);
                for (i, slot) in data[..line_bytes].iter_mut().enumerate() {
                    let at = if dsc.flags & SPRITE_MASK_MIRROR_X != 0 {
                        row_base.wrapping_add((line_bytes - 1 - i) as u16)
                    } else {
                        row_base.wrapping_add(i as u16)
                    };
                    *slot = bank[at as usize];
                }

                sprite::encode_sprite(&mut self.line, &dsc, &data[..line_bytes], &self.palette);

                // Last sprite line: load the next descriptor for this slot.
                if dsc.pos_y as i32 + dsc.lines_y as i32 == y as i32 + 1 {
                    self.sprite_dscs[plane][index] = dsc.next_dsc_offset;
                }
            }
        }

        let bc = Self::border_columns_clamped(sprite_regs.border_columns) as usize;
        if bc > 0 {
            let back = self.palette[self.back_color() as usize];
            self.line.fill_back(0, bc, back);
            self.line.fill_back(FRAME_CHARS - bc, bc, back);
        }
    }

    fn render_bckgnd_plane(
        &mut self,
        plane: usize,
        y: u16,
        line_filled: &mut bool,
        trigger_dli: &mut bool,
    ) {
        if y == 0 {
            // Start of frame: release the VBL latch and restart rows.
            self.plane_state[plane].wait_vbl = false;
            self.plane_state[plane].row_line_count = 0;
        }

        if !self.plane_enabled(plane) {
            return;
        }

        let mut instr_budget = MAX_DL_INSTR_PER_LINE;

        loop {
            let bckgnd = BckgndRegs::decode(self.plane_block(plane));

            if self.plane_state[plane].wait_vbl {
                // DL is stopped until VBL; a non-transparent border still
                // provides a filled background for later planes.
                if bckgnd.flags & PLANE_MASK_BORDER_TRANSPARENT == 0 {
                    self.fill_full_line(self.back_color());
                    *line_filled = true;
                }
                return;
            }

            let op = self.vram.bank(VRAM_BCKGND_SLOT)[self.plane_offset(plane) as usize];
            self.int_mask |= INT_FLAG_DLI;

            if !self.vram.synced(VRAM_BCKGND_SLOT) {
                return; // bank not synced yet; plane skips this line
            }

            if instr_budget == 0 {
                // Runaway display list: diagnostic line, force progress.
                self.fill_full_line(UNHANDLED_DL_COLOR);
                *line_filled = true;
                self.plane_state[plane].row_line_count = 0;
                self.set_plane_offset(plane, self.plane_offset(plane).wrapping_add(1));
                return;
            }
            instr_budget -= 1;

            // A transparent plane on an unfilled line first paints the
            // background floor so holes show the back color.
            if !*line_filled && bckgnd.flags & PLANE_MASK_TRANSPARENT != 0 {
                self.fill_full_line(self.back_color());
                *line_filled = true;
            }

            let (instr, dli) = DlInstr::decode(op);
            let offset = self.plane_offset(plane);
            let bank_slot = VRAM_BCKGND_SLOT;

            // Rasters in the current row; blank/duplicate override it.
            let mut dl_row_lines = bckgnd.row_height;

            match instr {
                DlInstr::Jmp { wait_vbl } => {
                    let target = self.vram_u16(bank_slot, offset.wrapping_add(1));
                    self.set_plane_offset(plane, target);
                    self.plane_state[plane].row_line_count = 0;
                    if wait_vbl {
                        self.plane_state[plane].wait_vbl = true;
                    }
                    continue;
                }
                DlInstr::LoadMem { mask } => {
                    let mut at = offset.wrapping_add(1);
                    if mask & 0x10 != 0 {
                        self.plane_state[plane].memory_scan = self.vram_u16(bank_slot, at);
                        at = at.wrapping_add(2);
                    }
                    if mask & 0x20 != 0 {
                        self.plane_state[plane].colour_scan = self.vram_u16(bank_slot, at);
                        at = at.wrapping_add(2);
                    }
                    if mask & 0x40 != 0 {
                        self.plane_state[plane].backgr_scan = self.vram_u16(bank_slot, at);
                        at = at.wrapping_add(2);
                    }
                    if mask & 0x80 != 0 {
                        self.plane_state[plane].char_gen_offset = self.vram_u16(bank_slot, at);
                        at = at.wrapping_add(2);
                    }
                    self.set_plane_offset(plane, at);
                    if dli {
                        *trigger_dli = true;
                    }
                    continue;
                }
                DlInstr::SetReg8 { idx } => {
                    let value = self.vram.bank(bank_slot)[offset.wrapping_add(1) as usize];
                    self.regs[plane_base(plane) + (idx & 0x0F) as usize] = value;
                    self.set_plane_offset(plane, offset.wrapping_add(2));
                    if dli {
                        *trigger_dli = true;
                    }
                    continue;
                }
                DlInstr::SetReg16 { idx } => {
                    let value = self.vram_u16(bank_slot, offset.wrapping_add(1));
                    let base = plane_base(plane) + (idx & 0x0E) as usize;
                    let [lo, hi] = value.to_le_bytes();
                    self.regs[base] = lo;
                    self.regs[base + 1] = hi;
                    self.set_plane_offset(plane, offset.wrapping_add(3));
                    if dli {
                        *trigger_dli = true;
                    }
                    continue;
                }
                DlInstr::BlankLines(n) => {
                    dl_row_lines = n;
                    if !*line_filled || bckgnd.flags & PLANE_MASK_BORDER_TRANSPARENT == 0 {
                        self.fill_full_line(self.back_color());
                    }
                }
                DlInstr::DuplicateLines(n) => {
                    // The line buffer persists between rasters, so leaving
                    // it untouched repeats the previous line.
                    dl_row_lines = n;
                }
                DlInstr::Unknown(op) => {
                    log::warn!("CGIA unknown DL opcode {op:02X} on plane {plane}");
                    self.fill_full_line(UNHANDLED_DL_COLOR);
                    // Force moving to the next DL instruction.
                    dl_row_lines = self.plane_state[plane].row_line_count;
                }
                DlInstr::ModeRow(mode) => {
                    let cells = self.render_mode_row(plane, mode, &bckgnd);
                    self.finish_row(plane, y, mode, &bckgnd, cells, dli, line_filled, trigger_dli);
                    return;
                }
            }

            // Instruction rows (blank/duplicate/unknown) share the plain
            // row epilogue with no scan-pointer updates.
            *line_filled = true;
            if dli {
                *trigger_dli = true;
            }
            let state = &mut self.plane_state[plane];
            if state.row_line_count == dl_row_lines {
                state.row_line_count = 0;
                self.set_plane_offset(plane, self.plane_offset(plane).wrapping_add(1));
            } else {
                state.row_line_count += 1;
            }
            return;
        }
    }

    fn vram_u16(&self, slot: usize, at: u16) -> u16 {
        let bank = self.vram.bank(slot);
        u16::from_le_bytes([bank[at as usize], bank[at.wrapping_add(1) as usize]])
    }

    /// Draw one raster of a mode row. Returns the cells consumed, used by
    /// the end-of-row scan advance.
    fn render_mode_row(&mut self, plane: usize, mode: ModeRow, bckgnd: &BckgndRegs) -> u16 {
        let bc = Self::border_columns_clamped(bckgnd.border_columns);
        let row_columns = (FRAME_CHARS as u8).saturating_sub(2 * bc) as u32;
        if row_columns == 0 {
            self.draw_borders_if_opaque(bckgnd, bc, row_columns);
            return 0;
        }

        let state = self.plane_state[plane];
        let x0 = (bc as i32) * CGIA_COLUMN_PX as i32 + bckgnd.scroll_x as i32;
        let char_shift = char_shift(bckgnd.row_height);
        let transparent = bckgnd.flags & PLANE_MASK_TRANSPARENT != 0;
        let doubled = bckgnd.flags & PLANE_MASK_DOUBLE_WIDTH != 0;

        // Mode 7 reads its own register view and ignores scroll.
        if mode == ModeRow::Affine {
            let affine = AffineRegs::decode(self.plane_block(plane));
            if self.plane_state[plane].row_line_count == 0 {
                // Start interpolator lanes at the programmed origin.
                self.plane_state[plane].lanes[0].set(affine.u as i32, affine.du as i32);
                self.plane_state[plane].lanes[1].set(affine.v as i32, affine.dv as i32);
            }
            let u = self.plane_state[plane].lanes[0].pop();
            let v = self.plane_state[plane].lanes[1].pop();
            let ctx = ModeCtx {
                bank: self.vram.bank(VRAM_BCKGND_SLOT),
                palette: &self.palette,
                x0: (bc as i32) * CGIA_COLUMN_PX as i32,
                columns: row_columns,
                transparent,
                doubled,
            };
            modes::encode_affine(
                &mut self.line,
                ctx,
                state.memory_scan,
                u,
                v,
                affine.dx as i32,
                affine.dy as i32,
                affine.texture_width_bits(),
                affine.texture_height_bits(),
            );
            self.draw_borders_if_opaque(bckgnd, bc, row_columns);
            return 0;
        }

        let ctx = ModeCtx {
            bank: self.vram.bank(VRAM_BCKGND_SLOT),
            palette: &self.palette,
            x0,
            columns: row_columns,
            transparent,
            doubled,
        };

        let cells = match mode {
            ModeRow::Text => modes::encode_text(
                &mut self.line,
                ctx,
                state.memory_scan,
                state.colour_scan,
                state.backgr_scan,
                state.char_gen_offset.wrapping_add(state.row_line_count as u16),
                char_shift,
            ),
            ModeRow::Bitmap => {
                let cells = modes::encode_bitmap(
                    &mut self.line,
                    ctx,
                    state.memory_scan,
                    bckgnd.row_height as u16 + 1,
                    state.colour_scan,
                    state.backgr_scan,
                );
                // Next raster starts with the next byte; colour and
                // background scans stay row-stable.
                self.plane_state[plane].memory_scan = state.memory_scan.wrapping_add(1);
                cells
            }
            ModeRow::MulticolorText => modes::encode_mc_text(
                &mut self.line,
                ctx,
                state.memory_scan,
                state.colour_scan,
                state.backgr_scan,
                state.char_gen_offset.wrapping_add(state.row_line_count as u16),
                char_shift,
                bckgnd.shared_color,
            ),
            ModeRow::MulticolorBitmap => {
                let cell_stride = bckgnd.row_height as u16 + 1;
                // offset_x shifts all scans; stride trims the encoded
                // width by the scrolled-off columns.
                let offset_x = bckgnd.offset_x as i32;
                let ms = (state.memory_scan as i32 + offset_x * ((1i32) << char_shift)) as u16;
                let cs = (state.colour_scan as i32 + offset_x) as u16;
                let bs = (state.backgr_scan as i32 + offset_x) as u16;
                let mut ctx = ctx;
                if bckgnd.stride != 0 {
                    let mut scr = bckgnd.scroll_x as i32;
                    if scr < 0 {
                        scr -= 7;
                    }
                    ctx.columns = (row_columns as i32 - scr / CGIA_COLUMN_PX as i32).max(0) as u32;
                }
                let cells = modes::encode_mc_bitmap(
                    &mut self.line,
                    ctx,
                    ms,
                    cell_stride,
                    cs,
                    bs,
                    bckgnd.shared_color,
                );
                self.plane_state[plane].memory_scan = state.memory_scan.wrapping_add(1);
                cells
            }
            ModeRow::Ham => {
                let ham = HamRegs::decode(self.plane_block(plane));
                let back_color = self.back_color();
                let consumed = modes::encode_ham(
                    &mut self.line,
                    ctx,
                    state.memory_scan,
                    ham.base_color,
                    back_color,
                );
                self.plane_state[plane].memory_scan = state.memory_scan.wrapping_add(1);
                consumed
            }
            ModeRow::Affine => unreachable!(),
        };

        self.draw_borders_if_opaque(bckgnd, bc, row_columns);
        cells
    }

    fn draw_borders_if_opaque(&mut self, bckgnd: &BckgndRegs, bc: u8, row_columns: u32) {
        if bckgnd.flags & PLANE_MASK_BORDER_TRANSPARENT == 0 {
            self.draw_borders(bc, row_columns);
        }
    }

    fn draw_borders(&mut self, bc: u8, row_columns: u32) {
        if bc > 0 {
            let back = self.palette[self.back_color() as usize];
            self.line.fill_back(0, bc as usize, back);
            self.line.fill_back(bc as usize + row_columns as usize, bc as usize, back);
        }
    }

    /// Row accounting after drawing a mode row raster: advance the line
    /// counter, and on the last raster update the scan pointers and step
    /// to the next DL instruction.
    #[allow(clippy::too_many_arguments)]
    fn finish_row(
        &mut self,
        plane: usize,
        _y: u16,
        mode: ModeRow,
        bckgnd: &BckgndRegs,
        cells: u16,
        dli: bool,
        line_filled: &mut bool,
        trigger_dli: &mut bool,
    ) {
        *line_filled = true;
        if dli {
            *trigger_dli = true;
        }

        let dl_row_lines = bckgnd.row_height;
        let state = &mut self.plane_state[plane];
        if state.row_line_count != dl_row_lines {
            state.row_line_count += 1;
            return;
        }

        // Last raster of the row: advance scans for the next row.
        if mode != ModeRow::Affine {
            let row_step = bckgnd.row_height as u16 + 1;
            if bckgnd.stride != 0 {
                let stride = bckgnd.stride as u16;
                state.colour_scan = state.colour_scan.wrapping_add(stride);
                state.backgr_scan = state.backgr_scan.wrapping_add(stride);
                state.memory_scan = state
                    .memory_scan
                    .wrapping_add((stride - 1).wrapping_mul(row_step));
            } else {
                match mode {
                    ModeRow::Text | ModeRow::MulticolorText => {
                        state.memory_scan = state.memory_scan.wrapping_add(cells);
                        state.colour_scan = state.colour_scan.wrapping_add(cells);
                        state.backgr_scan = state.backgr_scan.wrapping_add(cells);
                    }
                    ModeRow::Bitmap => {
                        // The per-raster increments walked memory through
                        // the row; land on the first byte after it.
                        state.memory_scan = state
                            .memory_scan
                            .wrapping_sub(bckgnd.row_height as u16 + 1)
                            .wrapping_add(cells.wrapping_mul(row_step));
                        state.colour_scan = state.colour_scan.wrapping_add(cells);
                        state.backgr_scan = state.backgr_scan.wrapping_add(cells);
                    }
                    ModeRow::MulticolorBitmap => {
                        let offset_x = bckgnd.offset_x as i32 + cells as i32;
                        state.memory_scan = (state.memory_scan as i32
                            - (bckgnd.row_height as i32 + 1)
                            + offset_x * row_step as i32)
                            as u16;
                        state.colour_scan =
                            (state.colour_scan as i32 + offset_x) as u16;
                        state.backgr_scan =
                            (state.backgr_scan as i32 + offset_x) as u16;
                    }
                    ModeRow::Ham => {
                        // Memory advanced one byte per raster; land past
                        // the bytes the last raster consumed.
                        state.memory_scan = state
                            .memory_scan
                            .wrapping_sub(1)
                            .wrapping_add(cells);
                    }
                    ModeRow::Affine => unreachable!(),
                }
            }
        }

        state.row_line_count = 0;
        self.set_plane_offset(plane, self.plane_offset(plane).wrapping_add(1));
    }
}

/// Number of address bits a character row occupies: `ceil(log2(n + 1))`.
/// Row height 7 (an 8-line font) shifts character codes by 3.
fn char_shift(row_height: u8) -> u8 {
    (32 - (row_height as u32).leading_zeros()) as u8
}

impl Default for Cgia {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_shift_matches_log2_table() {
        assert_eq!(char_shift(0), 0);
        assert_eq!(char_shift(1), 1);
        assert_eq!(char_shift(3), 2);
        assert_eq!(char_shift(7), 3);
        assert_eq!(char_shift(15), 4);
        assert_eq!(char_shift(31), 5);
    }
}
