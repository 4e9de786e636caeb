//! Sound bridge: the SGU-1 and its host register window.
//!
//! The host interface exposes 64 registers, one channel's worth. A write
//! to SPECIAL2 (offset 0x1F) selects which of the nine channels is
//! projected into the window. Channel 0xFF names the service page (chip
//! identifier, mixer/DSP controls).

use x65_core::device::sgu::{CHN_SPECIAL2, SGU_CHNS, SGU_REGS_PER_CH, Sgu};

/// Channel-select value mapping the service registers.
pub const SGU_SERVICE_PAGE: u8 = 0xFF;

pub struct SoundBridge {
    pub sgu: Sgu,
    selected: u8,
}

impl SoundBridge {
    pub fn new() -> Self {
        Self { sgu: Sgu::default(), selected: 0 }
    }

    pub fn reset(&mut self) {
        self.sgu.reset();
        self.selected = 0;
    }

    pub fn selected_channel(&self) -> u8 {
        self.selected
    }

    fn window_base(&self) -> u16 {
        ((self.selected as usize % SGU_CHNS) * SGU_REGS_PER_CH) as u16
    }

    /// Read one register of the projected channel window.
    pub fn reg_read(&self, reg: u8) -> u8 {
        let reg = reg & 0x3F;
        if self.selected == SGU_SERVICE_PAGE {
            // TODO: service registers (chip identifier, UniqueID, mixer
            // controls) are not defined yet.
            return 0;
        }
        if reg as usize == CHN_SPECIAL2 {
            return self.selected;
        }
        self.sgu.read(self.window_base() + reg as u16)
    }

    /// Write one register of the projected channel window. SPECIAL2
    /// switches the projection instead of storing.
    pub fn reg_write(&mut self, reg: u8, data: u8) {
        let reg = reg & 0x3F;
        if reg as usize == CHN_SPECIAL2 {
            self.selected = data;
            return;
        }
        if self.selected == SGU_SERVICE_PAGE {
            // TODO: service register writes are not defined yet.
            return;
        }
        self.sgu.write(self.window_base() + reg as u16, data);
    }

    /// Advance the synthesizer one internal sample tick.
    pub fn tick(&mut self) -> (i32, i32) {
        self.sgu.next_sample()
    }
}

impl Default for SoundBridge {
    fn default() -> Self {
        Self::new()
    }
}
