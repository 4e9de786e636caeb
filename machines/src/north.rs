//! North bridge: CPU interface side.
//!
//! Owns main RAM with its L2 cache, the RIA register file, and the PIX
//! master endpoint. Every RAM store is mirrored onto the PIX bus so the
//! video bridge's VRAM cache stays coherent.

use x65_core::device::l2_cache::Memory;
use x65_core::device::ria::Ria;
use x65_core::pix::{PixError, PixLink, PixMaster};

pub struct NorthBridge {
    pub mem: Memory,
    pub ria: Ria,
    pub pix: PixMaster,
}

impl NorthBridge {
    pub fn new() -> Self {
        Self {
            mem: Memory::new(),
            ria: Ria::new(),
            pix: PixMaster::new(),
        }
    }

    pub fn reset(&mut self) {
        self.mem.reset();
        self.ria.reset();
        self.pix = PixMaster::new();
    }

    /// One CPU read transaction. Bank 0 is special: I/O devices are
    /// memory-mapped in the top page.
    pub fn cpu_read(&mut self, addr24: u32) -> u8 {
        let addr24 = addr24 & 0xFF_FFFF;
        let bank = (addr24 >> 16) as u8;
        let addr = addr24 as u16;
        if bank == 0 && addr >= 0xFF00 {
            if addr >= 0xFFC0 {
                self.ria.read(addr)
            } else {
                // Other I/O devices are reached through the API doorbell.
                0xFF
            }
        } else {
            self.mem.read(addr24)
        }
    }

    /// One CPU write transaction. RAM stores go write-through and are
    /// mirrored over PIX.
    pub fn cpu_write(&mut self, link: &mut PixLink, addr24: u32, data: u8) {
        let addr24 = addr24 & 0xFF_FFFF;
        let bank = (addr24 >> 16) as u8;
        let addr = addr24 as u16;
        if bank == 0 && addr >= 0xFF00 {
            if addr >= 0xFFC0 {
                self.ria.write(addr, data);
            }
        } else {
            self.mem.write(addr24, data);
            self.pix.mem_write(link, addr24, data);
        }
    }

    /// Idle PIX work: pump a queued DMA row or retrieve an ACK. The
    /// watchdog fires through the returned error.
    pub fn pix_task(&mut self, link: &mut PixLink, now_us: u64) -> Result<(), PixError> {
        let mem = &self.mem;
        self.pix.task(link, now_us, |bank, addr| mem.fetch_row(bank, addr))
    }
}

impl Default for NorthBridge {
    fn default() -> Self {
        Self::new()
    }
}
