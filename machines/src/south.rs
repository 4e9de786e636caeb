//! South bridge: the video side of the PIX link.
//!
//! Owns the CGIA (and with it the VRAM mirror) and services every PIX
//! request: VRAM mirroring, DMA bank refresh, and the VPU device command
//! set. Every request gets exactly one reply; when a bank refresh is
//! pending and no stream is running, the DMA_REQ reply substitutes for
//! the plain ACK.

use x65_core::device::cgia::vram::{VRAM_BCKGND_SLOT, VRAM_SPRITE_SLOT};
use x65_core::device::cgia::{Cgia, font};
use x65_core::pix::{
    PIX_DEV_VPU, PIX_VPU_CMD_GET_CHARGEN, PIX_VPU_CMD_GET_STATUS, PIX_VPU_CMD_GET_VERSION,
    PIX_VPU_CMD_RESET, PIX_VPU_CMD_SET_CODE_PAGE, PIX_VPU_CMD_SET_MODE_CGIA,
    PIX_VPU_CMD_SET_MODE_VT, ReplyCode, ReqType, pix_response,
};

const VPU_VERSION_MESSAGE: &[u8] = b"X65 VPU CGIA v1.0\0";

/// 64 KB bank in 32-byte rows.
const VCACHE_BLOCKS_PER_BANK: u16 = (0x10000 / 32) as u16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutMode {
    /// Terminal emulator output (boot/monitor screens).
    Vt,
    /// CGIA raster output.
    Cgia,
}

#[derive(Clone, Copy, Default)]
struct VcacheDma {
    running: bool,
    slot: usize,
    bank: u8,
    offset: u16,
    blocks_remaining: u16,
}

pub struct SouthBridge {
    pub cgia: Cgia,
    dma: VcacheDma,
    out_mode: OutMode,
    code_page: u16,
}

impl SouthBridge {
    pub fn new() -> Self {
        Self {
            cgia: Cgia::new(),
            dma: VcacheDma::default(),
            out_mode: OutMode::Vt,
            code_page: 0,
        }
    }

    pub fn reset(&mut self) {
        self.cgia.reset();
        self.dma = VcacheDma::default();
        self.out_mode = OutMode::Vt;
    }

    pub fn out_mode(&self) -> OutMode {
        self.out_mode
    }

    pub fn code_page(&self) -> u16 {
        self.code_page
    }

    fn raster12(&self) -> u16 {
        self.cgia.raster() & 0x0FFF
    }

    /// ACK with the current raster line, or kick off a pending bank
    /// refresh with a DMA_REQ instead.
    fn ack(&mut self) -> u16 {
        if !self.dma.running {
            let pending = [VRAM_BCKGND_SLOT, VRAM_SPRITE_SLOT]
                .into_iter()
                .find_map(|slot| self.cgia.vram.pending_page(slot).map(|page| (slot, page)));
            if let Some((slot, page)) = pending {
                self.cgia.vram.begin_fill(slot);
                self.dma = VcacheDma {
                    running: true,
                    slot,
                    bank: page,
                    offset: 0,
                    blocks_remaining: VCACHE_BLOCKS_PER_BANK,
                };
                return pix_response(ReplyCode::DmaReq, page as u16);
            }
        }
        pix_response(ReplyCode::Ack, self.raster12())
    }

    fn nak(&self) -> u16 {
        pix_response(ReplyCode::Nak, self.raster12())
    }

    /// Handle one framed request, producing exactly one reply word.
    pub fn service(&mut self, type_bits: u8, payload: &[u8]) -> u16 {
        let len = payload.len();
        match ReqType::from_bits(type_bits) {
            Some(ReqType::Sync) => self.ack(),
            Some(ReqType::Ping) => {
                let echo = ((payload[len - 1] as u16) << 6) | len as u16;
                pix_response(ReplyCode::Pong, echo)
            }
            Some(ReqType::MemWrite) => {
                if len != 4 {
                    return self.unknown(type_bits, payload);
                }
                let addr24 = ((payload[0] as u32) << 16)
                    | ((payload[1] as u32) << 8)
                    | payload[2] as u32;
                self.cgia.vram.ram_write(addr24, payload[3]);
                self.ack()
            }
            Some(ReqType::DmaWrite) => {
                if len != 32 {
                    return self.unknown(type_bits, payload);
                }
                if self.dma.blocks_remaining == 0 {
                    log::error!("PIX VCACHE DMA overflow, bank {:02X}", self.dma.bank);
                    return self.nak();
                }
                self.cgia.vram.write_row(self.dma.slot, self.dma.offset, payload);
                self.dma.offset = self.dma.offset.wrapping_add(32);
                self.dma.blocks_remaining -= 1;
                if self.dma.blocks_remaining == 0 {
                    self.cgia.vram.finish_fill(self.dma.slot);
                    self.dma.running = false;
                }
                self.ack()
            }
            Some(ReqType::DevCmd) => self.dev_cmd(payload),
            Some(ReqType::DevRead) => {
                if len != 2 || payload[0] != PIX_DEV_VPU {
                    return self.unknown(type_bits, payload);
                }
                pix_response(ReplyCode::DevData, self.cgia.reg_read(payload[1]) as u16)
            }
            Some(ReqType::DevWrite) => {
                if len != 3 || payload[0] != PIX_DEV_VPU {
                    return self.unknown(type_bits, payload);
                }
                self.cgia.reg_write(payload[1], payload[2]);
                self.ack()
            }
            None => self.unknown(type_bits, payload),
        }
    }

    fn dev_cmd(&mut self, payload: &[u8]) -> u16 {
        let selector = payload[0];
        let device = (selector >> 4) & 0x0F;
        let cmd = selector & 0x0F;
        if device != PIX_DEV_VPU {
            return self.nak();
        }
        match cmd {
            PIX_VPU_CMD_RESET => {
                self.cgia.reset();
                self.ack()
            }
            PIX_VPU_CMD_GET_VERSION => {
                let idx = payload.get(1).copied().unwrap_or(0) as usize;
                let byte = VPU_VERSION_MESSAGE.get(idx).copied().unwrap_or(0);
                pix_response(ReplyCode::DevData, byte as u16)
            }
            PIX_VPU_CMD_GET_STATUS => self.ack(),
            PIX_VPU_CMD_GET_CHARGEN => {
                let at = u16::from_le_bytes([
                    payload.get(1).copied().unwrap_or(0),
                    payload.get(2).copied().unwrap_or(0),
                ]);
                pix_response(ReplyCode::DevData, font::font8(at) as u16)
            }
            PIX_VPU_CMD_SET_MODE_VT => {
                self.out_mode = OutMode::Vt;
                self.ack()
            }
            PIX_VPU_CMD_SET_MODE_CGIA => {
                self.out_mode = OutMode::Cgia;
                self.ack()
            }
            PIX_VPU_CMD_SET_CODE_PAGE => {
                self.code_page = u16::from_le_bytes([
                    payload.get(1).copied().unwrap_or(0),
                    payload.get(2).copied().unwrap_or(0),
                ]);
                self.ack()
            }
            _ => self.nak(),
        }
    }

    fn unknown(&mut self, type_bits: u8, payload: &[u8]) -> u16 {
        log::warn!(
            "PIX unknown message {:X}/{}: {:02X?}",
            type_bits,
            payload.len(),
            payload
        );
        self.nak()
    }
}

impl Default for SouthBridge {
    fn default() -> Self {
        Self::new()
    }
}
