//! CPU-side PIX endpoint.
//!
//! Owns the request/reply accounting: every request increments the
//! in-flight counter, every reply decrements it. A reply arriving with no
//! request outstanding is a protocol violation and halts the CPU. A caller
//! that wants the reply value arms a response slot before sending; replies
//! for earlier in-flight requests are skipped past it.
//!
//! When the slave asks for a VRAM bank refresh (DMA_REQ), the master
//! answers by streaming 2048 DMA_WRITE frames of 32 bytes each (one full
//! 64 KB bank), pulled row by row from main RAM on each idle slot.

use super::{
    PIX_ACK_TIMEOUT_US, PixError, PixLink, ReplyCode, ReqType, pix_reply_code, pix_reply_payload,
};

/// One 64 KB bank in 32-byte cache rows.
const DMA_BLOCKS_PER_BANK: u16 = (0x10000 / 32) as u16;

pub struct PixMaster {
    in_flight: i32,
    awaiting_response: bool,
    response_skip: i32,
    response: Option<u16>,

    // Raster line reported by the latest ACK/NAK backchannel.
    vpu_raster: u16,

    // VRAM bank refresh pump.
    dma_bank: u8,
    dma_offset: u16,
    dma_blocks_remaining: u16,

    last_activity_us: u64,
}

impl PixMaster {
    pub fn new() -> Self {
        Self {
            in_flight: 0,
            awaiting_response: false,
            response_skip: 0,
            response: None,
            vpu_raster: 0,
            dma_bank: 0,
            dma_offset: 0,
            dma_blocks_remaining: 0,
            last_activity_us: 0,
        }
    }

    /// Raster line most recently reported by the slave.
    pub fn vpu_raster(&self) -> u16 {
        self.vpu_raster
    }

    /// True while a bank refresh is being streamed.
    pub fn dma_active(&self) -> bool {
        self.dma_blocks_remaining > 0
    }

    /// Send one request. With `want_response`, the reply word for *this*
    /// request will be captured and returned by `take_response()`; replies
    /// for requests already in flight pass through undisturbed.
    pub fn send_request(
        &mut self,
        link: &mut PixLink,
        req_type: ReqType,
        payload: &[u8],
        want_response: bool,
    ) {
        debug_assert!(!payload.is_empty());
        debug_assert!(!(want_response && self.awaiting_response));

        if want_response {
            self.awaiting_response = true;
            self.response_skip = self.in_flight;
            self.response = None;
        }
        self.in_flight += 1;
        link.push_request(req_type, payload);
    }

    /// Take the captured reply word, if it has arrived.
    pub fn take_response(&mut self) -> Option<u16> {
        self.response.take()
    }

    /// Mirror one main-RAM write into the slave's VRAM cache.
    pub fn mem_write(&mut self, link: &mut PixLink, addr24: u32, data: u8) {
        self.send_request(
            link,
            ReqType::MemWrite,
            &[
                (addr24 >> 16) as u8,
                (addr24 >> 8) as u8,
                addr24 as u8,
                data,
            ],
            false,
        );
    }

    /// Write one register of a device on the far bridge.
    pub fn dev_write(&mut self, link: &mut PixLink, device: u8, reg: u8, value: u8) {
        self.send_request(link, ReqType::DevWrite, &[device, reg, value], false);
    }

    /// Request one register of a device on the far bridge. The DEV_DATA
    /// reply lands in the response slot.
    pub fn dev_read(&mut self, link: &mut PixLink, device: u8, reg: u8) {
        self.send_request(link, ReqType::DevRead, &[device, reg], true);
    }

    /// Drain and account all pending replies.
    pub fn drain_replies(&mut self, link: &mut PixLink) -> Result<(), PixError> {
        while let Some(reply) = link.replies.pop_front() {
            self.process_reply(reply)?;
        }
        Ok(())
    }

    fn process_reply(&mut self, reply: u16) -> Result<(), PixError> {
        self.in_flight -= 1;
        if self.in_flight < 0 {
            self.in_flight = 0;
            return Err(PixError::UnexpectedReply(reply));
        }

        let mut delivered = false;
        if self.awaiting_response {
            if self.response_skip == 0 {
                self.awaiting_response = false;
                self.response = Some(reply);
                delivered = true;
            } else {
                self.response_skip -= 1;
            }
        }

        let code = pix_reply_code(reply);
        match ReplyCode::from_bits(code) {
            Some(ReplyCode::Pong) => {}
            Some(ReplyCode::Ack) => self.vpu_raster = pix_reply_payload(reply),
            Some(ReplyCode::DmaReq) => {
                self.dma_bank = pix_reply_payload(reply) as u8;
                self.dma_offset = 0;
                self.dma_blocks_remaining = DMA_BLOCKS_PER_BANK;
            }
            Some(ReplyCode::DevData) => {
                if !delivered {
                    return Err(PixError::UnexpectedDevData(reply));
                }
            }
            Some(ReplyCode::Nak) => {
                self.vpu_raster = pix_reply_payload(reply);
                log::warn!("PIX NAK: {:03X}", pix_reply_payload(reply));
            }
            None => {
                log::warn!("PIX unknown reply code {:X}: {:03X}", code, reply & 0xFFF);
            }
        }
        Ok(())
    }

    /// Idle work: keep the link warm. Streams one queued DMA row per call,
    /// or a SYNC to retrieve an ACK with the raster line. Checks the
    /// watchdog; an expired watchdog means the far bridge is gone.
    ///
    /// `fetch_row` supplies one 32-byte cache row of main RAM.
    pub fn task(
        &mut self,
        link: &mut PixLink,
        now_us: u64,
        mut fetch_row: impl FnMut(u8, u16) -> [u8; 32],
    ) -> Result<(), PixError> {
        if link.tx_idle() && self.in_flight == 0 {
            if self.dma_blocks_remaining > 0 {
                let row = fetch_row(self.dma_bank, self.dma_offset);
                self.last_activity_us = now_us;
                self.send_request(link, ReqType::DmaWrite, &row, false);
                self.dma_offset = self.dma_offset.wrapping_add(32);
                self.dma_blocks_remaining -= 1;
            } else {
                self.last_activity_us = now_us;
                self.send_request(link, ReqType::Sync, &[0], false);
            }
        }

        if self.in_flight > 0 && now_us.saturating_sub(self.last_activity_us) > PIX_ACK_TIMEOUT_US {
            log::error!("PIX FAILED");
            return Err(PixError::Timeout);
        }
        Ok(())
    }

    /// Stamp outgoing activity (used by callers that send directly and
    /// then pump, so the watchdog measures from the send).
    pub fn touch(&mut self, now_us: u64) {
        self.last_activity_us = now_us;
    }
}

impl Default for PixMaster {
    fn default() -> Self {
        Self::new()
    }
}
