//! PIX — Pico Information eXchange bus.
//!
//! Framed byte-oriented link between two bridges: a CPU-side master and a
//! video/audio-side slave. Every message starts with one header byte
//! `[TTT LLLLL]` (request type, payload length minus one), followed by
//! 1..=32 payload bytes. Every request produces exactly one 16-bit reply
//! word `[CCCC PPPPPPPPPPPP]` (reply code, 12-bit payload). The default ACK
//! payload is the current raster line, which is how the CPU side observes
//! vertical timing without polling.

pub mod master;

pub use master::PixMaster;

use std::collections::VecDeque;

/// Maximum payload length of a single PIX frame.
pub const PIX_MAX_PAYLOAD: usize = 32;

/// PIX watchdog: a request left unanswered this long means the other
/// bridge is dead and the CPU must be stopped.
pub const PIX_ACK_TIMEOUT_US: u64 = 50_000;

/// Request types, encoded in the top three bits of the header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReqType {
    Sync = 0,
    Ping = 1,
    MemWrite = 2,
    DmaWrite = 3,
    DevCmd = 4,
    DevWrite = 5,
    DevRead = 6,
}

impl ReqType {
    pub fn from_bits(bits: u8) -> Option<ReqType> {
        match bits {
            0 => Some(ReqType::Sync),
            1 => Some(ReqType::Ping),
            2 => Some(ReqType::MemWrite),
            3 => Some(ReqType::DmaWrite),
            4 => Some(ReqType::DevCmd),
            5 => Some(ReqType::DevWrite),
            6 => Some(ReqType::DevRead),
            _ => None,
        }
    }
}

/// Reply codes, encoded in the top four bits of the reply word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyCode {
    Ack = 0,
    Pong = 1,
    DmaReq = 2,
    DevData = 3,
    Nak = 0xF,
}

impl ReplyCode {
    pub fn from_bits(bits: u8) -> Option<ReplyCode> {
        match bits {
            0 => Some(ReplyCode::Ack),
            1 => Some(ReplyCode::Pong),
            2 => Some(ReplyCode::DmaReq),
            3 => Some(ReplyCode::DevData),
            0xF => Some(ReplyCode::Nak),
            _ => None,
        }
    }
}

/// Devices addressable through DEV_CMD / DEV_READ / DEV_WRITE.
pub const PIX_DEV_RIA: u8 = 0;
pub const PIX_DEV_VPU: u8 = 1;
pub const PIX_DEV_SPU: u8 = 2;

/// VPU device commands (low nibble of the DEV_CMD selector byte).
pub const PIX_VPU_CMD_GET_VERSION: u8 = 0;
pub const PIX_VPU_CMD_GET_STATUS: u8 = 1;
pub const PIX_VPU_CMD_RESET: u8 = 2;
pub const PIX_VPU_CMD_SET_MODE_VT: u8 = 3;
pub const PIX_VPU_CMD_SET_MODE_CGIA: u8 = 4;
pub const PIX_VPU_CMD_SET_CODE_PAGE: u8 = 5;
pub const PIX_VPU_CMD_GET_CHARGEN: u8 = 6;

/// Build a request header byte: `[TTT LLLLL]`, length encoded minus one.
#[inline]
pub fn pix_message(req_type: ReqType, len: usize) -> u8 {
    debug_assert!(len >= 1 && len <= PIX_MAX_PAYLOAD);
    (((req_type as u8) & 0b111) << 5) | ((len as u8).wrapping_sub(1) & 0b11111)
}

/// Split a header byte into request type bits and payload length.
#[inline]
pub fn pix_header(header: u8) -> (u8, usize) {
    (header >> 5, ((header & 0b11111) as usize) + 1)
}

/// Build a reply word: `[CCCC PPPPPPPPPPPP]`.
#[inline]
pub fn pix_response(code: ReplyCode, payload12: u16) -> u16 {
    (((code as u16) & 0xF) << 12) | (payload12 & 0x0FFF)
}

#[inline]
pub fn pix_reply_code(reply: u16) -> u8 {
    ((reply >> 12) & 0x0F) as u8
}

#[inline]
pub fn pix_reply_payload(reply: u16) -> u16 {
    reply & 0x0FFF
}

/// Pack a device/command selector byte: `[DDDD CCCC]`.
#[inline]
pub fn pix_device_cmd(device: u8, cmd: u8) -> u8 {
    ((device & 0xF) << 4) | (cmd & 0xF)
}

/// PIX protocol failures. All of these are fatal to the CPU side: the
/// machine stops the 65C816 and surfaces a log line (there are no retries
/// on the bus).
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixError {
    #[error("unexpected reply with no request in flight: {0:#06X}")]
    UnexpectedReply(u16),
    #[error("unexpected DEV_DATA with no response slot armed: {0:#06X}")]
    UnexpectedDevData(u16),
    #[error("no reply within the watchdog window")]
    Timeout,
}

/// The wires between the two bridges: a request byte stream travelling
/// master→slave and a reply word stream travelling back. Stands in for the
/// PIO FIFO pair; the framing on it is bit-exact, the clocking is not
/// modeled (any equivalent transport satisfies the contract).
#[derive(Default)]
pub struct PixLink {
    pub requests: VecDeque<u8>,
    pub replies: VecDeque<u16>,
}

impl PixLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the master→slave direction has nothing queued.
    pub fn tx_idle(&self) -> bool {
        self.requests.is_empty()
    }

    /// Push one framed request (header + payload bytes).
    pub fn push_request(&mut self, req_type: ReqType, payload: &[u8]) {
        self.requests.push_back(pix_message(req_type, payload.len()));
        self.requests.extend(payload.iter().copied());
    }

    /// Pull one complete frame off the request stream, if available.
    /// Returns the raw type bits (the slave NAKs unknown types itself)
    /// and the payload.
    pub fn pop_request(&mut self) -> Option<(u8, Vec<u8>)> {
        let header = *self.requests.front()?;
        let (type_bits, len) = pix_header(header);
        if self.requests.len() < 1 + len {
            return None; // frame still being clocked in
        }
        self.requests.pop_front();
        let payload = self.requests.drain(..len).collect();
        Some((type_bits, payload))
    }
}
