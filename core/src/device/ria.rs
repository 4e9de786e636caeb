//! RIA — the CPU-visible housekeeping register file at 0xFFC0..=0xFFFF.
//!
//! # Register map (bank 0)
//!
//! | Address | Read                         | Write                    |
//! |---------|------------------------------|--------------------------|
//! | 0xFFC0-1| OPERA (u16, le)              | OPERA                    |
//! | 0xFFC2-3| OPERB (u16, le)              | OPERB                    |
//! | 0xFFC4-5| OPERA * OPERB (low 16 bits)  | plain cell               |
//! | 0xFFC6-7| OPERA / OPERB (signed/unsig) | plain cell               |
//! | 0xFFC8-D| monotonic clock, 48-bit µs   | plain cells              |
//! | 0xFFCE-F| 0xFF                         | plain cells              |
//! | 0xFFE0  | UART flow (rx rdy 6, tx 7)   | plain cell               |
//! | 0xFFE1  | UART Rx                      | UART Tx                  |
//! | 0xFFE2-3| random bytes                 | plain cells              |
//! | 0xFFEC  | IRQ ACK (raises IRQB)        | IRQ enable               |
//! | 0xFFED  | IRQ status (stub, 0xFF)      | plain cell               |
//! | 0xFFF0  | xstack pop                   | xstack push              |
//! | 0xFFF1  | latched API op               | API doorbell             |
//! | 0xFFF2  | errno                        | plain cell               |
//! | 0xFFF3  | busy flag (bit 7)            | plain cell               |
//! | 0xFFF4-5| API return value AX (u16)    | plain cells              |
//!
//! The doorbell: writing 0x00 resets the xstack and returns 0; 0xFF
//! requests a CPU halt; any other value latches an operation code for the
//! orchestration side to service.
//!
//! The xstack is 512 bytes, down-growing, saturating at both ends, with
//! one always-zero byte past the end so cstrings need no terminator.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

pub const XSTACK_SIZE: usize = 0x200;

// API doorbell operations handled in the bus loop itself.
const API_OP_ZXSTACK: u8 = 0x00;
const API_OP_HALT: u8 = 0xFF;

const BUSY_BIT: u8 = 0x80;

pub struct Ria {
    regs: [u8; 64],

    xstack: [u8; XSTACK_SIZE + 1],
    xstack_ptr: usize,

    api_op: u8,
    api_busy: bool,
    api_errno: u8,

    irq_enable: u8,
    irqb_asserted: bool,

    uart_rx: std::collections::VecDeque<u8>,
    uart_tx: std::collections::VecDeque<u8>,

    clock_us: u64,
    rng: SmallRng,

    halt_requested: bool,
}

impl Ria {
    pub fn new() -> Self {
        Self {
            regs: [0; 64],
            xstack: [0; XSTACK_SIZE + 1],
            xstack_ptr: XSTACK_SIZE,
            api_op: 0,
            api_busy: false,
            api_errno: 0,
            irq_enable: 0,
            irqb_asserted: false,
            uart_rx: std::collections::VecDeque::new(),
            uart_tx: std::collections::VecDeque::new(),
            clock_us: 0,
            rng: SmallRng::seed_from_u64(0x6502_65C8_1600_0001),
            halt_requested: false,
        }
    }

    /// Advance the monotonic microsecond clock. Called by the machine.
    pub fn set_clock_us(&mut self, us: u64) {
        self.clock_us = us;
    }

    /// True once the API doorbell received a halt request.
    pub fn halt_requested(&self) -> bool {
        self.halt_requested
    }

    /// IRQB line state (active when an enabled source fired).
    pub fn irqb(&self) -> bool {
        self.irqb_asserted
    }

    /// Assert IRQB from an orchestration-side source, gated by the enable
    /// register.
    pub fn set_irq(&mut self, source: u8) {
        if self.irq_enable & source != 0 {
            self.irqb_asserted = true;
        }
    }

    /// Push a byte into the UART receiver (console side).
    pub fn uart_feed(&mut self, byte: u8) {
        self.uart_rx.push_back(byte);
    }

    /// Drain bytes the CPU transmitted.
    pub fn uart_take_tx(&mut self) -> Vec<u8> {
        self.uart_tx.drain(..).collect()
    }

    /// Latch an API operation result: return value in the AX cells at
    /// 0xFFF4/0xFFF5 and clear the busy flag. Used by the orchestration
    /// side when it finishes servicing a latched op.
    pub fn api_return_ax(&mut self, ax: u16) {
        self.regs[0x34] = ax as u8;
        self.regs[0x35] = (ax >> 8) as u8;
        self.api_busy = false;
    }

    pub fn api_set_errno(&mut self, errno: u8) {
        self.api_errno = errno;
    }

    /// Latched operation awaiting service, if the doorbell rang.
    pub fn api_pending_op(&self) -> Option<u8> {
        if self.api_busy { Some(self.api_op) } else { None }
    }

    fn opera(&self) -> u16 {
        u16::from_le_bytes([self.regs[0x00], self.regs[0x01]])
    }

    fn operb(&self) -> u16 {
        u16::from_le_bytes([self.regs[0x02], self.regs[0x03]])
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        let cell = self.regs[(addr & 0x3F) as usize];
        match addr {
            // ------ FFF0 - FFFF ------ (API, xstack)
            0xFFF3 => {
                if self.api_busy {
                    BUSY_BIT
                } else {
                    0
                }
            }
            0xFFF2 => self.api_errno,
            0xFFF1 => self.api_op,
            0xFFF0 => {
                let data = self.xstack[self.xstack_ptr];
                if self.xstack_ptr < XSTACK_SIZE {
                    self.xstack_ptr += 1;
                }
                data
            }

            // ------ FFE0 - FFEF ------ (UART, RNG, IRQ CTL)
            0xFFED => 0xFF,
            0xFFEC => {
                self.irqb_asserted = false;
                cell
            }
            0xFFE2 | 0xFFE3 => self.rng.next_u32() as u8,
            0xFFE1 => self.uart_rx.pop_front().unwrap_or(0),
            0xFFE0 => {
                let mut status = 0u8;
                if !self.uart_rx.is_empty() {
                    status |= 0b0100_0000;
                }
                status |= 0b1000_0000; // tx always writable in this model
                status
            }

            // ------ FFC0 - FFCF ------ (MUL/DIV, TOD)
            0xFFCE | 0xFFCF => 0xFF,
            0xFFC8..=0xFFCD => {
                let byte = (addr - 0xFFC8) as u32;
                (self.clock_us >> (8 * byte)) as u8
            }
            0xFFC6 | 0xFFC7 => {
                let oper_a = self.opera() as i16;
                let oper_b = self.operb();
                let div = if oper_b != 0 {
                    ((oper_a as i32) / (oper_b as i32)) as u16
                } else {
                    0xFFFF
                };
                if addr & 1 != 0 { (div >> 8) as u8 } else { div as u8 }
            }
            0xFFC4 | 0xFFC5 => {
                let mul = self.opera().wrapping_mul(self.operb());
                if addr & 1 != 0 { (mul >> 8) as u8 } else { mul as u8 }
            }

            _ => cell,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        // Writes land in the register cell first; special cells override.
        self.regs[(addr & 0x3F) as usize] = data;

        match addr {
            0xFFF1 => {
                self.api_op = data;
                self.api_busy = true;
                if data == API_OP_ZXSTACK {
                    self.xstack_ptr = XSTACK_SIZE;
                    self.api_return_ax(0);
                } else if data == API_OP_HALT {
                    self.halt_requested = true;
                }
            }
            0xFFF0 => {
                if self.xstack_ptr > 0 {
                    self.xstack_ptr -= 1;
                    self.xstack[self.xstack_ptr] = data;
                }
            }
            0xFFEC => {
                self.irq_enable = data;
                self.irqb_asserted = false;
            }
            0xFFE1 => {
                self.uart_tx.push_back(data);
            }
            _ => {}
        }
    }

    /// Power-on reset: clears everything but the clock.
    pub fn reset(&mut self) {
        self.regs = [0; 64];
        self.xstack = [0; XSTACK_SIZE + 1];
        self.xstack_ptr = XSTACK_SIZE;
        self.api_op = 0;
        self.api_busy = false;
        self.api_errno = 0;
        self.irq_enable = 0;
        self.irqb_asserted = false;
        self.uart_rx.clear();
        self.uart_tx.clear();
        self.halt_requested = false;
    }
}

impl Default for Ria {
    fn default() -> Self {
        Self::new()
    }
}
