//! X65 Microcomputer System
//!
//! Hardware: WDC 65C816 behind a trusted bus front end, three bridges:
//! north (CPU interface, 16 MB PSRAM with L2 cache, RIA register file),
//! south (CGIA video with a 2×64 KB VRAM mirror), sound (SGU-1).
//! The bridges talk over the PIX message bus; the machine pumps the link
//! to completion every scanline, so requests never outlive a line.
//!
//! Memory map (bank 0):
//!   0x0000-0xFEFF  Main RAM (through the L2 cache, PIX-mirrored writes)
//!   0xFF00-0xFFBF  Reads 0xFF; devices are reached via the API doorbell
//!   0xFFC0-0xFFFF  RIA register file (math, clock, UART, xstack, API)
//! Banks 1..255 are main RAM.
//!
//! The API doorbell routes device register access: XREG/XREG_READ ops pop
//! `(device, reg, value)` off the xstack and forward to the VPU over PIX
//! DEV_WRITE/DEV_READ or to the SGU host window.

use crate::north::NorthBridge;
use crate::sound::SoundBridge;
use crate::south::SouthBridge;
use x65_core::core::bus::{Bus, BusMaster, InterruptState};
use x65_core::core::machine::Machine;
use x65_core::device::cgia::{DISPLAY_HEIGHT_LINES, DISPLAY_WIDTH_PX};
use x65_core::device::sgu::SGU_INTERNAL_RATE_HZ;
use x65_core::pix::{PIX_DEV_SPU, PIX_DEV_VPU, PixLink, pix_reply_payload};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// 768×480 DVI mode with 2× pixel repeat: 384×240 at 60 Hz.
// Line period: 16667 µs / 240 ≈ 69.4 µs.
const LINES_PER_FRAME: u64 = DISPLAY_HEIGHT_LINES as u64;
const FRAME_RATE_HZ: u64 = 60;
const US_PER_FRAME: u64 = 1_000_000 / FRAME_RATE_HZ;
const LINE_RATE_HZ: u32 = (LINES_PER_FRAME * FRAME_RATE_HZ) as u32;

// API doorbell operations serviced by the orchestration side.
pub const API_OP_XREG: u8 = 0x01;
pub const API_OP_XREG_READ: u8 = 0x02;
pub const API_OP_OEM_CODEPAGE: u8 = 0x03;
pub const API_OP_OEM_GET_CHARGEN: u8 = 0x10;

const API_ENOSYS: u8 = 13;

pub struct X65 {
    pub north: NorthBridge,
    pub south: SouthBridge,
    pub sound: SoundBridge,
    link: PixLink,

    framebuffer: Vec<u32>,
    audio: Vec<(i32, i32)>,
    audio_acc: u32,

    next_line: u16,
    line_counter: u64,
    halted: bool,
}

impl X65 {
    pub fn new() -> Self {
        Self {
            north: NorthBridge::new(),
            south: SouthBridge::new(),
            sound: SoundBridge::new(),
            link: PixLink::new(),
            framebuffer: vec![0; DISPLAY_WIDTH_PX * DISPLAY_HEIGHT_LINES],
            audio: Vec::new(),
            audio_acc: 0,
            next_line: 0,
            line_counter: 0,
            halted: false,
        }
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    fn now_us(&self) -> u64 {
        self.line_counter * US_PER_FRAME / LINES_PER_FRAME
    }

    // ---- PIX plumbing ----------------------------------------------

    /// Service every queued request on the slave and account the replies
    /// on the master. A protocol violation stops the CPU.
    fn pump_pix(&mut self) {
        while let Some((type_bits, payload)) = self.link.pop_request() {
            let reply = self.south.service(type_bits, &payload);
            self.link.replies.push_back(reply);
        }
        if let Err(err) = self.north.pix.drain_replies(&mut self.link) {
            log::error!("PIX failed: {err}");
            self.halted = true;
        }
    }

    /// Liveness test: echo one byte of the payload back.
    pub fn ping(&mut self, payload: &[u8]) -> Option<u16> {
        self.north
            .pix
            .send_request(&mut self.link, x65_core::pix::ReqType::Ping, payload, true);
        self.pump_pix();
        self.north.pix.take_response()
    }

    /// Write one CGIA register over PIX.
    pub fn vpu_reg_write(&mut self, reg: u8, value: u8) {
        self.north.pix.dev_write(&mut self.link, PIX_DEV_VPU, reg, value);
        self.pump_pix();
    }

    /// Read one CGIA register over PIX.
    pub fn vpu_reg_read(&mut self, reg: u8) -> u8 {
        self.north.pix.dev_read(&mut self.link, PIX_DEV_VPU, reg);
        self.pump_pix();
        self.north
            .pix
            .take_response()
            .map(|reply| pix_reply_payload(reply) as u8)
            .unwrap_or(0xFF)
    }

    /// Load the VPU version string, one indexed byte per GET_VERSION
    /// round trip, up to the NUL.
    pub fn vpu_version(&mut self) -> String {
        let mut version = Vec::new();
        for idx in 0..32u8 {
            self.north.pix.send_request(
                &mut self.link,
                x65_core::pix::ReqType::DevCmd,
                &[
                    x65_core::pix::pix_device_cmd(
                        PIX_DEV_VPU,
                        x65_core::pix::PIX_VPU_CMD_GET_VERSION,
                    ),
                    idx,
                ],
                true,
            );
            self.pump_pix();
            let byte = self
                .north
                .pix
                .take_response()
                .map(|reply| pix_reply_payload(reply) as u8)
                .unwrap_or(0);
            if byte == 0 {
                break;
            }
            version.push(byte);
        }
        String::from_utf8_lossy(&version).into_owned()
    }

    /// Switch the video bridge between terminal and CGIA output.
    pub fn vpu_run(&mut self) {
        self.send_vpu_cmd(x65_core::pix::PIX_VPU_CMD_SET_MODE_CGIA);
    }

    pub fn vpu_stop(&mut self) {
        self.send_vpu_cmd(x65_core::pix::PIX_VPU_CMD_SET_MODE_VT);
    }

    fn send_vpu_cmd(&mut self, cmd: u8) {
        self.north.pix.send_request(
            &mut self.link,
            x65_core::pix::ReqType::DevCmd,
            &[x65_core::pix::pix_device_cmd(PIX_DEV_VPU, cmd)],
            false,
        );
        self.pump_pix();
    }

    /// Access the SGU host window (channel selected via SPECIAL2).
    pub fn sgu_reg_write(&mut self, reg: u8, value: u8) {
        self.sound.reg_write(reg, value);
    }

    pub fn sgu_reg_read(&mut self, reg: u8) -> u8 {
        self.sound.reg_read(reg)
    }

    // ---- CPU bus transactions --------------------------------------

    pub fn cpu_read(&mut self, addr24: u32) -> u8 {
        self.north.cpu_read(addr24)
    }

    pub fn cpu_write(&mut self, addr24: u32, data: u8) {
        self.north.cpu_write(&mut self.link, addr24, data);
        self.pump_pix();
        if addr24 & 0xFF_FFFF == 0xFFF1 {
            self.api_task();
        }
        if self.north.ria.halt_requested() {
            self.halted = true;
        }
    }

    // ---- API doorbell ----------------------------------------------

    fn xstack_pop(&mut self) -> u8 {
        self.north.ria.read(0xFFF0)
    }

    /// Service a latched API operation. Arguments were pushed onto the
    /// xstack in order, so they pop in reverse.
    fn api_task(&mut self) {
        let Some(op) = self.north.ria.api_pending_op() else {
            return;
        };
        match op {
            API_OP_XREG => {
                let value = self.xstack_pop();
                let reg = self.xstack_pop();
                let device = self.xstack_pop();
                match device {
                    PIX_DEV_VPU => self.vpu_reg_write(reg, value),
                    PIX_DEV_SPU => self.sound.reg_write(reg, value),
                    _ => {}
                }
                self.north.ria.api_return_ax(0);
            }
            API_OP_XREG_READ => {
                let reg = self.xstack_pop();
                let device = self.xstack_pop();
                let value = match device {
                    PIX_DEV_VPU => self.vpu_reg_read(reg) as u16,
                    PIX_DEV_SPU => self.sound.reg_read(reg) as u16,
                    _ => 0xFFFF,
                };
                self.north.ria.api_return_ax(value);
            }
            API_OP_OEM_CODEPAGE => {
                let lo = self.xstack_pop();
                let hi = self.xstack_pop();
                self.north.pix.send_request(
                    &mut self.link,
                    x65_core::pix::ReqType::DevCmd,
                    &[
                        x65_core::pix::pix_device_cmd(
                            PIX_DEV_VPU,
                            x65_core::pix::PIX_VPU_CMD_SET_CODE_PAGE,
                        ),
                        lo,
                        hi,
                    ],
                    false,
                );
                self.pump_pix();
                self.north.ria.api_return_ax(0);
            }
            API_OP_OEM_GET_CHARGEN => {
                let lo = self.xstack_pop();
                let hi = self.xstack_pop();
                self.north.pix.send_request(
                    &mut self.link,
                    x65_core::pix::ReqType::DevCmd,
                    &[
                        x65_core::pix::pix_device_cmd(
                            PIX_DEV_VPU,
                            x65_core::pix::PIX_VPU_CMD_GET_CHARGEN,
                        ),
                        lo,
                        hi,
                    ],
                    true,
                );
                self.pump_pix();
                let value = self
                    .north
                    .pix
                    .take_response()
                    .map(pix_reply_payload)
                    .unwrap_or(0);
                self.north.ria.api_return_ax(value);
            }
            _ => {
                self.north.ria.api_set_errno(API_ENOSYS);
                self.north.ria.api_return_ax(0xFFFF);
            }
        }
    }

    // ---- scanline clock --------------------------------------------

    /// Advance one scanline: idle PIX work (DMA streaming runs to
    /// completion within the line), render, and pace the synthesizer.
    pub fn run_line(&mut self) {
        if self.halted {
            return;
        }
        let now = self.now_us();
        self.north.ria.set_clock_us(now);

        loop {
            if let Err(err) = self.north.pix_task(&mut self.link, now) {
                log::error!("PIX failed: {err}");
                self.halted = true;
                return;
            }
            self.pump_pix();
            if self.halted {
                return;
            }
            if !self.north.pix.dma_active() {
                break;
            }
        }

        let y = self.next_line;
        self.south.cgia.render_line(y);
        let row = &mut self.framebuffer
            [y as usize * DISPLAY_WIDTH_PX..(y as usize + 1) * DISPLAY_WIDTH_PX];
        row.copy_from_slice(self.south.cgia.line_pixels());

        // One stereo sample per I²S slot at the internal rate.
        self.audio_acc += SGU_INTERNAL_RATE_HZ;
        while self.audio_acc >= LINE_RATE_HZ {
            self.audio_acc -= LINE_RATE_HZ;
            let sample = self.sound.tick();
            self.audio.push(sample);
        }

        self.line_counter += 1;
        self.next_line = if (y + 1) as usize >= DISPLAY_HEIGHT_LINES { 0 } else { y + 1 };

        self.api_task();
        if self.north.ria.halt_requested() {
            self.halted = true;
        }
    }

    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// Pixel at (x, y) from the last rendered frame.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.framebuffer[y * DISPLAY_WIDTH_PX + x]
    }
}

impl Bus for X65 {
    type Address = u32;
    type Data = u8;

    fn read(&mut self, _master: BusMaster, addr: u32) -> u8 {
        self.cpu_read(addr)
    }

    fn write(&mut self, _master: BusMaster, addr: u32, data: u8) {
        self.cpu_write(addr, data);
    }

    fn is_halted_for(&self, _master: BusMaster) -> bool {
        self.halted
    }

    fn check_interrupts(&self, _target: BusMaster) -> InterruptState {
        InterruptState {
            nmi: self.south.cgia.nmi(),
            irq: self.north.ria.irqb(),
        }
    }
}

impl Machine for X65 {
    fn display_size(&self) -> (u32, u32) {
        (DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_LINES as u32)
    }

    fn run_frame(&mut self) {
        for _ in 0..DISPLAY_HEIGHT_LINES {
            self.run_line();
        }
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        for (i, &px) in self.framebuffer.iter().enumerate() {
            buffer[i * 3] = (px >> 16) as u8;
            buffer[i * 3 + 1] = (px >> 8) as u8;
            buffer[i * 3 + 2] = px as u8;
        }
    }

    fn drain_audio(&mut self) -> Vec<(i32, i32)> {
        std::mem::take(&mut self.audio)
    }

    fn reset(&mut self) {
        self.north.reset();
        self.south.reset();
        self.sound.reset();
        self.link = PixLink::new();
        self.framebuffer.fill(0);
        self.audio.clear();
        self.audio_acc = 0;
        self.next_line = 0;
        self.line_counter = 0;
        self.halted = false;
    }
}

impl Default for X65 {
    fn default() -> Self {
        Self::new()
    }
}
