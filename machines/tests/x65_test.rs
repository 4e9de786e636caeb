use x65_core::core::bus::{Bus, BusMaster};
use x65_core::core::machine::Machine;
use x65_core::device::cgia::vram::VRAM_BCKGND_SLOT;
use x65_core::device::cgia::{font, REG_BACK_COLOR, REG_BCKGND_BANK, REG_INT_ENABLE, REG_INT_STATUS, REG_PLANES};
use x65_core::pix::{ReplyCode, pix_reply_code, pix_reply_payload};
use x65_machines::X65;
use x65_machines::x65::{API_OP_OEM_GET_CHARGEN, API_OP_XREG, API_OP_XREG_READ};

const OFFSET0: u8 = 0x48;
const PLANE0: u8 = 0x50;

fn machine() -> X65 {
    let _ = env_logger::builder().is_test(true).try_init();
    X65::new()
}

fn set_offset0(x65: &mut X65, addr: u16) {
    x65.vpu_reg_write(OFFSET0, addr as u8);
    x65.vpu_reg_write(OFFSET0 + 1, (addr >> 8) as u8);
}

#[test]
fn test_ping_liveness() {
    let mut x65 = machine();
    let reply = x65.ping(&[0xAB]).expect("PONG expected");
    assert_eq!(pix_reply_code(reply), ReplyCode::Pong as u8);
    assert_eq!(pix_reply_payload(reply), 0xAC1);
}

#[test]
fn test_ping_echoes_last_byte_and_length() {
    let mut x65 = machine();
    for len in 1..=32usize {
        let payload: Vec<u8> = (1..=len as u8).collect();
        let reply = x65.ping(&payload).unwrap();
        let expect = ((payload[len - 1] as u16) << 6) | len as u16;
        assert_eq!(pix_reply_payload(reply), expect & 0xFFF, "len {len}");
    }
}

#[test]
fn test_mem_write_mirrors_into_vram() {
    let mut x65 = machine();
    // Page 0 is mirrored from cold boot.
    x65.cpu_write(0x001234, 0x99);
    assert_eq!(x65.cpu_read(0x001234), 0x99);
    assert_eq!(x65.south.cgia.vram.bank(VRAM_BCKGND_SLOT)[0x1234], 0x99);

    // Writes to an unmirrored page leave the mirror untouched.
    x65.cpu_write(0x051234, 0x77);
    assert_eq!(x65.south.cgia.vram.bank(VRAM_BCKGND_SLOT)[0x1234], 0x99);
    assert!(!x65.halted());
}

#[test]
fn test_math_accelerator_over_bus() {
    let mut x65 = machine();
    x65.cpu_write(0xFFC0, 0x34);
    x65.cpu_write(0xFFC1, 0x12);
    x65.cpu_write(0xFFC2, 0x10);
    x65.cpu_write(0xFFC3, 0x00);
    // Low 16 bits of 0x1234 * 0x0010 = 0x2340.
    assert_eq!(x65.cpu_read(0xFFC4), 0x40);
    assert_eq!(x65.cpu_read(0xFFC5), 0x23);
    // 0x1234 / 0x0010 = 0x0123.
    assert_eq!(x65.cpu_read(0xFFC6), 0x23);
    assert_eq!(x65.cpu_read(0xFFC7), 0x01);
}

#[test]
fn test_unmapped_io_reads_ff() {
    let mut x65 = machine();
    assert_eq!(x65.cpu_read(0x00FF00), 0xFF);
    assert_eq!(x65.cpu_read(0x00FFBF), 0xFF);
}

#[test]
fn test_monotonic_clock_advances() {
    let mut x65 = machine();
    x65.run_frame();
    x65.run_frame();
    let us = u32::from_le_bytes([
        x65.cpu_read(0xFFC8),
        x65.cpu_read(0xFFC9),
        x65.cpu_read(0xFFCA),
        x65.cpu_read(0xFFCB),
    ]);
    // Two frames at 60 Hz land a bit past 33 ms.
    assert!((30_000..40_000).contains(&us), "clock reads {us} µs");
}

#[test]
fn test_api_xreg_routes_to_vpu() {
    let mut x65 = machine();
    // Push (device, reg, value), ring the doorbell.
    x65.cpu_write(0xFFF0, 1); // VPU
    x65.cpu_write(0xFFF0, REG_BACK_COLOR);
    x65.cpu_write(0xFFF0, 7);
    x65.cpu_write(0xFFF1, API_OP_XREG);

    assert_eq!(x65.cpu_read(0xFFF3), 0x00, "op must complete");
    assert_eq!(x65.vpu_reg_read(REG_BACK_COLOR), 7);

    // And read it back through the API.
    x65.cpu_write(0xFFF0, 1);
    x65.cpu_write(0xFFF0, REG_BACK_COLOR);
    x65.cpu_write(0xFFF1, API_OP_XREG_READ);
    assert_eq!(x65.cpu_read(0xFFF4), 7);
    assert_eq!(x65.cpu_read(0xFFF5), 0);
}

#[test]
fn test_api_xreg_routes_to_sgu_window() {
    let mut x65 = machine();
    // Select channel 3 through SPECIAL2, then set its volume.
    x65.cpu_write(0xFFF0, 2); // SPU
    x65.cpu_write(0xFFF0, 0x1F); // SPECIAL2
    x65.cpu_write(0xFFF0, 3);
    x65.cpu_write(0xFFF1, API_OP_XREG);

    x65.cpu_write(0xFFF0, 2);
    x65.cpu_write(0xFFF0, 0x02); // VOL
    x65.cpu_write(0xFFF0, 0x40);
    x65.cpu_write(0xFFF1, API_OP_XREG);

    assert_eq!(x65.sound.sgu.read((3 * 64 + 0x02) as u16), 0x40);
}

#[test]
fn test_api_get_chargen() {
    let mut x65 = machine();
    let index = (b'A' as u16) << 3;
    x65.cpu_write(0xFFF0, (index >> 8) as u8);
    x65.cpu_write(0xFFF0, index as u8);
    x65.cpu_write(0xFFF1, API_OP_OEM_GET_CHARGEN);
    assert_eq!(x65.cpu_read(0xFFF4), font::glyph(b'A')[0]);
}

#[test]
fn test_api_halt_stops_machine() {
    let mut x65 = machine();
    x65.cpu_write(0xFFF1, 0xFF);
    assert!(x65.halted());
    assert!(x65.is_halted_for(BusMaster::Cpu));

    // A halted machine stops producing frames.
    let before = x65.framebuffer().to_vec();
    x65.run_frame();
    assert_eq!(x65.framebuffer(), &before[..]);
}

#[test]
fn test_bank_switch_streams_new_page() {
    let mut x65 = machine();
    // Seed PSRAM page 5 with a pattern (not mirrored yet).
    for i in 0..256u32 {
        x65.cpu_write(0x050000 + i, (i as u8) ^ 0x5A);
    }
    assert_ne!(x65.south.cgia.vram.bank(VRAM_BCKGND_SLOT)[0], 0x5A);

    // Selecting the page answers the next idle reply with DMA_REQ and the
    // master streams 2048 rows; it all completes within one scanline.
    x65.vpu_reg_write(REG_BCKGND_BANK, 5);
    x65.run_line();

    assert!(x65.south.cgia.vram.synced(VRAM_BCKGND_SLOT));
    for i in 0..256usize {
        assert_eq!(
            x65.south.cgia.vram.bank(VRAM_BCKGND_SLOT)[i],
            (i as u8) ^ 0x5A,
            "byte {i}"
        );
    }
    assert!(!x65.halted());
}

#[test]
fn test_text_frame_end_to_end() {
    let mut x65 = machine();

    // Display list and scan data go in through normal RAM writes; the PIX
    // mirror keeps the VRAM copy coherent.
    let dl: [u8; 19] = [
        0x70, 0x70, 0x30, // 20 blank lines
        0xF3, 0x00, 0x00, 0x00, 0x10, 0x00, 0x20, 0x00, 0x30, // scans
        0x0A, 0x0A, 0x0A, 0x0A, // four MODE2 rows
        0x82, 0x00, 0x00, // stop until VBL
    ];
    for (i, &b) in dl.iter().enumerate() {
        x65.cpu_write(i as u32, b);
    }
    for i in 0..0x100u32 {
        x65.cpu_write(0x1000 + i, 3); // colour cells
        x65.cpu_write(0x2000 + i, 5); // background cells
    }
    for i in 0..0x800u32 {
        x65.cpu_write(0x3000 + i, 0xF0); // chargen rows
    }

    x65.vpu_reg_write(REG_BACK_COLOR, 2);
    x65.vpu_reg_write(PLANE0 + 2, 7); // row height
    set_offset0(&mut x65, 0x0000);
    x65.vpu_reg_write(REG_PLANES, 0x01);

    x65.run_frame();

    let pal = *x65.south.cgia.palette();
    for y in 0..20 {
        assert_eq!(x65.pixel(0, y), pal[2], "blank line {y}");
        assert_eq!(x65.pixel(200, y), pal[2], "blank line {y}");
    }
    for y in 20..28 {
        assert_eq!(x65.pixel(0, y), pal[3], "glyph fg at line {y}");
        assert_eq!(x65.pixel(4, y), pal[5], "glyph bg at line {y}");
    }
    // After the JMP-and-wait, the rest of the frame is border fill.
    for y in 52..240 {
        assert_eq!(x65.pixel(100, y), pal[2], "waiting line {y}");
    }
}

#[test]
fn test_sprite_frame_end_to_end() {
    let mut x65 = machine();

    let dsc: [u8; 16] = [
        10, 0, 50, 0, 4, 0, 0, 0, // pos (10, 50), 4 lines, 1 byte wide
        7, 7, 7, 0, // colors
        0x00, 0x09, 0x00, 0x08, // data at 0x0900, next: itself
    ];
    for (i, &b) in dsc.iter().enumerate() {
        x65.cpu_write(0x0800 + i as u32, b);
    }
    for i in 0..4u32 {
        x65.cpu_write(0x0900 + i, 0xFF);
    }

    set_offset0(&mut x65, 0x0800);
    x65.vpu_reg_write(PLANE0, 0x01); // sprite 0 active
    x65.vpu_reg_write(REG_PLANES, 0x11); // plane 0 enabled, sprite type

    x65.run_frame();

    let pal = *x65.south.cgia.palette();
    assert_eq!(x65.pixel(10, 49), pal[0]);
    for y in 50..54 {
        assert_eq!(x65.pixel(9, y), pal[0], "line {y} left of sprite");
        for x in 10..18 {
            assert_eq!(x65.pixel(x, y), pal[7], "line {y} sprite pixel {x}");
        }
        assert_eq!(x65.pixel(18, y), pal[0], "line {y} right of sprite");
    }
    assert_eq!(x65.pixel(10, 54), pal[0]);
}

#[test]
fn test_vbi_drives_nmi_line() {
    let mut x65 = machine();
    x65.vpu_reg_write(REG_INT_ENABLE, 0x80);
    assert!(!x65.check_interrupts(BusMaster::Cpu).nmi);

    x65.run_line(); // renders line 0
    assert!(x65.check_interrupts(BusMaster::Cpu).nmi);

    // Acknowledging through INT_STATUS drops the line.
    x65.vpu_reg_write(REG_INT_STATUS, 0);
    assert!(!x65.check_interrupts(BusMaster::Cpu).nmi);
}

#[test]
fn test_video_mode_switch() {
    use x65_machines::south::OutMode;

    let mut x65 = machine();
    assert_eq!(x65.south.out_mode(), OutMode::Vt);
    x65.vpu_run();
    assert_eq!(x65.south.out_mode(), OutMode::Cgia);
    x65.vpu_stop();
    assert_eq!(x65.south.out_mode(), OutMode::Vt);
}

#[test]
fn test_audio_pacing() {
    let mut x65 = machine();
    x65.run_frame();
    let samples = x65.drain_audio();
    // 96 kHz internal rate at 60 Hz: 1600 stereo samples per frame.
    assert_eq!(samples.len(), 1600);
    assert!(x65.drain_audio().is_empty());
}

#[test]
fn test_text_demo_screen() {
    use x65_machines::demo;

    let mut x65 = machine();
    demo::install_text_demo(&mut x65, "HELLO");
    x65.run_frame();

    let pal = *x65.south.cgia.palette();
    // Top border is the backdrop color.
    assert_eq!(x65.pixel(0, 0), pal[0x52]);
    // 'H' occupies cell 0 of the first text row (lines 20..27): its top
    // glyph row is 0x66, so pixel columns 1..2 and 5..6 are lit.
    assert_eq!(x65.pixel(0, 20), pal[0x52]);
    assert_eq!(x65.pixel(1, 20), pal[0x0F]);
    assert_eq!(x65.pixel(2, 20), pal[0x0F]);
    assert_eq!(x65.pixel(3, 20), pal[0x52]);
    // Space cells render pure background.
    assert_eq!(x65.pixel(100, 30), pal[0x52]);
    // The VPU was switched to CGIA output.
    assert_eq!(x65.south.out_mode(), x65_machines::south::OutMode::Cgia);
}

#[test]
fn test_vpu_version_walk() {
    let mut x65 = machine();
    let version = x65.vpu_version();
    assert!(version.starts_with("X65 VPU"), "got {version:?}");
    assert!(!x65.halted());
}

#[test]
fn test_machine_reset() {
    let mut x65 = machine();
    x65.cpu_write(0x001000, 0xAA);
    x65.cpu_write(0xFFF1, 0xFF);
    assert!(x65.halted());

    x65.reset();
    assert!(!x65.halted());
    assert_eq!(x65.cpu_read(0x001000), 0x00);
    assert_eq!(x65.display_size(), (384, 240));
}
