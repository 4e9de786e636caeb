use x65_core::device::Ria;
use x65_core::device::ria::XSTACK_SIZE;

fn write_u16(ria: &mut Ria, addr: u16, value: u16) {
    ria.write(addr, value as u8);
    ria.write(addr + 1, (value >> 8) as u8);
}

#[test]
fn test_multiply_accelerator() {
    let mut ria = Ria::new();
    write_u16(&mut ria, 0xFFC0, 0x1234); // OPERA
    write_u16(&mut ria, 0xFFC2, 0x0010); // OPERB
    // Low 16 bits of 0x1234 * 0x10 = 0x12340.
    assert_eq!(ria.read(0xFFC4), 0x40);
    assert_eq!(ria.read(0xFFC5), 0x23);
}

#[test]
fn test_divide_accelerator() {
    let mut ria = Ria::new();
    write_u16(&mut ria, 0xFFC0, 0x1234);
    write_u16(&mut ria, 0xFFC2, 0x0010);
    assert_eq!(ria.read(0xFFC6), 0x23);
    assert_eq!(ria.read(0xFFC7), 0x01);
}

#[test]
fn test_divide_signed_opera() {
    let mut ria = Ria::new();
    write_u16(&mut ria, 0xFFC0, (-100i16) as u16);
    write_u16(&mut ria, 0xFFC2, 10);
    let div = u16::from_le_bytes([ria.read(0xFFC6), ria.read(0xFFC7)]);
    assert_eq!(div as i16, -10);
}

#[test]
fn test_divide_by_zero() {
    let mut ria = Ria::new();
    write_u16(&mut ria, 0xFFC0, 0x1234);
    write_u16(&mut ria, 0xFFC2, 0);
    assert_eq!(ria.read(0xFFC6), 0xFF);
    assert_eq!(ria.read(0xFFC7), 0xFF);
}

#[test]
fn test_monotonic_clock_bytes() {
    let mut ria = Ria::new();
    ria.set_clock_us(0x0000_1234_5678_9ABC);
    assert_eq!(ria.read(0xFFC8), 0xBC);
    assert_eq!(ria.read(0xFFC9), 0x9A);
    assert_eq!(ria.read(0xFFCA), 0x78);
    assert_eq!(ria.read(0xFFCB), 0x56);
    assert_eq!(ria.read(0xFFCC), 0x34);
    assert_eq!(ria.read(0xFFCD), 0x12);
}

#[test]
fn test_unused_cells_read_ff() {
    let mut ria = Ria::new();
    assert_eq!(ria.read(0xFFCE), 0xFF);
    assert_eq!(ria.read(0xFFCF), 0xFF);
    assert_eq!(ria.read(0xFFED), 0xFF);
}

#[test]
fn test_xstack_push_pop() {
    let mut ria = Ria::new();
    ria.write(0xFFF0, 0x11);
    ria.write(0xFFF0, 0x22);
    ria.write(0xFFF0, 0x33);
    assert_eq!(ria.read(0xFFF0), 0x33);
    assert_eq!(ria.read(0xFFF0), 0x22);
    assert_eq!(ria.read(0xFFF0), 0x11);
    // Empty stack pops the guard zero.
    assert_eq!(ria.read(0xFFF0), 0x00);
}

#[test]
fn test_xstack_saturates_when_full() {
    let mut ria = Ria::new();
    for i in 0..XSTACK_SIZE {
        ria.write(0xFFF0, i as u8);
    }
    // Further pushes are dropped.
    ria.write(0xFFF0, 0xEE);
    // The top of a full stack is the last accepted byte.
    assert_eq!(ria.read(0xFFF0), (XSTACK_SIZE - 1) as u8);
}

#[test]
fn test_api_zxstack() {
    let mut ria = Ria::new();
    ria.write(0xFFF0, 0x42);
    ria.write(0xFFF1, 0x00); // ZXSTACK
    // Handled immediately: stack emptied, not busy, returns 0.
    assert_eq!(ria.read(0xFFF3), 0x00);
    assert_eq!(ria.read(0xFFF0), 0x00);
    assert_eq!(ria.read(0xFFF4), 0x00);
}

#[test]
fn test_api_doorbell_latches() {
    let mut ria = Ria::new();
    ria.write(0xFFF1, 0x21);
    assert_eq!(ria.read(0xFFF1), 0x21);
    assert_eq!(ria.read(0xFFF3) & 0x80, 0x80); // busy
    assert_eq!(ria.api_pending_op(), Some(0x21));

    ria.api_return_ax(0x1234);
    assert_eq!(ria.read(0xFFF3), 0x00);
    assert_eq!(ria.read(0xFFF4), 0x34);
    assert_eq!(ria.read(0xFFF5), 0x12);
}

#[test]
fn test_api_halt() {
    let mut ria = Ria::new();
    assert!(!ria.halt_requested());
    ria.write(0xFFF1, 0xFF);
    assert!(ria.halt_requested());
}

#[test]
fn test_uart_flow() {
    let mut ria = Ria::new();
    // Nothing received: rx-ready clear, tx writable.
    assert_eq!(ria.read(0xFFE0), 0b1000_0000);
    assert_eq!(ria.read(0xFFE1), 0);

    ria.uart_feed(b'X');
    assert_eq!(ria.read(0xFFE0), 0b1100_0000);
    assert_eq!(ria.read(0xFFE1), b'X');
    assert_eq!(ria.read(0xFFE0), 0b1000_0000);

    ria.write(0xFFE1, b'O');
    ria.write(0xFFE1, b'K');
    assert_eq!(ria.uart_take_tx(), b"OK");
}

#[test]
fn test_irq_enable_and_ack() {
    let mut ria = Ria::new();
    ria.set_irq(0x01);
    assert!(!ria.irqb(), "masked source must not assert");

    ria.write(0xFFEC, 0x01);
    ria.set_irq(0x01);
    assert!(ria.irqb());

    // Reading IRQ ACK deasserts the line.
    ria.read(0xFFEC);
    assert!(!ria.irqb());
}

#[test]
fn test_random_bytes_vary() {
    let mut ria = Ria::new();
    let mut values = std::collections::HashSet::new();
    for _ in 0..64 {
        values.insert(ria.read(0xFFE2));
        values.insert(ria.read(0xFFE3));
    }
    assert!(values.len() > 8);
}
