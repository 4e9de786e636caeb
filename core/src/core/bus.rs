/// Identifies who is accessing the bus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusMaster {
    Cpu, // the 65C816-facing front end
    Pix, // PIX DMA pulls (cache-row fetches for the VRAM mirror)
}

/// Generic bus interface for the 24-bit flat address space.
///
/// The CPU front end is out of scope; a trusted caller supplies
/// `(addr24, data, rw)` transactions through this trait.
pub trait Bus {
    type Address: Copy + Into<u64>; // u32 for the 24-bit space
    type Data; // u8

    fn read(&mut self, master: BusMaster, addr: Self::Address) -> Self::Data;
    fn write(&mut self, master: BusMaster, addr: Self::Address, data: Self::Data);

    /// Check if the bus is halted for this master (RESB held, PIX dead,
    /// API halt doorbell). Returns true if the master must pause.
    fn is_halted_for(&self, master: BusMaster) -> bool;

    /// Generic interrupt query.
    fn check_interrupts(&self, target: BusMaster) -> InterruptState;
}

#[derive(Default, Clone, Copy, Debug)]
pub struct InterruptState {
    pub nmi: bool, // CGIA raster/DL/VBL interrupts
    pub irq: bool, // RIA IRQB sources
}
