pub mod core;
pub mod device;
pub mod pix;

pub mod prelude {
    pub use crate::core::machine::Machine;
    pub use crate::core::{Bus, BusMaster, bus::InterruptState};
}
