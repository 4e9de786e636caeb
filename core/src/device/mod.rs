pub mod cgia;
pub mod l2_cache;
pub mod ria;
pub mod sgu;

pub use cgia::Cgia;
pub use l2_cache::Memory;
pub use ria::Ria;
pub use sgu::Sgu;
