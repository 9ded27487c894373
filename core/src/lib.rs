mod device;
pub mod error;
mod resource;

pub use device::*;
pub use resource::*;

pub static CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
