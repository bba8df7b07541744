pub mod config;
pub mod memory;
pub mod traits;

pub use config::*;
pub use memory::*;
pub use traits::*;
