pub mod error;
pub mod memory;
pub mod traits;
pub mod unavailable;

pub use error::*;
pub use memory::*;
pub use traits::*;
pub use unavailable::*;
