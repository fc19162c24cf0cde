mod client_type;
mod detection;
mod device_type;
mod result;

pub use client_type::*;
pub use detection::*;
pub use device_type::*;
pub use result::*;
