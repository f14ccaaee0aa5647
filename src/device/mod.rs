mod description;
mod time_device;

pub use description::*;
pub use time_device::*;
