pub mod app_state;
pub mod device;
pub mod loglevel;
pub mod params;
pub mod poll;
pub mod settings;
pub mod snapshot;
pub mod solar;
pub mod utils;
