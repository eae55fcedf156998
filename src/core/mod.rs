pub mod classifier;
pub mod ports;
pub mod session;
pub mod types;
