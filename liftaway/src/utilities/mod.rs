pub mod debug;
pub mod error;
pub mod logging;
pub mod status;
#[cfg(test)]
pub mod testing;
