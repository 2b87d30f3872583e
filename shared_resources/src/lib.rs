pub mod audio;
pub mod config;
pub mod control;
