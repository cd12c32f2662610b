//! Cerberus SDR host tools
//!
//! Decodes RFDC ILA CSV captures into IQ samples, and captures IQ samples on
//! the board over SSH with `rx_samples_to_file`.

pub mod acquire;
pub mod cli;
pub mod config;
pub mod ila;
pub mod remote;
pub mod viz;

pub use rustfft::num_complex::Complex64;
