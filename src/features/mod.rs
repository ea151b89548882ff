//! Correlation features of a series.

pub mod autocorrelation;

pub use autocorrelation::{acf, pacf, white_noise_bound};
