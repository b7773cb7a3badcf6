pub mod format;
pub mod quant;

pub use quant::{PerceptualColor, QuantizeError, Quantizer};
