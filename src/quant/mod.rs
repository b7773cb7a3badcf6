//! Adaptive color quantizer: an arena-based Rust port of the ExoQuant v0.7
//! variance-maximizing color-space splitting algorithm.
//!
//! Typical use:
//!
//! ```no_run
//! use n64texconv::quant::Quantizer;
//!
//! let mut q = Quantizer::new();
//! q.feed(&[255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
//! q.quantize(2);
//! let palette = q.get_palette(2);
//! let indices = q.map_image_ordered(2, 1, &[255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
//! assert_eq!(palette.len(), 8);
//! assert_eq!(indices.len(), 2);
//! ```

mod color;
mod error;
mod histogram;
mod map;
mod node;
mod quantizer;

pub use color::PerceptualColor;
pub use error::QuantizeError;
pub use quantizer::Quantizer;

pub type Result<T> = std::result::Result<T, QuantizeError>;
