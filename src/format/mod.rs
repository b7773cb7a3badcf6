//! Texture format and output-size vocabulary, plus the encoding adapters
//! that turn quantizer output into N64-ready byte streams.

mod text;
mod texture;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use text::emit_c_array;
pub use texture::{encode_direct, encode_indexed};

/// The seven pixel formats the original tool supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
	Rgba16,
	Rgba32,
	Ia4,
	Ia8,
	Ia16,
	Ci4,
	Ci8,
}

impl TextureFormat {
	pub const ALL: [TextureFormat; 7] = [
		TextureFormat::Rgba16,
		TextureFormat::Rgba32,
		TextureFormat::Ia4,
		TextureFormat::Ia8,
		TextureFormat::Ia16,
		TextureFormat::Ci4,
		TextureFormat::Ci8,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			TextureFormat::Rgba16 => "RGBA16",
			TextureFormat::Rgba32 => "RGBA32",
			TextureFormat::Ia4 => "IA4",
			TextureFormat::Ia8 => "IA8",
			TextureFormat::Ia16 => "IA16",
			TextureFormat::Ci4 => "CI4",
			TextureFormat::Ci8 => "CI8",
		}
	}

	pub fn is_indexed(&self) -> bool {
		matches!(self, TextureFormat::Ci4 | TextureFormat::Ci8)
	}
}

impl fmt::Display for TextureFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for TextureFormat {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"RGBA16" => Ok(TextureFormat::Rgba16),
			"RGBA32" => Ok(TextureFormat::Rgba32),
			"IA4" => Ok(TextureFormat::Ia4),
			"IA8" => Ok(TextureFormat::Ia8),
			"IA16" => Ok(TextureFormat::Ia16),
			"CI4" => Ok(TextureFormat::Ci4),
			"CI8" => Ok(TextureFormat::Ci8),
			other => Err(ParseError::UnknownFormat(other.to_string())),
		}
	}
}

/// The element width requested for the emitted C array: one, two, or four
/// bytes per entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputSize {
	U8,
	U16,
	U32,
}

impl OutputSize {
	pub const ALL: [OutputSize; 3] = [OutputSize::U8, OutputSize::U16, OutputSize::U32];

	pub fn bytes(&self) -> usize {
		match self {
			OutputSize::U8 => 1,
			OutputSize::U16 => 2,
			OutputSize::U32 => 4,
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			OutputSize::U8 => "U8",
			OutputSize::U16 => "U16",
			OutputSize::U32 => "U32",
		}
	}

	pub fn c_type(&self) -> &'static str {
		match self {
			OutputSize::U8 => "u8",
			OutputSize::U16 => "u16",
			OutputSize::U32 => "u32",
		}
	}
}

impl fmt::Display for OutputSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for OutputSize {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"U8" => Ok(OutputSize::U8),
			"U16" => Ok(OutputSize::U16),
			"U32" => Ok(OutputSize::U32),
			other => Err(ParseError::UnknownSize(other.to_string())),
		}
	}
}

#[derive(Debug, Error)]
pub enum ParseError {
	#[error("unknown texture format '{0}'")]
	UnknownFormat(String),
	#[error("unknown output size '{0}'")]
	UnknownSize(String),
}

/// Collapses a filename stem to a valid C identifier fragment: spaces
/// become underscores, everything else outside `[0-9a-zA-Z_]` is dropped.
pub fn sanitize_identifier(name: &str) -> String {
	name.chars()
		.map(|c| if c == ' ' { '_' } else { c })
		.filter(|c| c.is_ascii_alphanumeric() || *c == '_')
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_formats_case_insensitively() {
		assert_eq!("ci4".parse::<TextureFormat>().unwrap(), TextureFormat::Ci4);
		assert_eq!("Rgba32".parse::<TextureFormat>().unwrap(), TextureFormat::Rgba32);
	}

	#[test]
	fn rejects_unknown_format() {
		assert!("xyz".parse::<TextureFormat>().is_err());
	}

	#[test]
	fn sanitizes_identifiers() {
		assert_eq!(sanitize_identifier("my texture-v2!.png"), "my_texturev2png");
	}
}
