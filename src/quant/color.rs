//! Perceptual color space used internally by the quantizer.
//!
//! All interior math runs in this space: a 4-tuple of `f64`s scaled by
//! [`SCALE`], with RGB optionally premultiplied by alpha. This matches
//! `ExqColor` / `_EXQ_SCALE_*` in the original ExoQuant port.

/// Per-channel weights applied when a raw byte channel is brought into
/// perceptual space.
pub const SCALE: PerceptualColor = PerceptualColor { r: 1.0, g: 1.2, b: 0.8, a: 1.0 };

/// A color in the quantizer's internal working space.
///
/// Unlike a raw RGBA pixel, the components here are weighted by [`SCALE`]
/// and, in transparency mode, the RGB components are premultiplied by `a`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerceptualColor {
	pub r: f64,
	pub g: f64,
	pub b: f64,
	pub a: f64,
}

impl PerceptualColor {
	pub const ZERO: PerceptualColor = PerceptualColor { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

	/// Brings raw, already channel-masked byte channels into perceptual
	/// space, applying [`SCALE`] and, if `transparency` is set,
	/// premultiplying RGB by alpha.
	pub fn from_channels(r: u8, g: u8, b: u8, a: u8, transparency: bool) -> PerceptualColor {
		let mut c = PerceptualColor {
			r: r as f64 / 255.0 * SCALE.r,
			g: g as f64 / 255.0 * SCALE.g,
			b: b as f64 / 255.0 * SCALE.b,
			a: a as f64 / 255.0 * SCALE.a,
		};
		if transparency {
			c.r *= c.a;
			c.g *= c.a;
			c.b *= c.a;
		}
		c
	}

	pub fn add(self, other: PerceptualColor) -> PerceptualColor {
		PerceptualColor {
			r: self.r + other.r,
			g: self.g + other.g,
			b: self.b + other.b,
			a: self.a + other.a,
		}
	}

	pub fn sub(self, other: PerceptualColor) -> PerceptualColor {
		PerceptualColor {
			r: self.r - other.r,
			g: self.g - other.g,
			b: self.b - other.b,
			a: self.a - other.a,
		}
	}

	pub fn scale(self, n: f64) -> PerceptualColor {
		PerceptualColor { r: self.r * n, g: self.g * n, b: self.b * n, a: self.a * n }
	}

	/// Componentwise absolute value.
	pub fn abs(self) -> PerceptualColor {
		PerceptualColor { r: self.r.abs(), g: self.g.abs(), b: self.b.abs(), a: self.a.abs() }
	}

	pub fn dot(self, other: PerceptualColor) -> f64 {
		self.r * other.r + self.g * other.g + self.b * other.b + self.a * other.a
	}

	pub fn length_squared(self) -> f64 {
		self.dot(self)
	}

	/// Squared Euclidean distance between two perceptual colors.
	pub fn distance_squared(self, other: PerceptualColor) -> f64 {
		self.sub(other).length_squared()
	}

	/// Scales by a per-channel vector instead of a scalar.
	pub fn mul_componentwise(self, other: PerceptualColor) -> PerceptualColor {
		PerceptualColor { r: self.r * other.r, g: self.g * other.g, b: self.b * other.b, a: self.a * other.a }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn premultiplies_rgb_by_alpha() {
		let c = PerceptualColor::from_channels(200, 100, 50, 0, true);
		assert_eq!(c.r, 0.0);
		assert_eq!(c.g, 0.0);
		assert_eq!(c.b, 0.0);
		assert_eq!(c.a, 0.0);
	}

	#[test]
	fn leaves_rgb_alone_without_transparency() {
		let c = PerceptualColor::from_channels(255, 255, 255, 0, false);
		assert!((c.r - SCALE.r).abs() < 1e-9);
		assert!((c.g - SCALE.g).abs() < 1e-9);
		assert!((c.b - SCALE.b).abs() < 1e-9);
		assert_eq!(c.a, 0.0);
	}
}
