//! Per-format pixel encoders. Each takes a flat RGBA8 buffer (row-major,
//! four bytes per pixel) and produces the byte stream for that texture
//! format.

use crate::quant::{QuantizeError, Quantizer};

/// Scales a 5-bit channel back up to 8 bits: `x * 255 / 31`.
fn scale5_to_8(x: u8) -> u8 {
	((x as u32 * 0xFF) / 0x1F) as u8
}

/// Truncates an 8-bit channel down to 5 bits: `x * 31 / 255`.
fn clamp8_to_5(x: u8) -> u8 {
	(((x as u32) * 0x1F) / 0xFF) as u8
}

/// Packs a pixel into 5551 (5-bit R, G, B; 1-bit A, opaque iff `a == 255`).
fn to5551(r: u8, g: u8, b: u8, a: u8) -> u16 {
	let r5 = clamp8_to_5(r) as u16;
	let g5 = clamp8_to_5(g) as u16;
	let b5 = clamp8_to_5(b) as u16;
	let abit: u16 = if a == 255 { 1 } else { 0 };
	(r5 << 11) | (g5 << 6) | (b5 << 1) | abit
}

/// Round-trips a pixel through 5551, approximating what it will look like
/// once actually packed as RGBA16. Used to pre-snap pixels before indexed
/// quantization so the palette is chosen against the format's own gamut.
fn snap_to_5551(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
	let packed = to5551(r, g, b, a);
	let r5 = (packed >> 11) & 0x1F;
	let g5 = (packed >> 6) & 0x1F;
	let b5 = (packed >> 1) & 0x1F;
	let abit = packed & 1;
	(scale5_to_8(r5 as u8), scale5_to_8(g5 as u8), scale5_to_8(b5 as u8), if abit == 0 { 0 } else { 255 })
}

fn intensity(r: u8, g: u8, b: u8) -> f64 {
	r.max(g).max(b) as f64 / 255.0
}

/// Encodes every non-indexed format: RGBA16, RGBA32, IA4, IA8, IA16.
pub fn encode_direct(format: super::TextureFormat, pixels: &[u8]) -> Vec<u8> {
	use super::TextureFormat::*;
	match format {
		Rgba16 => pixels
			.chunks_exact(4)
			.flat_map(|p| {
				let packed = to5551(p[0], p[1], p[2], p[3]);
				[(packed >> 8) as u8, (packed & 0xFF) as u8]
			})
			.collect(),
		Rgba32 => pixels.to_vec(),
		Ia4 => {
			let vals: Vec<u8> = pixels
				.chunks_exact(4)
				.map(|p| {
					let i = intensity(p[0], p[1], p[2]);
					let a = p[3] as f64 / 255.0;
					(((i * 7.0) as u8 & 0x7) << 1) | if a > 0.5 { 1 } else { 0 }
				})
				.collect();
			vals.chunks(2).map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0)).collect()
		}
		Ia8 => pixels
			.chunks_exact(4)
			.map(|p| {
				let i = intensity(p[0], p[1], p[2]);
				let a = p[3] as f64 / 255.0;
				(((i * 15.0) as u8 & 0xF) << 4) | ((a * 15.0) as u8 & 0xF)
			})
			.collect(),
		Ia16 => pixels
			.chunks_exact(4)
			.flat_map(|p| {
				let i = intensity(p[0], p[1], p[2]);
				[((i * 255.0) as u8), p[3]]
			})
			.collect(),
		Ci4 | Ci8 => unreachable!("indexed formats go through encode_indexed"),
	}
}

/// Quantizes `pixels` down to the format's color depth (16 for CI4, 256 for
/// CI8) and returns `(palette_rgba16_bytes, index_bytes)`.
///
/// Pixels are first snapped to their RGBA16 equivalents so the palette is
/// chosen against the same gamut the final texture will actually use.
pub fn encode_indexed(
	format: super::TextureFormat,
	pixels: &[u8],
	width: u32,
	height: u32,
) -> Result<(Vec<u8>, Vec<u8>), QuantizeError> {
	let depth = match format {
		super::TextureFormat::Ci4 => 16,
		super::TextureFormat::Ci8 => 256,
		_ => unreachable!("only CI4/CI8 are indexed"),
	};
	log::info!("encoding {}x{} image as {} ({} colors)", width, height, format, depth);

	let snapped: Vec<u8> = pixels
		.chunks_exact(4)
		.flat_map(|p| {
			let (r, g, b, a) = snap_to_5551(p[0], p[1], p[2], p[3]);
			[r, g, b, a]
		})
		.collect();

	let mut q = Quantizer::new();
	q.feed(&snapped)?;
	q.quantize(depth);
	let palette = q.get_palette(depth);
	let indices = q.map_image_ordered(width as usize, height as usize, &snapped)?;

	let pal_5551: Vec<u8> = palette
		.chunks_exact(4)
		.flat_map(|p| {
			let packed = to5551(p[0], p[1], p[2], p[3]);
			[(packed >> 8) as u8, (packed & 0xFF) as u8]
		})
		.collect();

	let index_bytes: Vec<u8> = if format == super::TextureFormat::Ci8 {
		indices.iter().map(|&i| i as u8).collect()
	} else {
		indices.chunks(2).map(|pair| ((pair[0] as u8) << 4) | pair.get(1).map(|&x| x as u8).unwrap_or(0)).collect()
	};

	Ok((pal_5551, index_bytes))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::format::TextureFormat;

	#[test]
	fn rgba32_is_a_passthrough() {
		let pixels = [1, 2, 3, 4, 5, 6, 7, 8];
		assert_eq!(encode_direct(TextureFormat::Rgba32, &pixels), pixels);
	}

	#[test]
	fn rgba16_packs_two_bytes_per_pixel() {
		let pixels = [255, 255, 255, 255, 0, 0, 0, 0];
		let out = encode_direct(TextureFormat::Rgba16, &pixels);
		assert_eq!(out.len(), 4);
		assert_eq!(out[0], 0xFF);
		assert_eq!(out[1], 0xFF);
	}

	#[test]
	fn ia4_packs_two_pixels_per_byte() {
		let pixels = [255, 255, 255, 255, 0, 0, 0, 255];
		let out = encode_direct(TextureFormat::Ia4, &pixels);
		assert_eq!(out.len(), 1);
	}

	#[test]
	fn ci4_quantizes_to_sixteen_colors_or_fewer() {
		let mut pixels = Vec::new();
		for i in 0..16u8 {
			pixels.extend_from_slice(&[i * 16, 0, 0, 255]);
		}
		let (pal, idx) = encode_indexed(TextureFormat::Ci4, &pixels, 16, 1).unwrap();
		assert!(pal.len() <= 16 * 2);
		assert_eq!(idx.len(), 8); // 16 indices, 2 per byte
	}
}
