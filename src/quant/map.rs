//! Maps already-quantized pixels to palette indices: a plain nearest-color
//! mapper and a Bayer-ordered dithered mapper, both backed by the same
//! per-histogram-entry caches so repeated pixels are free after the first
//! lookup.

use super::color::PerceptualColor;
use super::error::QuantizeError;
use super::node::NodePool;
use super::quantizer::Quantizer;

/// Linear scan for the node whose mean is nearest `color`. The original's
/// fixed initial threshold of 16 (squared perceptual units) means a pixel
/// further than that from every node maps to node 0. Ties favor the lowest
/// index.
pub(crate) fn find_nearest_color(nodes: &NodePool, color: PerceptualColor) -> usize {
	let mut best_v = 16.0;
	let mut best_i = 0;
	for i in 0..nodes.len() {
		let d = color.distance_squared(nodes.get(i).avg);
		if d < best_v {
			best_v = d;
			best_i = i;
		}
	}
	best_i
}

/// Bayer 2x2 dither weights, indexed by `(x & 1) + (y & 1) * 2`.
const DITHER_MATRIX: [f64; 4] = [-0.375, 0.125, 0.375, -0.125];

impl Quantizer {
	/// Maps each pixel in `data` to the index of its nearest palette entry.
	/// No dithering; every occurrence of the same RGBA quad maps to the
	/// same index.
	pub fn map_image(&mut self, data: &[u8]) -> Result<Vec<u32>, QuantizeError> {
		if data.len() % 4 != 0 {
			return Err(QuantizeError::InvalidBufferLength(data.len()));
		}
		self.ensure_optimized();

		let n_pixels = data.len() / 4;
		let mut out = vec![0u32; n_pixels];
		for i in 0..n_pixels {
			let (r, g, b, a) = (data[i * 4], data[i * 4 + 1], data[i * 4 + 2], data[i * 4 + 3]);
			let hist_idx = self.hist.find(r, g, b, a);
			if let Some(cached) = hist_idx.and_then(|h| self.hist.get(h).pal_index) {
				out[i] = cached;
				continue;
			}
			let color = PerceptualColor::from_channels(r, g, b, a, self.transparency);
			let idx = find_nearest_color(&self.nodes, color) as u32;
			out[i] = idx;
			if let Some(h) = hist_idx {
				self.hist.get_mut(h).pal_index = Some(idx);
			}
		}
		Ok(out)
	}

	/// Maps `data` (a `width * height` RGBA buffer) to palette indices using
	/// ordered (Bayer 2x2) dithering. Each histogram entry learns a dither
	/// scale the first time it's seen (probed by nudging the color toward
	/// and away from its nearest neighbor), then reuses it for every
	/// occurrence and every Bayer cell.
	pub fn map_image_ordered(&mut self, width: usize, height: usize, data: &[u8]) -> Result<Vec<u32>, QuantizeError> {
		let expected = width * height;
		let actual = data.len() / 4;
		if expected != actual {
			return Err(QuantizeError::DimensionMismatch { expected, actual });
		}
		self.ensure_optimized();

		let mut out = vec![0u32; expected];
		for y in 0..height {
			for x in 0..width {
				let index = y * width + x;
				let d = (x & 1) + (y & 1) * 2;
				let (r, g, b, a) =
					(data[index * 4], data[index * 4 + 1], data[index * 4 + 2], data[index * 4 + 3]);
				let hist_idx = self.hist.find(r, g, b, a);
				let p = PerceptualColor::from_channels(r, g, b, a, self.transparency);

				let scale = match hist_idx.and_then(|h| self.hist.get(h).dither_scale) {
					Some(s) => s,
					None => {
						let s = self.derive_dither_scale(p);
						if let Some(h) = hist_idx {
							self.hist.get_mut(h).dither_scale = Some(s);
						}
						s
					}
				};

				if let Some(cached) = hist_idx.and_then(|h| self.hist.get(h).dither_index[d]) {
					out[index] = cached;
					continue;
				}

				let tmp = p.add(scale.scale(DITHER_MATRIX[d]));
				let idx = find_nearest_color(&self.nodes, tmp) as u32;
				out[index] = idx;
				if let Some(h) = hist_idx {
					self.hist.get_mut(h).dither_index[d] = Some(idx);
				}
			}
		}
		Ok(out)
	}

	/// Probes at three perturbation levels to find a neighboring palette
	/// entry distinct from the nearest one, then derives a per-channel
	/// dither amplitude from the distance between them.
	fn derive_dither_scale(&self, p: PerceptualColor) -> PerceptualColor {
		let i = find_nearest_color(&self.nodes, p);
		let avg_i = self.nodes.get(i).avg;
		let probe = avg_i.sub(p);

		let mut j = find_nearest_color(&self.nodes, p.sub(probe.scale(1.0 / 3.0)));
		if i == j {
			j = find_nearest_color(&self.nodes, p.sub(probe.scale(3.0)));
		}

		if i != j {
			self.nodes.get(j).avg.sub(avg_i).scale(0.8).abs()
		} else {
			PerceptualColor::ZERO
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quant::Quantizer as Q;

	fn checkerboard(n: usize) -> Vec<u8> {
		let mut data = Vec::new();
		for i in 0..n {
			if i % 2 == 0 {
				data.extend_from_slice(&[255, 255, 255, 255]);
			} else {
				data.extend_from_slice(&[0, 0, 0, 255]);
			}
		}
		data
	}

	#[test]
	fn plain_mapper_is_idempotent_on_repeated_pixels() {
		let mut q = Q::new();
		let data = checkerboard(64);
		q.feed(&data).unwrap();
		q.quantize(2);
		let first = q.map_image(&data).unwrap();
		let second = q.map_image(&data).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn map_image_rejects_unaligned_buffers() {
		let mut q = Q::new();
		q.quantize(1);
		assert!(matches!(q.map_image(&[1, 2, 3]), Err(QuantizeError::InvalidBufferLength(3))));
	}

	#[test]
	fn ordered_mapper_rejects_dimension_mismatch() {
		let mut q = Q::new();
		let data = checkerboard(64);
		q.feed(&data).unwrap();
		q.quantize(2);
		assert!(matches!(
			q.map_image_ordered(9, 9, &data),
			Err(QuantizeError::DimensionMismatch { expected: 81, actual: 64 })
		));
	}

	#[test]
	fn ordered_mapper_is_deterministic() {
		let mut q = Q::new();
		let data = checkerboard(64);
		q.feed(&data).unwrap();
		q.quantize(2);
		let first = q.map_image_ordered(8, 8, &data).unwrap();
		let second = q.map_image_ordered(8, 8, &data).unwrap();
		assert_eq!(first, second);
	}
}
