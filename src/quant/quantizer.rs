//! The driver that ties the histogram and node pool together: feeding
//! pixels, growing the palette one split at a time, Lloyd-style refinement,
//! and palette extraction/injection.

use super::color::{PerceptualColor, SCALE};
use super::error::QuantizeError;
use super::histogram::Histogram;
use super::map::find_nearest_color;
use super::node::{rethread, sum_node, NodePool};

/// An adaptive color quantizer: feed it pixels, ask it to quantize down to
/// N colors, then read back a palette or map pixels to palette indices.
///
/// Mirrors the usage of the original ExoQuant: construct, `feed`, `quantize`,
/// then `get_palette` / `map_image` (or `map_image_ordered`) in any order.
pub struct Quantizer {
	pub(crate) hist: Histogram,
	pub(crate) nodes: NodePool,
	num_bits_per_channel: u8,
	pub(crate) optimized: bool,
	pub(crate) transparency: bool,
}

impl Default for Quantizer {
	fn default() -> Self {
		Quantizer {
			hist: Histogram::default(),
			nodes: NodePool::default(),
			num_bits_per_channel: 8,
			optimized: false,
			transparency: true,
		}
	}
}

impl Quantizer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Turns off alpha premultiplication: RGB channels are weighted only by
	/// [`SCALE`], not also by the pixel's alpha.
	pub fn disable_transparency(&mut self) {
		self.transparency = false;
	}

	fn channel_mask(&self) -> u8 {
		((0xFF00u32 >> self.num_bits_per_channel) & 0xFF) as u8
	}

	/// Feeds a byte stream of consecutive RGBA quads into the histogram.
	pub fn feed(&mut self, data: &[u8]) -> Result<(), QuantizeError> {
		let channel_mask = self.channel_mask();
		self.hist.feed(data, self.transparency, channel_mask)
	}

	/// Grows the palette to `n_colors` (clamped to 256), splitting the
	/// single highest-variance-reduction node at each step.
	pub fn quantize(&mut self, n_colors: usize) {
		self.quantize_ex(n_colors, false);
	}

	/// As [`Quantizer::quantize`], but runs one Lloyd relaxation pass after
	/// every split. Slower, usually a better palette for the same color
	/// count.
	pub fn quantize_hq(&mut self, n_colors: usize) {
		self.quantize_ex(n_colors, true);
	}

	fn quantize_ex(&mut self, n_colors: usize, hq: bool) {
		// A node can only be usefully split once it holds at least two
		// distinct histogram entries (`split.is_some()`); once every live
		// node has degenerated to a singleton, further splits would just
		// shuffle entries into new empty nodes instead of growing the real
		// color count. Clamping by the distinct-entry count keeps numColors
		// from exceeding what's actually achievable.
		let n_colors = n_colors.min(256).min(self.hist.len().max(1));
		log::info!("quantizing {} distinct colors down to {}", self.hist.len(), n_colors);

		if self.nodes.is_empty() {
			let mut items = Vec::new();
			self.hist.for_each_in_bucket_order(|i| items.push(i));
			let head = rethread(&mut self.hist, &items);
			self.nodes.get_mut(0).histogram_head = head;
			sum_node(self.nodes.get_mut(0), &mut self.hist);
			self.nodes.set_len(1);
		}

		for i in self.nodes.len()..n_colors {
			let besti = self.nodes.best_split_candidate();
			if self.nodes.get(besti).split.is_none() {
				log::debug!("no further splittable node; stopping at {} colors", self.nodes.len());
				break;
			}
			log::debug!("splitting node {} (vdif {:.4}) into node {}", besti, self.nodes.get(besti).vdif, i);
			let head = self.nodes.get(besti).histogram_head;
			let split = self.nodes.get(besti).split;

			let mut moving = Vec::new();
			let mut staying = Vec::new();
			let mut cur = head;
			let mut still_moving = true;
			while let Some(idx) = cur {
				if still_moving && Some(idx) == split {
					still_moving = false;
				}
				if still_moving {
					moving.push(idx);
				} else {
					staying.push(idx);
				}
				cur = self.hist.next_in_node(idx);
			}

			let new_head = rethread(&mut self.hist, &moving);
			let remain_head = rethread(&mut self.hist, &staying);
			self.nodes.get_mut(i).histogram_head = new_head;
			self.nodes.get_mut(besti).histogram_head = remain_head;

			sum_node(self.nodes.get_mut(besti), &mut self.hist);
			sum_node(self.nodes.get_mut(i), &mut self.hist);

			self.nodes.set_len(i + 1);
			if hq {
				self.optimize_palette(1);
			}
		}

		self.optimized = false;
		log::info!("mean error after quantizing: {:.4}", self.get_mean_error());
	}

	/// Root-mean-square perceptual error across the current palette,
	/// rescaled to roughly an 8-bit-channel magnitude.
	pub fn get_mean_error(&self) -> f64 {
		let mut n: u64 = 0;
		let mut err = 0.0;
		for node in self.nodes.live() {
			n += node.count;
			err += node.err;
		}
		if n == 0 {
			return 0.0;
		}
		(err / n as f64).sqrt() * 256.0
	}

	/// Reassigns every histogram entry to its nearest node and recomputes
	/// node statistics, `iter` times. Run automatically before the first
	/// palette read or pixel mapping unless [`Quantizer::set_palette`] was
	/// called since the last `quantize`.
	pub fn optimize_palette(&mut self, iter: usize) {
		self.optimized = true;
		for _ in 0..iter {
			let mut chains: Vec<Vec<u32>> = vec![Vec::new(); self.nodes.len()];
			self.hist.for_each_in_bucket_order(|idx| {
				let j = find_nearest_color(&self.nodes, self.hist.get(idx).color);
				chains[j].push(idx);
			});
			for (i, items) in chains.into_iter().enumerate() {
				let head = rethread(&mut self.hist, &items);
				self.nodes.get_mut(i).histogram_head = head;
			}
			for i in 0..self.nodes.len() {
				sum_node(self.nodes.get_mut(i), &mut self.hist);
			}
		}
	}

	/// Extracts exactly `4 * n_colors` packed RGBA bytes, optimizing first if
	/// the palette hasn't been refined since the last structural change. The
	/// first `4 * min(n_colors, numColors)` bytes are real palette entries;
	/// any remainder (when `n_colors` exceeds the live node count) is zero.
	pub fn get_palette(&mut self, n_colors: usize) -> Vec<u8> {
		if !self.optimized {
			self.optimize_palette(4);
		}

		let live = n_colors.min(self.nodes.len());
		let channel_mask = self.channel_mask();
		let bias = (1u32 << (8 - self.num_bits_per_channel)) / 2;
		let mut pal = vec![0u8; n_colors * 4];
		for i in 0..live {
			let avg = self.nodes.get(i).avg;
			let (mut r, mut g, mut b, a) = (avg.r, avg.g, avg.b, avg.a);
			if self.transparency && a != 0.0 {
				r /= a;
				g /= a;
				b /= a;
			}
			let pr = r / SCALE.r * 255.9;
			let pg = g / SCALE.g * 255.9;
			let pb = b / SCALE.b * 255.9;
			let pa = a / SCALE.a * 255.9;

			let pr = ((pr as i64 + bias as i64) as u32 & channel_mask as u32) as u8;
			let pg = ((pg as i64 + bias as i64) as u32 & channel_mask as u32) as u8;
			let pb = ((pb as i64 + bias as i64) as u32 & channel_mask as u32) as u8;
			pal[i * 4] = pr;
			pal[i * 4 + 1] = pg;
			pal[i * 4 + 2] = pb;
			pal[i * 4 + 3] = pa as u8;
		}
		pal
	}

	/// Installs a palette directly, bypassing `quantize`. Marks the
	/// quantizer as already optimized, so the next `get_palette` or mapping
	/// call uses it verbatim.
	pub fn set_palette(&mut self, pal: &[u8], n_colors: usize) {
		self.nodes.set_len(n_colors);
		for i in 0..n_colors {
			let r = pal[i * 4] as f64 * SCALE.r / 255.9;
			let g = pal[i * 4 + 1] as f64 * SCALE.g / 255.9;
			let b = pal[i * 4 + 2] as f64 * SCALE.b / 255.9;
			let a = pal[i * 4 + 3] as f64 * SCALE.a / 255.9;
			self.nodes.get_mut(i).avg = PerceptualColor { r, g, b, a };
		}
		self.optimized = true;
	}

	pub(crate) fn ensure_optimized(&mut self) {
		if !self.optimized {
			self.optimize_palette(4);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn single_color_image_quantizes_to_one_live_color_with_zero_error() {
		let mut q = Quantizer::new();
		let pixels = vec![10u8, 20, 30, 255].repeat(64);
		q.feed(&pixels).unwrap();
		q.quantize(4);
		assert_eq!(q.get_mean_error(), 0.0);
		let pal = q.get_palette(4);
		// only the first live node is non-degenerate; the rest pad with zero
		assert_eq!(pal.len(), 16);
		assert_eq!(&pal[0..3], &[10, 20, 30]);
		assert_eq!(&pal[4..16], &[0u8; 12]);
	}

	#[test]
	fn two_color_checkerboard_quantizes_to_both_colors() {
		let mut q = Quantizer::new();
		let mut pixels = Vec::new();
		for i in 0..64 {
			if i % 2 == 0 {
				pixels.extend_from_slice(&[255, 0, 0, 255]);
			} else {
				pixels.extend_from_slice(&[0, 0, 255, 255]);
			}
		}
		q.feed(&pixels).unwrap();
		q.quantize(2);
		let pal = q.get_palette(2);
		assert_eq!(pal.len(), 8);
		let colors: Vec<(u8, u8, u8)> = vec![(pal[0], pal[1], pal[2]), (pal[4], pal[5], pal[6])];
		assert!(colors.contains(&(255, 0, 0)));
		assert!(colors.contains(&(0, 0, 255)));
	}

	#[test]
	fn requesting_more_colors_than_distinct_pixels_clamps() {
		let mut q = Quantizer::new();
		q.feed(&[1, 2, 3, 255]).unwrap();
		q.quantize(16);
		let pal = q.get_palette(16);
		assert_eq!(pal.len(), 64);
		assert_eq!(&pal[4..], &[0u8; 60]);
	}

	#[test]
	fn quantizing_past_full_singleton_exhaustion_stops_growing() {
		// 8 distinct colors; request far more than that so every node has
		// long since degenerated to a singleton by the time the loop would
		// otherwise keep going, exercising the split.is_none() early exit.
		let mut q = Quantizer::new();
		let mut pixels = Vec::new();
		for i in 0..8u8 {
			pixels.extend_from_slice(&[i * 30, i * 10, 255 - i * 20, 255]);
		}
		q.feed(&pixels).unwrap();
		q.quantize(200);
		let pal = q.get_palette(200);
		assert_eq!(pal.len(), 800);
		assert!(pal[32..].iter().all(|&b| b == 0));
	}

	#[test]
	fn set_palette_then_get_palette_round_trips_without_optimizing() {
		let mut q = Quantizer::new();
		q.set_palette(&[10, 20, 30, 255, 40, 50, 60, 255], 2);
		let pal = q.get_palette(2);
		assert_eq!(pal.len(), 8);
	}
}
