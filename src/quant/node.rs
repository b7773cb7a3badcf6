//! A node is one (eventual) palette slot: a cluster of histogram entries
//! plus the aggregate statistics [`sum_node`] derives from them. Up to 256
//! nodes live in a fixed-capacity pool addressed by small index, one per
//! final palette entry.

use super::color::PerceptualColor;
use super::histogram::Histogram;

pub const MAX_NODES: usize = 256;

/// One cluster of histogram entries and the statistics describing it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Node {
	/// Head of this node's intra-node entry chain (threaded through
	/// `HistogramEntry::next_in_node`). No ordering guarantee between
	/// quantize passes; `sum_node` re-establishes it every time it runs.
	pub histogram_head: Option<u32>,
	/// The entry marking the split boundary chosen the last time this node
	/// was summarized. `None` means "split after the last entry" (i.e. a
	/// single-entry node; every entry would move to the new node).
	pub split: Option<u32>,
	pub count: u64,
	pub avg: PerceptualColor,
	/// Unit vector: the principal sort direction used to linearize entries
	/// for splitting.
	pub dir: PerceptualColor,
	/// Total weighted squared deviation from `avg`.
	pub err: f64,
	/// Estimated error reduction achievable by splitting this node; the
	/// driver always picks the live node with the largest `vdif`.
	pub vdif: f64,
}

/// Fixed-size pool of 256 nodes; only the first `len` are live.
pub struct NodePool {
	nodes: Box<[Node; MAX_NODES]>,
	len: usize,
}

impl Default for NodePool {
	fn default() -> Self {
		NodePool { nodes: Box::new([Node::default(); MAX_NODES]), len: 0 }
	}
}

impl NodePool {
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	pub fn set_len(&mut self, len: usize) {
		self.len = len;
	}

	pub fn get(&self, i: usize) -> &Node {
		&self.nodes[i]
	}

	pub fn get_mut(&mut self, i: usize) -> &mut Node {
		&mut self.nodes[i]
	}

	pub fn live(&self) -> &[Node] {
		&self.nodes[..self.len]
	}

	/// Index of the live node with maximum `vdif`; ties favor the lowest
	/// index.
	pub fn best_split_candidate(&self) -> usize {
		let mut best_i = 0;
		let mut best_v = self.nodes[0].vdif;
		for i in 1..self.len {
			if self.nodes[i].vdif > best_v {
				best_v = self.nodes[i].vdif;
				best_i = i;
			}
		}
		best_i
	}
}

/// Materializes a node's entry chain into an index vector, in chain order.
fn collect_chain(hist: &Histogram, head: Option<u32>) -> Vec<u32> {
	let mut items = Vec::new();
	let mut cur = head;
	while let Some(i) = cur {
		items.push(i);
		cur = hist.next_in_node(i);
	}
	items
}

/// Re-threads `next_in_node` to match the order of `items`, and returns the
/// new head. Used by [`sum_node`] internally and by the quantizer driver
/// when it splits a node's chain in two.
pub(crate) fn rethread(hist: &mut Histogram, items: &[u32]) -> Option<u32> {
	for w in items.windows(2) {
		hist.set_next_in_node(w[0], Some(w[1]));
	}
	if let Some(&last) = items.last() {
		hist.set_next_in_node(last, None);
	}
	items.first().copied()
}

/// Iteratively partitions `pairs` around the mean of their sort keys,
/// recursing into each half, until a partition's keys are all equal. This
/// is the list sort from the original algorithm (mean-of-keys partition
/// quicksort), implemented over an index array with an explicit work stack
/// instead of recursing on a linked list.
fn mean_partition_sort(pairs: &mut [(u32, f64)]) {
	let mut stack = vec![(0usize, pairs.len())];
	while let Some((start, end)) = stack.pop() {
		let len = end - start;
		if len < 2 {
			continue;
		}
		let mean: f64 = pairs[start..end].iter().map(|(_, k)| *k).sum::<f64>() / len as f64;
		let mut lo = Vec::with_capacity(len);
		let mut hi = Vec::with_capacity(len);
		for &item in &pairs[start..end] {
			if item.1 < mean {
				lo.push(item);
			} else {
				hi.push(item);
			}
		}
		if lo.is_empty() || hi.is_empty() {
			// All keys tied at this level; this partition is as sorted as
			// the algorithm gets.
			continue;
		}
		let mid = start + lo.len();
		pairs[start..mid].copy_from_slice(&lo);
		pairs[mid..end].copy_from_slice(&hi);
		stack.push((start, mid));
		stack.push((mid, end));
	}
}

fn sort_chain_by(hist: &mut Histogram, items: &mut Vec<u32>, key: impl Fn(PerceptualColor) -> f64) {
	let mut pairs: Vec<(u32, f64)> = items.iter().map(|&i| (i, key(hist.get(i).color))).collect();
	mean_partition_sort(&mut pairs);
	*items = pairs.into_iter().map(|(i, _)| i).collect();
	rethread(hist, items);
}

/// Recomputes every aggregate statistic for `node` from its current entry
/// chain: count, mean, per-channel variance, split axis, principal
/// direction, and the best bisection point. This is the numeric heart of
/// the quantizer.
pub fn sum_node(node: &mut Node, hist: &mut Histogram) {
	let mut items = collect_chain(hist, node.histogram_head);
	if items.is_empty() {
		node.count = 0;
		node.err = 0.0;
		node.vdif = 0.0;
		node.split = None;
		return;
	}

	let mut n: u64 = 0;
	let mut fsum = PerceptualColor::ZERO;
	let mut fsum2 = PerceptualColor::ZERO;
	for &i in &items {
		let e = hist.get(i);
		let w = e.count as f64;
		n += e.count;
		fsum = fsum.add(e.color.scale(w));
		fsum2 = fsum2.add(e.color.mul_componentwise(e.color).scale(w));
	}
	node.count = n;

	let avg = fsum.scale(1.0 / n as f64);
	node.avg = avg;

	let vc = fsum2.sub(fsum.mul_componentwise(avg));
	let err = vc.r + vc.g + vc.b + vc.a;
	node.err = err;
	let no_split_score = -err;

	// Axis selection, exact tie-break order: R beats G,B,A; else G beats
	// B,A; else B beats A; else A.
	let key: fn(PerceptualColor) -> f64 = if vc.r > vc.g && vc.r > vc.b && vc.r > vc.a {
		|c| c.r
	} else if vc.g > vc.b && vc.g > vc.a {
		|c| c.g
	} else if vc.b > vc.a {
		|c| c.b
	} else {
		|c| c.a
	};
	sort_chain_by(hist, &mut items, key);

	let mut dir = PerceptualColor::ZERO;
	for &i in &items {
		let e = hist.get(i);
		let mut tmp = e.color.sub(avg).scale(e.count as f64);
		if tmp.dot(dir) < 0.0 {
			tmp = tmp.scale(-1.0);
		}
		dir = dir.add(tmp);
	}
	let dir_len_sq = dir.length_squared();
	let dir = if dir_len_sq == 0.0 { PerceptualColor::ZERO } else { dir.scale(1.0 / dir_len_sq.sqrt()) };
	node.dir = dir;

	sort_chain_by(hist, &mut items, |c| c.dot(dir));
	node.histogram_head = items.first().copied();

	let mut n2: u64 = 0;
	let mut sum_lo = PerceptualColor::ZERO;
	let mut sum2_lo = PerceptualColor::ZERO;
	let mut best = no_split_score;
	let mut best_split_pos: Option<usize> = None;
	for (pos, &i) in items.iter().enumerate() {
		let e = hist.get(i);
		let w = e.count as f64;
		n2 += e.count;
		sum_lo = sum_lo.add(e.color.scale(w));
		sum2_lo = sum2_lo.add(e.color.mul_componentwise(e.color).scale(w));
		if n2 == n {
			break;
		}
		let n2f = n2 as f64;
		let n_hi = (n - n2) as f64;
		let lo = sum2_lo.sub(sum_lo.mul_componentwise(sum_lo).scale(1.0 / n2f));
		let sum_hi = fsum.sub(sum_lo);
		let sum2_hi = fsum2.sub(sum2_lo);
		let hi = sum2_hi.sub(sum_hi.mul_componentwise(sum_hi).scale(1.0 / n_hi));
		let s = lo.r + lo.g + lo.b + lo.a + hi.r + hi.g + hi.b + hi.a;
		if -s > best {
			best = -s;
			best_split_pos = Some(pos + 1);
		}
	}

	let split_pos = match best_split_pos {
		Some(p) => Some(p),
		None if items.len() >= 2 => Some(1),
		None => None,
	};
	node.split = split_pos.map(|p| items[p]);
	node.vdif = best + err;
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::quant::histogram::Histogram;

	fn feed_chain(hist: &mut Histogram, pixels: &[(u8, u8, u8, u8)]) -> Option<u32> {
		let mut bytes = Vec::new();
		for &(r, g, b, a) in pixels {
			bytes.extend_from_slice(&[r, g, b, a]);
		}
		hist.feed(&bytes, true, 0xFF).unwrap();
		let mut head = None;
		let mut tail: Option<u32> = None;
		for &(r, g, b, a) in pixels {
			let i = hist.find(r, g, b, a).unwrap();
			if hist.next_in_node(i).is_none() && Some(i) != tail {
				// only thread each distinct entry once
			}
			if head.is_none() {
				head = Some(i);
			}
			if let Some(t) = tail {
				if t != i {
					hist.set_next_in_node(t, Some(i));
					tail = Some(i);
				}
			} else {
				tail = Some(i);
			}
		}
		head
	}

	#[test]
	fn empty_node_has_zero_stats() {
		let mut hist = Histogram::default();
		let mut node = Node::default();
		sum_node(&mut node, &mut hist);
		assert_eq!(node.count, 0);
		assert_eq!(node.err, 0.0);
		assert_eq!(node.vdif, 0.0);
	}

	#[test]
	fn single_solid_color_has_zero_error() {
		let mut hist = Histogram::default();
		let head = feed_chain(&mut hist, &[(200, 100, 50, 255)]);
		let mut node = Node { histogram_head: head, ..Default::default() };
		sum_node(&mut node, &mut hist);
		assert_eq!(node.err, 0.0);
		assert_eq!(node.vdif, 0.0);
		assert_eq!(node.count, 1);
	}

	#[test]
	fn two_distinct_colors_produce_positive_split_score() {
		let mut hist = Histogram::default();
		let head = feed_chain(&mut hist, &[(255, 0, 0, 255), (0, 0, 255, 255)]);
		let mut node = Node { histogram_head: head, ..Default::default() };
		sum_node(&mut node, &mut hist);
		assert!(node.err > 0.0);
		assert!(node.vdif > 0.0);
		assert!(node.split.is_some());
	}
}
