/// Failure modes at the quantizer's boundary.
///
/// Pure numeric computation inside the quantizer never fails (see the
/// Design Notes on degenerate direction vectors and empty nodes); only the
/// adapters that accept caller-supplied buffers validate their input.
#[derive(Debug, thiserror::Error)]
pub enum QuantizeError {
	/// A pixel buffer's length was not a multiple of 4 (one `u8` per RGBA
	/// channel).
	#[error("pixel buffer length {0} is not a multiple of 4")]
	InvalidBufferLength(usize),

	/// `map_image_ordered`'s `width * height` did not match the supplied
	/// pixel buffer.
	#[error("width*height ({expected}) does not match buffer of {actual} pixels")]
	DimensionMismatch { expected: usize, actual: usize },
}
