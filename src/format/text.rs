//! Renders an encoded byte stream as a `.inc.c`-style array declaration,
//! regrouping the raw bytes into the requested element width independently
//! of how the format itself packed them.

use super::OutputSize;

fn group_hex(raw_bytes: &[u8], size: OutputSize) -> Vec<String> {
	let width = size.bytes();
	let digits = width * 2;
	raw_bytes
		.chunks(width)
		.map(|chunk| {
			let mut value: u64 = 0;
			for &b in chunk {
				value = (value << 8) | b as u64;
			}
			if chunk.len() < width {
				value <<= 8 * (width - chunk.len()) as u64;
			}
			format!("0X{:0width$X}", value, width = digits)
		})
		.collect()
}

/// Emits `{c_type} {var}[] = { ... };` with a leading element-count comment,
/// 16 bytes' worth of elements per line, trailing bytes zero-padded into a
/// final element if they don't divide evenly by `size`.
pub fn emit_c_array(var: &str, raw_bytes: &[u8], size: OutputSize) -> String {
	let grouped = group_hex(raw_bytes, size);
	let per_line = 16 / size.bytes();

	let mut lines = Vec::new();
	lines.push(format!("// size = {}", grouped.len()));
	lines.push(format!("{} {}[] = {{", size.c_type(), var));
	for chunk in grouped.chunks(per_line.max(1)) {
		lines.push(format!("\t{},", chunk.join(", ")));
	}
	lines.push("};\n".to_string());
	lines.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn groups_bytes_into_u16_words() {
		let out = emit_c_array("tex", &[0x12, 0x34, 0x56, 0x78], OutputSize::U16);
		assert!(out.contains("u16 tex[]"));
		assert!(out.contains("0X1234"));
		assert!(out.contains("0X5678"));
		assert!(out.contains("// size = 2"));
	}

	#[test]
	fn pads_trailing_partial_element_with_zero_bytes() {
		let out = emit_c_array("tex", &[0xAB], OutputSize::U16);
		assert!(out.contains("0XAB00"));
	}

	#[test]
	fn u8_elements_need_no_padding() {
		let out = emit_c_array("idx", &[1, 2, 3], OutputSize::U8);
		assert!(out.contains("0X01, 0X02, 0X03"));
	}
}
