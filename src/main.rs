use image::error::ImageError;

use n64texconv::format::{emit_c_array, sanitize_identifier, OutputSize, TextureFormat};

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Helper function for `main`.
fn error_exit(msg: &str, code: i32) -> ! {
	eprintln!("{}", msg);
	std::process::exit(code)
}

fn print_help() {
	println!("n64texconv <image-path> [format] [output-size]");
	println!("\nFormats:");
	println!("{}", TextureFormat::ALL.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", "));
	println!("\nOutput sizes:");
	println!("{}", OutputSize::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "));
}

/// CLI for converting a truecolor image into an N64 texture byte array.
///
/// May exit process with status code if there are errors:
///
/// 2: invalid arguments
///
/// 3: file I/O issues
///
/// 4: invalid image data
///
/// 10: other, potentially unknown error
fn main() {
	env_logger::init();

	let clap_matches = clap::App::new("n64texconv")
		.version("0.2.0")
		.author("vkcz")
		.about("Converts a truecolor image into an N64 texture format byte array (ExoQuant port).")
		.arg_from_usage("<IMAGE> 'Path to the source image'")
		.arg_from_usage("[FORMAT] 'Output format: RGBA16, RGBA32, IA4, IA8, IA16, CI4, CI8; defaults to RGBA16'")
		.arg_from_usage("[SIZE] 'Output element width: U8, U16, U32; defaults to U8 (fixed for CI4/CI8)'")
		.arg_from_usage("-o, --output=[FILE] 'Output path; defaults to <name>_<FORMAT>.inc.c'")
		.get_matches();

	let image_path = clap_matches.value_of("IMAGE").unwrap();
	if image_path.eq_ignore_ascii_case("help") {
		print_help();
		std::process::exit(0);
	}

	let format: TextureFormat = match clap_matches.value_of("FORMAT").unwrap_or("RGBA16").parse() {
		Ok(f) => f,
		Err(e) => error_exit(&format!("{}", e), 2),
	};

	let size: OutputSize = match clap_matches.value_of("SIZE").unwrap_or("U8").parse() {
		Ok(s) => s,
		Err(e) => error_exit(&format!("{}", e), 2),
	};
	if format.is_indexed() && clap_matches.value_of("SIZE").is_some() {
		log::warn!("output sizes for CI4/CI8 are fixed: palette data is U16, index data is U8");
	}

	log::info!("creating {} texture from {}", format, image_path);
	let source = match image::open(image_path) {
		Ok(img) => img.into_rgba(),
		Err(e) => {
			let (msg, code) = match e {
				ImageError::Decoding(_) => ("Invalid image data", 4),
				ImageError::Limits(_) => ("Computation limits exceeded", 5),
				ImageError::IoError(_) => ("File not found or could not be read", 3),
				_ => ("An error occurred", 10),
			};
			error_exit(msg, code)
		}
	};
	let (width, height) = source.dimensions();
	let pixels = source.into_raw();

	let tex_stem = Path::new(image_path).file_stem().and_then(|s| s.to_str()).unwrap_or("texture");
	let tex_name = sanitize_identifier(&format!("{}_{}", tex_stem, format));

	let file_data = if format.is_indexed() {
		let (palette, indexes) = match n64texconv::format::encode_indexed(format, &pixels, width, height) {
			Ok(v) => v,
			Err(e) => error_exit(&format!("{}", e), 4),
		};
		let pal_c = emit_c_array(&format!("{}_pal", tex_name), &palette, OutputSize::U16);
		let idx_c = emit_c_array(&format!("{}_indexes", tex_name), &indexes, OutputSize::U8);
		format!("{}\n{}", pal_c, idx_c)
	} else {
		let data = n64texconv::format::encode_direct(format, &pixels);
		emit_c_array(&tex_name, &data, size)
	};

	let output_path =
		clap_matches.value_of("output").map(String::from).unwrap_or_else(|| format!("{}.inc.c", tex_name));
	let mut out_fh = match File::create(&output_path) {
		Ok(f) => f,
		Err(_) => error_exit("Could not open output file", 3),
	};
	match out_fh.write_all(file_data.as_bytes()) {
		Ok(_) => (),
		Err(_) => error_exit("Could not write to output file", 3),
	}

	println!("Success! Data written to {}", output_path);
}
