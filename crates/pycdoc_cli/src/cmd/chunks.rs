use std::path::PathBuf;

use pycdoc::pyc::{Chunk, DecodeOptions, Result, decode_with_options};

use crate::cmd::util::{emit_json, load};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Absolute offset of the container inside the file.
	#[arg(long, default_value_t = 0)]
	pub offset: u64,
	/// Maximum object nesting depth accepted by the decoder.
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
	/// Characters of string content shown in comments.
	#[arg(long = "preview")]
	pub preview_chars: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// Decode one container and print its chunk tree.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		offset,
		max_depth,
		preview_chars,
		json,
	} = args;

	let defaults = DecodeOptions::default();
	let options = DecodeOptions {
		max_depth: max_depth.unwrap_or(defaults.max_depth),
		preview_chars: preview_chars.unwrap_or(defaults.preview_chars),
	};

	let (bytes, start, _) = load(&path, offset)?;
	let tree = decode_with_options(&bytes, start as u64, &options)?;

	if json {
		return emit_json(&tree);
	}

	tree.walk(&mut |chunk, depth| println!("{}", render_line(chunk, depth)));
	Ok(())
}

/// Render `start..end kind name  # comment` with two spaces of indent per level.
fn render_line(chunk: &Chunk, depth: usize) -> String {
	let mut line = format!("{:indent$}{}..{} {} {}", "", chunk.range.start, chunk.range.end, chunk.kind, chunk.name, indent = depth * 2);
	if let Some(target) = chunk.target {
		line.push_str(&format!(" -> {}..{}", target.start, target.end));
	}
	if let Some(comment) = &chunk.comment {
		line.push_str("  # ");
		line.push_str(comment);
	}
	line
}
