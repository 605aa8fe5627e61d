use std::path::PathBuf;

use pycdoc::pyc::{DecodeOptions, PycFile, Result, SourceStamp};
use serde::Serialize;

use crate::cmd::util::{emit_json, load};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Absolute offset of the container inside the file.
	#[arg(long, default_value_t = 0)]
	pub offset: u64,
	#[arg(long)]
	pub json: bool,
}

#[derive(Serialize)]
struct InfoReport {
	path: String,
	decoder: &'static str,
	offset: usize,
	magic: u16,
	python: &'static str,
	header_size: usize,
	code_layout: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	flags: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	mtime: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	source_size: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	source_hash: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	check_source: Option<bool>,
	root_kind: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	root_name: Option<String>,
	object_count: usize,
	ref_count: usize,
	body_end: usize,
	trailing_bytes: usize,
}

/// Print header fields and object statistics for one container.
pub fn run(args: Args) -> Result<()> {
	let Args { path, offset, json } = args;

	let (bytes, start, decoder) = load(&path, offset)?;
	let file = PycFile::parse(&bytes, start, &DecodeOptions::default())?;
	let header = &file.header;
	let root = file.graph.root();

	let mut report = InfoReport {
		path: path.display().to_string(),
		decoder: decoder.as_str(),
		offset: header.offset,
		magic: header.variant.magic,
		python: header.variant.python,
		header_size: header.size(),
		code_layout: header.variant.code.as_str(),
		flags: header.flags,
		mtime: None,
		source_size: None,
		source_hash: None,
		check_source: None,
		root_kind: file.graph.get(root).kind_label(),
		root_name: file.graph.code_name(root),
		object_count: file.graph.nodes().len(),
		ref_count: file.graph.refs().len(),
		body_end: file.body_end(),
		trailing_bytes: file.trailing_len(),
	};
	match header.stamp {
		SourceStamp::Timestamp { mtime, source_size } => {
			report.mtime = Some(mtime);
			report.source_size = Some(source_size);
		}
		SourceStamp::Hash { hash, check_source } => {
			report.source_hash = Some(hash.iter().map(|byte| format!("{byte:02x}")).collect());
			report.check_source = Some(check_source);
		}
	}

	if json {
		return emit_json(&report);
	}

	println!("path: {}", report.path);
	println!("decoder: {}", report.decoder);
	println!("offset: {}", report.offset);
	println!("magic: {}", report.magic);
	println!("python: {}", report.python);
	println!("header_size: {}", report.header_size);
	println!("code_layout: {}", report.code_layout);
	if let Some(flags) = report.flags {
		println!("flags: 0x{flags:x}");
	}
	if let (Some(mtime), Some(source_size)) = (report.mtime, report.source_size) {
		println!("mtime: {mtime}");
		println!("source_size: {source_size}");
	}
	if let (Some(hash), Some(check_source)) = (&report.source_hash, report.check_source) {
		println!("source_hash: {hash}");
		println!("check_source: {check_source}");
	}
	match &report.root_name {
		Some(name) => println!("root: {} {name}", report.root_kind),
		None => println!("root: {}", report.root_kind),
	}
	println!("object_count: {}", report.object_count);
	println!("ref_count: {}", report.ref_count);
	println!("body_end: {}", report.body_end);
	println!("trailing_bytes: {}", report.trailing_bytes);

	Ok(())
}
