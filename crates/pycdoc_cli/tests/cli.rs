#![allow(missing_docs)]

use std::path::Path;
use std::process::{Command, Output};

use pycdoc_testkit::{CodeShape, CodeSpec, MarshalWriter, write_fixture};
use serde_json::Value;

fn hello_module() -> Vec<u8> {
	let mut w = MarshalWriter::new();
	w.classic_header(3350, 1_476_000_000, 64);
	w.code(CodeShape::Py33, CodeSpec::new("<module>"), true, |w| {
		w.small_tuple(2, false).short_ascii("hello", true).reference(1);
	});
	w.into_bytes()
}

#[test]
fn info_json_reports_header_and_counts() {
	let path = write_fixture("info_hello.pyc", &hello_module());
	let json = run_json(&["info", path_arg(&path).as_str(), "--json"]);

	assert_eq!(json["decoder"], "pyc");
	assert_eq!(json["magic"], 3350);
	assert_eq!(json["python"], "3.5");
	assert_eq!(json["header_size"], 12);
	assert_eq!(json["mtime"], 1_476_000_000);
	assert_eq!(json["root_kind"], "code");
	assert_eq!(json["root_name"], "<module>");
	assert_eq!(json["ref_count"], 2);
	assert_eq!(json["trailing_bytes"], 0);
	assert!(json.get("flags").is_none(), "classic header has no flags word");
}

#[test]
fn info_honours_offset_into_container() {
	let mut bytes = b"prefix".to_vec();
	bytes.extend_from_slice(&hello_module());
	bytes.extend_from_slice(b"tail");
	let path = write_fixture("info_offset.pyc", &bytes);

	let json = run_json(&["info", path_arg(&path).as_str(), "--offset", "6", "--json"]);
	assert_eq!(json["offset"], 6);
	assert_eq!(json["trailing_bytes"], 4);
}

#[test]
fn chunks_json_is_the_serialized_tree() {
	let path = write_fixture("chunks_hello.pyc", &hello_module());
	let json = run_json(&["chunks", path_arg(&path).as_str(), "--json"]);

	assert_eq!(json["kind"], "pyc");
	let children = json["children"].as_array().expect("root children");
	assert_eq!(children.len(), 2);
	assert_eq!(children[0]["range"]["end"], 12);

	let code = &children[1];
	assert_eq!(code["name"], "<module>");
	let consts = code["children"]
		.as_array()
		.and_then(|fields| fields.iter().find(|field| field["name"] == "constants"))
		.expect("constants chunk");
	let items = consts["children"].as_array().expect("tuple items");
	assert_eq!(items[0]["kind"], "string");
	assert_eq!(items[1]["kind"], "reference");
	assert_eq!(items[1]["target"], items[0]["range"]);
}

#[test]
fn chunks_text_lists_indented_lines() {
	let path = write_fixture("chunks_text.pyc", &hello_module());
	let output = run(&["chunks", path_arg(&path).as_str()]);
	assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

	let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
	let mut lines = stdout.lines();
	assert!(lines.next().is_some_and(|line| line.starts_with("0..") && line.contains(" pyc pyc file")));
	assert!(stdout.lines().any(|line| line.starts_with("  12..") && line.contains(" code <module>")));
	assert!(stdout.lines().any(|line| line.trim_start().contains("reference [1] -> ")));
}

#[test]
fn chunks_rejects_excessive_nesting() {
	let mut w = MarshalWriter::new();
	w.classic_header(3350, 0, 0);
	for _ in 0..8 {
		w.small_tuple(1, false);
	}
	w.none();
	let path = write_fixture("deep.pyc", &w.into_bytes());

	let output = run(&["chunks", path_arg(&path).as_str(), "--max-depth", "4"]);
	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).starts_with("error: "));

	let output = run(&["chunks", path_arg(&path).as_str(), "--max-depth", "16"]);
	assert!(output.status.success());
}

#[test]
fn unknown_magic_fails_with_error_line() {
	let path = write_fixture("not_pyc.bin", b"PK\x03\x04rest");
	let output = run(&["info", path_arg(&path).as_str()]);

	assert_eq!(output.status.code(), Some(1));
	assert!(String::from_utf8_lossy(&output.stderr).contains("not a recognized .pyc file"));
}

#[test]
fn negative_length_fails_without_output() {
	let mut w = MarshalWriter::new();
	w.classic_header(3350, 0, 0).tag(b'u', false).raw_i32(-1);
	let path = write_fixture("negative.pyc", w.bytes());

	let output = run(&["chunks", path_arg(&path).as_str(), "--json"]);
	assert_eq!(output.status.code(), Some(1));
	assert!(output.stdout.is_empty());
}

fn run(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_pycdoc")).args(args).output().expect("command executes")
}

fn run_json(args: &[&str]) -> Value {
	let output = run(args);
	assert!(
		output.status.success(),
		"pycdoc failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn path_arg(path: &Path) -> String {
	path.display().to_string()
}
