use pycdoc_testkit::{CodeShape, CodeSpec, MarshalWriter};

use crate::pyc::bytes::Cursor;
use crate::pyc::test_support::assert_well_formed;
use crate::pyc::{Chunk, ChunkRange, CodeLayout, DecodeOptions, build_object_chunk, read_object};

fn chunks(bytes: &[u8], opt: &DecodeOptions) -> Chunk {
	let mut cursor = Cursor::new(bytes);
	let graph = read_object(&mut cursor, CodeLayout::Py33, opt).expect("object decodes");
	let chunk = build_object_chunk(&graph, opt);
	assert_well_formed(&chunk);
	chunk
}

#[test]
fn sequence_members_get_positional_names() {
	let mut w = MarshalWriter::new();
	w.small_tuple(2, false).int(42, false).short_ascii("x", false);
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	assert_eq!(chunk.kind, "tuple");
	assert_eq!(chunk.name, "tuple");
	assert_eq!(chunk.comment.as_deref(), Some("2 items"));
	assert_eq!(chunk.range, ChunkRange::new(0, 10));

	let first = chunk.child("[0]").expect("first member");
	assert_eq!((first.kind, first.comment.as_deref()), ("int", Some("42")));
	let second = chunk.child("[1]").expect("second member");
	assert_eq!((second.kind, second.comment.as_deref()), ("string", Some("'x', ascii")));
}

#[test]
fn dict_values_are_named_after_their_keys() {
	let mut w = MarshalWriter::new();
	w.dict(false).short_ascii_interned("answer", false).int(42, false);
	w.small_tuple(0, false).none().null();
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	assert_eq!(chunk.comment.as_deref(), Some("2 entries"));
	let names: Vec<_> = chunk.children.iter().map(|child| child.name.as_str()).collect();
	assert_eq!(names, vec!["key[0]", "'answer'", "key[1]", "value[1]"]);
	assert_eq!(chunk.children[0].comment.as_deref(), Some("'answer', interned, ascii"));
	assert_eq!(chunk.range.end, w.bytes().len() as u64, "terminator is inside the dict range");
}

#[test]
fn reference_chunk_links_to_target_without_copying_children() {
	let mut w = MarshalWriter::new();
	w.small_tuple(2, false);
	w.small_tuple(2, true).int(1, false).int(2, false);
	w.reference(0);
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	let shared = chunk.child("[0]").expect("shared tuple");
	let alias = chunk.child("[1]").expect("alias");

	assert_eq!(shared.comment.as_deref(), Some("2 items, ref #0"));
	assert_eq!(alias.kind, "reference");
	assert_eq!(alias.target, Some(shared.range));
	assert_eq!(alias.range.len(), 5);
	assert!(alias.children.is_empty());
	assert_eq!(alias.comment.as_deref(), Some("-> #0 tuple at 2..14"));
}

#[test]
fn code_object_chunk_names_fields_and_decodes_flags() {
	let mut w = MarshalWriter::new();
	let spec = CodeSpec {
		flags: 0x43,
		firstlineno: 7,
		..CodeSpec::new("main")
	};
	w.code(CodeShape::Py33, spec, false, |w| {
		w.small_tuple(1, false).none();
	});
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	assert_eq!(chunk.kind, "code");
	assert_eq!(chunk.name, "main");
	assert_eq!(chunk.comment.as_deref(), Some("test.py:7"));

	let names: Vec<_> = chunk.children.iter().map(|child| child.name.as_str()).collect();
	assert_eq!(
		names,
		vec![
			"argcount",
			"kwonlyargcount",
			"nlocals",
			"stacksize",
			"flags",
			"code",
			"constants",
			"names",
			"varnames",
			"freevars",
			"cellvars",
			"filename",
			"name",
			"firstlineno",
			"lnotab"
		]
	);

	let flags = chunk.child("flags").expect("flags chunk");
	assert_eq!(flags.kind, "int");
	assert_eq!(flags.range.len(), 4);
	assert_eq!(flags.comment.as_deref(), Some("0x43 OPTIMIZED|NEWLOCALS|NOFREE"));
	assert_eq!(chunk.child("code").map(|item| item.kind), Some("bytes"));
	assert_eq!(chunk.child("constants").map(|item| item.kind), Some("tuple"));
}

#[test]
fn string_previews_are_truncated() {
	let mut w = MarshalWriter::new();
	w.unicode("abcdefgh", false);
	let opt = DecodeOptions {
		preview_chars: 4,
		..DecodeOptions::default()
	};
	let chunk = chunks(w.bytes(), &opt);
	assert_eq!(chunk.comment.as_deref(), Some("'abcd...'"));
}

#[test]
fn scalar_previews() {
	let mut w = MarshalWriter::new();
	w.small_tuple(5, false).bool(false).float(0.5, false).complex(1.0, -2.0, false);
	w.long(&[1, 1], true, false).bytes_obj(b"abc", false);
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	let comments: Vec<_> = chunk.children.iter().map(|child| child.comment.clone().unwrap_or_default()).collect();
	assert_eq!(comments, vec!["False", "0.5", "(1.0-2.0j)", "-32769", "3 bytes"]);
}

#[test]
fn walk_find_and_count_cover_whole_tree() {
	let mut w = MarshalWriter::new();
	w.small_tuple(2, false).small_tuple(1, false).none().int(3, false);
	let chunk = chunks(w.bytes(), &DecodeOptions::default());

	assert_eq!(chunk.count(), 4);
	let mut seen = Vec::new();
	chunk.walk(&mut |item, depth| seen.push((item.kind, depth)));
	assert_eq!(seen, vec![("tuple", 0), ("tuple", 1), ("none", 2), ("int", 1)]);

	let found = chunk.find(&|item| item.kind == "none").expect("none chunk exists");
	assert_eq!(found.name, "[0]");
}
