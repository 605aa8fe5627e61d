//! Shared test helpers for workspace crates: a marshal/`.pyc` byte writer.

use std::path::{Path, PathBuf};

/// Set on a type byte to register the value in the reader's back-reference table.
pub const FLAG_REF: u8 = 0x80;

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..").join("target"))
}

/// Write `bytes` to a per-process fixture file under the target directory.
pub fn write_fixture(name: &str, bytes: &[u8]) -> PathBuf {
	let dir = target_dir().join("pycdoc-fixtures").join(std::process::id().to_string());
	std::fs::create_dir_all(&dir).expect("fixture dir is creatable");
	let path = dir.join(name);
	std::fs::write(&path, bytes).expect("fixture is writable");
	path
}

/// Code-object record shape to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeShape {
	/// Python 3.3 to 3.7.
	Py33,
	/// Python 3.8 and 3.9.
	Py38,
	/// Python 3.10: the 3.8 record with `linetable` in place of `lnotab`.
	Py310,
	/// Python 3.11+.
	Py311,
}

/// Scalar fields of an emitted code object.
#[derive(Debug, Clone, Copy)]
pub struct CodeSpec<'s> {
	/// `co_name`.
	pub name: &'s str,
	/// `co_qualname` (3.11+ only); defaults to `name`.
	pub qualname: Option<&'s str>,
	/// `co_filename`.
	pub filename: &'s str,
	/// `co_flags`.
	pub flags: i32,
	/// `co_firstlineno`.
	pub firstlineno: i32,
}

impl<'s> CodeSpec<'s> {
	/// Code object with the given name and neutral defaults.
	pub fn new(name: &'s str) -> Self {
		Self {
			name,
			qualname: None,
			filename: "test.py",
			flags: 0x40,
			firstlineno: 1,
		}
	}
}

/// Append-only writer producing marshal streams the way CPython lays them out.
#[derive(Debug, Clone, Default)]
pub struct MarshalWriter {
	buf: Vec<u8>,
}

impl MarshalWriter {
	/// Empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Bytes written so far.
	pub fn pos(&self) -> usize {
		self.buf.len()
	}

	/// Borrow the written bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.buf
	}

	/// Consume the writer.
	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}

	/// Append raw bytes.
	pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
		self.buf.extend_from_slice(bytes);
		self
	}

	/// Append a raw little-endian `i32`.
	pub fn raw_i32(&mut self, value: i32) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Append a raw little-endian `u32`.
	pub fn raw_u32(&mut self, value: u32) -> &mut Self {
		self.raw(&value.to_le_bytes())
	}

	/// Write a 12-byte classic header (`magic, mtime, source_size`).
	pub fn classic_header(&mut self, magic: u16, mtime: u32, source_size: u32) -> &mut Self {
		self.magic(magic).raw_u32(mtime).raw_u32(source_size)
	}

	/// Write a 16-byte PEP 552 timestamp header.
	pub fn pep552_header(&mut self, magic: u16, mtime: u32, source_size: u32) -> &mut Self {
		self.magic(magic).raw_u32(0).raw_u32(mtime).raw_u32(source_size)
	}

	fn magic(&mut self, magic: u16) -> &mut Self {
		self.raw(&magic.to_le_bytes()).raw(b"\r\n")
	}

	/// Write a type byte, optionally flagged for back-reference registration.
	pub fn tag(&mut self, tag: u8, flagged: bool) -> &mut Self {
		self.buf.push(if flagged { tag | FLAG_REF } else { tag });
		self
	}

	/// `N`.
	pub fn none(&mut self) -> &mut Self {
		self.tag(b'N', false)
	}

	/// `T` / `F`.
	pub fn bool(&mut self, value: bool) -> &mut Self {
		self.tag(if value { b'T' } else { b'F' }, false)
	}

	/// `0`, the dict terminator.
	pub fn null(&mut self) -> &mut Self {
		self.tag(b'0', false)
	}

	/// `i` with a 32-bit payload.
	pub fn int(&mut self, value: i32, flagged: bool) -> &mut Self {
		self.tag(b'i', flagged).raw_i32(value)
	}

	/// `I` with a 64-bit payload.
	pub fn int64(&mut self, value: i64, flagged: bool) -> &mut Self {
		self.tag(b'I', flagged).raw(&value.to_le_bytes())
	}

	/// `l` with explicit 15-bit digits, least significant first.
	pub fn long(&mut self, digits: &[u16], negative: bool, flagged: bool) -> &mut Self {
		let count = i32::try_from(digits.len()).expect("digit count fits i32");
		self.tag(b'l', flagged).raw_i32(if negative { -count } else { count });
		for digit in digits {
			self.raw(&digit.to_le_bytes());
		}
		self
	}

	/// `g` binary float.
	pub fn float(&mut self, value: f64, flagged: bool) -> &mut Self {
		self.tag(b'g', flagged).raw(&value.to_le_bytes())
	}

	/// `f` text float.
	pub fn float_text(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'f', flagged).short_payload(text.as_bytes())
	}

	/// `y` binary complex.
	pub fn complex(&mut self, real: f64, imag: f64, flagged: bool) -> &mut Self {
		self.tag(b'y', flagged).raw(&real.to_le_bytes()).raw(&imag.to_le_bytes())
	}

	/// `x` complex with both parts as length-prefixed text.
	pub fn complex_text(&mut self, real: &str, imag: &str, flagged: bool) -> &mut Self {
		self.tag(b'x', flagged).short_payload(real.as_bytes()).short_payload(imag.as_bytes())
	}

	/// `s` bytes object.
	pub fn bytes_obj(&mut self, data: &[u8], flagged: bool) -> &mut Self {
		self.tag(b's', flagged).long_payload(data)
	}

	/// `u` unicode string.
	pub fn unicode(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'u', flagged).long_payload(text.as_bytes())
	}

	/// `t` interned string.
	pub fn interned(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b't', flagged).long_payload(text.as_bytes())
	}

	/// `a` ASCII string.
	pub fn ascii(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'a', flagged).long_payload(text.as_bytes())
	}

	/// `A` interned ASCII string.
	pub fn ascii_interned(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'A', flagged).long_payload(text.as_bytes())
	}

	/// `z` short ASCII string.
	pub fn short_ascii(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'z', flagged).short_payload(text.as_bytes())
	}

	/// `Z` short interned ASCII string.
	pub fn short_ascii_interned(&mut self, text: &str, flagged: bool) -> &mut Self {
		self.tag(b'Z', flagged).short_payload(text.as_bytes())
	}

	/// Sequence header (`(`, `[`, `<` or `>`) with a 4-byte count; elements follow.
	pub fn seq(&mut self, tag: u8, count: i32, flagged: bool) -> &mut Self {
		self.tag(tag, flagged).raw_i32(count)
	}

	/// `(` tuple header.
	pub fn tuple(&mut self, count: i32, flagged: bool) -> &mut Self {
		self.seq(b'(', count, flagged)
	}

	/// `[` list header.
	pub fn list(&mut self, count: i32, flagged: bool) -> &mut Self {
		self.seq(b'[', count, flagged)
	}

	/// `<` set header.
	pub fn set(&mut self, count: i32, flagged: bool) -> &mut Self {
		self.seq(b'<', count, flagged)
	}

	/// `>` frozenset header.
	pub fn frozenset(&mut self, count: i32, flagged: bool) -> &mut Self {
		self.seq(b'>', count, flagged)
	}

	/// `)` small tuple header.
	pub fn small_tuple(&mut self, count: u8, flagged: bool) -> &mut Self {
		self.tag(b')', flagged).raw(&[count])
	}

	/// `{` dict header; write key/value pairs then [`MarshalWriter::null`].
	pub fn dict(&mut self, flagged: bool) -> &mut Self {
		self.tag(b'{', flagged)
	}

	/// `r` back-reference.
	pub fn reference(&mut self, index: u32) -> &mut Self {
		self.tag(b'r', false).raw_u32(index)
	}

	/// `c` code object; `consts` must write exactly one object (normally a tuple).
	pub fn code(&mut self, shape: CodeShape, spec: CodeSpec<'_>, flagged: bool, consts: impl FnOnce(&mut Self)) -> &mut Self {
		self.tag(b'c', flagged);
		match shape {
			CodeShape::Py33 => {
				self.raw_i32(0).raw_i32(0).raw_i32(0).raw_i32(1).raw_i32(spec.flags);
			}
			CodeShape::Py38 | CodeShape::Py310 => {
				self.raw_i32(0).raw_i32(0).raw_i32(0).raw_i32(0).raw_i32(1).raw_i32(spec.flags);
			}
			CodeShape::Py311 => {
				self.raw_i32(0).raw_i32(0).raw_i32(0).raw_i32(1).raw_i32(spec.flags);
			}
		}

		self.bytes_obj(b"d\x00S\x00", false);
		consts(self);
		self.small_tuple(0, false);

		match shape {
			CodeShape::Py33 | CodeShape::Py38 | CodeShape::Py310 => {
				self.small_tuple(0, false).small_tuple(0, false).small_tuple(0, false);
				self.short_ascii(spec.filename, false).short_ascii(spec.name, false);
				self.raw_i32(spec.firstlineno).bytes_obj(b"", false);
			}
			CodeShape::Py311 => {
				self.small_tuple(0, false).bytes_obj(b"", false);
				self.short_ascii(spec.filename, false).short_ascii(spec.name, false);
				self.short_ascii(spec.qualname.unwrap_or(spec.name), false);
				self.raw_i32(spec.firstlineno).bytes_obj(b"", false).bytes_obj(b"", false);
			}
		}
		self
	}

	fn long_payload(&mut self, data: &[u8]) -> &mut Self {
		let len = i32::try_from(data.len()).expect("payload fits i32");
		self.raw_i32(len).raw(data)
	}

	fn short_payload(&mut self, data: &[u8]) -> &mut Self {
		let len = u8::try_from(data.len()).expect("short payload fits u8");
		self.raw(&[len]).raw(data)
	}
}
