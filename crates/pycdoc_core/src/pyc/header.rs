use std::fmt;

use crate::pyc::bytes::Cursor;
use crate::pyc::{PycError, Result};

/// Fixed header shape that precedes the marshalled body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
	/// `magic, mtime, source_size` (12 bytes, Python 3.3 to 3.6).
	Classic,
	/// `magic, flags, mtime|hash` (16 bytes, PEP 552, Python 3.7+).
	Pep552,
}

impl HeaderLayout {
	/// Header size in bytes, magic included.
	pub fn size(self) -> usize {
		match self {
			Self::Classic => 12,
			Self::Pep552 => 16,
		}
	}
}

/// Storage kind of one code-object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFieldKind {
	/// Raw little-endian `i32` without a type tag.
	Int,
	/// Nested marshal object.
	Object,
}

/// One entry of a code-object record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFieldSpec {
	/// Field name used for chunk labels.
	pub name: &'static str,
	/// Field storage kind.
	pub kind: CodeFieldKind,
}

const fn int(name: &'static str) -> CodeFieldSpec {
	CodeFieldSpec {
		name,
		kind: CodeFieldKind::Int,
	}
}

const fn obj(name: &'static str) -> CodeFieldSpec {
	CodeFieldSpec {
		name,
		kind: CodeFieldKind::Object,
	}
}

const PY33_FIELDS: &[CodeFieldSpec] = &[
	int("argcount"),
	int("kwonlyargcount"),
	int("nlocals"),
	int("stacksize"),
	int("flags"),
	obj("code"),
	obj("constants"),
	obj("names"),
	obj("varnames"),
	obj("freevars"),
	obj("cellvars"),
	obj("filename"),
	obj("name"),
	int("firstlineno"),
	obj("lnotab"),
];

const PY38_FIELDS: &[CodeFieldSpec] = &[
	int("argcount"),
	int("posonlyargcount"),
	int("kwonlyargcount"),
	int("nlocals"),
	int("stacksize"),
	int("flags"),
	obj("code"),
	obj("constants"),
	obj("names"),
	obj("varnames"),
	obj("freevars"),
	obj("cellvars"),
	obj("filename"),
	obj("name"),
	int("firstlineno"),
	obj("lnotab"),
];

const PY310_FIELDS: &[CodeFieldSpec] = &[
	int("argcount"),
	int("posonlyargcount"),
	int("kwonlyargcount"),
	int("nlocals"),
	int("stacksize"),
	int("flags"),
	obj("code"),
	obj("constants"),
	obj("names"),
	obj("varnames"),
	obj("freevars"),
	obj("cellvars"),
	obj("filename"),
	obj("name"),
	int("firstlineno"),
	obj("linetable"),
];

const PY311_FIELDS: &[CodeFieldSpec] = &[
	int("argcount"),
	int("posonlyargcount"),
	int("kwonlyargcount"),
	int("stacksize"),
	int("flags"),
	obj("code"),
	obj("constants"),
	obj("names"),
	obj("localsplusnames"),
	obj("localspluskinds"),
	obj("filename"),
	obj("name"),
	obj("qualname"),
	int("firstlineno"),
	obj("linetable"),
	obj("exceptiontable"),
];

/// Code-object record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLayout {
	/// Python 3.3 to 3.7.
	Py33,
	/// Python 3.8 and 3.9 (adds `posonlyargcount`).
	Py38,
	/// Python 3.10 (`lnotab` becomes `linetable`).
	Py310,
	/// Python 3.11+ (locals-plus tables, `qualname`, exception table).
	Py311,
}

impl CodeLayout {
	/// Ordered field list for this layout.
	pub fn fields(self) -> &'static [CodeFieldSpec] {
		match self {
			Self::Py33 => PY33_FIELDS,
			Self::Py38 => PY38_FIELDS,
			Self::Py310 => PY310_FIELDS,
			Self::Py311 => PY311_FIELDS,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Py33 => "py33",
			Self::Py38 => "py38",
			Self::Py310 => "py310",
			Self::Py311 => "py311",
		}
	}
}

/// Recognized format revision, selected solely by the header magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatVariant {
	/// Magic number stored little-endian in the first two bytes.
	pub magic: u16,
	/// Python release that introduced this magic.
	pub python: &'static str,
	/// Header layout.
	pub header: HeaderLayout,
	/// Code-object record layout.
	pub code: CodeLayout,
}

const fn variant(magic: u16, python: &'static str, header: HeaderLayout, code: CodeLayout) -> FormatVariant {
	FormatVariant { magic, python, header, code }
}

const VARIANTS: &[FormatVariant] = &[
	variant(3230, "3.3", HeaderLayout::Classic, CodeLayout::Py33),
	variant(3310, "3.4", HeaderLayout::Classic, CodeLayout::Py33),
	variant(3350, "3.5", HeaderLayout::Classic, CodeLayout::Py33),
	variant(3351, "3.5.3", HeaderLayout::Classic, CodeLayout::Py33),
	variant(3379, "3.6", HeaderLayout::Classic, CodeLayout::Py33),
	variant(3394, "3.7", HeaderLayout::Pep552, CodeLayout::Py33),
	variant(3413, "3.8", HeaderLayout::Pep552, CodeLayout::Py38),
	variant(3425, "3.9", HeaderLayout::Pep552, CodeLayout::Py38),
	variant(3439, "3.10", HeaderLayout::Pep552, CodeLayout::Py310),
	variant(3495, "3.11", HeaderLayout::Pep552, CodeLayout::Py311),
	variant(3531, "3.12", HeaderLayout::Pep552, CodeLayout::Py311),
	variant(3571, "3.13", HeaderLayout::Pep552, CodeLayout::Py311),
];

impl FormatVariant {
	/// Every recognized variant, oldest first.
	pub fn all() -> &'static [FormatVariant] {
		VARIANTS
	}

	/// Look up the variant for raw magic bytes (`lo, hi, '\r', '\n'`).
	pub fn from_magic(magic: [u8; 4]) -> Option<&'static FormatVariant> {
		if magic[2..] != *b"\r\n" {
			return None;
		}
		let number = u16::from_le_bytes([magic[0], magic[1]]);
		VARIANTS.iter().find(|item| item.magic == number)
	}

	/// Raw magic bytes as stored in the file.
	pub fn magic_bytes(&self) -> [u8; 4] {
		let [lo, hi] = self.magic.to_le_bytes();
		[lo, hi, b'\r', b'\n']
	}
}

/// Source-freshness stamp stored after the magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStamp {
	/// Source modification time and size.
	Timestamp {
		/// Seconds since the Unix epoch, truncated to 32 bits.
		mtime: u32,
		/// Source size in bytes, truncated to 32 bits.
		source_size: u32,
	},
	/// SipHash of the source (hash-based pycs).
	Hash {
		/// Raw 8-byte source hash.
		hash: [u8; 8],
		/// Whether the importer re-validates against the source.
		check_source: bool,
	},
}

/// Parsed `.pyc` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PycHeader {
	/// Absolute offset of the first header byte.
	pub offset: usize,
	/// Raw magic bytes.
	pub magic: [u8; 4],
	/// Format revision selected by the magic.
	pub variant: &'static FormatVariant,
	/// PEP 552 flags word, absent for classic headers.
	pub flags: Option<u32>,
	/// Timestamp or hash validation stamp.
	pub stamp: SourceStamp,
}

impl PycHeader {
	const FLAG_HASH_BASED: u32 = 0b01;
	const FLAG_CHECK_SOURCE: u32 = 0b10;

	/// Parse a header starting at absolute offset `start` of `bytes`.
	pub fn parse(bytes: &[u8], start: usize) -> Result<Self> {
		let have = bytes.len().saturating_sub(start);
		if have < 4 {
			return Err(PycError::TruncatedHeader { need: 4, have });
		}

		let mut cursor = Cursor::at(bytes, start);
		let magic = cursor.read_array::<4>()?;
		let variant = FormatVariant::from_magic(magic).ok_or(PycError::UnsupportedVariant { magic })?;

		let need = variant.header.size();
		if have < need {
			return Err(PycError::TruncatedHeader { need, have });
		}

		let (flags, stamp) = match variant.header {
			HeaderLayout::Classic => (None, read_timestamp(&mut cursor)?),
			HeaderLayout::Pep552 => {
				let flags = cursor.read_u32_le()?;
				let stamp = if flags & Self::FLAG_HASH_BASED != 0 {
					SourceStamp::Hash {
						hash: cursor.read_array()?,
						check_source: flags & Self::FLAG_CHECK_SOURCE != 0,
					}
				} else {
					read_timestamp(&mut cursor)?
				};
				(Some(flags), stamp)
			}
		};

		tracing::debug!(
			offset = start,
			magic = variant.magic,
			python = variant.python,
			code_layout = variant.code.as_str(),
			"pyc header parsed"
		);

		Ok(Self {
			offset: start,
			magic,
			variant,
			flags,
			stamp,
		})
	}

	/// Header size in bytes.
	pub fn size(&self) -> usize {
		self.variant.header.size()
	}

	/// Absolute offset one past the last header byte.
	pub fn end(&self) -> usize {
		self.offset + self.size()
	}
}

fn read_timestamp(cursor: &mut Cursor<'_>) -> Result<SourceStamp> {
	let mtime = cursor.read_u32_le()?;
	let source_size = cursor.read_u32_le()?;
	Ok(SourceStamp::Timestamp { mtime, source_size })
}

impl fmt::Display for PycHeader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "magic {} (Python {})", self.variant.magic, self.variant.python)?;
		if let Some(flags) = self.flags {
			write!(f, ", flags 0x{flags:x}")?;
		}
		match self.stamp {
			SourceStamp::Timestamp { mtime, source_size } => write!(f, ", mtime {mtime}, source size {source_size}"),
			SourceStamp::Hash { hash, check_source } => {
				write!(f, ", source hash ")?;
				for byte in hash {
					write!(f, "{byte:02x}")?;
				}
				write!(f, ", check_source {check_source}")
			}
		}
	}
}
