use crate::pyc::bytes::Cursor;
use crate::pyc::header::{CodeFieldKind, CodeLayout};
use crate::pyc::value::{CodeField, CodeFieldValue, CodeObject, LongInt, Object, ObjectGraph, ObjectId, ObjectNode, SeqKind, Span, StrKind};
use crate::pyc::{PycError, Result};

/// Set on a type byte when the writer wants the value added to the back-reference table.
pub const FLAG_REF: u8 = 0x80;

/// Marshal type bytes.
pub mod tag {
	#![allow(missing_docs)]

	pub const NULL: u8 = b'0';
	pub const NONE: u8 = b'N';
	pub const FALSE: u8 = b'F';
	pub const TRUE: u8 = b'T';
	pub const STOPITER: u8 = b'S';
	pub const ELLIPSIS: u8 = b'.';
	pub const INT: u8 = b'i';
	pub const INT64: u8 = b'I';
	pub const FLOAT: u8 = b'f';
	pub const BINARY_FLOAT: u8 = b'g';
	pub const COMPLEX: u8 = b'x';
	pub const BINARY_COMPLEX: u8 = b'y';
	pub const LONG: u8 = b'l';
	pub const STRING: u8 = b's';
	pub const INTERNED: u8 = b't';
	pub const REF: u8 = b'r';
	pub const TUPLE: u8 = b'(';
	pub const LIST: u8 = b'[';
	pub const DICT: u8 = b'{';
	pub const CODE: u8 = b'c';
	pub const UNICODE: u8 = b'u';
	pub const SET: u8 = b'<';
	pub const FROZENSET: u8 = b'>';
	pub const ASCII: u8 = b'a';
	pub const ASCII_INTERNED: u8 = b'A';
	pub const SMALL_TUPLE: u8 = b')';
	pub const SHORT_ASCII: u8 = b'z';
	pub const SHORT_ASCII_INTERNED: u8 = b'Z';
}

/// Runtime limits and presentation switches for decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
	/// Maximum object nesting depth.
	pub max_depth: u32,
	/// Maximum characters of string content shown in chunk comments.
	pub preview_chars: usize,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: 256,
			preview_chars: 48,
		}
	}
}

/// Decode one marshalled object starting at the cursor position.
///
/// On success the cursor sits one past the last byte of the object.
pub fn read_object<'a>(cursor: &mut Cursor<'a>, layout: CodeLayout, opt: &DecodeOptions) -> Result<ObjectGraph<'a>> {
	let mut decoder = Decoder {
		cursor,
		layout,
		opt,
		nodes: Vec::new(),
		refs: BackRefTable::default(),
	};
	let root = decoder.value(0, "top level")?;
	let refs = decoder.refs.finish();

	tracing::debug!(nodes = decoder.nodes.len(), refs = refs.len(), end = decoder.cursor.pos(), "marshal object decoded");

	Ok(ObjectGraph {
		nodes: decoder.nodes,
		refs,
		root,
	})
}

/// Back-reference slots in registration order.
///
/// A slot is reserved when a flagged value's tag is read and filled once the
/// value is complete, so a composite cannot be referenced from inside itself.
#[derive(Debug, Default)]
struct BackRefTable {
	slots: Vec<Option<ObjectId>>,
}

impl BackRefTable {
	fn reserve(&mut self, at: usize) -> Result<u32> {
		let index = u32::try_from(self.slots.len()).map_err(|_| PycError::InvalidLength {
			len: i64::MAX,
			at,
		})?;
		self.slots.push(None);
		Ok(index)
	}

	fn fill(&mut self, index: u32, id: ObjectId) {
		if let Some(slot) = self.slots.get_mut(index as usize) {
			*slot = Some(id);
		}
	}

	fn resolve(&self, index: u32, at: usize) -> Result<ObjectId> {
		match self.slots.get(index as usize) {
			Some(Some(id)) => Ok(*id),
			_ => Err(PycError::DanglingReference {
				index,
				at,
				len: self.slots.len(),
			}),
		}
	}

	fn finish(self) -> Vec<ObjectId> {
		self.slots.into_iter().flatten().collect()
	}
}

struct Decoder<'a, 'c> {
	cursor: &'c mut Cursor<'a>,
	layout: CodeLayout,
	opt: &'c DecodeOptions,
	nodes: Vec<ObjectNode<'a>>,
	refs: BackRefTable,
}

impl<'a> Decoder<'a, '_> {
	fn value(&mut self, depth: u32, context: &'static str) -> Result<ObjectId> {
		let at = self.cursor.pos();
		self.value_or_null(depth)?.ok_or(PycError::UnexpectedNull { context, at })
	}

	fn value_or_null(&mut self, depth: u32) -> Result<Option<ObjectId>> {
		let at = self.cursor.pos();
		if depth >= self.opt.max_depth {
			return Err(PycError::DepthExceeded {
				max_depth: self.opt.max_depth,
				at,
			});
		}

		let raw = self.cursor.read_u8()?;
		let code = raw & !FLAG_REF;
		let flagged = raw & FLAG_REF != 0;
		tracing::trace!(at, tag = %char::from(code), flagged, depth, "object");

		if code == tag::NULL {
			return Ok(None);
		}

		let ref_index = if flagged && registers(code) { Some(self.refs.reserve(at)?) } else { None };
		let value = self.payload(code, at, depth)?;

		let id = ObjectId(self.nodes.len());
		self.nodes.push(ObjectNode {
			span: Span {
				start: at,
				end: self.cursor.pos(),
			},
			tag: code,
			ref_index,
			value,
		});
		if let Some(index) = ref_index {
			self.refs.fill(index, id);
		}
		Ok(Some(id))
	}

	fn payload(&mut self, code: u8, at: usize, depth: u32) -> Result<Object<'a>> {
		Ok(match code {
			tag::NONE => Object::None,
			tag::FALSE => Object::Bool(false),
			tag::TRUE => Object::Bool(true),
			tag::STOPITER => Object::StopIteration,
			tag::ELLIPSIS => Object::Ellipsis,
			tag::INT => Object::Int(i64::from(self.cursor.read_i32_le()?)),
			tag::INT64 => Object::Int(self.cursor.read_i64_le()?),
			tag::FLOAT => Object::Float(self.float_text()?),
			tag::BINARY_FLOAT => Object::Float(self.cursor.read_f64_le()?),
			tag::COMPLEX => {
				let real = self.float_text()?;
				let imag = self.float_text()?;
				Object::Complex { real, imag }
			}
			tag::BINARY_COMPLEX => {
				let real = self.cursor.read_f64_le()?;
				let imag = self.cursor.read_f64_le()?;
				Object::Complex { real, imag }
			}
			tag::LONG => Object::Long(self.long(at)?),
			tag::STRING => Object::Bytes(self.cursor.read_len_prefixed()?),
			tag::INTERNED => self.str_long(StrKind::Interned)?,
			tag::UNICODE => self.str_long(StrKind::Unicode)?,
			tag::ASCII => self.str_long(StrKind::Ascii)?,
			tag::ASCII_INTERNED => self.str_long(StrKind::AsciiInterned)?,
			tag::SHORT_ASCII => self.str_short(StrKind::ShortAscii)?,
			tag::SHORT_ASCII_INTERNED => self.str_short(StrKind::ShortAsciiInterned)?,
			tag::TUPLE => self.seq_long(SeqKind::Tuple, depth)?,
			tag::LIST => self.seq_long(SeqKind::List, depth)?,
			tag::SET => self.seq_long(SeqKind::Set, depth)?,
			tag::FROZENSET => self.seq_long(SeqKind::FrozenSet, depth)?,
			tag::SMALL_TUPLE => {
				let count = usize::from(self.cursor.read_u8()?);
				self.seq(SeqKind::Tuple, count, depth)?
			}
			tag::DICT => self.dict(depth)?,
			tag::CODE => self.code(depth)?,
			tag::REF => {
				let index = self.cursor.read_u32_le()?;
				let target = self.refs.resolve(index, at)?;
				Object::Ref { index, target }
			}
			_ => return Err(PycError::UnknownTag { tag: code, at }),
		})
	}

	fn str_long(&mut self, kind: StrKind) -> Result<Object<'a>> {
		let text = self.cursor.read_len_prefixed()?;
		Ok(Object::Str { text, kind })
	}

	fn str_short(&mut self, kind: StrKind) -> Result<Object<'a>> {
		let text = self.cursor.read_u8_prefixed()?;
		Ok(Object::Str { text, kind })
	}

	fn float_text(&mut self) -> Result<f64> {
		let at = self.cursor.pos();
		let raw = self.cursor.read_u8_prefixed()?;
		std::str::from_utf8(raw)
			.ok()
			.and_then(|text| text.trim().parse::<f64>().ok())
			.ok_or(PycError::InvalidFloat { at })
	}

	fn long(&mut self, at: usize) -> Result<LongInt<'a>> {
		let len_at = self.cursor.pos();
		let n = self.cursor.read_i32_le()?;
		if n == i32::MIN {
			return Err(PycError::InvalidLength {
				len: i64::from(n),
				at: len_at,
			});
		}

		let digit_count = n.unsigned_abs() as usize;
		let byte_len = digit_count.checked_mul(2).ok_or(PycError::InvalidLength {
			len: i64::from(n),
			at: len_at,
		})?;
		let digits = self.cursor.read_exact(byte_len)?;

		let mut iter = digits.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
		if iter.any(|digit| digit >= 1 << 15) {
			return Err(PycError::MalformedLong { at });
		}
		if digits.ends_with(&[0, 0]) {
			return Err(PycError::MalformedLong { at });
		}

		Ok(LongInt { negative: n < 0, digits })
	}

	fn seq_long(&mut self, kind: SeqKind, depth: u32) -> Result<Object<'a>> {
		let count = self.cursor.read_len()?;
		self.seq(kind, count, depth)
	}

	fn seq(&mut self, kind: SeqKind, count: usize, depth: u32) -> Result<Object<'a>> {
		// Every element needs at least one byte; cap the allocation accordingly.
		let mut items = Vec::with_capacity(count.min(self.cursor.remaining()));
		for _ in 0..count {
			items.push(self.value(depth + 1, kind.as_str())?);
		}
		Ok(Object::Seq { kind, items })
	}

	fn dict(&mut self, depth: u32) -> Result<Object<'a>> {
		let mut pairs = Vec::new();
		while let Some(key) = self.value_or_null(depth + 1)? {
			let value = self.value(depth + 1, "dict value")?;
			pairs.push((key, value));
		}
		Ok(Object::Dict(pairs))
	}

	fn code(&mut self, depth: u32) -> Result<Object<'a>> {
		let specs = self.layout.fields();
		let mut fields = Vec::with_capacity(specs.len());
		for spec in specs {
			let start = self.cursor.pos();
			let value = match spec.kind {
				CodeFieldKind::Int => CodeFieldValue::Int(self.cursor.read_i32_le()?),
				CodeFieldKind::Object => CodeFieldValue::Object(self.value(depth + 1, spec.name)?),
			};
			fields.push(CodeField {
				name: spec.name,
				span: Span {
					start,
					end: self.cursor.pos(),
				},
				value,
			});
		}
		Ok(Object::Code(Box::new(CodeObject { layout: self.layout, fields })))
	}
}

/// Whether a flagged value of this type occupies a back-reference slot.
fn registers(code: u8) -> bool {
	!matches!(
		code,
		tag::NULL | tag::NONE | tag::FALSE | tag::TRUE | tag::STOPITER | tag::ELLIPSIS | tag::REF
	)
}
