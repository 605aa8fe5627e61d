use crate::pyc::header::CodeLayout;

/// Index of a node inside an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
	/// Position of the node in [`ObjectGraph::nodes`].
	pub fn index(self) -> usize {
		self.0
	}
}

/// Half-open absolute byte span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
	/// First byte.
	pub start: usize,
	/// One past the last byte.
	pub end: usize,
}

impl Span {
	/// Span length in bytes.
	pub fn len(self) -> usize {
		self.end - self.start
	}

	/// Whether the span covers no bytes.
	pub fn is_empty(self) -> bool {
		self.start == self.end
	}
}

/// String flavour carried by the type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrKind {
	/// `u`: UTF-8 text.
	Unicode,
	/// `t`: interned UTF-8 text.
	Interned,
	/// `a`: ASCII text.
	Ascii,
	/// `A`: interned ASCII text.
	AsciiInterned,
	/// `z`: ASCII text with 1-byte length.
	ShortAscii,
	/// `Z`: interned ASCII text with 1-byte length.
	ShortAsciiInterned,
}

impl StrKind {
	/// Whether the writer interned this string.
	pub fn is_interned(self) -> bool {
		matches!(self, Self::Interned | Self::AsciiInterned | Self::ShortAsciiInterned)
	}
}

/// Sequence flavour for list-like containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqKind {
	/// `(` or `)`.
	Tuple,
	/// `[`.
	List,
	/// `<`.
	Set,
	/// `>`.
	FrozenSet,
}

impl SeqKind {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Tuple => "tuple",
			Self::List => "list",
			Self::Set => "set",
			Self::FrozenSet => "frozenset",
		}
	}
}

/// Arbitrary-width integer as stored: sign plus little-endian base-2^15 digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongInt<'a> {
	/// Sign of the value.
	pub negative: bool,
	/// Raw digit bytes, two per digit, least significant digit first.
	pub digits: &'a [u8],
}

impl LongInt<'_> {
	const DIGIT_BITS: u32 = 15;

	/// Number of 15-bit digits.
	pub fn digit_count(&self) -> usize {
		self.digits.len() / 2
	}

	fn digit_iter(&self) -> impl DoubleEndedIterator<Item = u16> + '_ {
		self.digits.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
	}

	/// Value as `i128` when it fits.
	pub fn to_i128(&self) -> Option<i128> {
		let mut magnitude = 0_u128;
		for digit in self.digit_iter().rev() {
			if magnitude.leading_zeros() < Self::DIGIT_BITS {
				return None;
			}
			magnitude = (magnitude << Self::DIGIT_BITS) | u128::from(digit);
		}
		let magnitude = i128::try_from(magnitude).ok()?;
		Some(if self.negative { -magnitude } else { magnitude })
	}

	/// Decimal rendering of any width.
	pub fn to_decimal(&self) -> String {
		if let Some(value) = self.to_i128() {
			return value.to_string();
		}

		// Repeated division of the base-2^15 magnitude by 10^4.
		let mut work: Vec<u32> = self.digit_iter().map(u32::from).collect();
		let mut groups = Vec::new();
		while work.iter().any(|digit| *digit != 0) {
			let mut rem = 0_u32;
			for digit in work.iter_mut().rev() {
				let cur = (rem << Self::DIGIT_BITS) | *digit;
				*digit = cur / 10_000;
				rem = cur % 10_000;
			}
			groups.push(rem);
			while work.last() == Some(&0) {
				work.pop();
			}
		}

		let mut iter = groups.iter().rev();
		let head = iter.next().map(u32::to_string).unwrap_or_default();
		let tail: String = iter.map(|group| format!("{group:04}")).collect();
		format!("{}{head}{tail}", if self.negative { "-" } else { "" })
	}
}

/// Decoded value of one code-object field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFieldValue {
	/// Untagged `i32`.
	Int(i32),
	/// Nested object node.
	Object(ObjectId),
}

/// One decoded code-object field with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeField {
	/// Field name from the layout.
	pub name: &'static str,
	/// Bytes covered by the field.
	pub span: Span,
	/// Decoded value.
	pub value: CodeFieldValue,
}

/// Decoded code object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeObject {
	/// Layout used to decode the record.
	pub layout: CodeLayout,
	/// Fields in record order.
	pub fields: Vec<CodeField>,
}

impl CodeObject {
	/// Look up a field by layout name.
	pub fn field(&self, name: &str) -> Option<CodeFieldValue> {
		self.fields.iter().find(|field| field.name == name).map(|field| field.value)
	}

	/// Look up a raw integer field.
	pub fn int_field(&self, name: &str) -> Option<i32> {
		match self.field(name)? {
			CodeFieldValue::Int(value) => Some(value),
			CodeFieldValue::Object(_) => None,
		}
	}

	/// Look up a nested object field.
	pub fn object_field(&self, name: &str) -> Option<ObjectId> {
		match self.field(name)? {
			CodeFieldValue::Object(id) => Some(id),
			CodeFieldValue::Int(_) => None,
		}
	}
}

/// Decoded marshal value. Children are node ids in the owning graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Object<'a> {
	/// `N`.
	None,
	/// `F` / `T`.
	Bool(bool),
	/// `S`.
	StopIteration,
	/// `.`.
	Ellipsis,
	/// `i` / `I`.
	Int(i64),
	/// `l`.
	Long(LongInt<'a>),
	/// `f` / `g`.
	Float(f64),
	/// `x` / `y`.
	Complex {
		/// Real part.
		real: f64,
		/// Imaginary part.
		imag: f64,
	},
	/// `s`.
	Bytes(&'a [u8]),
	/// `t` `u` `a` `A` `z` `Z`.
	Str {
		/// Raw text bytes.
		text: &'a [u8],
		/// Tag flavour.
		kind: StrKind,
	},
	/// `(` `)` `[` `<` `>`.
	Seq {
		/// Container flavour.
		kind: SeqKind,
		/// Elements in encoded order.
		items: Vec<ObjectId>,
	},
	/// `{`: key/value pairs, excluding the null terminator.
	Dict(Vec<(ObjectId, ObjectId)>),
	/// `c`.
	Code(Box<CodeObject>),
	/// `r`: alias of an earlier registered node.
	Ref {
		/// Back-reference table index.
		index: u32,
		/// Node the index resolved to.
		target: ObjectId,
	},
}

impl Object<'_> {
	/// Stable type label used for chunk kinds.
	pub fn kind_label(&self) -> &'static str {
		match self {
			Self::None => "none",
			Self::Bool(_) => "bool",
			Self::StopIteration => "stopiteration",
			Self::Ellipsis => "ellipsis",
			Self::Int(_) => "int",
			Self::Long(_) => "long",
			Self::Float(_) => "float",
			Self::Complex { .. } => "complex",
			Self::Bytes(_) => "bytes",
			Self::Str { .. } => "string",
			Self::Seq { kind, .. } => kind.as_str(),
			Self::Dict(_) => "dict",
			Self::Code(_) => "code",
			Self::Ref { .. } => "reference",
		}
	}
}

/// One decoded value with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode<'a> {
	/// Bytes from the tag through the last payload byte.
	pub span: Span,
	/// Tag byte with the reference flag stripped.
	pub tag: u8,
	/// Back-reference table index, when the value was flagged and registered.
	pub ref_index: Option<u32>,
	/// Decoded value.
	pub value: Object<'a>,
}

/// Arena of decoded nodes plus the final back-reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGraph<'a> {
	pub(crate) nodes: Vec<ObjectNode<'a>>,
	pub(crate) refs: Vec<ObjectId>,
	pub(crate) root: ObjectId,
}

impl<'a> ObjectGraph<'a> {
	/// Top-level node.
	pub fn root(&self) -> ObjectId {
		self.root
	}

	/// All nodes; children always precede their parents.
	pub fn nodes(&self) -> &[ObjectNode<'a>] {
		&self.nodes
	}

	/// Back-reference table: `refs()[i]` is the node registered at index `i`.
	pub fn refs(&self) -> &[ObjectId] {
		&self.refs
	}

	/// Node by id.
	///
	/// # Panics
	///
	/// Panics if `id` was not produced by this graph.
	pub fn node(&self, id: ObjectId) -> &ObjectNode<'a> {
		&self.nodes[id.index()]
	}

	/// Value by id. Panics on an id from another graph, like [`ObjectGraph::node`].
	pub fn get(&self, id: ObjectId) -> &Object<'a> {
		&self.node(id).value
	}

	/// Follow a back-reference to the aliased node; other ids are returned unchanged.
	pub fn resolve(&self, id: ObjectId) -> ObjectId {
		match self.get(id) {
			Object::Ref { target, .. } => *target,
			_ => id,
		}
	}

	/// Text of a string-like node, following a back-reference.
	pub fn text(&self, id: ObjectId) -> Option<&'a [u8]> {
		match self.get(self.resolve(id)) {
			Object::Str { text, .. } => Some(text),
			Object::Bytes(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Elements of a sequence node, following a back-reference.
	pub fn items(&self, id: ObjectId) -> Option<&[ObjectId]> {
		match self.get(self.resolve(id)) {
			Object::Seq { items, .. } => Some(items),
			_ => None,
		}
	}

	/// Code record of a code node, following a back-reference.
	pub fn code(&self, id: ObjectId) -> Option<&CodeObject> {
		match self.get(self.resolve(id)) {
			Object::Code(code) => Some(code),
			_ => None,
		}
	}

	/// Display name of a code object: `qualname` when present, otherwise `name`.
	pub fn code_name(&self, id: ObjectId) -> Option<String> {
		let code = self.code(id)?;
		let field = code.object_field("qualname").or_else(|| code.object_field("name"))?;
		self.text(field).map(|text| String::from_utf8_lossy(text).into_owned())
	}
}
