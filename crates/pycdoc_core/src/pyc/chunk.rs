use serde::Serialize;

use crate::pyc::DecodeOptions;
use crate::pyc::value::{CodeFieldValue, CodeObject, Object, ObjectGraph, ObjectId, Span, StrKind};

/// Half-open absolute byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkRange {
	/// First byte.
	pub start: u64,
	/// One past the last byte.
	pub end: u64,
}

impl ChunkRange {
	/// Range from `usize` offsets.
	pub fn new(start: usize, end: usize) -> Self {
		Self {
			start: start as u64,
			end: end as u64,
		}
	}

	/// Length in bytes.
	pub fn len(self) -> u64 {
		self.end - self.start
	}

	/// Whether the range covers no bytes.
	pub fn is_empty(self) -> bool {
		self.start == self.end
	}

	/// Whether `other` lies fully inside this range.
	pub fn contains(self, other: ChunkRange) -> bool {
		self.start <= other.start && other.end <= self.end
	}
}

impl From<Span> for ChunkRange {
	fn from(span: Span) -> Self {
		Self::new(span.start, span.end)
	}
}

/// Annotated byte range with ordered, non-overlapping children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
	/// Bytes covered.
	pub range: ChunkRange,
	/// Semantic type label (`code`, `tuple`, `string`, `header`, ...).
	pub kind: &'static str,
	/// Display name.
	pub name: String,
	/// Free-text annotation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
	/// Range of the chunk a reference resolves to.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target: Option<ChunkRange>,
	/// Nested chunks in byte order.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub children: Vec<Chunk>,
}

impl Chunk {
	/// Leaf chunk without annotations.
	pub fn new(range: ChunkRange, kind: &'static str, name: impl Into<String>) -> Self {
		Self {
			range,
			kind,
			name: name.into(),
			comment: None,
			target: None,
			children: Vec::new(),
		}
	}

	/// Attach a comment.
	pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
		self.comment = Some(comment.into());
		self
	}

	/// First direct child with the given name.
	pub fn child(&self, name: &str) -> Option<&Chunk> {
		self.children.iter().find(|child| child.name == name)
	}

	/// First chunk, depth-first and pre-order, matching `pred`.
	pub fn find(&self, pred: &impl Fn(&Chunk) -> bool) -> Option<&Chunk> {
		if pred(self) {
			return Some(self);
		}
		self.children.iter().find_map(|child| child.find(pred))
	}

	/// Visit every chunk depth-first with its nesting depth.
	pub fn walk(&self, visit: &mut impl FnMut(&Chunk, usize)) {
		self.walk_at(0, visit);
	}

	fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&Chunk, usize)) {
		visit(self, depth);
		for child in &self.children {
			child.walk_at(depth + 1, visit);
		}
	}

	/// Total number of chunks in this subtree.
	pub fn count(&self) -> usize {
		1 + self.children.iter().map(Chunk::count).sum::<usize>()
	}
}

const CO_FLAGS: &[(i32, &str)] = &[
	(0x0001, "OPTIMIZED"),
	(0x0002, "NEWLOCALS"),
	(0x0004, "VARARGS"),
	(0x0008, "VARKEYWORDS"),
	(0x0010, "NESTED"),
	(0x0020, "GENERATOR"),
	(0x0040, "NOFREE"),
	(0x0080, "COROUTINE"),
	(0x0100, "ITERABLE_COROUTINE"),
	(0x0200, "ASYNC_GENERATOR"),
];

/// Build the chunk subtree for the root of a decoded object graph.
pub fn build_object_chunk(graph: &ObjectGraph<'_>, opt: &DecodeOptions) -> Chunk {
	ChunkBuilder { graph, opt }.node(graph.root(), None)
}

struct ChunkBuilder<'g, 'a> {
	graph: &'g ObjectGraph<'a>,
	opt: &'g DecodeOptions,
}

impl ChunkBuilder<'_, '_> {
	fn node(&self, id: ObjectId, label: Option<String>) -> Chunk {
		let node = self.graph.node(id);
		let kind = node.value.kind_label();
		let name = match &node.value {
			Object::Code(_) => self.graph.code_name(id).or(label),
			_ => label,
		};
		let mut chunk = Chunk::new(node.span.into(), kind, name.unwrap_or_else(|| kind.to_owned()));

		let mut notes = Vec::new();
		match &node.value {
			Object::Seq { items, .. } => {
				notes.push(format!("{} items", items.len()));
				chunk.children = items
					.iter()
					.enumerate()
					.map(|(idx, item)| self.node(*item, Some(format!("[{idx}]"))))
					.collect();
			}
			Object::Dict(pairs) => {
				notes.push(format!("{} entries", pairs.len()));
				for (idx, (key, value)) in pairs.iter().enumerate() {
					let value_label = self.key_label(*key).unwrap_or_else(|| format!("value[{idx}]"));
					chunk.children.push(self.node(*key, Some(format!("key[{idx}]"))));
					chunk.children.push(self.node(*value, Some(value_label)));
				}
			}
			Object::Code(code) => {
				notes.extend(self.code_location(code));
				chunk.children = self.code_fields(code);
			}
			Object::Ref { index, target } => {
				let target_node = self.graph.node(*target);
				chunk.target = Some(target_node.span.into());
				notes.push(format!(
					"-> #{index} {} at {}..{}",
					target_node.value.kind_label(),
					target_node.span.start,
					target_node.span.end
				));
			}
			value => notes.extend(self.preview(value)),
		}
		if let Some(index) = node.ref_index {
			notes.push(format!("ref #{index}"));
		}

		if !notes.is_empty() {
			chunk.comment = Some(notes.join(", "));
		}
		chunk
	}

	fn code_fields(&self, code: &CodeObject) -> Vec<Chunk> {
		code.fields
			.iter()
			.map(|field| match field.value {
				CodeFieldValue::Int(value) => {
					let comment = if field.name == "flags" { flags_comment(value) } else { value.to_string() };
					Chunk::new(field.span.into(), "int", field.name).with_comment(comment)
				}
				CodeFieldValue::Object(id) => self.node(id, Some(field.name.to_owned())),
			})
			.collect()
	}

	fn code_location(&self, code: &CodeObject) -> Option<String> {
		let filename = code.object_field("filename").and_then(|id| self.graph.text(id))?;
		let filename = String::from_utf8_lossy(filename);
		Some(match code.int_field("firstlineno") {
			Some(line) => format!("{filename}:{line}"),
			None => filename.into_owned(),
		})
	}

	fn key_label(&self, key: ObjectId) -> Option<String> {
		match self.graph.get(self.graph.resolve(key)) {
			Object::Str { text, .. } => Some(self.quote(text)),
			Object::Int(value) => Some(value.to_string()),
			_ => None,
		}
	}

	fn preview(&self, value: &Object<'_>) -> Option<String> {
		match value {
			Object::Bool(value) => Some(if *value { "True" } else { "False" }.to_owned()),
			Object::Int(value) => Some(value.to_string()),
			Object::Long(value) => Some(self.truncate(&value.to_decimal())),
			Object::Float(value) => Some(format!("{value:?}")),
			Object::Complex { real, imag } => Some(format!("({real:?}{imag:+?}j)")),
			Object::Bytes(data) => Some(format!("{} bytes", data.len())),
			Object::Str { text, kind } => {
				let mut out = self.quote(text);
				if kind.is_interned() {
					out.push_str(", interned");
				}
				if matches!(kind, StrKind::Ascii | StrKind::AsciiInterned | StrKind::ShortAscii | StrKind::ShortAsciiInterned) {
					out.push_str(", ascii");
				}
				Some(out)
			}
			_ => None,
		}
	}

	fn quote(&self, text: &[u8]) -> String {
		format!("'{}'", self.truncate(&String::from_utf8_lossy(text).escape_debug().to_string()))
	}

	fn truncate(&self, text: &str) -> String {
		if text.chars().count() <= self.opt.preview_chars {
			return text.to_owned();
		}
		let out: String = text.chars().take(self.opt.preview_chars).collect();
		format!("{out}...")
	}
}

fn flags_comment(flags: i32) -> String {
	let names: Vec<&str> = CO_FLAGS.iter().filter(|(bit, _)| flags & bit != 0).map(|(_, name)| *name).collect();
	if names.is_empty() {
		format!("0x{flags:x}")
	} else {
		format!("0x{flags:x} {}", names.join("|"))
	}
}

#[cfg(test)]
mod tests;
