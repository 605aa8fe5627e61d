use crate::pyc::bytes::Cursor;
use crate::pyc::chunk::{Chunk, ChunkRange, build_object_chunk};
use crate::pyc::marshal::{DecodeOptions, read_object};
use crate::pyc::value::ObjectGraph;
use crate::pyc::{PycHeader, Result};

/// Decoded `.pyc` container located inside a larger buffer.
#[derive(Debug, Clone)]
pub struct PycFile<'a> {
	/// Parsed header.
	pub header: PycHeader,
	/// Decoded top-level object and back-reference table.
	pub graph: ObjectGraph<'a>,
	bytes: &'a [u8],
	body_end: usize,
}

impl<'a> PycFile<'a> {
	/// Parse the container that starts at absolute offset `start` of `bytes`.
	pub fn parse(bytes: &'a [u8], start: usize, opt: &DecodeOptions) -> Result<Self> {
		let header = PycHeader::parse(bytes, start)?;
		let mut cursor = Cursor::at(bytes, header.end());
		let graph = read_object(&mut cursor, header.variant.code, opt)?;
		let body_end = cursor.pos();

		if cursor.remaining() > 0 {
			tracing::debug!(offset = body_end, len = cursor.remaining(), "trailing data after marshalled body");
		}

		Ok(Self {
			header,
			graph,
			bytes,
			body_end,
		})
	}

	/// Absolute offset one past the marshalled body.
	pub fn body_end(&self) -> usize {
		self.body_end
	}

	/// Bytes left after the body.
	pub fn trailing_len(&self) -> usize {
		self.bytes.len() - self.body_end
	}

	/// Build the chunk tree: header, top-level object, and any trailing data.
	pub fn chunk_tree(&self, opt: &DecodeOptions) -> Chunk {
		let variant = self.header.variant;
		let mut root = Chunk::new(ChunkRange::new(self.header.offset, self.bytes.len()), "pyc", "pyc file")
			.with_comment(format!("Python {} (magic {})", variant.python, variant.magic));

		root.children.push(Chunk::new(ChunkRange::new(self.header.offset, self.header.end()), "header", "header").with_comment(self.header.to_string()));
		root.children.push(build_object_chunk(&self.graph, opt));

		if self.trailing_len() > 0 {
			root.children.push(
				Chunk::new(ChunkRange::new(self.body_end, self.bytes.len()), "trailing", "trailing data")
					.with_comment(format!("{} bytes", self.trailing_len())),
			);
		}
		root
	}
}

/// Decode the container at `start_offset` of `buffer` into a chunk tree with default options.
pub fn decode(buffer: &[u8], start_offset: u64) -> Result<Chunk> {
	decode_with_options(buffer, start_offset, &DecodeOptions::default())
}

/// Decode the container at `start_offset` of `buffer` into a chunk tree.
///
/// Chunk ranges are absolute offsets into `buffer`. Any decode error aborts
/// the whole call; no partial tree is produced.
pub fn decode_with_options(buffer: &[u8], start_offset: u64, opt: &DecodeOptions) -> Result<Chunk> {
	let start = usize::try_from(start_offset).unwrap_or(usize::MAX);
	let file = PycFile::parse(buffer, start, opt)?;
	Ok(file.chunk_tree(opt))
}
