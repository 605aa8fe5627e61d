use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, PycError>;

/// Errors produced while detecting, reading, and decoding `.pyc` data.
#[derive(Debug, Error)]
pub enum PycError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// No registered signature matched the leading bytes.
	#[error("not a recognized .pyc file (magic={magic:02x?})")]
	UnknownMagic {
		/// First up-to-4 bytes of the stream.
		magic: [u8; 4],
	},
	/// Fewer bytes than the fixed header requires.
	#[error("truncated header: need {need} bytes, have {have}")]
	TruncatedHeader {
		/// Bytes required by the selected header layout.
		need: usize,
		/// Bytes available from the start offset.
		have: usize,
	},
	/// Header magic does not map to a known format variant.
	#[error("unsupported format variant (magic={magic:02x?})")]
	UnsupportedVariant {
		/// Raw magic bytes.
		magic: [u8; 4],
	},
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// A signed length field decoded to a negative value.
	#[error("negative length {len} at offset {at}")]
	NegativeLength {
		/// Parsed signed length.
		len: i64,
		/// Offset of the length field.
		at: usize,
	},
	/// A length field decoded to a value outside the format's range.
	#[error("invalid length {len} at offset {at}")]
	InvalidLength {
		/// Parsed length.
		len: i64,
		/// Offset of the length field.
		at: usize,
	},
	/// Type byte not recognized by the marshal decoder.
	#[error("unknown tag 0x{tag:02x} at offset {at}")]
	UnknownTag {
		/// Tag with the reference flag stripped.
		tag: u8,
		/// Offset of the tag byte.
		at: usize,
	},
	/// Back-reference to an index that is not yet registered.
	#[error("dangling reference #{index} at offset {at} (table holds {len} entries)")]
	DanglingReference {
		/// Requested table index.
		index: u32,
		/// Offset of the reference tag.
		at: usize,
		/// Table length at resolution time.
		len: usize,
	},
	/// Null marker found outside a dict terminator position.
	#[error("unexpected null object in {context} at offset {at}")]
	UnexpectedNull {
		/// Structure being decoded when the null was read.
		context: &'static str,
		/// Offset of the null tag.
		at: usize,
	},
	/// Arbitrary-width integer digits were out of range or unnormalized.
	#[error("malformed long integer at offset {at}")]
	MalformedLong {
		/// Offset of the long tag.
		at: usize,
	},
	/// Text-encoded float could not be parsed.
	#[error("invalid float literal at offset {at}")]
	InvalidFloat {
		/// Offset of the float text.
		at: usize,
	},
	/// Object nesting exceeded the configured limit.
	#[error("decode depth exceeded at offset {at} (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
		/// Offset of the tag that would exceed the limit.
		at: usize,
	},
}

impl PycError {
	/// Byte offset where decoding failed, when the error is tied to one.
	pub fn offset(&self) -> Option<usize> {
		match self {
			Self::UnexpectedEof { at, .. }
			| Self::NegativeLength { at, .. }
			| Self::InvalidLength { at, .. }
			| Self::UnknownTag { at, .. }
			| Self::DanglingReference { at, .. }
			| Self::UnexpectedNull { at, .. }
			| Self::MalformedLong { at }
			| Self::InvalidFloat { at }
			| Self::DepthExceeded { at, .. } => Some(*at),
			Self::Io(_) | Self::UnknownMagic { .. } | Self::TruncatedHeader { .. } | Self::UnsupportedVariant { .. } => None,
		}
	}
}
