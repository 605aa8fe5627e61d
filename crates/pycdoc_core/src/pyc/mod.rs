mod bytes;
mod chunk;
mod error;
mod file;
mod header;
mod marshal;
mod signature;
mod value;

#[cfg(test)]
mod test_support;

/// Bounded little-endian read cursor.
pub use bytes::Cursor;
/// Chunk tree types and object-graph conversion.
pub use chunk::{Chunk, ChunkRange, build_object_chunk};
/// Error and result aliases.
pub use error::{PycError, Result};
/// Container entry points.
pub use file::{PycFile, decode, decode_with_options};
/// Header parsing and the format variant table.
pub use header::{CodeFieldKind, CodeFieldSpec, CodeLayout, FormatVariant, HeaderLayout, PycHeader, SourceStamp};
/// Marshal decoder, options, and type bytes.
pub use marshal::{DecodeOptions, FLAG_REF, read_object, tag};
/// Signature dispatch.
pub use signature::{DecoderId, SignatureTable, detect};
/// Decoded object graph types.
pub use value::{CodeField, CodeFieldValue, CodeObject, LongInt, Object, ObjectGraph, ObjectId, ObjectNode, SeqKind, Span, StrKind};
