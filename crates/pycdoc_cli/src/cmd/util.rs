use std::io::Write;
use std::path::Path;

use pycdoc::pyc::{DecoderId, PycError, Result, SignatureTable, detect};

/// Read `path` and check that a known container starts at `offset`.
pub(crate) fn load(path: &Path, offset: u64) -> Result<(Vec<u8>, usize, DecoderId)> {
	let bytes = std::fs::read(path)?;
	let start = usize::try_from(offset).unwrap_or(usize::MAX).min(bytes.len());
	let decoder = detect(&SignatureTable::builtin(), &bytes[start..]).ok_or_else(|| PycError::UnknownMagic {
		magic: leading_magic(&bytes[start..]),
	})?;

	tracing::debug!(path = %path.display(), offset = start, decoder = decoder.as_str(), "signature matched");
	Ok((bytes, start, decoder))
}

/// Write `payload` to stdout as pretty JSON.
pub(crate) fn emit_json<T: serde::Serialize>(payload: &T) -> Result<()> {
	let mut out = std::io::stdout().lock();
	serde_json::to_writer_pretty(&mut out, payload).map_err(std::io::Error::from)?;
	writeln!(out)?;
	Ok(())
}

fn leading_magic(bytes: &[u8]) -> [u8; 4] {
	let mut out = [0_u8; 4];
	let len = bytes.len().min(4);
	out[..len].copy_from_slice(&bytes[..len]);
	out
}
