use crate::pyc::{PycError, Result};

/// Bounded little-endian read cursor over an immutable byte slice.
///
/// Offsets are absolute within the wrapped slice. A read that cannot be
/// satisfied returns an error and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Create a cursor at `pos`, clamped to the slice length.
	pub fn at(bytes: &'a [u8], pos: usize) -> Self {
		Self {
			bytes,
			pos: pos.min(bytes.len()),
		}
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return total length of the underlying slice.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Return whether the underlying slice is empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(eof(self, n));
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read `N` bytes into a fixed array.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_array::<1>()?[0])
	}

	/// Read a little-endian `u16`.
	pub fn read_u16_le(&mut self) -> Result<u16> {
		self.read_array().map(u16::from_le_bytes)
	}

	/// Read a little-endian `u32`.
	pub fn read_u32_le(&mut self) -> Result<u32> {
		self.read_array().map(u32::from_le_bytes)
	}

	/// Read a little-endian `i32`.
	pub fn read_i32_le(&mut self) -> Result<i32> {
		self.read_array().map(i32::from_le_bytes)
	}

	/// Read a little-endian `i64`.
	pub fn read_i64_le(&mut self) -> Result<i64> {
		self.read_array().map(i64::from_le_bytes)
	}

	/// Read a little-endian IEEE-754 `f64`.
	pub fn read_f64_le(&mut self) -> Result<f64> {
		self.read_array().map(f64::from_le_bytes)
	}

	/// Read a 4-byte signed length, rejecting negative values without advancing.
	pub fn read_len(&mut self) -> Result<usize> {
		let at = self.pos;
		let len = self.read_i32_le()?;
		match usize::try_from(len) {
			Ok(len) => Ok(len),
			Err(_) => {
				self.pos = at;
				Err(PycError::NegativeLength { len: i64::from(len), at })
			}
		}
	}

	/// Read a 4-byte signed length followed by that many bytes.
	///
	/// On failure the cursor is restored to the start of the length field.
	pub fn read_len_prefixed(&mut self) -> Result<&'a [u8]> {
		let at = self.pos;
		let len = self.read_len()?;
		self.read_exact(len).inspect_err(|_| self.pos = at)
	}

	/// Read a 1-byte length followed by that many bytes.
	pub fn read_u8_prefixed(&mut self) -> Result<&'a [u8]> {
		let at = self.pos;
		let len = self.read_u8()?;
		self.read_exact(usize::from(len)).inspect_err(|_| self.pos = at)
	}
}

fn eof(cursor: &Cursor<'_>, need: usize) -> PycError {
	PycError::UnexpectedEof {
		at: cursor.pos,
		need,
		rem: cursor.remaining(),
	}
}

#[cfg(test)]
mod tests;
