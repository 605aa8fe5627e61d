use crate::pyc::header::FormatVariant;

/// Identifier of a decoder selected by signature dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderId(pub &'static str);

impl DecoderId {
	/// Decoder for compiled Python bytecode containers.
	pub const PYC: Self = Self("pyc");

	/// Stable decoder label.
	pub fn as_str(self) -> &'static str {
		self.0
	}
}

#[derive(Debug, Clone)]
struct SignatureEntry {
	decoder: DecoderId,
	magic: Vec<u8>,
}

/// Ordered set of `(decoder, magic)` signatures.
///
/// Lookup picks the longest signature that prefixes the input. Signatures of
/// equal length resolve to whichever was registered first.
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
	entries: Vec<SignatureEntry>,
}

impl SignatureTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Table registering [`DecoderId::PYC`] for every known format variant magic.
	pub fn builtin() -> Self {
		let mut table = Self::new();
		for variant in FormatVariant::all() {
			table.register(DecoderId::PYC, variant.magic_bytes());
		}
		table
	}

	/// Append a signature. Earlier entries win ties against later ones.
	pub fn register(&mut self, decoder: DecoderId, magic: impl Into<Vec<u8>>) {
		self.entries.push(SignatureEntry {
			decoder,
			magic: magic.into(),
		});
	}

	/// Length of the longest registered signature.
	pub fn max_len(&self) -> usize {
		self.entries.iter().map(|entry| entry.magic.len()).max().unwrap_or(0)
	}

	/// Number of registered signatures.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no signatures are registered.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Return the decoder whose signature best matches the start of `prefix`.
	pub fn match_prefix(&self, prefix: &[u8]) -> Option<DecoderId> {
		let mut best: Option<&SignatureEntry> = None;
		for entry in &self.entries {
			if !prefix.starts_with(&entry.magic) {
				continue;
			}
			if best.is_none_or(|current| entry.magic.len() > current.magic.len()) {
				best = Some(entry);
			}
		}
		best.map(|entry| entry.decoder)
	}
}

/// Run signature dispatch over the leading bytes of `bytes`.
pub fn detect(table: &SignatureTable, bytes: &[u8]) -> Option<DecoderId> {
	let prefix = &bytes[..bytes.len().min(table.max_len())];
	table.match_prefix(prefix)
}
