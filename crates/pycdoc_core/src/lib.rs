//! Public library API for decoding compiled Python `.pyc` files into annotated byte-range chunks.

/// Header, marshal decoding, and chunk tree construction.
pub mod pyc;
