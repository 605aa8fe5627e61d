use crate::pyc::Chunk;

/// Assert that every child lies inside its parent and siblings do not overlap.
pub(crate) fn assert_well_formed(chunk: &Chunk) {
	assert!(chunk.range.start <= chunk.range.end, "inverted range in {}", chunk.name);

	let mut prev_end = chunk.range.start;
	for child in &chunk.children {
		assert!(
			chunk.range.contains(child.range),
			"{} {:?} escapes parent {} {:?}",
			child.name,
			child.range,
			chunk.name,
			chunk.range
		);
		assert!(child.range.start >= prev_end, "{} overlaps previous sibling in {}", child.name, chunk.name);
		prev_end = child.range.end;
		assert_well_formed(child);
	}
}
