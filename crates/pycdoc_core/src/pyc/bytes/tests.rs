use crate::pyc::PycError;
use crate::pyc::bytes::Cursor;

#[test]
fn reads_little_endian_scalars() {
	let mut bytes = vec![0x7f, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xfe, 0xff, 0xff, 0xff];
	bytes.extend_from_slice(&1.5_f64.to_le_bytes());
	let mut cursor = Cursor::new(&bytes);

	assert_eq!(cursor.read_u8().expect("u8"), 0x7f);
	assert_eq!(cursor.read_u16_le().expect("u16"), 0x1234);
	assert_eq!(cursor.read_u32_le().expect("u32"), 0x1234_5678);
	assert_eq!(cursor.read_i32_le().expect("i32"), -2);
	assert_eq!(cursor.read_f64_le().expect("f64"), 1.5);
	assert_eq!(cursor.remaining(), 0);
}

#[test]
fn failed_read_does_not_advance() {
	let bytes = [1_u8, 2, 3];
	let mut cursor = Cursor::at(&bytes, 1);

	let err = cursor.read_u32_le().expect_err("short read should fail");
	assert!(matches!(err, PycError::UnexpectedEof { at: 1, need: 4, rem: 2 }));
	assert_eq!(cursor.pos(), 1);
	assert_eq!(cursor.read_u16_le().expect("two bytes remain"), 0x0302);
}

#[test]
fn negative_length_is_rejected_at_field_offset() {
	let bytes = [0xaa, 0xff, 0xff, 0xff, 0xff, b'x'];
	let mut cursor = Cursor::at(&bytes, 1);

	let err = cursor.read_len_prefixed().expect_err("negative length should fail");
	assert!(matches!(err, PycError::NegativeLength { len: -1, at: 1 }));
	assert_eq!(cursor.pos(), 1);
}

#[test]
fn length_prefixed_read_borrows_without_copy() {
	let bytes = [5_u8, 0, 0, 0, b'h', b'e', b'l', b'l', b'o', b'!'];
	let mut cursor = Cursor::new(&bytes);

	let data = cursor.read_len_prefixed().expect("string reads");
	assert_eq!(data, b"hello");
	assert_eq!(data.as_ptr(), bytes[4..].as_ptr());
	assert_eq!(cursor.remaining(), 1);
}

#[test]
fn truncated_payload_restores_length_field_position() {
	let bytes = [9_u8, 0, 0, 0, b'a', b'b'];
	let mut cursor = Cursor::new(&bytes);

	let err = cursor.read_len_prefixed().expect_err("payload is short");
	assert!(matches!(err, PycError::UnexpectedEof { at: 4, need: 9, rem: 2 }));
	assert_eq!(cursor.pos(), 0);

	let err = Cursor::new(&[3, b'a']).read_u8_prefixed().expect_err("short u8-prefixed payload");
	assert!(matches!(err, PycError::UnexpectedEof { at: 1, need: 3, rem: 1 }));
}

#[test]
fn cursor_start_is_clamped_to_slice() {
	let bytes = [0_u8; 2];
	let cursor = Cursor::at(&bytes, 10);
	assert_eq!(cursor.pos(), 2);
	assert_eq!(cursor.remaining(), 0);
}
