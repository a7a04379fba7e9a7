// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Buffer codec between host values and the native byte convention
//!
//! Outbound text is passed as its UTF-8 bytes; outbound bytes pass through
//! untouched. Inbound buffers are length-prefixed regions owned by the native
//! library, which are copied into host memory before anything else happens.
//! Text decoding is strict: malformed UTF-8 is a [`DecodeError::InvalidUtf8`],
//! never replaced.

use std::{borrow::Cow, slice, str};

use procmetrics_abi::LENGTH_PREFIX_SIZE;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{DecodeError, FramingError};

/// Outbound argument before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
	Text(&'a str),
	Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Payload<'a> {
	fn from(text: &'a str) -> Self {
		Payload::Text(text)
	}
}

impl<'a> From<&'a String> for Payload<'a> {
	fn from(text: &'a String) -> Self {
		Payload::Text(text.as_str())
	}
}

impl<'a> From<&'a [u8]> for Payload<'a> {
	fn from(bytes: &'a [u8]) -> Self {
		Payload::Bytes(bytes)
	}
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
	fn from(bytes: &'a Vec<u8>) -> Self {
		Payload::Bytes(bytes.as_slice())
	}
}

impl<'a, const N: usize> From<&'a [u8; N]> for Payload<'a> {
	fn from(bytes: &'a [u8; N]) -> Self {
		Payload::Bytes(bytes.as_slice())
	}
}

/// Encoded bytes handed to the native side as a (pointer, length) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBuffer<'a>(Cow<'a, [u8]>);

impl<'a> RawBuffer<'a> {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn as_ptr(&self) -> *const u8 {
		self.0.as_ptr()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Detach from the borrowed input so the buffer can cross to a worker thread
	pub fn into_owned(self) -> RawBuffer<'static> {
		RawBuffer(Cow::Owned(self.0.into_owned()))
	}
}

impl From<Vec<u8>> for RawBuffer<'static> {
	fn from(bytes: Vec<u8>) -> Self {
		RawBuffer(Cow::Owned(bytes))
	}
}

/// Encode text or bytes for a native call
///
/// Bytes are returned as-is. Text is already UTF-8 in memory, so neither case
/// copies.
pub fn encode<'a>(payload: impl Into<Payload<'a>>) -> RawBuffer<'a> {
	match payload.into() {
		Payload::Text(text) => RawBuffer(Cow::Borrowed(text.as_bytes())),
		Payload::Bytes(bytes) => RawBuffer(Cow::Borrowed(bytes)),
	}
}

/// Strict UTF-8 decode
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
	Ok(str::from_utf8(bytes)?.to_owned())
}

/// Copy a native length-prefixed region into host memory
///
/// Reads the 4-byte big-endian length `n`, checks it against `max_len`, then
/// copies the `n` bytes following the header. No payload byte is touched when
/// the declared length is over the limit.
///
/// # Safety
/// `ptr` must be null or point at a readable header followed by at least `n`
/// readable bytes, where `n` is the length the header declares.
pub unsafe fn read_length_prefixed(ptr: *const u8, max_len: usize) -> Result<Vec<u8>, FramingError> {
	if ptr.is_null() {
		return Err(FramingError::NullPointer);
	}

	let mut header = [0u8; LENGTH_PREFIX_SIZE];
	// SAFETY: caller guarantees the header is readable
	unsafe { header.copy_from_slice(slice::from_raw_parts(ptr, LENGTH_PREFIX_SIZE)) };

	let len = u32::from_be_bytes(header) as usize;
	if len > max_len {
		return Err(FramingError::LengthExceedsLimit {
			len,
			limit: max_len,
		});
	}

	// SAFETY: caller guarantees `len` bytes follow the header
	let payload = unsafe { slice::from_raw_parts(ptr.add(LENGTH_PREFIX_SIZE), len) };
	Ok(payload.to_vec())
}

/// Length-prefixed framing over a region whose bound is known
///
/// Bytes past the declared payload are ignored.
pub fn read_length_prefixed_slice(region: &[u8]) -> Result<&[u8], FramingError> {
	let Some((header, rest)) = region.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
		return Err(FramingError::TruncatedHeader {
			available: region.len(),
		});
	};

	let declared = u32::from_be_bytes(*header) as usize;
	rest.get(..declared).ok_or(FramingError::Truncated {
		declared,
		available: rest.len(),
	})
}

/// Build a length-prefixed region around `payload`
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, FramingError> {
	let len = u32::try_from(payload.len()).map_err(|_| FramingError::PayloadTooLarge {
		len: payload.len(),
	})?;

	let mut region = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
	region.extend_from_slice(&len.to_be_bytes());
	region.extend_from_slice(payload);
	Ok(region)
}

/// String-keyed fields of a decoded structured payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuredPayload {
	fields: Map<String, Value>,
}

impl StructuredPayload {
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.fields.get(field)
	}

	pub fn contains(&self, field: &str) -> bool {
		self.fields.contains_key(field)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn into_inner(self) -> Map<String, Value> {
		self.fields
	}

	/// Deserialize the object into `T`, ignoring fields `T` does not declare
	pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_value(Value::Object(self.fields.clone()))
	}
}

impl From<Map<String, Value>> for StructuredPayload {
	fn from(fields: Map<String, Value>) -> Self {
		Self {
			fields,
		}
	}
}

/// Decode UTF-8 bytes holding a JSON object
pub fn decode_structured(bytes: &[u8]) -> Result<StructuredPayload, DecodeError> {
	let text = str::from_utf8(bytes)?;
	match serde_json::from_str::<Value>(text)? {
		Value::Object(fields) => Ok(StructuredPayload::from(fields)),
		other => Err(DecodeError::NotAnObject {
			found: json_kind(&other),
		}),
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_text_round_trip() {
		for text in ["", "plain", "héllo wörld", "日本語", "emoji 🦀", "nul\0inside"] {
			assert_eq!(decode(encode(text).as_bytes()).unwrap(), text);
		}
	}

	#[test]
	fn test_bytes_pass_through() {
		let bytes: &[u8] = &[0xff, 0x00, 0xfe, 0x80];
		let buffer = encode(bytes);
		assert_eq!(buffer.as_bytes(), bytes);
		assert_eq!(buffer.as_ptr(), bytes.as_ptr());
		assert_eq!(buffer.len(), 4);
	}

	#[test]
	fn test_decode_rejects_malformed_utf8() {
		let err = decode(&[0x66, 0x6f, 0xff, 0x6f]).unwrap_err();
		assert!(matches!(err, DecodeError::InvalidUtf8(_)));
		assert!(decode(&[0xe6, 0x97]).is_err());
	}

	#[test]
	fn test_read_length_prefixed() {
		let region = frame(b"payload").unwrap();
		assert_eq!(&region[..4], &[0, 0, 0, 7]);

		let payload = unsafe { read_length_prefixed(region.as_ptr(), 1024) }.unwrap();
		assert_eq!(payload, b"payload");
	}

	#[test]
	fn test_read_length_prefixed_empty() {
		let region = frame(&[]).unwrap();
		let payload = unsafe { read_length_prefixed(region.as_ptr(), 1024) }.unwrap();
		assert!(payload.is_empty());
	}

	#[test]
	fn test_read_length_prefixed_ignores_trailing_bytes() {
		let mut region = frame(b"abc").unwrap();
		region.extend_from_slice(b"garbage");
		let payload = unsafe { read_length_prefixed(region.as_ptr(), 1024) }.unwrap();
		assert_eq!(payload, b"abc");
	}

	#[test]
	fn test_read_length_prefixed_null() {
		let err = unsafe { read_length_prefixed(std::ptr::null(), 1024) }.unwrap_err();
		assert_eq!(err, FramingError::NullPointer);
	}

	#[test]
	fn test_read_length_prefixed_over_limit() {
		// Only the header exists; the limit check must reject before any payload read.
		let header = 0xFFFF_FFF0u32.to_be_bytes();
		let err = unsafe { read_length_prefixed(header.as_ptr(), 1 << 20) }.unwrap_err();
		assert_eq!(
			err,
			FramingError::LengthExceedsLimit {
				len: 0xFFFF_FFF0,
				limit: 1 << 20,
			}
		);
	}

	#[test]
	fn test_read_length_prefixed_slice() {
		let region = frame(b"hello").unwrap();
		assert_eq!(read_length_prefixed_slice(&region).unwrap(), b"hello");

		assert_eq!(
			read_length_prefixed_slice(&region[..3]).unwrap_err(),
			FramingError::TruncatedHeader {
				available: 3,
			}
		);
		assert_eq!(
			read_length_prefixed_slice(&region[..7]).unwrap_err(),
			FramingError::Truncated {
				declared: 5,
				available: 3,
			}
		);
		assert_eq!(read_length_prefixed_slice(&[0, 0, 0, 0]).unwrap(), b"");
	}

	#[test]
	fn test_decode_structured() {
		let payload = decode_structured(br#"{"user_time":3,"system_time":2}"#).unwrap();
		assert_eq!(payload.len(), 2);
		assert_eq!(payload.get("user_time").and_then(Value::as_u64), Some(3));
		assert!(!payload.contains("memory"));
	}

	#[test]
	fn test_decode_structured_failures() {
		assert!(matches!(decode_structured(b"{\"user_time\":"), Err(DecodeError::Structured(_))));
		assert!(matches!(
			decode_structured(b"[1,2]"),
			Err(DecodeError::NotAnObject {
				found: "an array"
			})
		));
		assert!(matches!(decode_structured(&[0x7b, 0xff, 0x7d]), Err(DecodeError::InvalidUtf8(_))));
	}
}
