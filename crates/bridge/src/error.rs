// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Error taxonomy of the bridge
//!
//! [`LoadError`] is fatal and only surfaces while loading the native library.
//! Everything else is scoped to a single call; the bridge stays usable after it.
//! Failures the native side reports inside its own result (a populated
//! `CertDetails::error`, a `"NOK"` verification) are data, not errors.

use procmetrics_abi::{ParamKind, ResultKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	#[error("failed to open native library '{path}': {source}")]
	Open {
		path: String,
		#[source]
		source: libloading::Error,
	},

	#[error("native library '{path}' does not export '{symbol}': {source}")]
	MissingSymbol {
		path: String,
		symbol: &'static str,
		#[source]
		source: libloading::Error,
	},

	#[error("no native library is built for operating system '{os}'")]
	UnsupportedPlatform {
		os: String,
	},

	#[error("failed to locate the running executable: {0}")]
	CurrentExe(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FramingError {
	#[error("native call returned a null buffer")]
	NullPointer,

	#[error("declared payload length {len} exceeds the limit of {limit} bytes")]
	LengthExceedsLimit {
		len: usize,
		limit: usize,
	},

	#[error("buffer of {available} bytes is too short for the length header")]
	TruncatedHeader {
		available: usize,
	},

	#[error("declared payload length {declared} exceeds the {available} bytes available")]
	Truncated {
		declared: usize,
		available: usize,
	},

	#[error("payload of {len} bytes does not fit a u32 length header")]
	PayloadTooLarge {
		len: usize,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("payload is not valid UTF-8: {0}")]
	InvalidUtf8(#[from] std::str::Utf8Error),

	#[error("payload is not well-formed JSON: {0}")]
	Structured(#[from] serde_json::Error),

	#[error("structured payload must be an object, got {found}")]
	NotAnObject {
		found: &'static str,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
	#[error("{record} is missing field '{field}'")]
	MissingField {
		record: &'static str,
		field: &'static str,
	},

	#[error("{record} has an invalid field: {reason}")]
	InvalidField {
		record: &'static str,
		reason: String,
	},
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Load(#[from] LoadError),

	#[error(transparent)]
	Framing(#[from] FramingError),

	#[error(transparent)]
	Decode(#[from] DecodeError),

	#[error(transparent)]
	Mapping(#[from] MappingError),

	#[error("'{entry}' expects {expected} arguments, got {actual}")]
	ArgumentCount {
		entry: &'static str,
		expected: usize,
		actual: usize,
	},

	#[error("'{entry}' argument {index} must be {expected}, got {actual}")]
	ArgumentKind {
		entry: &'static str,
		index: usize,
		expected: ParamKind,
		actual: ParamKind,
	},

	#[error("'{entry}' returned {actual}, expected {expected}")]
	UnexpectedResult {
		entry: &'static str,
		expected: ResultKind,
		actual: ResultKind,
	},

	#[error("'{entry}' is a deferred entry point and must be awaited")]
	NotBlocking {
		entry: &'static str,
	},

	#[error("'{entry}' is a deferred entry point and needs a tokio runtime")]
	NoRuntime {
		entry: &'static str,
	},

	#[error("deferred dispatch for '{entry}' is shut down")]
	ShutDown {
		entry: &'static str,
	},

	#[error("deferred call '{entry}' did not complete: {source}")]
	Join {
		entry: &'static str,
		#[source]
		source: tokio::task::JoinError,
	},
}
