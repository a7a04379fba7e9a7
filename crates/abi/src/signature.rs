// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use core::fmt;

/// Shape of a single native parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	/// Pointer to raw bytes followed by its length as `usize`
	///
	/// The native side has no other way to bound the read, so a buffer is
	/// never passed without its length.
	Buffer,
	U32,
	U8,
}

impl fmt::Display for ParamKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ParamKind::Buffer => f.write_str("buffer"),
			ParamKind::U32 => f.write_str("u32"),
			ParamKind::U8 => f.write_str("u8"),
		}
	}
}

/// Shape of a native return value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
	U64,
	I64,
	F32,
	/// Pointer to a native-owned, length-prefixed region
	Buffer,
}

impl fmt::Display for ResultKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResultKind::U64 => f.write_str("u64"),
			ResultKind::I64 => f.write_str("i64"),
			ResultKind::F32 => f.write_str("f32"),
			ResultKind::Buffer => f.write_str("buffer"),
		}
	}
}

/// How the host must invoke an entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
	/// Runs to completion on the calling thread
	Blocking,
	/// Runs off the calling thread; the caller suspends until it completes
	Deferred,
}

/// Static descriptor of one native entry point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSignature {
	/// Exported symbol name
	pub name: &'static str,
	/// Parameter slots in call order
	pub params: &'static [ParamKind],
	pub result: ResultKind,
	pub mode: DispatchMode,
}

impl CallSignature {
	pub const fn new(
		name: &'static str,
		params: &'static [ParamKind],
		result: ResultKind,
		mode: DispatchMode,
	) -> Self {
		Self {
			name,
			params,
			result,
			mode,
		}
	}

	/// Number of C arguments, counting a buffer as pointer plus length
	pub fn c_arity(&self) -> usize {
		self.params
			.iter()
			.map(|p| match p {
				ParamKind::Buffer => 2,
				_ => 1,
			})
			.sum()
	}

	pub fn is_blocking(&self) -> bool {
		self.mode == DispatchMode::Blocking
	}
}
