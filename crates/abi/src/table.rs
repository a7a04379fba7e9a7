// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! The closed table of native entry points
//!
//! The table is fixed at build time. Adding an entry point means adding a
//! variant, a table row and a [`SymbolsFFI`](crate::SymbolsFFI) field together.

use core::{fmt, str::FromStr};

use crate::signature::{
	CallSignature,
	DispatchMode::{Blocking, Deferred},
	ParamKind::{Buffer, U8, U32},
	ResultKind,
};

const PID: &[crate::ParamKind] = &[U32];

/// Every entry point, ordered by symbol name
pub static CALL_TABLE: [CallSignature; 12] = [
	CallSignature::new("get_cert", &[Buffer, U32, U8], ResultKind::Buffer, Deferred),
	CallSignature::new("get_cpu_stime", PID, ResultKind::U64, Blocking),
	CallSignature::new("get_cpu_usage", PID, ResultKind::F32, Blocking),
	CallSignature::new("get_cpu_utime", PID, ResultKind::U64, Blocking),
	CallSignature::new("get_max_children", &[], ResultKind::I64, Blocking),
	CallSignature::new("get_memory", PID, ResultKind::U64, Blocking),
	CallSignature::new("get_process_info", PID, ResultKind::Buffer, Blocking),
	CallSignature::new("get_process_time", PID, ResultKind::Buffer, Blocking),
	CallSignature::new("get_run_time", PID, ResultKind::U64, Blocking),
	CallSignature::new("get_start_time", PID, ResultKind::U64, Blocking),
	CallSignature::new("get_virtual_memory", PID, ResultKind::U64, Blocking),
	CallSignature::new("verify_signature", &[Buffer, Buffer, Buffer], ResultKind::Buffer, Deferred),
];

/// Typed key into [`CALL_TABLE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntryPoint {
	GetCert = 0,
	GetCpuStime = 1,
	GetCpuUsage = 2,
	GetCpuUtime = 3,
	GetMaxChildren = 4,
	GetMemory = 5,
	GetProcessInfo = 6,
	GetProcessTime = 7,
	GetRunTime = 8,
	GetStartTime = 9,
	GetVirtualMemory = 10,
	VerifySignature = 11,
}

impl EntryPoint {
	pub const ALL: [EntryPoint; 12] = [
		EntryPoint::GetCert,
		EntryPoint::GetCpuStime,
		EntryPoint::GetCpuUsage,
		EntryPoint::GetCpuUtime,
		EntryPoint::GetMaxChildren,
		EntryPoint::GetMemory,
		EntryPoint::GetProcessInfo,
		EntryPoint::GetProcessTime,
		EntryPoint::GetRunTime,
		EntryPoint::GetStartTime,
		EntryPoint::GetVirtualMemory,
		EntryPoint::VerifySignature,
	];

	pub fn signature(self) -> &'static CallSignature {
		&CALL_TABLE[self as usize]
	}

	pub fn name(self) -> &'static str {
		self.signature().name
	}
}

impl fmt::Display for EntryPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Error returned when parsing a name that is not in the call table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntryPoint(pub String);

impl fmt::Display for UnknownEntryPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown entry point '{}'", self.0)
	}
}

impl std::error::Error for UnknownEntryPoint {}

impl FromStr for EntryPoint {
	type Err = UnknownEntryPoint;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		EntryPoint::ALL.into_iter().find(|e| e.name() == s).ok_or_else(|| UnknownEntryPoint(s.to_string()))
	}
}

/// Look up a signature by exported symbol name
pub fn lookup(name: &str) -> Option<&'static CallSignature> {
	CALL_TABLE.binary_search_by(|sig| sig.name.cmp(name)).ok().map(|idx| &CALL_TABLE[idx])
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ParamKind;

	#[test]
	fn test_table_is_sorted_and_unique() {
		for pair in CALL_TABLE.windows(2) {
			assert!(pair[0].name < pair[1].name, "{} must sort before {}", pair[0].name, pair[1].name);
		}
	}

	#[test]
	fn test_entry_points_match_rows() {
		for (idx, entry) in EntryPoint::ALL.iter().enumerate() {
			assert_eq!(*entry as usize, idx);
			assert_eq!(entry.signature(), &CALL_TABLE[idx]);
			assert_eq!(entry.name().parse::<EntryPoint>().unwrap(), *entry);
		}
	}

	#[test]
	fn test_deferred_entries() {
		let deferred: Vec<_> = CALL_TABLE.iter().filter(|s| !s.is_blocking()).map(|s| s.name).collect();
		assert_eq!(deferred, vec!["get_cert", "verify_signature"]);
	}

	#[test]
	fn test_lookup() {
		let sig = lookup("get_cert").unwrap();
		assert_eq!(sig.params, &[ParamKind::Buffer, ParamKind::U32, ParamKind::U8]);
		assert_eq!(sig.c_arity(), 4);
		assert_eq!(lookup("verify_signature").unwrap().c_arity(), 6);
		assert_eq!(lookup("get_max_children").unwrap().c_arity(), 0);
		assert!(lookup("get_uptime").is_none());
		assert!("get_uptime".parse::<EntryPoint>().is_err());
	}
}
