// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use procmetrics_abi::{CERT_ACCEPT_INVALID, CERT_STRICT, EntryPoint};
use tracing::{info, instrument};

use crate::{
	codec::{Payload, decode, decode_structured, encode},
	config::BridgeConfig,
	dispatch::{Arg, Dispatcher, NativeValue},
	error::{Error, LoadError, Result},
	loader::ForeignLibraryHandle,
	mapper::FromPayload,
	record::{CertDetails, ProcessInfo, ProcessTime, VerificationResult},
};

/// Typed surface over the native library
///
/// Cheap to clone; every clone shares the same loaded library.
#[derive(Debug, Clone)]
pub struct Bridge {
	dispatcher: Dispatcher,
}

impl Bridge {
	/// Resolve, open and bind the native library described by `config`
	pub fn load(config: &BridgeConfig) -> std::result::Result<Self, LoadError> {
		let path = config.library_path()?;
		let handle = ForeignLibraryHandle::load(&path)?;
		info!("loaded native library from {}", handle.origin());
		Ok(Self::from_handle(handle, config))
	}

	pub fn from_handle(handle: ForeignLibraryHandle, config: &BridgeConfig) -> Self {
		Self {
			dispatcher: Dispatcher::new(Arc::new(handle), config),
		}
	}

	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// CPU usage in percent, or `UNAVAILABLE_CPU_USAGE` for an unknown process
	pub fn get_cpu_usage(&self, pid: u32) -> Result<f32> {
		match self.dispatcher.call_blocking(EntryPoint::GetCpuUsage, vec![Arg::U32(pid)])? {
			NativeValue::F32(value) => Ok(value),
			other => Err(unexpected(EntryPoint::GetCpuUsage, &other)),
		}
	}

	pub fn get_memory(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetMemory, pid)
	}

	pub fn get_virtual_memory(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetVirtualMemory, pid)
	}

	pub fn get_run_time(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetRunTime, pid)
	}

	pub fn get_start_time(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetStartTime, pid)
	}

	/// User CPU time in milliseconds
	pub fn get_cpu_utime(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetCpuUtime, pid)
	}

	/// System CPU time in milliseconds
	pub fn get_cpu_stime(&self, pid: u32) -> Result<u64> {
		self.reading(EntryPoint::GetCpuStime, pid)
	}

	/// Per-user process limit as reported by the native side
	pub fn get_max_children(&self) -> Result<i64> {
		match self.dispatcher.call_blocking(EntryPoint::GetMaxChildren, vec![])? {
			NativeValue::I64(value) => Ok(value),
			other => Err(unexpected(EntryPoint::GetMaxChildren, &other)),
		}
	}

	#[instrument(name = "bridge::process_info", level = "debug", skip(self))]
	pub fn get_process_info(&self, pid: u32) -> Result<ProcessInfo> {
		self.record(EntryPoint::GetProcessInfo, pid)
	}

	#[instrument(name = "bridge::process_time", level = "debug", skip(self))]
	pub fn get_process_time(&self, pid: u32) -> Result<ProcessTime> {
		self.record(EntryPoint::GetProcessTime, pid)
	}

	/// Fetch the peer certificate of `host:port`
	///
	/// A failed lookup comes back as `Ok` with `CertDetails::error` populated.
	#[instrument(name = "bridge::get_cert", level = "debug", skip(self))]
	pub async fn get_cert(&self, host: &str, port: u32, accept_invalid: bool) -> Result<CertDetails> {
		let flags = if accept_invalid {
			CERT_ACCEPT_INVALID
		} else {
			CERT_STRICT
		};

		let invocation = self.dispatcher.dispatch(
			EntryPoint::GetCert,
			vec![Arg::Buffer(encode(host)), Arg::U32(port), Arg::U8(flags)],
		)?;
		let bytes = into_buffer(EntryPoint::GetCert, invocation.resolve().await?)?;
		let payload = decode_structured(&bytes)?;
		Ok(CertDetails::from_payload(&payload)?)
	}

	/// Verify `signature` over `message` with a PEM encoded public key
	#[instrument(name = "bridge::verify_signature", level = "debug", skip_all)]
	pub async fn verify_signature<'a>(
		&self,
		public_key_pem: impl Into<Payload<'a>>,
		message: impl Into<Payload<'a>>,
		signature: impl Into<Payload<'a>>,
	) -> Result<VerificationResult> {
		let invocation = self.dispatcher.dispatch(
			EntryPoint::VerifySignature,
			vec![
				Arg::Buffer(encode(public_key_pem)),
				Arg::Buffer(encode(message)),
				Arg::Buffer(encode(signature)),
			],
		)?;
		let bytes = into_buffer(EntryPoint::VerifySignature, invocation.resolve().await?)?;
		Ok(VerificationResult(decode(&bytes)?))
	}

	fn reading(&self, entry: EntryPoint, pid: u32) -> Result<u64> {
		match self.dispatcher.call_blocking(entry, vec![Arg::U32(pid)])? {
			NativeValue::U64(value) => Ok(value),
			other => Err(unexpected(entry, &other)),
		}
	}

	fn record<T: FromPayload>(&self, entry: EntryPoint, pid: u32) -> Result<T> {
		let bytes = into_buffer(entry, self.dispatcher.call_blocking(entry, vec![Arg::U32(pid)])?)?;
		let payload = decode_structured(&bytes)?;
		Ok(T::from_payload(&payload)?)
	}
}

fn into_buffer(entry: EntryPoint, value: NativeValue) -> Result<Vec<u8>> {
	match value {
		NativeValue::Buffer(bytes) => Ok(bytes),
		other => Err(unexpected(entry, &other)),
	}
}

fn unexpected(entry: EntryPoint, value: &NativeValue) -> Error {
	Error::UnexpectedResult {
		entry: entry.name(),
		expected: entry.signature().result,
		actual: value.kind(),
	}
}
