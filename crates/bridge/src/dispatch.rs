// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Call dispatcher over the fixed call table
//!
//! A single [`Dispatcher::dispatch`] covers both modes. Blocking entries run on
//! the caller's thread. Deferred entries run on tokio's blocking pool behind a
//! semaphore, and the caller awaits the returned [`Deferred`]. In both modes a
//! buffer result is copied out of native memory on the thread that made the
//! call, immediately after it returns, so no native pointer outlives its call.

use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use procmetrics_abi::{DispatchMode, EntryPoint, ParamKind, ResultKind, SymbolsFFI};
use tokio::{
	runtime::Handle,
	sync::Semaphore,
	task::{self, JoinHandle},
};
use tracing::{Instrument, Span, instrument, warn};

use crate::{
	codec::{RawBuffer, read_length_prefixed},
	config::BridgeConfig,
	error::{Error, Result},
	loader::ForeignLibraryHandle,
};

/// One native argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg<'a> {
	/// Passed as (pointer, length)
	Buffer(RawBuffer<'a>),
	U32(u32),
	U8(u8),
}

impl<'a> Arg<'a> {
	pub fn kind(&self) -> ParamKind {
		match self {
			Arg::Buffer(_) => ParamKind::Buffer,
			Arg::U32(_) => ParamKind::U32,
			Arg::U8(_) => ParamKind::U8,
		}
	}

	pub fn into_owned(self) -> Arg<'static> {
		match self {
			Arg::Buffer(buffer) => Arg::Buffer(buffer.into_owned()),
			Arg::U32(v) => Arg::U32(v),
			Arg::U8(v) => Arg::U8(v),
		}
	}
}

/// Raw result of a native call, buffers already copied into host memory
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
	U64(u64),
	I64(i64),
	F32(f32),
	Buffer(Vec<u8>),
}

impl NativeValue {
	pub fn kind(&self) -> ResultKind {
		match self {
			NativeValue::U64(_) => ResultKind::U64,
			NativeValue::I64(_) => ResultKind::I64,
			NativeValue::F32(_) => ResultKind::F32,
			NativeValue::Buffer(_) => ResultKind::Buffer,
		}
	}
}

/// Outcome of [`Dispatcher::dispatch`]
#[derive(Debug)]
pub enum Invocation {
	Ready(NativeValue),
	Deferred(Deferred),
}

impl Invocation {
	pub async fn resolve(self) -> Result<NativeValue> {
		match self {
			Invocation::Ready(value) => Ok(value),
			Invocation::Deferred(deferred) => deferred.await,
		}
	}
}

/// Pending result of a deferred entry point
///
/// Dropping it detaches the call; the native side still runs to completion.
#[derive(Debug)]
pub struct Deferred {
	entry: EntryPoint,
	handle: JoinHandle<Result<NativeValue>>,
}

impl Deferred {
	pub fn entry(&self) -> EntryPoint {
		self.entry
	}
}

impl Future for Deferred {
	type Output = Result<NativeValue>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let entry = self.entry;
		match Pin::new(&mut self.handle).poll(cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			Poll::Ready(Err(source)) => Poll::Ready(Err(Error::Join {
				entry: entry.name(),
				source,
			})),
		}
	}
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
	library: Arc<ForeignLibraryHandle>,
	permits: Arc<Semaphore>,
	max_payload_len: usize,
}

impl Dispatcher {
	pub fn new(library: Arc<ForeignLibraryHandle>, config: &BridgeConfig) -> Self {
		Self {
			library,
			permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
			max_payload_len: config.max_payload_len,
		}
	}

	pub fn library(&self) -> &ForeignLibraryHandle {
		&self.library
	}

	/// Invoke `entry` with `args` in the entry's dispatch mode
	///
	/// Arguments are checked against the call table before any native code runs.
	/// Deferred entries need to be dispatched from within a tokio runtime.
	#[instrument(name = "bridge::dispatch", level = "debug", skip_all, fields(entry = %entry))]
	pub fn dispatch(&self, entry: EntryPoint, args: Vec<Arg<'_>>) -> Result<Invocation> {
		check_arguments(entry, &args)?;

		match entry.signature().mode {
			DispatchMode::Blocking => self.invoke(entry, &args).map(Invocation::Ready),
			DispatchMode::Deferred => self.spawn(entry, args).map(Invocation::Deferred),
		}
	}

	/// Invoke a blocking entry point and return its value directly
	pub fn call_blocking(&self, entry: EntryPoint, args: Vec<Arg<'_>>) -> Result<NativeValue> {
		if !entry.signature().is_blocking() {
			return Err(Error::NotBlocking {
				entry: entry.name(),
			});
		}

		match self.dispatch(entry, args)? {
			Invocation::Ready(value) => Ok(value),
			Invocation::Deferred(_) => Err(Error::NotBlocking {
				entry: entry.name(),
			}),
		}
	}

	fn invoke(&self, entry: EntryPoint, args: &[Arg<'_>]) -> Result<NativeValue> {
		call_native(self.library.symbols(), entry, args, self.max_payload_len).inspect_err(|err| {
			warn!("native call {} failed: {}", entry, err);
		})
	}

	fn spawn(&self, entry: EntryPoint, args: Vec<Arg<'_>>) -> Result<Deferred> {
		let runtime = Handle::try_current().map_err(|_| Error::NoRuntime {
			entry: entry.name(),
		})?;

		let args: Vec<Arg<'static>> = args.into_iter().map(Arg::into_owned).collect();
		let dispatcher = self.clone();

		let handle = runtime.spawn(
			async move {
				let permit = Arc::clone(&dispatcher.permits).acquire_owned().await.map_err(|_| {
					Error::ShutDown {
						entry: entry.name(),
					}
				})?;

				task::spawn_blocking(move || {
					let _permit = permit;
					dispatcher.invoke(entry, &args)
				})
				.await
				.map_err(|source| Error::Join {
					entry: entry.name(),
					source,
				})?
			}
			.instrument(Span::current()),
		);

		Ok(Deferred {
			entry,
			handle,
		})
	}
}

fn check_arguments(entry: EntryPoint, args: &[Arg<'_>]) -> Result<()> {
	let params = entry.signature().params;
	if params.len() != args.len() {
		return Err(Error::ArgumentCount {
			entry: entry.name(),
			expected: params.len(),
			actual: args.len(),
		});
	}

	for (index, (expected, arg)) in params.iter().zip(args).enumerate() {
		if *expected != arg.kind() {
			return Err(Error::ArgumentKind {
				entry: entry.name(),
				index,
				expected: *expected,
				actual: arg.kind(),
			});
		}
	}

	Ok(())
}

fn call_native(symbols: &SymbolsFFI, entry: EntryPoint, args: &[Arg<'_>], max_payload_len: usize) -> Result<NativeValue> {
	use EntryPoint::*;

	let value = match (entry, args) {
		(GetCert, [Arg::Buffer(host), Arg::U32(port), Arg::U8(flags)]) => {
			let ptr = (symbols.get_cert)(host.as_ptr(), host.len(), *port, *flags);
			copy_buffer(ptr, max_payload_len)?
		}
		(VerifySignature, [Arg::Buffer(pem), Arg::Buffer(message), Arg::Buffer(signature)]) => {
			let ptr = (symbols.verify_signature)(
				pem.as_ptr(),
				pem.len(),
				message.as_ptr(),
				message.len(),
				signature.as_ptr(),
				signature.len(),
			);
			copy_buffer(ptr, max_payload_len)?
		}
		(GetProcessInfo, [Arg::U32(pid)]) => copy_buffer((symbols.get_process_info)(*pid), max_payload_len)?,
		(GetProcessTime, [Arg::U32(pid)]) => copy_buffer((symbols.get_process_time)(*pid), max_payload_len)?,
		(GetCpuUsage, [Arg::U32(pid)]) => NativeValue::F32((symbols.get_cpu_usage)(*pid)),
		(GetCpuStime, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_cpu_stime)(*pid)),
		(GetCpuUtime, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_cpu_utime)(*pid)),
		(GetMemory, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_memory)(*pid)),
		(GetRunTime, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_run_time)(*pid)),
		(GetStartTime, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_start_time)(*pid)),
		(GetVirtualMemory, [Arg::U32(pid)]) => NativeValue::U64((symbols.get_virtual_memory)(*pid)),
		(GetMaxChildren, []) => NativeValue::I64((symbols.get_max_children)()),
		// every other shape is rejected by check_arguments before we get here
		_ => {
			return Err(Error::ArgumentCount {
				entry: entry.name(),
				expected: entry.signature().params.len(),
				actual: args.len(),
			});
		}
	};

	debug_assert_eq!(value.kind(), entry.signature().result);
	Ok(value)
}

fn copy_buffer(ptr: *const u8, max_payload_len: usize) -> Result<NativeValue> {
	// SAFETY: the native side returns null or a header followed by the payload
	// it declares; the limit check happens before the payload is read.
	let bytes = unsafe { read_length_prefixed(ptr, max_payload_len) }?;
	Ok(NativeValue::Buffer(bytes))
}

#[cfg(test)]
mod tests {
	use procmetrics_testing::native;

	use super::*;
	use crate::codec::encode;

	fn dispatcher() -> Dispatcher {
		Dispatcher::new(Arc::new(ForeignLibraryHandle::from_symbols(native::symbols())), &BridgeConfig::default())
	}

	#[test]
	fn test_argument_count_checked() {
		let err = dispatcher().dispatch(EntryPoint::GetMemory, vec![]).unwrap_err();
		assert!(matches!(
			err,
			Error::ArgumentCount {
				entry: "get_memory",
				expected: 1,
				actual: 0,
			}
		));
	}

	#[test]
	fn test_argument_kind_checked() {
		let err = dispatcher()
			.dispatch(EntryPoint::GetCert, vec![Arg::U32(1), Arg::U32(443), Arg::U8(0)])
			.unwrap_err();
		assert!(matches!(
			err,
			Error::ArgumentKind {
				index: 0,
				expected: ParamKind::Buffer,
				actual: ParamKind::U32,
				..
			}
		));
	}

	#[test]
	fn test_blocking_numeric_is_ready() {
		let invocation = dispatcher().dispatch(EntryPoint::GetMaxChildren, vec![]).unwrap();
		match invocation {
			Invocation::Ready(NativeValue::I64(v)) => assert_eq!(v, native::MAX_CHILDREN),
			other => panic!("unexpected invocation {other:?}"),
		}
	}

	#[test]
	fn test_blocking_buffer_is_copied() {
		let value = dispatcher().call_blocking(EntryPoint::GetProcessTime, vec![Arg::U32(native::KNOWN_PID)]).unwrap();
		let NativeValue::Buffer(bytes) = value else {
			panic!("expected a buffer");
		};
		assert!(bytes.starts_with(b"{"));
	}

	#[test]
	fn test_deferred_needs_runtime() {
		let err = dispatcher()
			.dispatch(EntryPoint::GetCert, vec![Arg::Buffer(encode("example.com")), Arg::U32(443), Arg::U8(0)])
			.unwrap_err();
		assert!(matches!(
			err,
			Error::NoRuntime {
				entry: "get_cert"
			}
		));
	}

	#[test]
	fn test_call_blocking_rejects_deferred() {
		let err = dispatcher()
			.call_blocking(
				EntryPoint::VerifySignature,
				vec![Arg::Buffer(encode("pem")), Arg::Buffer(encode("m")), Arg::Buffer(encode("s"))],
			)
			.unwrap_err();
		assert!(matches!(err, Error::NotBlocking { .. }));
	}

	#[tokio::test]
	async fn test_deferred_resolves() {
		let invocation = dispatcher()
			.dispatch(
				EntryPoint::VerifySignature,
				vec![
					Arg::Buffer(encode(native::PUBLIC_KEY_PEM)),
					Arg::Buffer(encode(b"message")),
					Arg::Buffer(encode(&native::sign(b"message"))),
				],
			)
			.unwrap();
		assert!(matches!(invocation, Invocation::Deferred(_)));

		let value = invocation.resolve().await.unwrap();
		assert_eq!(value, NativeValue::Buffer(b"OK".to_vec()));
	}
}
