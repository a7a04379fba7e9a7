// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! C ABI definitions for the procmetrics native library
//!
//! This crate declares the fixed set of entry points the native library exports,
//! their parameter and result shapes, and whether the host may call them on the
//! calling thread or must dispatch them off-thread. Nothing here performs a call;
//! the host bridge resolves these symbols and drives them.

pub mod constants;
pub mod signature;
pub mod symbols;
pub mod table;

pub use constants::*;
pub use signature::*;
pub use symbols::*;
pub use table::*;
