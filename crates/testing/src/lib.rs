// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Test support for the procmetrics bridge
//!
//! [`native`] implements every entry point of the call table as a plain
//! `extern "C"` function in this process. Behaviour is a pure function of the
//! arguments, so tests can run in parallel without shared fixtures.

pub mod native;
