// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits consumed by the engine.

pub mod remote;

pub use remote::{AccountStream, RemoteAccountClient};
