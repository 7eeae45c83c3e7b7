// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All operate on ciphertext blobs; encryption happens
//! in the [`crate::store::SessionStore`] facade.

pub mod pending;
pub mod sessions;
