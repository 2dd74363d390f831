// SPDX-FileCopyrightText: 2026 Comanda Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for typed operations on storage entities.

pub mod catalog;
pub mod messages;
pub mod orders;
pub mod users;
