// SPDX-License-Identifier: MIT OR Apache-2.0

//! csvec - CSV to vector search library
//!
//! Shared modules for the csvec CLI tool.

pub mod config;
pub mod embedding;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod store;
