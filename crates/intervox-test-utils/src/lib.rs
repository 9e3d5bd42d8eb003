// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Intervox workspace: a scripted gateway and
//! in-memory stores.

pub mod memory_store;
pub mod mock_gateway;

pub use memory_store::{MemoryProfileStore, MemorySink};
pub use mock_gateway::MockGateway;
