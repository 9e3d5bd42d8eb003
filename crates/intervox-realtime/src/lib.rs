// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime layer: HTTP API, WebSocket attachment, connection fan-out, and
//! the wire protocol between interview participants and the session engine.

pub mod connections;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod ws;

pub use connections::ConnectionManager;
pub use protocol::{HandlerFlow, InboundEnvelope, OutboundEnvelope, ProtocolHandler};
pub use server::{build_router, start_server, RealtimeState, ServerConfig};
