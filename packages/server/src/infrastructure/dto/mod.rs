//! Data Transfer Objects (DTOs) for the quiz session server.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message DTOs
//! - `http`: HTTP API request/response DTOs
//! - `conversion`: Domain entity → DTO conversions

pub mod conversion;
pub mod http;
pub mod websocket;
