//! Infrastructure layer: concrete stores, the WebSocket connection registry and wire DTOs.

pub mod connection_registry;
pub mod dto;
pub mod repository;
