//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{
    check_room_password, create_room, get_chat_history, get_room_detail, get_rooms, health_check,
};
pub use websocket::websocket_handler;
