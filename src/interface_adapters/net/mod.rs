// Network adapter: the detection bridge websocket.

pub mod client;

pub use client::{frame_serializer, ws_handler};
