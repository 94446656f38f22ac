// Interface adapters: wire protocol, camera model and network handling.

pub mod net;
pub mod projection;
pub mod protocol;
pub mod state;
pub mod utils;
