pub mod chat_log;
pub mod connection;
pub mod dispatch;
pub mod handler;
pub mod lifecycle;
pub mod listener;
pub mod registry;
pub mod send_target;

pub use chat_log::{ChatEntry, ChatLog};
pub use connection::Connection;
pub use dispatch::{DispatchError, Dispatcher};
pub use handler::ConnectionHandler;
pub use lifecycle::Shutdown;
pub use listener::Listener;
pub use registry::{PeerKey, PeerRegistry};
pub use send_target::{SendTarget, TargetParseError};
