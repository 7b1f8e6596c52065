mod call_session;
mod call_state;
mod session_command;
mod session_config;
mod session_handle;
mod snapshot;

pub use call_session::CallSession;
pub use call_state::CallState;
pub use session_command::SessionCommand;
pub use session_config::SessionConfig;
pub use session_handle::SessionHandle;
pub use snapshot::{CallSnapshot, RemotePeer};
