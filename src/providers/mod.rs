pub mod remote;
pub mod traits;
pub mod types;

pub use remote::RemoteResponder;
pub use traits::Responder;
pub use types::{echo_reply, ChatTurn, ResponderError};
