pub mod session_id;

pub use session_id::{SessionId, SESSION_ID_HEADER};
