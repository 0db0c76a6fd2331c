// Service exports
pub mod backend;
pub mod inbox;
pub mod media;
pub mod sessions;
pub mod tokens;

pub use backend::BackendClient;
pub use inbox::{spawn_http_transport, InboxChannel, InboxRequest};
pub use media::{ImageError, ImageStore};
pub use sessions::{Session, SessionError, SessionHandle, SessionRegistry};
pub use tokens::{load_context, MemoryTokenStore, TokenStore, EMAIL_KEY, TOKEN_KEY};
