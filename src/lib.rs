pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod session;
pub mod shell;

pub use api::ApiClient;
pub use config::Config;
pub use error::{ApiError, DraftError, FilterError, SessionError};
pub use search::Coordinator;
pub use session::{Session, SessionStore};
