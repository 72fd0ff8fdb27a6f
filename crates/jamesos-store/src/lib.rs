pub mod backend;
pub mod error;
pub mod logs;
pub mod sessions;

pub use backend::Backend;
pub use error::StoreError;
pub use logs::{LogRepo, Stats};
pub use sessions::{SessionRepo, SessionSummary};
