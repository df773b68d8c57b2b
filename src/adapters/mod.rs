// Adapters layer: concrete implementations for external systems (REST record store, session, local storage).

pub mod http;
pub mod session;
pub mod storage;

pub use http::RestRecordStore;
pub use session::Session;
pub use storage::LocalStorage;
