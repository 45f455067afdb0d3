pub mod api;
pub mod config;
pub mod extractor;

pub use api::{router, AppState};
pub use config::Config;
