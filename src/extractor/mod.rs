// Extractor module - yt-dlp backed stream listing
//
// Pipeline: url::normalize -> Invoker (attempt cascade) -> formats::normalize,
// orchestrated by ExtractionService.

pub mod diagnostics;
pub mod errors;
pub mod formats;
pub mod invoker;
pub mod models;
pub mod process;
pub mod profiles;
pub mod service;
pub mod tools;
pub mod url;

pub use errors::{ExtractError, RunError};
pub use invoker::Invoker;
pub use models::{AudioStream, ExtractionRequest, ExtractionResult, VideoInfo, VideoStream};
pub use process::{ProcessOutput, ProcessRunner, TokioProcessRunner};
pub use service::ExtractionService;
pub use tools::ExtractorTool;
