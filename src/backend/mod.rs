//! Backend module - generation client, retry policy, and the backend trait

pub mod gemini;
pub mod retry;
pub mod traits;

pub use gemini::GeminiBackend;
pub use retry::RetryPolicy;
pub use traits::GenerationBackend;
