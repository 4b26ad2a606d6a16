pub mod gemini;
pub mod prompts;

pub use gemini::GeminiImageClient;
