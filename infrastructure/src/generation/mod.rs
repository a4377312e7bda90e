//! Generation gateway adapters.

mod openai;
mod sse;

pub use openai::{OpenAiCompatibleGateway, OpenAiSettings};
