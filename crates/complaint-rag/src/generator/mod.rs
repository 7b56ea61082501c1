//! `Generator` implementations.

mod openai;

pub use openai::OpenAiCompatGenerator;
