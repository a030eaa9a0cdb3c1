//! Channel helpers for prompt detection and output cleanup.

mod buffer;
mod patterns;

pub use buffer::PatternBuffer;
pub use patterns::{combined_prompt_pattern, normalize_output, trailing_prompt};
