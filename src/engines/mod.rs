//! Synthesis engines.
//!
//! - [`qwen`]: Qwen3-TTS voice design, custom voice and voice clone
//!   synthesis over a pluggable model runtime

pub mod qwen;
