//! Speech I/O
//!
//! Spoken output through a system synthesis command and spoken input
//! through an HTTP recognition service. Both sit behind traits so the
//! server can run silent or without a microphone.

mod stt;
mod tts;

pub use stt::{build_recognizer, DisabledRecognizer, HttpRecognizer, SpeechInput, SttConfig};
pub use tts::{build_tts, CommandTts, SilentTts, SpeechOutput, TtsConfig};

use thiserror::Error;

/// Speech error types
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech backend unavailable: {0}")]
    Unavailable(String),

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
