use serde::{Deserialize, Serialize};

/// Audio encoding of the raw chunks sent upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    /// Uncompressed 16-bit signed little-endian PCM
    Linear16,
    Flac,
    Mulaw,
    Amr,
    AmrWb,
    OggOpus,
    WebmOpus,
}

/// A list of hint phrases the engine should favour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechContext {
    pub phrases: Vec<String>,
}

/// Recognition settings applied to every upstream connection
///
/// Loaded once at startup and shared by all sessions; a restarted connection
/// is opened with exactly the same values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,

    /// Sample rate of the incoming audio (telephony audio is 8kHz)
    pub sample_rate_hertz: u32,

    /// BCP-47 language tag, e.g. "ko-KR" or "en-US"
    pub language_code: String,

    pub profanity_filter: bool,

    pub enable_word_time_offsets: bool,

    /// Phrase hints for better recognition of domain vocabulary
    pub speech_contexts: Vec<SpeechContext>,

    /// Whether the engine should emit interim (non-final) results
    pub interim_results: bool,

    /// Whether the engine should end the stream after one utterance
    pub single_utterance: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Linear16,
            sample_rate_hertz: 8000,
            language_code: "ko-KR".to_string(),
            profanity_filter: false,
            enable_word_time_offsets: true,
            speech_contexts: Vec::new(),
            interim_results: true,
            single_utterance: true,
        }
    }
}
