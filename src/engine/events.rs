/// Event emitted by an upstream connection
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Non-final hypothesis for the current utterance
    Interim {
        transcript: String,
        confidence: Option<f32>,
    },

    /// Completed transcript for the current utterance
    Final {
        transcript: String,
        confidence: Option<f32>,
    },

    /// The engine detected the end of the utterance
    EndOfUtterance,

    /// Engine-side failure; the connection may or may not still be usable
    Error(String),
}

impl EngineEvent {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self::Interim {
            transcript: transcript.into(),
            confidence: None,
        }
    }

    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self::Final {
            transcript: transcript.into(),
            confidence: None,
        }
    }

    /// Whether this event ends the current upstream connection
    pub fn ends_utterance(&self) -> bool {
        matches!(self, Self::Final { .. } | Self::EndOfUtterance)
    }
}
