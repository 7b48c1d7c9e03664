/// Failures talking to the LLM gateway.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM gateway rate limit exceeded")]
    RateLimited,
    #[error("LLM gateway requires payment")]
    PaymentRequired,
    #[error("LLM gateway error (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("LLM gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),
    #[error("LLM gateway not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Map a non-success gateway status to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => Self::RateLimited,
            402 => Self::PaymentRequired,
            _ => Self::Upstream { status, body },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_statuses_map_to_variants() {
        assert!(matches!(LlmError::from_status(429, String::new()), LlmError::RateLimited));
        assert!(matches!(
            LlmError::from_status(402, String::new()),
            LlmError::PaymentRequired
        ));
        assert!(matches!(
            LlmError::from_status(500, "boom".into()),
            LlmError::Upstream { status: 500, .. }
        ));
        assert!(matches!(
            LlmError::from_status(401, String::new()),
            LlmError::Upstream { status: 401, .. }
        ));
    }
}
