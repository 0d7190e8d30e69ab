pub type AdResult<T> = Result<T, AdError>;

#[derive(thiserror::Error, Debug)]
pub enum AdError {
    #[error("generation error: {0}")]
    Generation(String),

    #[error("judge error: {0}")]
    Judge(String),

    #[error("verdict parse error: {0}")]
    VerdictParse(String),

    #[error("account error: {0}")]
    Account(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("exhausted after {attempts} attempts without a reviewable creative")]
    Exhausted { attempts: u32 },

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AdError {
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn judge(msg: impl Into<String>) -> Self {
        Self::Judge(msg.into())
    }

    pub fn verdict_parse(msg: impl Into<String>) -> Self {
        Self::VerdictParse(msg.into())
    }

    pub fn account(msg: impl Into<String>) -> Self {
        Self::Account(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the review loop may spend another attempt after this error.
    ///
    /// Transient remote failures and malformed verdicts are retried; configuration and
    /// input defects are not, since a new background cannot fix them.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Generation(_) | Self::Judge(_) | Self::VerdictParse(_)
        )
    }

    /// Short stable tag used in audit records and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Generation(_) => "generation",
            Self::Judge(_) => "judge",
            Self::VerdictParse(_) => "verdict_parse",
            Self::Account(_) => "account",
            Self::Asset(_) => "asset",
            Self::Layout(_) => "layout",
            Self::Exhausted { .. } => "exhausted",
            Self::Cancelled(_) => "cancelled",
            Self::Validation(_) => "validation",
            Self::Other(_) => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            AdError::generation("x")
                .to_string()
                .contains("generation error:")
        );
        assert!(
            AdError::verdict_parse("x")
                .to_string()
                .contains("verdict parse error:")
        );
        assert!(AdError::asset("x").to_string().contains("asset error:"));
        assert!(AdError::layout("x").to_string().contains("layout error:"));
        assert!(
            AdError::Exhausted { attempts: 3 }
                .to_string()
                .contains("after 3 attempts")
        );
    }

    #[test]
    fn retry_policy_splits_transient_from_fatal() {
        assert!(AdError::generation("timeout").is_retryable());
        assert!(AdError::judge("502").is_retryable());
        assert!(AdError::verdict_parse("missing field").is_retryable());

        assert!(!AdError::account("401").is_retryable());
        assert!(!AdError::asset("bad png").is_retryable());
        assert!(!AdError::layout("width").is_retryable());
        assert!(!AdError::cancelled("interrupt").is_retryable());
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = AdError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
        assert_eq!(err.kind(), "other");
    }
}
