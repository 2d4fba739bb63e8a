//! Scriptable provider for pipeline tests
//!
//! Returns a fixed reply or a fixed failure and records the prompts it was
//! sent, so callers can check what reached the service boundary.

use std::sync::Mutex;

use super::{NarrativeProvider, NarrativeRequest};
use crate::error::{PcgError, Result};

#[derive(Debug)]
pub struct MockNarrator {
    outcome: std::result::Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockNarrator {
    /// Always answer with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            outcome: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a service error carrying `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Err(reason.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl NarrativeProvider for MockNarrator {
    fn name(&self) -> &str {
        "mock"
    }

    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt());
        }
        self.outcome
            .clone()
            .map_err(|reason| PcgError::NarrativeService {
                provider: self.name().to_string(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::Valve;

    #[test]
    fn test_records_prompts() {
        let mock = MockNarrator::replying("fine");
        let reply = mock
            .summarize(&NarrativeRequest::Features {
                valve: Valve::Aortic,
                summary: "x",
            })
            .unwrap();
        assert_eq!(reply, "fine");
        assert_eq!(mock.prompts().len(), 1);
    }

    #[test]
    fn test_failure_message() {
        let mock = MockNarrator::failing("quota exceeded");
        let err = mock
            .summarize(&NarrativeRequest::Image {
                valve: Valve::Mitral,
                bytes: &[],
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "Narrative service 'mock' failed: quota exceeded");
    }
}
