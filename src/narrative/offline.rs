//! Deterministic provider used when no service is configured

use super::{NarrativeProvider, NarrativeRequest};
use crate::error::{PcgError, Result};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Echoes what it was given without contacting any service
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNarrator;

impl OfflineNarrator {
    pub fn new() -> Self {
        Self
    }
}

impl NarrativeProvider for OfflineNarrator {
    fn name(&self) -> &str {
        "offline"
    }

    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        match request {
            NarrativeRequest::Features { valve, summary } => Ok(format!(
                "Offline review for {}: no narrative service configured.\n{}",
                valve.display_name(),
                summary
            )),
            NarrativeRequest::Image { valve, bytes } => {
                let kind = image_kind(bytes).ok_or_else(|| PcgError::NarrativeService {
                    provider: self.name().to_string(),
                    reason: "image is not PNG or JPEG".to_string(),
                })?;
                Ok(format!(
                    "Offline review for {}: received {} image ({} bytes); no narrative service configured.",
                    valve.display_name(),
                    kind,
                    bytes.len()
                ))
            }
        }
    }
}

fn image_kind(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        Some("PNG")
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some("JPEG")
    } else {
        None
    }
}
