//! JSON-over-HTTP narrative service client
//!
//! Posts `{model, prompt, image_base64}` to the configured endpoint and
//! expects `{"text": ...}` back. The network path is compiled only with the
//! `narrative-http` feature; without it every call reports the service as
//! unavailable.

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{NarrativeProvider, NarrativeRequest};
use crate::config::NarrativeSettings;
use crate::error::{PcgError, Result};

/// Request body sent to the narrative endpoint
#[derive(Debug, Serialize)]
struct NarrativeBody {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<String>,
}

/// Response body from the narrative endpoint
#[derive(Debug, Deserialize)]
struct NarrativeReply {
    text: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "narrative-http"), allow(dead_code))]
pub struct HttpNarrator {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    timeout_ms: u64,
}

impl HttpNarrator {
    /// Build from settings; the endpoint URL is required
    pub fn from_settings(settings: &NarrativeSettings) -> Result<Self> {
        let endpoint = settings
            .url
            .clone()
            .ok_or_else(|| PcgError::NarrativeUnavailable {
                reason: "PCG_NARRATIVE_URL is not set".to_string(),
            })?;
        Ok(Self {
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout_ms: settings.timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body(&self, request: &NarrativeRequest<'_>) -> NarrativeBody {
        let image_base64 = match request {
            NarrativeRequest::Image { bytes, .. } => Some(encode_image(bytes)),
            NarrativeRequest::Features { .. } => None,
        };
        NarrativeBody {
            model: self.model.clone(),
            prompt: request.prompt(),
            image_base64,
        }
    }

    #[cfg(feature = "narrative-http")]
    fn send(&self, body: &NarrativeBody) -> Result<String> {
        let service_err = |reason: String| PcgError::NarrativeService {
            provider: "http".to_string(),
            reason,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| service_err(e.to_string()))?;

        let mut call = client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().map_err(|e| {
            if e.is_timeout() {
                service_err(format!("timed out after {} ms", self.timeout_ms))
            } else if e.is_connect() {
                PcgError::NarrativeUnavailable {
                    reason: format!("cannot connect to {}: {}", self.endpoint, e),
                }
            } else {
                service_err(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(service_err(format!("endpoint returned {}", response.status())));
        }

        let text = response.text().map_err(|e| service_err(e.to_string()))?;
        parse_reply(&text)
    }

    #[cfg(not(feature = "narrative-http"))]
    fn send(&self, _body: &NarrativeBody) -> Result<String> {
        Err(PcgError::NarrativeUnavailable {
            reason: "HTTP narrative support not compiled. Build with --features narrative-http"
                .to_string(),
        })
    }
}

impl NarrativeProvider for HttpNarrator {
    fn name(&self) -> &str {
        "http"
    }

    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        let body = self.body(request);
        tracing::debug!(
            endpoint = %self.endpoint,
            valve = %request.valve(),
            has_image = body.image_base64.is_some(),
            "requesting narrative"
        );
        self.send(&body)
    }
}

fn encode_image(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg_attr(not(feature = "narrative-http"), allow(dead_code))]
fn parse_reply(body: &str) -> Result<String> {
    serde_json::from_str::<NarrativeReply>(body)
        .map(|reply| reply.text)
        .map_err(|e| PcgError::NarrativeService {
            provider: "http".to_string(),
            reason: format!("invalid response: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::Valve;

    fn settings(url: Option<&str>) -> NarrativeSettings {
        NarrativeSettings {
            url: url.map(str::to_string),
            ..NarrativeSettings::default()
        }
    }

    #[test]
    fn test_requires_endpoint() {
        let err = HttpNarrator::from_settings(&settings(None)).unwrap_err();
        assert_eq!(err.error_code(), "NARRATIVE_UNAVAILABLE");
    }

    #[test]
    fn test_feature_body_has_no_image() {
        let narrator = HttpNarrator::from_settings(&settings(Some("http://127.0.0.1:9/narrate"))).unwrap();
        let body = narrator.body(&NarrativeRequest::Features {
            valve: Valve::Aortic,
            summary: "std_dev=2.0",
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "pcg-narrative");
        assert!(json.get("image_base64").is_none());
    }

    #[test]
    fn test_reply_parsing() {
        assert_eq!(parse_reply(r#"{"text":"Possible MR"}"#).unwrap(), "Possible MR");
        assert!(parse_reply(r#"{"answer":1}"#).is_err());
    }

    #[cfg(not(feature = "narrative-http"))]
    #[test]
    fn test_unavailable_without_feature() {
        let narrator = HttpNarrator::from_settings(&settings(Some("http://127.0.0.1:9/narrate"))).unwrap();
        let err = narrator
            .summarize(&NarrativeRequest::Image {
                valve: Valve::Mitral,
                bytes: &[1, 2, 3],
            })
            .unwrap_err();
        assert!(matches!(err, PcgError::NarrativeUnavailable { .. }));
    }

    #[test]
    fn test_image_is_base64() {
        let narrator = HttpNarrator::from_settings(&settings(Some("http://127.0.0.1:9/narrate"))).unwrap();
        let body = narrator.body(&NarrativeRequest::Image {
            valve: Valve::Mitral,
            bytes: b"abc",
        });
        assert_eq!(body.image_base64.as_deref(), Some("YWJj"));
    }
}
