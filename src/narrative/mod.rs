//! Free-text narratives from an external service
//!
//! The pipeline never depends on a concrete service; it is handed a
//! [`NarrativeProvider`] and treats any failure as text to record.

mod http;
mod mock;
mod offline;

pub use http::HttpNarrator;
pub use mock::MockNarrator;
pub use offline::OfflineNarrator;

use std::fmt;
use std::str::FromStr;

use crate::config::NarrativeSettings;
use crate::diagnosis::Valve;
use crate::error::{PcgError, Result};

/// What a provider is asked to describe
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NarrativeRequest<'a> {
    /// Textual feature summary for one valve
    Features { valve: Valve, summary: &'a str },
    /// Encoded image (PNG/JPEG) of a valve's PCG trace
    Image { valve: Valve, bytes: &'a [u8] },
}

impl NarrativeRequest<'_> {
    pub fn valve(&self) -> Valve {
        match self {
            NarrativeRequest::Features { valve, .. } | NarrativeRequest::Image { valve, .. } => *valve,
        }
    }

    /// Instruction text sent alongside the payload
    pub fn prompt(&self) -> String {
        match self {
            NarrativeRequest::Image { valve, .. } => format!(
                "Identify possible valvular heart diseases (AS, AR, MS, MR, TS, TR, PS, PR) \
                 based on this PCG graph for {}",
                valve.display_name()
            ),
            NarrativeRequest::Features { valve, summary } => format!(
                "Identify possible valvular heart diseases (AS, AR, MS, MR, TS, TR, PS, PR) \
                 based on these PCG features for {}:\n{}",
                valve.display_name(),
                summary
            ),
        }
    }
}

/// External narrative capability
pub trait NarrativeProvider {
    /// Short identifier used in logs and errors
    fn name(&self) -> &str;

    /// Produce narrative text for the request
    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String>;
}

impl<T: NarrativeProvider + ?Sized> NarrativeProvider for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        (**self).summarize(request)
    }
}

impl<T: NarrativeProvider + ?Sized> NarrativeProvider for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn summarize(&self, request: &NarrativeRequest<'_>) -> Result<String> {
        (**self).summarize(request)
    }
}

/// Available provider implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Offline,
    Http,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Offline => "offline",
            ProviderKind::Http => "http",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = PcgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "offline" => Ok(ProviderKind::Offline),
            "http" => Ok(ProviderKind::Http),
            _ => Err(PcgError::InvalidParameter {
                param: "narrative".to_string(),
                value: s.to_string(),
                expected: "offline or http".to_string(),
            }),
        }
    }
}

/// Construct the provider of the given kind
pub fn build_provider(
    kind: ProviderKind,
    settings: &NarrativeSettings,
) -> Result<Box<dyn NarrativeProvider>> {
    match kind {
        ProviderKind::Offline => Ok(Box::new(OfflineNarrator::new())),
        ProviderKind::Http => Ok(Box::new(HttpNarrator::from_settings(settings)?)),
    }
}
