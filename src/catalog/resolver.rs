//! Channel URL resolution.
//!
//! Supported address forms:
//!
//! | Form | Example | Resolution |
//! |------|---------|------------|
//! | handle | `youtube.com/@name` | lookup by handle |
//! | direct id | `youtube.com/channel/UC…` | taken verbatim, no request |
//! | custom name | `youtube.com/c/name` | lookup by legacy username |
//! | username | `youtube.com/user/name` | lookup by handle |

use tracing::warn;

use super::{CatalogApi, CatalogError};

/// A parsed channel address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// `/@name`
    Handle(String),
    /// `/channel/ID`
    ChannelId(String),
    /// `/c/name`
    CustomName(String),
    /// `/user/name`
    Username(String),
}

impl ChannelRef {
    /// Parse a channel URL into one of the supported address forms
    pub fn parse(channel_url: &str) -> Result<Self, CatalogError> {
        let unsupported = || CatalogError::UnsupportedUrl(channel_url.to_string());
        let trimmed = channel_url.trim();

        // A bare "@name" is accepted as a handle
        if let Some(handle) = trimmed.strip_prefix('@') {
            return non_empty(handle).map(Self::Handle).ok_or_else(unsupported);
        }

        // Drop scheme, host, query string and fragment
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        let path = without_scheme
            .split_once('/')
            .map(|(_, path)| path)
            .unwrap_or("");
        let path = path.split(['?', '#']).next().unwrap_or("");

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next().ok_or_else(unsupported)?;

        if let Some(handle) = first.strip_prefix('@') {
            return non_empty(handle).map(Self::Handle).ok_or_else(unsupported);
        }

        let value = segments.next().and_then(non_empty);
        let parsed = match first {
            "channel" => value.map(Self::ChannelId),
            "c" => value.map(Self::CustomName),
            "user" => value.map(Self::Username),
            _ => None,
        };

        parsed.ok_or_else(unsupported)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Resolve a channel URL to its canonical channel id
///
/// Unsupported URL shapes, zero lookup results and transport failures all
/// surface as `NotFound`; there is no retry at this layer.
pub async fn resolve_channel_id(
    api: &dyn CatalogApi,
    channel_url: &str,
) -> Result<String, CatalogError> {
    let parsed = match ChannelRef::parse(channel_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("{}", e);
            return Err(CatalogError::NotFound(channel_url.to_string()));
        }
    };

    let (name, lookup) = match parsed {
        ChannelRef::ChannelId(id) => return Ok(id),
        ChannelRef::Handle(handle) | ChannelRef::Username(handle) => {
            let result = api.channel_id_for_handle(&handle).await;
            (handle, result)
        }
        ChannelRef::CustomName(name) => {
            let result = api.channel_id_for_username(&name).await;
            (name, result)
        }
    };

    match lookup {
        Ok(Some(id)) => Ok(id),
        Ok(None) => Err(CatalogError::NotFound(name)),
        Err(CatalogError::MissingApiKey) => Err(CatalogError::MissingApiKey),
        Err(e) => {
            warn!(channel = %name, "Channel lookup failed: {}", e);
            Err(CatalogError::NotFound(name))
        }
    }
}
