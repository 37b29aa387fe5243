//! Channel identity records.

use serde::{Deserialize, Serialize};

/// A registered content source
///
/// Created on first reference and never updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Store-assigned identifier
    pub id: i64,

    /// Handle of the social account the channel posts to (unique)
    pub external_handle: String,

    /// Channel URL as registered (unique)
    pub channel_url: String,
}
