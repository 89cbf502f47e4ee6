//! Change notifications.
//!
//! When the settings UI changes anything, it broadcasts one message to
//! every open tab; the receiving side re-reads its settings and re-tailors,
//! scoped to the affected entries when the change names them. Delivery is
//! fire-and-forget with no ordering guarantee across tabs; idempotent
//! re-tailoring is what makes that safe.

use serde::{Deserialize, Serialize};

/// Message type prefix distinguishing change notifications from unrelated
/// traffic on the same channel. Only this prefix is significant; the rest
/// of the type string is a diagnostic reason, never matched for behavior.
pub const CHANGE_PREFIX: &str = "change:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ChangeNotification {
    /// `change:<reason>`, e.g. `change:entry-opacity`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ids of the entries the change touched; `None` re-tailors everything
    /// (bulk imports, engine toggles, resets).
    #[serde(rename = "updatedIds")]
    pub updated_ids: Option<Vec<String>>,
}

impl ChangeNotification {
    pub fn new(reason: &str, updated_ids: Option<Vec<String>>) -> Self {
        Self {
            kind: format!("{CHANGE_PREFIX}{reason}"),
            updated_ids,
        }
    }

    /// Parses a raw channel message. Returns `None` for malformed JSON and
    /// for messages that are not change notifications, both of which are
    /// simply ignored by the receiver.
    pub fn parse(json: &str) -> Option<Self> {
        let notification: Self = serde_json::from_str(json).ok()?;
        notification
            .kind
            .starts_with(CHANGE_PREFIX)
            .then_some(notification)
    }

    /// The diagnostic reason after the prefix.
    pub fn reason(&self) -> &str {
        self.kind.strip_prefix(CHANGE_PREFIX).unwrap_or(&self.kind)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
