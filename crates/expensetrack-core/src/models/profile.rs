use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct UserProfile {
    pub username: String,
    pub email: String,
}

impl UserProfile {
    /// Name shown in the profile header; "Guest" when the server sent none.
    pub fn display_name(&self) -> &str {
        if self.username.trim().is_empty() {
            "Guest"
        } else {
            &self.username
        }
    }
}
