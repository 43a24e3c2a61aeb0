//! Tab record

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TabError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabData {
    pub id: String,
    /// URL of the page last displayed
    pub url: Option<String>,
    /// Title of the page last displayed
    pub title: Option<String>,
    /// Milliseconds since the epoch
    pub last_active_ms: i64,
    pub is_archived: bool,
}

impl TabData {
    pub fn new(url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            title: None,
            last_active_ms: Utc::now().timestamp_millis(),
            is_archived: false,
        }
    }

    /// Points the tab at a new page. The title is unknown until it loads.
    pub fn navigate(&mut self, url: String) -> Result<()> {
        if url.is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
        }
        self.url = Some(url);
        self.title = None;
        Ok(())
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .or(self.url.as_deref())
            .unwrap_or_default()
    }

    /// Whether the tab was last active before `cutoff_ms`.
    pub fn inactive_since(&self, cutoff_ms: i64) -> bool {
        self.last_active_ms < cutoff_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tab() {
        let tab = TabData::new(Some("https://example.com".to_string()));
        assert!(!tab.is_archived);
        assert!(tab.title.is_none());
        assert_eq!(tab.display_title(), "https://example.com");
    }

    #[test]
    fn test_navigate_resets_title() {
        let mut tab = TabData::new(None);
        tab.title = Some("Old".to_string());

        tab.navigate("https://neeva.com".to_string()).unwrap();
        assert_eq!(tab.url.as_deref(), Some("https://neeva.com"));
        assert!(tab.title.is_none());

        assert!(tab.navigate(String::new()).is_err());
    }
}
