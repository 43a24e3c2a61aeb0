//! Automatic tab archiving option

use chrono::Duration;
use neeva_prefs::{PrefFolder, PrefKey, PrefValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArchiveAfterOption {
    After1Day,
    #[default]
    After7Days,
    After30Days,
    Never,
}

impl ArchiveAfterOption {
    pub const ALL: [ArchiveAfterOption; 4] = [
        ArchiveAfterOption::After1Day,
        ArchiveAfterOption::After7Days,
        ArchiveAfterOption::After30Days,
        ArchiveAfterOption::Never,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArchiveAfterOption::After1Day => "AFTER_1_DAY",
            ArchiveAfterOption::After7Days => "AFTER_7_DAYS",
            ArchiveAfterOption::After30Days => "AFTER_30_DAYS",
            ArchiveAfterOption::Never => "NEVER",
        }
    }

    /// Unknown names fall back to `After7Days`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|option| option.name() == name)
            .unwrap_or_default()
    }

    /// How long a tab may stay inactive before it is archived.
    pub fn inactivity_limit(&self) -> Option<Duration> {
        match self {
            ArchiveAfterOption::After1Day => Some(Duration::days(1)),
            ArchiveAfterOption::After7Days => Some(Duration::days(7)),
            ArchiveAfterOption::After30Days => Some(Duration::days(30)),
            ArchiveAfterOption::Never => None,
        }
    }

    /// Tabs last active before the returned time (ms since epoch) should be
    /// archived at `now_ms`.
    pub fn archive_cutoff_ms(&self, now_ms: i64) -> Option<i64> {
        self.inactivity_limit()
            .map(|limit| now_ms.saturating_sub(limit.num_milliseconds()))
    }
}

impl PrefValue for ArchiveAfterOption {
    fn encode(&self) -> String {
        self.name().to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(Self::from_name(raw))
    }
}

pub const AUTOMATICALLY_ARCHIVE_TABS: PrefKey<ArchiveAfterOption> = PrefKey::new(
    PrefFolder::App,
    "AUTOMATICALLY_ARCHIVE_TABS",
    ArchiveAfterOption::default,
);
