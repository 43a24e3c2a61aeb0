//! Well-known preference keys, grouped by folder.
//!
//! Keys owned by a single feature crate (the tab archiving option, for
//! instance) are declared next to that feature instead.

use crate::folder::PrefFolder;
use crate::key::{CollapsingSectionState, PrefKey};

fn empty() -> String {
    String::new()
}

fn compact() -> CollapsingSectionState {
    CollapsingSectionState::Compact
}

fn expanded() -> CollapsingSectionState {
    CollapsingSectionState::Expanded
}

pub mod app {
    use super::*;

    fn default_custom_domain() -> String {
        "m1.neeva.com".to_string()
    }

    pub const CHECK_FOR_IMPORTED_DATABASE: PrefKey<bool> = PrefKey::new(
        PrefFolder::App,
        "CHECK_FOR_IMPORTED_DATABASE_KEY",
        bool::default,
    );

    pub const CUSTOM_NEEVA_DOMAIN: PrefKey<String> =
        PrefKey::new(PrefFolder::App, "CUSTOM_NEEVA_DOMAIN", default_custom_domain);

    pub const SESSION_ID_V2: PrefKey<String> =
        PrefKey::new(PrefFolder::App, "SESSION_ID_V2", empty);

    /// Whether the incognito profile was in use when the app last ran. Read
    /// once at startup.
    pub const IS_CURRENTLY_INCOGNITO: PrefKey<bool> =
        PrefKey::new(PrefFolder::App, "IS_CURRENTLY_INCOGNITO", bool::default);

    pub const SPACES_SHOW_DESCRIPTIONS: PrefKey<bool> =
        PrefKey::new(PrefFolder::App, "SPACES_SHOW_DESCRIPTIONS", bool::default);

    pub const ZERO_QUERY_SUGGESTED_SITES_STATE: PrefKey<CollapsingSectionState> =
        PrefKey::new(PrefFolder::App, "ZERO_QUERY_SUGGESTED_SITES_STATE", compact);

    pub const ZERO_QUERY_SUGGESTED_QUERIES_STATE: PrefKey<CollapsingSectionState> =
        PrefKey::new(PrefFolder::App, "ZERO_QUERY_SUGGESTED_QUERIES_STATE", expanded);

    pub const ZERO_QUERY_COMMUNITY_SPACES_STATE: PrefKey<CollapsingSectionState> =
        PrefKey::new(PrefFolder::App, "ZERO_QUERY_COMMUNITY_SPACES_STATE", expanded);

    pub const ZERO_QUERY_SPACES_STATE: PrefKey<CollapsingSectionState> =
        PrefKey::new(PrefFolder::App, "ZERO_QUERY_SPACES_STATE", expanded);
}

pub mod first_run {
    use super::*;

    pub const FIRST_RUN_DONE: PrefKey<bool> =
        PrefKey::new(PrefFolder::FirstRun, "HAS_FINISHED_FIRST_RUN", bool::default);

    pub const HAS_SIGNED_IN_BEFORE: PrefKey<bool> =
        PrefKey::new(PrefFolder::FirstRun, "HAS_SIGNED_IN_AT_LEAST_ONCE", bool::default);

    pub const PREVIEW_QUERY_COUNT: PrefKey<i64> =
        PrefKey::new(PrefFolder::FirstRun, "NUM_PREVIEW_QUERIES", i64::default);

    pub const SHOULD_LOG_FIRST_LOGIN: PrefKey<bool> =
        PrefKey::new(PrefFolder::FirstRun, "SHOULD_LOG_FIRST_LOGIN", bool::default);
}

pub mod user {
    use super::*;

    /// Login cookie value. Empty means signed out.
    pub const TOKEN: PrefKey<String> = PrefKey::new(PrefFolder::User, "TOKEN", empty);

    pub const PREVIEW_SESSION_TOKEN: PrefKey<String> =
        PrefKey::new(PrefFolder::User, "PREVIEW_SESSION_TOKEN", empty);

    /// JSON-encoded user profile.
    pub const USER_INFO: PrefKey<String> = PrefKey::new(PrefFolder::User, "USER_INFO", empty);
}
