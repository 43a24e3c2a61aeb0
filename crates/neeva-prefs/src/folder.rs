//! Preference folders

use std::fmt;

/// Groups the preferences of related features.
///
/// The folder names are part of the stored key. Renaming one loses access to
/// every value saved under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefFolder {
    App,
    FirstRun,
    Settings,
    User,
}

impl PrefFolder {
    pub const ALL: [PrefFolder; 4] = [
        PrefFolder::App,
        PrefFolder::FirstRun,
        PrefFolder::Settings,
        PrefFolder::User,
    ];

    pub fn folder_name(&self) -> &'static str {
        match self {
            PrefFolder::App => "APP",
            PrefFolder::FirstRun => "FIRST_RUN",
            PrefFolder::Settings => "SETTINGS",
            PrefFolder::User => "USER",
        }
    }

    /// Key under which `key` is stored in a flat backend.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}/{}", self.folder_name(), key)
    }
}

impl fmt::Display for PrefFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}
