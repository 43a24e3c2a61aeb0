//! Typed preference keys

use std::fmt;
use std::marker::PhantomData;

use crate::folder::PrefFolder;

/// A value that can be stored as a preference.
///
/// `decode` returns `None` when the stored text cannot be read as `Self`;
/// readers then fall back to the key's default. Enums should decode every
/// string, mapping unknown names onto a fallback variant.
pub trait PrefValue: Sized {
    fn encode(&self) -> String;
    fn decode(raw: &str) -> Option<Self>;
}

impl PrefValue for bool {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl PrefValue for i32 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl PrefValue for i64 {
    fn encode(&self) -> String {
        self.to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }
}

impl PrefValue for String {
    fn encode(&self) -> String {
        self.clone()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

/// A typed key inside a [`PrefFolder`].
pub struct PrefKey<T> {
    folder: PrefFolder,
    key: &'static str,
    default: fn() -> T,
    _value: PhantomData<fn() -> T>,
}

impl<T> PrefKey<T> {
    pub const fn new(folder: PrefFolder, key: &'static str, default: fn() -> T) -> Self {
        Self {
            folder,
            key,
            default,
            _value: PhantomData,
        }
    }

    pub fn folder(&self) -> PrefFolder {
        self.folder
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }
}

impl<T> Clone for PrefKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PrefKey<T> {}

impl<T> fmt::Debug for PrefKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrefKey({}/{})", self.folder, self.key)
    }
}

/// Persisted expansion state of a collapsible zero-query section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapsingSectionState {
    Collapsed,
    Compact,
    Expanded,
}

impl CollapsingSectionState {
    pub fn name(&self) -> &'static str {
        match self {
            CollapsingSectionState::Collapsed => "COLLAPSED",
            CollapsingSectionState::Compact => "COMPACT",
            CollapsingSectionState::Expanded => "EXPANDED",
        }
    }

    /// Unknown names fall back to `Expanded`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "COLLAPSED" => CollapsingSectionState::Collapsed,
            "COMPACT" => CollapsingSectionState::Compact,
            _ => CollapsingSectionState::Expanded,
        }
    }

    /// Cycles through the states the way the section header toggle does.
    pub fn next(&self) -> Self {
        match self {
            CollapsingSectionState::Collapsed => CollapsingSectionState::Compact,
            CollapsingSectionState::Compact => CollapsingSectionState::Expanded,
            CollapsingSectionState::Expanded => CollapsingSectionState::Collapsed,
        }
    }
}

impl PrefValue for CollapsingSectionState {
    fn encode(&self) -> String {
        self.name().to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        Some(Self::from_name(raw))
    }
}
