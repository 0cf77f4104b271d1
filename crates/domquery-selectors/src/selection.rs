//! Selection descriptors: which provider lookup a selector runs.

use domquery::{ByRoleOptions, Matcher, MatcherOptions, SelectorMatcherOptions};

use crate::dispatch::Strategy;

/// Text-family lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextQuery {
    /// Own text content
    Text,
    /// Associated label text
    LabelText,
}

impl TextQuery {
    /// Strategy tag
    #[must_use]
    pub const fn strategy(self) -> Strategy {
        match self {
            Self::Text => Strategy::Text,
            Self::LabelText => Strategy::LabelText,
        }
    }
}

/// Attribute-family lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundAttribute {
    /// Associated label text, with plain matcher options
    LabelText,
    /// `alt` attribute
    AltText,
    /// Form control value
    DisplayValue,
    /// Test-id attribute
    TestId,
    /// `placeholder` attribute
    PlaceholderText,
    /// `title` attribute
    Title,
}

impl BoundAttribute {
    /// Every attribute kind
    pub const ALL: [Self; 6] = [
        Self::LabelText,
        Self::AltText,
        Self::DisplayValue,
        Self::TestId,
        Self::PlaceholderText,
        Self::Title,
    ];

    /// Strategy tag
    #[must_use]
    pub const fn strategy(self) -> Strategy {
        match self {
            Self::LabelText => Strategy::LabelText,
            Self::AltText => Strategy::AltText,
            Self::DisplayValue => Strategy::DisplayValue,
            Self::TestId => Strategy::TestId,
            Self::PlaceholderText => Strategy::PlaceholderText,
            Self::Title => Strategy::Title,
        }
    }
}

/// What a selector looks up, and with which options
#[derive(Debug, Clone)]
pub enum Selection {
    /// By ARIA role
    Role {
        /// Role matcher
        matcher: Matcher,
        /// Role options
        options: ByRoleOptions,
    },
    /// By text or label text
    Text {
        /// Which text lookup
        kind: TextQuery,
        /// Text matcher
        matcher: Matcher,
        /// Text options
        options: SelectorMatcherOptions,
    },
    /// By an attribute-like value
    BoundAttribute {
        /// Which attribute
        attribute: BoundAttribute,
        /// Value matcher
        matcher: Matcher,
        /// Matcher options
        options: MatcherOptions,
    },
}

impl Selection {
    /// Strategy tag used for dispatch
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::Role { .. } => Strategy::Role,
            Self::Text { kind, .. } => kind.strategy(),
            Self::BoundAttribute { attribute, .. } => attribute.strategy(),
        }
    }

    /// The matcher, whatever the strategy
    #[must_use]
    pub const fn matcher(&self) -> &Matcher {
        match self {
            Self::Role { matcher, .. }
            | Self::Text { matcher, .. }
            | Self::BoundAttribute { matcher, .. } => matcher,
        }
    }
}
