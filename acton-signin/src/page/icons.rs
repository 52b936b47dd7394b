//! Per-provider button icons
//!
//! Icons are looked up by provider id. Any id without an entry gets the
//! generic mark, so new providers render without changes here.

/// Icon shown on a provider button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderIcon {
    /// Remote image
    Image {
        /// Image URL
        src: &'static str,
        /// Alternative text
        alt: &'static str,
    },
    /// Inline SVG path
    Mark {
        /// SVG `viewBox`
        view_box: &'static str,
        /// SVG path data
        path: &'static str,
    },
}

impl ProviderIcon {
    /// Whether this is the fallback mark
    #[must_use]
    pub fn is_generic(&self) -> bool {
        *self == GENERIC_ICON
    }

    /// Image URL, for image icons
    #[must_use]
    pub const fn src(&self) -> Option<&'static str> {
        match self {
            Self::Image { src, .. } => Some(*src),
            Self::Mark { .. } => None,
        }
    }

    /// Alternative text; empty for marks, which are decorative
    #[must_use]
    pub const fn alt(&self) -> &'static str {
        match self {
            Self::Image { alt, .. } => *alt,
            Self::Mark { .. } => "",
        }
    }

    /// SVG `viewBox`; empty for images
    #[must_use]
    pub const fn view_box(&self) -> &'static str {
        match self {
            Self::Mark { view_box, .. } => *view_box,
            Self::Image { .. } => "",
        }
    }

    /// SVG path data; empty for images
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Mark { path, .. } => *path,
            Self::Image { .. } => "",
        }
    }
}

const GOOGLE_ICON: ProviderIcon = ProviderIcon::Image {
    src: "https://tailus.io/sources/blocks/social/preview/images/google.svg",
    alt: "google logo",
};

/// Fallback for ids without an entry in the table
pub const GENERIC_ICON: ProviderIcon = ProviderIcon::Mark {
    view_box: "0 0 16 16",
    path: "M8 0C3.58 0 0 3.58 0 8c0 3.54 2.29 6.53 5.47 7.59.4.07.55-.17.55-.38 0-.19-.01-.82-.01-1.49-2.01.37-2.53-.49-2.69-.94-.09-.23-.48-.94-.82-1.13-.28-.15-.68-.52-.01-.53.63-.01 1.08.58 1.23.82.72 1.21 1.87.87 2.33.66.07-.52.28-.87.51-1.07-1.78-.2-3.64-.89-3.64-3.95 0-.87.31-1.59.82-2.15-.08-.2-.36-1.02.08-2.12 0 0 .67-.21 2.2.82.64-.18 1.32-.27 2-.27.68 0 1.36.09 2 .27 1.53-1.04 2.2-.82 2.2-.82.44 1.1.16 1.92.08 2.12.51.56.82 1.27.82 2.15 0 3.07-1.87 3.75-3.65 3.95.29.25.54.73.54 1.48 0 1.07-.01 1.93-.01 2.2 0 .21.15.46.55.38A8.012 8.012 0 0 0 16 8c0-4.42-3.58-8-8-8z",
};

const ICONS: &[(&str, ProviderIcon)] = &[("google", GOOGLE_ICON)];

/// Icon for a provider id
#[must_use]
pub fn icon_for(provider_id: &str) -> ProviderIcon {
    ICONS
        .iter()
        .find(|(id, _)| *id == provider_id)
        .map_or(GENERIC_ICON, |(_, icon)| *icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_has_its_own_logo() {
        let icon = icon_for("google");
        assert!(matches!(icon, ProviderIcon::Image { alt: "google logo", .. }));
        assert!(!icon.is_generic());
    }

    #[test]
    fn test_everything_else_falls_back() {
        for id in ["github", "credentials", "acme-sso", ""] {
            assert!(icon_for(id).is_generic(), "{id}");
        }
    }
}
