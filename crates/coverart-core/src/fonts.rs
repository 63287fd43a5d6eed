//! Registered text fonts. The first entry is the default for new and migrated
//! text elements.

/// A font offered in the text panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub name: &'static str,
    /// CSS `font-family` value stored on text elements
    pub value: &'static str,
}

pub const FONTS: &[Font] = &[
    Font { name: "Inter", value: "'Inter', sans-serif" },
    Font { name: "Space Grotesk", value: "'Space Grotesk', sans-serif" },
    Font { name: "Playfair Display", value: "'Playfair Display', serif" },
    Font { name: "Bebas Neue", value: "'Bebas Neue', cursive" },
    Font { name: "Syncopate", value: "'Syncopate', sans-serif" },
    Font { name: "Monoton", value: "'Monoton', cursive" },
    Font { name: "Righteous", value: "'Righteous', cursive" },
    Font { name: "Unifraktur", value: "'UnifrakturMaguntia', cursive" },
    Font { name: "Abril Fatface", value: "'Abril Fatface', cursive" },
    Font { name: "Permanent Marker", value: "'Permanent Marker', cursive" },
];

/// Font weight used when a text element has none
pub const DEFAULT_FONT_WEIGHT: &str = "800";

pub fn default_font() -> &'static Font {
    &FONTS[0]
}

/// Look up a font by display name (case-insensitive)
pub fn find_font(name: &str) -> Option<&'static Font> {
    FONTS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}
