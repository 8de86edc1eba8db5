use colored::{Color, ColoredString, Colorize};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the twelve note colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Blue,
    Brown,
    DarkBlue,
    Gray,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    Teal,
    White,
    Yellow,
}

/// Canonical names in declaration order, with the terminal style of each.
/// `None` means the text is printed unstyled.
static PALETTE: [(ColorName, &str, Option<Color>); 12] = [
    (ColorName::Blue, "blue", Some(Color::BrightBlue)),
    (ColorName::Brown, "brown", Some(Color::Red)),
    (ColorName::DarkBlue, "darkblue", Some(Color::Blue)),
    (ColorName::Gray, "gray", Some(Color::BrightBlack)),
    (ColorName::Green, "green", Some(Color::Green)),
    (ColorName::Orange, "orange", Some(Color::Yellow)),
    (ColorName::Pink, "pink", Some(Color::BrightMagenta)),
    (ColorName::Purple, "purple", Some(Color::Magenta)),
    (ColorName::Red, "red", Some(Color::BrightRed)),
    (ColorName::Teal, "teal", Some(Color::Cyan)),
    (ColorName::White, "white", None),
    (ColorName::Yellow, "yellow", Some(Color::BrightYellow)),
];

/// Extra spellings, only accepted as whole words
static ALIASES: [(&str, ColorName); 4] = [
    ("cyan", ColorName::Teal),
    ("indigo", ColorName::DarkBlue),
    ("grey", ColorName::Gray),
    ("magenta", ColorName::Purple),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid color '{0}'")]
    Invalid(String),

    #[error("ambiguous color shorthand '{query}': could be one of {}", display_candidates(.candidates))]
    Ambiguous {
        query: String,
        candidates: Vec<ColorName>,
    },
}

fn display_candidates(candidates: &[ColorName]) -> String {
    candidates
        .iter()
        .map(|c| render(*c).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ColorName {
    pub const ALL: [ColorName; 12] = [
        ColorName::Blue,
        ColorName::Brown,
        ColorName::DarkBlue,
        ColorName::Gray,
        ColorName::Green,
        ColorName::Orange,
        ColorName::Pink,
        ColorName::Purple,
        ColorName::Red,
        ColorName::Teal,
        ColorName::White,
        ColorName::Yellow,
    ];

    pub fn as_str(self) -> &'static str {
        self.entry().1
    }

    /// Foreground color used when printing this name
    pub fn style(self) -> Option<Color> {
        self.entry().2
    }

    fn entry(self) -> &'static (ColorName, &'static str, Option<Color>) {
        // PALETTE follows the declaration order of the enum
        &PALETTE[self as usize]
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorName {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s)
    }
}

/// Expand a (possibly abbreviated) color name to its canonical form.
///
/// The query is matched as a literal, case-sensitive prefix against the
/// canonical names. A single match wins; several matches are ambiguous and
/// are reported in declaration order. When nothing matches, the query is
/// looked up as a whole-word alias (`cyan`, `grey`, ...).
pub fn resolve(query: &str) -> Result<ColorName, ColorError> {
    let candidates: Vec<ColorName> = PALETTE
        .iter()
        .filter(|(_, name, _)| name.starts_with(query))
        .map(|(color, _, _)| *color)
        .collect();

    match candidates.as_slice() {
        [only] => Ok(*only),
        [] => ALIASES
            .iter()
            .find(|(alias, _)| *alias == query)
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorError::Invalid(query.to_string())),
        _ => Err(ColorError::Ambiguous {
            query: query.to_string(),
            candidates,
        }),
    }
}

/// The color's name, styled with its own terminal color
pub fn render(name: ColorName) -> ColoredString {
    match name.style() {
        Some(color) => name.as_str().color(color),
        None => name.as_str().normal(),
    }
}
