use std::fmt;
use std::str::FromStr;

/// How message blocks are arranged in the conversation view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Every block is centered.
    Centered,

    /// User blocks align to one side, assistant and system blocks to the other.
    #[default]
    Side,
}

impl Layout {
    /// The persisted form of this layout.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Centered => "center",
            Layout::Side => "side",
        }
    }

    /// Interpret a persisted value; anything other than `"center"` is side.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("center") => Layout::Centered,
            _ => Layout::Side,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "center" | "centered" => Ok(Layout::Centered),
            "side" => Ok(Layout::Side),
            _ => Err(format!("unknown layout: {s} (expected 'center' or 'side')")),
        }
    }
}
