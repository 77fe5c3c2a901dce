//! Template resolution
//!
//! Every tenant business stores a template identifier choosing its visual
//! theme. The set of templates is closed, so it is modeled as an enum and
//! dispatch is an exhaustive `match`: adding a template without wiring its
//! manifest fails to compile. Unrecognized or legacy identifiers coming out
//! of the database fall back to the default template at the boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    #[default]
    Default,
    Modern,
    Elegant,
    DarkTrend,
    Pollen,
    Vintage,
    Minimal,
}

/// The nine logical pages every template implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Home,
    Header,
    Footer,
    ProductList,
    ProductDetail,
    Cart,
    Checkout,
    About,
    Contact,
}

impl PageKind {
    pub const ALL: [PageKind; 9] = [
        PageKind::Home,
        PageKind::Header,
        PageKind::Footer,
        PageKind::ProductList,
        PageKind::ProductDetail,
        PageKind::Cart,
        PageKind::Checkout,
        PageKind::About,
        PageKind::Contact,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TemplateManifest {
    pub id: TemplateId,
    pub display_name: &'static str,
    /// Asset prefix the renderer loads theme bundles from.
    pub asset_prefix: &'static str,
    pub dark_theme: bool,
    pub pages: Vec<PageKind>,
}

impl TemplateId {
    pub const ALL: [TemplateId; 7] = [
        TemplateId::Default,
        TemplateId::Modern,
        TemplateId::Elegant,
        TemplateId::DarkTrend,
        TemplateId::Pollen,
        TemplateId::Vintage,
        TemplateId::Minimal,
    ];

    /// Lossy parse for identifiers read from business records: unknown or
    /// legacy values resolve to the default template instead of failing.
    pub fn resolve(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Modern => "modern",
            Self::Elegant => "elegant",
            Self::DarkTrend => "dark-trend",
            Self::Pollen => "pollen",
            Self::Vintage => "vintage",
            Self::Minimal => "minimal",
        }
    }

    pub fn manifest(&self) -> TemplateManifest {
        let (display_name, asset_prefix, dark_theme) = match self {
            Self::Default => ("Default", "/themes/default", false),
            Self::Modern => ("Modern", "/themes/modern", false),
            Self::Elegant => ("Elegant", "/themes/elegant", false),
            Self::DarkTrend => ("Dark Trend", "/themes/dark-trend", true),
            Self::Pollen => ("Pollen", "/themes/pollen", false),
            Self::Vintage => ("Vintage", "/themes/vintage", false),
            Self::Minimal => ("Minimal", "/themes/minimal", false),
        };
        TemplateManifest {
            id: *self,
            display_name,
            asset_prefix,
            dark_theme,
            pages: PageKind::ALL.to_vec(),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strict parse for admin writes, where an unknown identifier is an error
/// rather than a silent fallback.
impl FromStr for TemplateId {
    type Err = UnknownTemplate;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownTemplate(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTemplate(pub String);

impl std::error::Error for UnknownTemplate {}
impl fmt::Display for UnknownTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown template '{}'", self.0)
    }
}
