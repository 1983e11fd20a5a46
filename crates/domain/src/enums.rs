use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Extractor that produced an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// DOM text-pattern heuristics.
    TextPattern,
    /// Vision model run over the page screenshot.
    Vision,
}

impl SourceKind {
    /// Column value used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TextPattern => "text_pattern",
            SourceKind::Vision => "vision",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text_pattern" => Ok(SourceKind::TextPattern),
            "vision" => Ok(SourceKind::Vision),
            other => Err(DomainError::UnknownSource(other.to_string())),
        }
    }
}

/// Logical dashboard section a position is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Concentrated and constant-product liquidity pools.
    Liquidity,
    /// Lending and borrowing markets.
    Lending,
    /// Perpetual futures.
    Perpetuals,
}

/// Protocols with a known home section, keyed by lowercase name.
const PROTOCOL_SECTIONS: &[(&str, Section)] = &[
    ("orca", Section::Liquidity),
    ("raydium", Section::Liquidity),
    ("meteora", Section::Liquidity),
    ("aerodrome", Section::Liquidity),
    ("velodrome", Section::Liquidity),
    ("uniswap", Section::Liquidity),
    ("pancakeswap", Section::Liquidity),
    ("cetus", Section::Liquidity),
    ("kamino", Section::Lending),
    ("marginfi", Section::Lending),
    ("aave", Section::Lending),
    ("morpho", Section::Lending),
    ("compound", Section::Lending),
    ("hyperliquid", Section::Perpetuals),
    ("drift", Section::Perpetuals),
    ("gmx", Section::Perpetuals),
    ("jupiter perps", Section::Perpetuals),
];

impl Section {
    /// Returns the section a protocol belongs to, if the protocol is known.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    pub fn for_protocol(protocol: &str) -> Option<Section> {
        let needle = protocol.trim().to_lowercase();
        PROTOCOL_SECTIONS
            .iter()
            .find(|(name, _)| *name == needle)
            .map(|(_, section)| *section)
    }

    /// Column value used by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Liquidity => "liquidity",
            Section::Lending => "lending",
            Section::Perpetuals => "perpetuals",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "liquidity" => Ok(Section::Liquidity),
            "lending" => Ok(Section::Lending),
            "perpetuals" => Ok(Section::Perpetuals),
            other => Err(DomainError::UnknownSection(other.to_string())),
        }
    }
}

/// Severity of a quality-control finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, data is usable.
    Info,
    /// Data is usable but degraded.
    Warning,
    /// Data is wrong or the batch cannot be processed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}
