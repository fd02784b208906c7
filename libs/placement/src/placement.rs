//! Placement directive parsing.

use cirrus_id::ZoneName;

/// Prefix of the zone placement directive.
pub const ZONE_PLACEMENT_PREFIX: &str = "zone=";

/// A placement directive, parsed once at the request boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Placement {
    /// No placement was given.
    #[default]
    None,

    /// `zone=<name>`: the instance must be created in this zone.
    Zone(ZoneName),

    /// Some other directive kind. Carried verbatim for other subsystems and
    /// ignored by zone resolution.
    Other(String),
}

impl Placement {
    /// Parses a raw placement string.
    ///
    /// The `zone=` prefix is matched exactly and the remainder is taken as
    /// the zone name without trimming.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Placement::None;
        }
        match raw.strip_prefix(ZONE_PLACEMENT_PREFIX) {
            Some(zone) => Placement::Zone(ZoneName::new(zone)),
            None => Placement::Other(raw.to_string()),
        }
    }

    /// Zone requested by the directive, if it is a zone directive.
    pub fn zone(&self) -> Option<&ZoneName> {
        match self {
            Placement::Zone(zone) => Some(zone),
            _ => None,
        }
    }
}

impl From<Option<&str>> for Placement {
    fn from(raw: Option<&str>) -> Self {
        raw.map(Placement::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Placement::None => Ok(()),
            Placement::Zone(zone) => write!(f, "{ZONE_PLACEMENT_PREFIX}{zone}"),
            Placement::Other(raw) => f.write_str(raw),
        }
    }
}
