//! Monitoring locations and the fixed registry they are drawn from

use serde::{Deserialize, Serialize};

use crate::types::GpsCoordinates;

/// Coarse climatic bucket used by the seasonal telemetry curves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    North,
    South,
    West,
}

impl Region {
    /// North above 28°N, south below 15°N, everything between is west/central
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude > 28.0 {
            Region::North
        } else if latitude < 15.0 {
            Region::South
        } else {
            Region::West
        }
    }
}

/// A registered monitoring point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub state: String,
    pub coordinates: GpsCoordinates,
    pub elevation_m: f64,
    pub region: Region,
    /// Alternative spellings of the state, matched inside query text
    #[serde(default, skip_serializing)]
    pub state_aliases: Vec<String>,
}

impl Location {
    pub fn new(
        name: &str,
        state: &str,
        latitude: f64,
        longitude: f64,
        elevation_m: f64,
        state_aliases: &[&str],
    ) -> Self {
        Self {
            id: slug(name),
            name: name.to_string(),
            state: state.to_string(),
            coordinates: GpsCoordinates::new(latitude, longitude),
            elevation_m,
            region: Region::from_latitude(latitude),
            state_aliases: state_aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// `state_city` form, e.g. `punjab_ludhiana`
    pub fn qualified_id(&self) -> String {
        format!("{}_{}", slug(&self.state), self.id)
    }
}

fn slug(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable set of monitoring points, loaded once at startup
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Agricultural monitoring points across India
    pub fn india_default() -> Self {
        Self::new(vec![
            Location::new("Delhi", "NCR", 28.7041, 77.1025, 216.0, &["delhi", "ncr", "दिल्ली"]),
            Location::new("Ludhiana", "Punjab", 30.9010, 75.8573, 247.0, &["punjab", "पंजाब"]),
            Location::new("Jaipur", "Rajasthan", 26.9124, 75.7873, 431.0, &["rajasthan", "राजस्थान"]),
            Location::new("Nagpur", "Maharashtra", 21.1458, 79.0882, 310.0, &["maharashtra", "vidarbha", "महाराष्ट्र"]),
            Location::new("Chennai", "Tamil Nadu", 13.0827, 80.2707, 6.0, &["tamil nadu", "tamilnadu", "तमिलनाडु"]),
            Location::new("Bangalore", "Karnataka", 12.9716, 77.5946, 920.0, &["karnataka", "bengaluru", "कर्नाटक"]),
            Location::new("Ahmedabad", "Gujarat", 23.0225, 72.5714, 53.0, &["gujarat", "गुजरात"]),
            Location::new("Kolkata", "West Bengal", 22.5726, 88.3639, 9.0, &["west bengal", "bengal", "बंगाल"]),
            Location::new("Hyderabad", "Telangana", 17.3850, 78.4867, 542.0, &["telangana", "तेलंगाना"]),
            Location::new("Coimbatore", "Tamil Nadu", 11.0168, 76.9558, 411.0, &["kongu"]),
        ])
    }

    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Look up by id, display name, or `state_city` id (case-insensitive)
    pub fn find(&self, key: &str) -> Option<&Location> {
        let key = slug(key);
        if key.is_empty() {
            return None;
        }
        self.locations
            .iter()
            .find(|loc| loc.id == key || slug(&loc.name) == key || loc.qualified_id() == key)
    }

    /// First registered point in the given state
    pub fn find_by_state(&self, state: &str) -> Option<&Location> {
        let state = slug(state);
        self.locations.iter().find(|loc| slug(&loc.state) == state)
    }

    /// Nearest registered point and its distance in kilometres
    pub fn nearest(&self, coordinates: &GpsCoordinates) -> Option<(&Location, f64)> {
        self.locations
            .iter()
            .map(|loc| (loc, loc.coordinates.distance_km(coordinates)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Registered point whose city or state is named in free text
    pub fn mentioned_in(&self, text: &str) -> Option<&Location> {
        let lowered = text.to_lowercase();
        let padded = format!(" {} ", tokenize(&lowered));

        self.locations
            .iter()
            .find(|loc| contains_term(&padded, &lowered, &loc.name.to_lowercase()))
            .or_else(|| {
                self.locations.iter().find(|loc| {
                    loc.state_aliases
                        .iter()
                        .any(|alias| contains_term(&padded, &lowered, alias))
                })
            })
    }
}

/// Lowercased text with punctuation collapsed to single spaces
fn tokenize(lowered: &str) -> String {
    lowered
        .split(|c: char| !c.is_alphanumeric() && !is_devanagari_mark(c))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_devanagari_mark(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn contains_term(padded_tokens: &str, raw: &str, term: &str) -> bool {
    if term.is_ascii() {
        padded_tokens.contains(&format!(" {} ", term))
    } else {
        raw.contains(term)
    }
}
