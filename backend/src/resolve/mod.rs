//! Geographic code resolution for presentation.
//!
//! Turns a `geo` code into a display name and a flag asset key. Both
//! functions are total: an unknown code resolves to itself.
//!
//! Resolution order:
//! 1. Aggregate regions (`EU27_2020`, `EA20`, ...) resolve to fixed names
//!    and the shared `eu` flag, whatever their numeric suffix.
//! 2. Dataset codes that differ from ISO 3166-1 alpha-2 are remapped
//!    (`EL` → `GR`, `UK` → `GB`).
//! 3. The ISO code is looked up in [`COUNTRY_NAMES`].

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Flag asset shared by all aggregate regions.
pub const REGIONAL_FLAG: &str = "eu";

/// Display name for a blank code.
pub const BLANK_CODE_NAME: &str = "Unknown";

/// Dataset codes that differ from the ISO 3166-1 alpha-2 code.
const CODE_REMAPS: &[(&str, &str)] = &[("EL", "GR"), ("UK", "GB")];

/// Aggregate region prefixes and their display names.
const AGGREGATE_REGIONS: &[(&str, &str)] = &[("EU", "European Union"), ("EA", "Euro area")];

/// ISO 3166-1 alpha-2 codes of the reporting countries and their English names.
pub const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("AL", "Albania"),
    ("AT", "Austria"),
    ("BA", "Bosnia and Herzegovina"),
    ("BE", "Belgium"),
    ("BG", "Bulgaria"),
    ("CH", "Switzerland"),
    ("CY", "Cyprus"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EE", "Estonia"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GR", "Greece"),
    ("HR", "Croatia"),
    ("HU", "Hungary"),
    ("IE", "Ireland"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("LI", "Liechtenstein"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("MD", "Moldova"),
    ("ME", "Montenegro"),
    ("MK", "North Macedonia"),
    ("MT", "Malta"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RS", "Serbia"),
    ("SE", "Sweden"),
    ("SI", "Slovenia"),
    ("SK", "Slovakia"),
    ("TR", "Türkiye"),
    ("UA", "Ukraine"),
    ("US", "United States"),
    ("JP", "Japan"),
];

static COUNTRY_INDEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| COUNTRY_NAMES.iter().copied().collect());

/// Display name and flag asset key of one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDisplay {
    pub code: String,
    pub name: String,
    pub flag: String,
}

/// Aggregate region name when `code` is a prefix followed by a digit.
fn aggregate_region(code: &str) -> Option<&'static str> {
    AGGREGATE_REGIONS.iter().find_map(|(prefix, name)| {
        code.strip_prefix(*prefix)
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .map(|_| *name)
    })
}

/// Replace a dataset-specific code with its ISO 3166-1 equivalent.
pub fn standard_code(code: &str) -> &str {
    CODE_REMAPS
        .iter()
        .find(|(from, _)| *from == code)
        .map_or(code, |(_, to)| *to)
}

/// Country name for an ISO 3166-1 alpha-2 code.
pub fn lookup_country(iso_code: &str) -> Option<&'static str> {
    COUNTRY_INDEX.get(iso_code).copied()
}

/// Human-readable name of a code. Unknown codes resolve to themselves,
/// blank codes to [`BLANK_CODE_NAME`].
pub fn resolve_display_name(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return BLANK_CODE_NAME.to_string();
    }
    if let Some(name) = aggregate_region(code) {
        return name.to_string();
    }
    match lookup_country(standard_code(code)) {
        Some(name) => name.to_string(),
        None => code.to_string(),
    }
}

/// Flag asset key of a code.
///
/// Aggregate regions share [`REGIONAL_FLAG`]; everything else uses the
/// lowercase standard code.
pub fn resolve_flag_asset_key(code: &str) -> String {
    let code = code.trim();
    if aggregate_region(code).is_some() {
        return REGIONAL_FLAG.to_string();
    }
    standard_code(code).to_lowercase()
}

/// Both resolutions of one code.
pub fn resolve(code: &str) -> CodeDisplay {
    CodeDisplay {
        code: code.to_string(),
        name: resolve_display_name(code),
        flag: resolve_flag_asset_key(code),
    }
}
