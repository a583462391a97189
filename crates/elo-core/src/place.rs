//! Place hierarchy path computation.
//!
//! Place documents are filed as
//! `Places/<continent>/<country>[/<region>]/<province>/<municipality>/<name>.md`.
//! Whether the region level appears depends on the country, on a
//! caller-supplied "famous region" flag and on whether a region folder is
//! already present in the vault.
//!
//! The last rule reads storage state, which makes placement order-dependent:
//! once a region folder exists, every later document in that region is filed
//! under it. This self-reinforcement is intended. The probe is consulted
//! before anything is created for the current invocation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults::{CITY_SUFFIX, HOME_COUNTRY, MANAGED_EXTENSION, PLACES_ROOT};
use crate::value::{MetadataMap, MetadataValue};

/// Metadata keys under which place components are stored in a document.
pub mod keys {
    pub const MUNICIPIO: &str = "Municipio";
    pub const PROVINCIA: &str = "Provincia";
    pub const REGION: &str = "Region";
    pub const PAIS: &str = "Pais";
    pub const CONTINENTE: &str = "Continente";
    pub const PLACE_ID: &str = "Lugar Id";
    pub const LATITUDE: &str = "Latitud";
    pub const LONGITUDE: &str = "Longitud";
}

/// Geocoded address components of a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceComponents {
    pub municipio: Option<String>,
    pub provincia: Option<String>,
    pub region: Option<String>,
    pub pais: Option<String>,
    pub continent: Option<String>,
    /// Provider-specific place identifier.
    #[serde(rename = "placeId", alias = "place_id")]
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Overrides the default region-inclusion rule.
    #[serde(rename = "isRegionFamous", alias = "is_region_famous")]
    pub is_region_famous: bool,
}

impl PlaceComponents {
    /// Read components back from a document's metadata block.
    ///
    /// Values written as wiki links (`[[Madrid]]`) are unwrapped. The famous
    /// flag is not stored in documents and must be supplied by the caller.
    pub fn from_metadata(metadata: &MetadataMap, is_region_famous: bool) -> Self {
        let read = |key: &str| {
            metadata
                .get(key)
                .and_then(MetadataValue::as_str)
                .map(unwrap_link)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            municipio: read(keys::MUNICIPIO),
            provincia: read(keys::PROVINCIA),
            region: read(keys::REGION),
            pais: read(keys::PAIS),
            continent: read(keys::CONTINENTE),
            place_id: read(keys::PLACE_ID),
            lat: metadata.get(keys::LATITUDE).and_then(MetadataValue::as_f64),
            lng: metadata.get(keys::LONGITUDE).and_then(MetadataValue::as_f64),
            is_region_famous,
        }
    }

    /// Forced-update map carrying every non-blank component.
    ///
    /// Zero coordinates are treated as absent.
    pub fn to_metadata_updates(&self) -> MetadataMap {
        let mut updates = MetadataMap::new();
        let fields = [
            (keys::MUNICIPIO, &self.municipio),
            (keys::PROVINCIA, &self.provincia),
            (keys::REGION, &self.region),
            (keys::PAIS, &self.pais),
            (keys::CONTINENTE, &self.continent),
            (keys::PLACE_ID, &self.place_id),
        ];
        for (key, value) in fields {
            if let Some(value) = clean(value.as_deref()) {
                updates.insert(key, value);
            }
        }
        for (key, value) in [(keys::LATITUDE, self.lat), (keys::LONGITUDE, self.lng)] {
            if let Some(value) = value.filter(|v| *v != 0.0) {
                updates.insert(key, value);
            }
        }
        updates
    }
}

/// Settings for the place hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceHierarchyConfig {
    /// Top-level folder for place documents.
    #[serde(default = "PlaceHierarchyConfig::default_root_folder")]
    pub root_folder: String,
    /// Country whose regions are always part of the path.
    #[serde(default = "PlaceHierarchyConfig::default_home_country")]
    pub home_country: String,
    /// Suffix for a city named like its province.
    #[serde(default = "PlaceHierarchyConfig::default_city_suffix")]
    pub city_suffix: String,
}

impl Default for PlaceHierarchyConfig {
    fn default() -> Self {
        Self {
            root_folder: Self::default_root_folder(),
            home_country: Self::default_home_country(),
            city_suffix: Self::default_city_suffix(),
        }
    }
}

impl PlaceHierarchyConfig {
    fn default_root_folder() -> String {
        PLACES_ROOT.to_string()
    }

    fn default_home_country() -> String {
        HOME_COUNTRY.to_string()
    }

    fn default_city_suffix() -> String {
        CITY_SUFFIX.to_string()
    }
}

/// Answers whether a folder exists at a vault-relative path.
pub trait FolderProbe {
    fn folder_exists(&self, path: &str) -> bool;
}

impl<F> FolderProbe for F
where
    F: Fn(&str) -> bool,
{
    fn folder_exists(&self, path: &str) -> bool {
        self(path)
    }
}

/// Computes target paths for place documents.
#[derive(Debug, Clone, Default)]
pub struct PlacePathBuilder {
    config: PlaceHierarchyConfig,
}

impl PlacePathBuilder {
    pub fn new(config: PlaceHierarchyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaceHierarchyConfig {
        &self.config
    }

    /// Build the vault-relative path for a place document.
    ///
    /// `place_name` is the current file stem. It is replaced by the
    /// municipality spelling when the two match ignoring case and accents,
    /// and gets the city suffix when the municipality also names the
    /// province. A different name (a landmark inside the town) is kept.
    pub fn build_path(
        &self,
        place_name: &str,
        components: &PlaceComponents,
        probe: &dyn FolderProbe,
    ) -> String {
        let municipio = clean(components.municipio.as_deref());
        let provincia = clean(components.provincia.as_deref());
        let region = clean(components.region.as_deref());
        let pais = clean(components.pais.as_deref());
        let continent = clean(components.continent.as_deref());
        let place_name = place_name.trim();

        let mut segments: Vec<&str> = vec![self.config.root_folder.as_str()];
        segments.extend(continent);
        segments.extend(pais);

        if let Some(region) = region {
            let is_home = pais.is_some_and(|p| p == self.config.home_country);
            let include = is_home
                || components.is_region_famous
                || probe.folder_exists(&normalize_path(&format!("{}/{}", segments.join("/"), region)));
            debug!(
                subsystem = "place",
                region = %region,
                is_home,
                is_region_famous = components.is_region_famous,
                include,
                "region inclusion decided"
            );
            if include {
                segments.push(region);
            }
        }

        segments.extend(provincia);
        segments.extend(municipio);

        let file_stem = match municipio {
            Some(municipio) if base_eq(place_name, municipio) => {
                if provincia.is_some_and(|p| base_eq(municipio, p)) {
                    format!("{} {}", municipio, self.config.city_suffix)
                } else {
                    municipio.to_string()
                }
            }
            _ => place_name.to_string(),
        };

        normalize_path(&format!(
            "{}/{file_stem}.{MANAGED_EXTENSION}",
            segments.join("/")
        ))
    }
}

/// Normalize a vault-relative path.
///
/// Backslashes become slashes, repeated slashes collapse, leading and
/// trailing slashes are removed and non-breaking spaces become spaces.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .replace('\u{00A0}', " ")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compare two names at base-letter strength: case and accents are ignored.
pub fn base_eq(a: &str, b: &str) -> bool {
    fold_base(a) == fold_base(b)
}

/// Lowercase and strip diacritics from Latin letters.
///
/// Handles both precomposed letters and combining marks. Letters with a
/// stroke (`ł`, `ø`, `đ`) fold to their base letter and ligatures such as
/// `ß` expand. Scripts other than Latin pass through unchanged.
pub fn fold_base(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| !('\u{0300}'..='\u{036F}').contains(c))
    {
        match c {
            'ß' => folded.push_str("ss"),
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            other => folded.push(strip_diacritic(other)),
        }
    }
    folded
}

fn strip_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' | 'ð' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => 's',
        'ţ' | 'ť' | 'ŧ' | 'ț' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn unwrap_link(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
