//! Bundled background assets addressed by stable ids
//!
//! Settings store asset ids (`bg-18`, `gradient-3`) rather than file paths so
//! a stored choice survives moving the asset directory. Uploaded images are
//! stored as data URLs and pass through untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::capture::image::is_data_url;
use crate::domain::{DEFAULT_BACKGROUND_ID, GradientChoice};
use crate::error::EditorError;

/// Background images: id and file relative to the asset root
const BACKGROUND_FILES: &[(&str, &str)] = &[
    ("bg-13", "bg-images/asset-13.jpg"),
    ("bg-18", "bg-images/asset-18.jpg"),
    ("bg-19", "bg-images/asset-19.jpg"),
    ("bg-24", "bg-images/asset-24.avif"),
    ("bg-25", "bg-images/asset-25.jpg"),
    ("bg-26", "bg-images/asset-26.jpeg"),
    ("bg-27", "bg-images/asset-27.jpeg"),
    ("bg-28", "bg-images/asset-28.jpeg"),
    ("bg-29", "bg-images/asset-29.jpeg"),
    ("bg-30", "bg-images/asset-30.jpeg"),
    ("mac-3", "mac/mac-asset-3.jpg"),
    ("mac-5", "mac/mac-asset-5.jpg"),
    ("mac-6", "mac/mac-asset-6.jpeg"),
    ("mac-7", "mac/mac-asset-7.png"),
    ("mac-8", "mac/mac-asset-8.jpg"),
    ("mac-9", "mac/mac-asset-9.jpg"),
    ("mac-10", "mac/mac-asset-10.jpg"),
];

/// Gradient presets: id, image file, fallback colour pair
const GRADIENTS: &[(&str, &str, (&str, &str))] = &[
    ("gradient-1", "mesh/mesh1.webp", ("#667eea", "#764ba2")),
    ("gradient-2", "mesh/mesh2.webp", ("#f093fb", "#f5576c")),
    ("gradient-3", "mesh/mesh3.webp", ("#4facfe", "#00f2fe")),
    ("gradient-4", "mesh/mesh4.webp", ("#43e97b", "#38f9d7")),
    ("gradient-5", "mesh/mesh5.webp", ("#fa709a", "#fee140")),
    ("gradient-6", "mesh/mesh6.webp", ("#30cfd0", "#330867")),
    ("gradient-7", "mesh/mesh7.webp", ("#a8edea", "#fed6e3")),
    ("gradient-8", "mesh/mesh8.webp", ("#ff9a9e", "#fecfef")),
];

/// Whether `value` names a bundled asset
pub fn is_asset_id(value: &str) -> bool {
    BACKGROUND_FILES.iter().any(|(id, _)| *id == value)
        || GRADIENTS.iter().any(|(id, _, _)| *id == value)
}

/// Digits directly following the first occurrence of `marker` that has any
fn digits_after<'a>(value: &'a str, marker: &str) -> Option<&'a str> {
    value.match_indices(marker).find_map(|(idx, _)| {
        let rest = &value[idx + marker.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

/// Map a stored value (asset id, data URL or legacy path) to an asset id or data URL.
///
/// Legacy paths are matched by their numeric suffix; anything unrecognised
/// falls back to the default background id.
pub fn migrate_stored_value(stored: &str) -> String {
    if is_asset_id(stored) || is_data_url(stored) {
        return stored.to_string();
    }
    let candidates = [
        ("asset-", "bg-"),
        ("mac-asset-", "mac-"),
        ("mesh", "gradient-"),
    ];
    for (marker, prefix) in candidates {
        if let Some(n) = digits_after(stored, marker) {
            let id = format!("{prefix}{n}");
            if is_asset_id(&id) {
                log::info!("Migrating legacy background {} -> {}", stored, id);
                return id;
            }
        }
    }
    log::warn!(
        "{}, using {}",
        EditorError::AssetResolutionAmbiguous(stored.to_string()),
        DEFAULT_BACKGROUND_ID
    );
    DEFAULT_BACKGROUND_ID.to_string()
}

/// Registry of bundled assets resolved against an asset root directory
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    root: PathBuf,
    locations: BTreeMap<&'static str, String>,
}

impl AssetRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let files = BACKGROUND_FILES
            .iter()
            .map(|(id, file)| (*id, *file))
            .chain(GRADIENTS.iter().map(|(id, file, _)| (*id, *file)));
        let locations = files
            .map(|(id, file)| (id, root.join(file).to_string_lossy().into_owned()))
            .collect();
        Self { root, locations }
    }

    /// Registry rooted at the per-user data directory
    pub fn from_data_dir() -> Self {
        let root = dirs::data_dir()
            .map(|d| d.join("snapframe").join("assets"))
            .unwrap_or_else(|| PathBuf::from("assets"));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.locations.keys().copied()
    }

    /// Loadable location for an asset id
    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.locations.get(id).map(String::as_str)
    }

    /// Asset id for a location previously returned by [`resolve`](Self::resolve)
    pub fn reverse_lookup(&self, location: &str) -> Option<&'static str> {
        self.locations
            .iter()
            .find(|(_, loc)| loc.as_str() == location)
            .map(|(id, _)| *id)
    }

    /// Value to persist for a location: its asset id, the data URL itself, or nothing
    pub fn to_storable_value(&self, location: &str) -> Option<String> {
        if let Some(id) = self.reverse_lookup(location) {
            return Some(id.to_string());
        }
        is_data_url(location).then(|| location.to_string())
    }

    /// Location to load for a stored value, falling back to the default background
    pub fn resolve_stored(&self, stored: Option<&str>) -> String {
        let id = match stored {
            None => DEFAULT_BACKGROUND_ID.to_string(),
            Some(value) if is_data_url(value) => return value.to_string(),
            Some(value) => migrate_stored_value(value),
        };
        self.resolve(&id)
            .or_else(|| self.resolve(DEFAULT_BACKGROUND_ID))
            .map(str::to_string)
            .unwrap_or(id)
    }

    /// Location for any image reference: asset ids resolve, everything else passes through
    pub fn locate<'a>(&'a self, reference: &'a str) -> &'a str {
        self.resolve(reference).unwrap_or(reference)
    }
}

/// Gradient preset by id
pub fn gradient(id: &str) -> Option<GradientChoice> {
    GRADIENTS
        .iter()
        .find(|(gid, _, _)| *gid == id)
        .map(|(gid, _, (a, b))| GradientChoice {
            id: gid.to_string(),
            image: gid.to_string(),
            colors: (a.to_string(), b.to_string()),
        })
}

pub fn gradients() -> impl Iterator<Item = GradientChoice> {
    GRADIENTS.iter().filter_map(|(id, _, _)| gradient(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_round_trips_through_storage() {
        let registry = AssetRegistry::new("/opt/snapframe/assets");
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids.len(), 25);
        for id in ids {
            let location = registry.resolve(id).unwrap();
            assert_eq!(registry.to_storable_value(location).as_deref(), Some(id));
        }
    }

    #[test]
    fn data_urls_are_stored_verbatim() {
        let registry = AssetRegistry::new("/a");
        let url = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(registry.to_storable_value(url).as_deref(), Some(url));
        assert_eq!(registry.to_storable_value("/tmp/random.png"), None);
        assert_eq!(registry.resolve_stored(Some(url)), url);
    }

    #[test]
    fn legacy_paths_migrate_by_suffix() {
        assert_eq!(migrate_stored_value("/src/assets/bg-images/asset-18.jpg"), "bg-18");
        assert_eq!(migrate_stored_value("/assets/asset-26-abc123.jpeg"), "bg-26");
        assert_eq!(migrate_stored_value("/assets/mac-asset-7-x.png"), "mac-7");
        assert_eq!(migrate_stored_value("/assets/mesh4.webp"), "gradient-4");
        assert_eq!(migrate_stored_value("gradient-2"), "gradient-2");
    }

    #[test]
    fn unknown_values_fall_back_to_default() {
        assert_eq!(migrate_stored_value("/assets/asset-99.jpg"), "bg-18");
        assert_eq!(migrate_stored_value("whatever"), "bg-18");
        let registry = AssetRegistry::new("/r");
        assert_eq!(registry.resolve_stored(None), registry.resolve("bg-18").unwrap());
        assert_eq!(
            registry.resolve_stored(Some("nonsense")),
            registry.resolve("bg-18").unwrap()
        );
    }

    #[test]
    fn digit_extraction_skips_markers_without_digits() {
        assert_eq!(digits_after("asset-x/asset-13.jpg", "asset-"), Some("13"));
        assert_eq!(digits_after("asset-", "asset-"), None);
    }

    #[test]
    fn gradient_presets_carry_fallback_colours() {
        let g = gradient("gradient-1").unwrap();
        assert_eq!(g, GradientChoice::default());
        assert_eq!(gradients().count(), 8);
        assert!(gradient("gradient-9").is_none());
    }

    #[test]
    fn locate_passes_through_unknown_references() {
        let registry = AssetRegistry::new("/r");
        assert_eq!(registry.locate("/tmp/x.png"), "/tmp/x.png");
        assert!(registry.locate("bg-13").ends_with("asset-13.jpg"));
    }
}
