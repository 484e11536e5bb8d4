//! Configuration for catalog export runs.

use std::path::PathBuf;

/// Default maximum recursion depth of the fallback file search.
pub const DEFAULT_SEARCH_DEPTH: usize = 3;

/// Run-level configuration: where to search, where to cache, how to name.
///
/// Built once per run and passed by value into the components that need it.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Root directory of the fallback file search.
    pub fallback_root: PathBuf,

    /// Maximum recursion depth of the fallback search.
    pub search_depth: usize,

    /// Directory holding the day-stamped cache snapshots.
    pub cache_dir: PathBuf,

    /// Whether to consult and update the cache at all.
    pub use_cache: bool,

    /// Customer tag used in the output file name.
    pub customer: String,
}

impl ExportConfig {
    /// Create a configuration with the given fallback root and cache directory.
    pub fn new(fallback_root: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback_root: fallback_root.into(),
            search_depth: DEFAULT_SEARCH_DEPTH,
            cache_dir: cache_dir.into(),
            use_cache: true,
            customer: "catalog".to_string(),
        }
    }

    /// Set the maximum fallback search depth.
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Enable or disable the cache.
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.use_cache = enable;
        self
    }

    /// Set the customer tag used for output naming.
    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = customer.into();
        self
    }
}

/// Extraction settings: which object categories end up in the output.
///
/// Passed unchanged through the coordinator to the content extractor.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Export placed graphics ("G" lines).
    pub graphics: bool,

    /// Export text frames ("T" lines).
    pub text_frames: bool,

    /// Export text found by walking stories ("T" lines).
    pub text_in_stories: bool,

    /// Export table cell text.
    pub tables: bool,

    /// Export labeled page items ("W" lines).
    pub page_items: bool,

    /// Layer the export was restricted to, recorded into result metadata.
    /// `None` means all layers.
    pub layer: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            graphics: true,
            text_frames: true,
            text_in_stories: true,
            tables: false,
            page_items: false,
            layer: None,
        }
    }
}

impl ExportSettings {
    /// Create settings with the standard category switches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the export to one layer (recorded in result metadata).
    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Enable or disable labeled page item export.
    pub fn with_page_items(mut self, enable: bool) -> Self {
        self.page_items = enable;
        self
    }

    /// Enable or disable table cell export.
    pub fn with_tables(mut self, enable: bool) -> Self {
        self.tables = enable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExportConfig::new("/srv/pages", "/srv/cache");
        assert_eq!(config.search_depth, DEFAULT_SEARCH_DEPTH);
        assert!(config.use_cache);
    }

    #[test]
    fn test_config_builders() {
        let config = ExportConfig::new("/srv/pages", "/srv/cache")
            .with_search_depth(5)
            .with_cache(false)
            .with_customer("personalshop");
        assert_eq!(config.search_depth, 5);
        assert!(!config.use_cache);
        assert_eq!(config.customer, "personalshop");
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ExportSettings::default();
        assert!(settings.graphics);
        assert!(settings.text_frames);
        assert!(settings.text_in_stories);
        assert!(!settings.tables);
        assert!(!settings.page_items);
        assert!(settings.layer.is_none());
    }
}
