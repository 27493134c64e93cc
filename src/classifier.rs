/// Extension-based file classification.
///
/// Maps a filename to the category folder it belongs in. The mapping is pure
/// and deterministic: the same filename with the same configuration always
/// yields the same category, and every filename yields a non-empty category
/// (unmapped extensions fall back to the default).
use std::collections::HashMap;

/// Classifies filenames into category folders by their extension.
///
/// Built from configuration via [`crate::config::Config::classifier`]; the
/// extension map is keyed by lowercase extensions including the leading dot
/// (e.g. `".jpg"`).
#[derive(Debug, Clone)]
pub struct Classifier {
    by_extension: HashMap<String, String>,
    default_category: String,
}

impl Classifier {
    /// Creates a classifier from a pre-normalized extension map.
    pub fn new(by_extension: HashMap<String, String>, default_category: String) -> Self {
        Self {
            by_extension,
            default_category,
        }
    }

    /// Returns the category folder name for a filename.
    ///
    /// The extension is the final suffix after the last dot, compared
    /// case-insensitively. Filenames with no extension, a trailing dot, or a
    /// bare leading dot (dotfiles like `.bashrc`) classify as the default
    /// category.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use filify::classifier::Classifier;
    ///
    /// let mut map = HashMap::new();
    /// map.insert(".jpg".to_string(), "Images".to_string());
    /// let classifier = Classifier::new(map, "Others".to_string());
    ///
    /// assert_eq!(classifier.classify("photo.JPG"), "Images");
    /// assert_eq!(classifier.classify("archive.tar.jpg"), "Images");
    /// assert_eq!(classifier.classify("README"), "Others");
    /// ```
    pub fn classify(&self, file_name: &str) -> &str {
        match file_name.rsplit_once('.') {
            Some((stem, suffix)) if !stem.is_empty() && !suffix.is_empty() => {
                let key = format!(".{}", suffix.to_lowercase());
                self.by_extension
                    .get(&key)
                    .map(String::as_str)
                    .unwrap_or(&self.default_category)
            }
            _ => &self.default_category,
        }
    }

    /// The configured fallback category.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }
}
