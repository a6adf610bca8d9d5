use validator::ValidationError;

/// Organization slug domain type. Lowercase letters, digits, and hyphens;
/// must start and end with a letter or digit. Unique per organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl Slug {
    /// Create a new Slug from a string. Trims and lowercases before checking.
    pub fn new(slug: String) -> Result<Self, ValidationError> {
        let normalized = slug.trim().to_lowercase();

        if normalized.len() < 2 || normalized.len() > 63 {
            let mut error = ValidationError::new("slug_length");
            error.message = Some("Slug must be 2–63 characters".into());
            return Err(error);
        }

        let valid_chars = normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let valid_edges = !normalized.starts_with('-') && !normalized.ends_with('-');
        if !valid_chars || !valid_edges {
            let mut error = ValidationError::new("invalid_slug");
            error.message = Some("Slug may contain lowercase letters, digits, and hyphens".into());
            return Err(error);
        }

        Ok(Self(normalized))
    }

    /// Get the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
