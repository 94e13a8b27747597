use std::fmt;

/// Which side of the comparison a track plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackRole {
    /// Reference voice sample
    Reference,
    /// The user's own recording
    User,
}

impl TrackRole {
    /// Both roles, reference first
    pub const ALL: [TrackRole; 2] = [TrackRole::Reference, TrackRole::User];

    /// The sibling track
    pub fn other(self) -> Self {
        match self {
            TrackRole::Reference => TrackRole::User,
            TrackRole::User => TrackRole::Reference,
        }
    }

    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            TrackRole::Reference => "reference",
            TrackRole::User => "user",
        }
    }
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An audio URL to load for one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    /// Remote URL, `file://` URL or filesystem path
    pub url: String,
    /// Side of the comparison
    pub role: TrackRole,
    /// Display-only label
    pub label: String,
}

impl AudioSource {
    /// Create a source labelled with its role name
    pub fn new(url: impl Into<String>, role: TrackRole) -> Self {
        AudioSource {
            url: url.into(),
            role,
            label: role.name().to_string(),
        }
    }

    /// Reference source
    pub fn reference(url: impl Into<String>) -> Self {
        Self::new(url, TrackRole::Reference)
    }

    /// User recording source
    pub fn user(url: impl Into<String>) -> Self {
        Self::new(url, TrackRole::User)
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Lowercase file extension of the URL path, used as a decoder hint
    pub fn extension(&self) -> Option<String> {
        extension_hint(&self.url)
    }
}

/// Extract a file extension from a URL or path, ignoring query and fragment
pub fn extension_hint(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_other() {
        assert_eq!(TrackRole::Reference.other(), TrackRole::User);
        assert_eq!(TrackRole::User.other(), TrackRole::Reference);
        assert_eq!(TrackRole::User.to_string(), "user");
    }

    #[test]
    fn test_source_label_defaults_to_role() {
        let source = AudioSource::user("https://example.com/me.webm");
        assert_eq!(source.label, "user");
        assert_eq!(source.with_label("My voice").label, "My voice");
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("https://x.com/a/b.WAV?sig=1").as_deref(), Some("wav"));
        assert_eq!(extension_hint("/tmp/take.mp3").as_deref(), Some("mp3"));
        assert_eq!(extension_hint("/audio-proxy?url=x.wav"), None);
        assert_eq!(extension_hint("https://x.com/.hidden"), None);
    }
}
