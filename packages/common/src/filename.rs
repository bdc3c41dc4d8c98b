use chrono::{DateTime, Utc};

/// Result of validating a flat filename.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Filename has no extension or one outside the allowed set.
    ExtensionNotAllowed,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::ExtensionNotAllowed => "File type not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // CRLF in a served name would end up in response headers.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Lower-cased extension after the last dot, if any.
pub fn extension_of(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Validates an uploaded name against the configured extension allow-list.
pub fn check_upload_name<'a>(
    filename: &'a str,
    allowed: &[String],
) -> Result<&'a str, FilenameError> {
    let name = validate_flat_filename(filename)?;
    match extension_of(name) {
        Some(ext) if allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(name),
        _ => Err(FilenameError::ExtensionNotAllowed),
    }
}

/// Reduces a client-supplied name to ASCII letters, digits, `.`, `-` and `_`.
///
/// The stem and the extension are cleaned separately so the extension
/// survives a stem made only of non-ASCII characters. Whitespace becomes `_`;
/// leading dots and underscores are stripped so the result is never hidden.
/// An emptied stem becomes `file`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    let cleaned: String = stem
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();
    let stem = match cleaned.trim_start_matches(['.', '_']) {
        "" => "file",
        s => s,
    };

    let ext: String = ext
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{ext}")
    }
}

/// Stored name for a library resource: `{unix millis}_{sanitized original}`.
pub fn timestamped_name(original: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}", now.timestamp_millis(), sanitize_filename(original))
}

/// Stored name for an editor upload: a random hex stem with the original extension.
pub fn random_name(ext: &str) -> String {
    format!("{}.{}", uuid::Uuid::new_v4().simple(), ext)
}

/// Library category derived from the stored name, e.g. `PDF`.
pub fn library_category(filename: &str) -> Option<String> {
    extension_of(filename).map(|ext| ext.to_ascii_uppercase())
}

/// MIME type for library files served inline.
///
/// Anything outside the whitelist is served as an opaque byte stream.
pub fn inline_mime_type(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
