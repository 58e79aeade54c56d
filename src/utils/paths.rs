use crate::config::{UPLOAD_DIR, UploadConfig};
use std::path::{Component, Path, PathBuf};

/// True when `value` starts with `<scheme>://`.
pub fn has_url_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// A single normal path component: no separators, no `.`/`..`, not empty.
pub fn is_plain_filename(value: &str) -> bool {
    if value.is_empty() || value.contains('/') || value.contains('\\') {
        return false;
    }
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Permanent location of a persisted award image.
pub fn get_upload_path(config: &UploadConfig, filename: &str) -> PathBuf {
    config.permanent_dir().join(filename)
}

/// Public URL for a stored image value.
///
/// Values that already carry a URL scheme are returned unchanged.
pub fn get_image_url(config: &UploadConfig, image: &str) -> String {
    if has_url_scheme(image) {
        return image.to_string();
    }

    let prefixes = [config.relative_path.as_str(), config.upload_url.as_str()];
    let absolute = prefixes
        .iter()
        .find(|p| !p.is_empty())
        .is_some_and(|p| p.starts_with('/'));

    let joined = prefixes
        .iter()
        .copied()
        .chain([UPLOAD_DIR, image])
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
