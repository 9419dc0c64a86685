//! Object key derivation.
//!
//! Keys have the shape `{orientation}/{id}.{extension}` where `id` is 32 bytes
//! from the OS random source, base64url-encoded without padding. Nothing from
//! the uploaded filename reaches the key. Uniqueness rests on the entropy of
//! the identifier alone; no lookup against existing objects is made.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tb_core::Orientation;

use crate::traits::{StorageError, StorageResult};

/// Length of the random identifier before encoding.
pub const ID_BYTES: usize = 32;

/// A derived object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    key: String,
    orientation: Orientation,
}

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// 32 random bytes encoded as unpadded base64url (43 characters).
pub fn random_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compose `{orientation}/{random_id}.{extension}`.
///
/// The extension must be non-empty ASCII alphanumerics.
pub fn derive_key(orientation: Orientation, extension: &str) -> StorageResult<StorageKey> {
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidKey(format!(
            "unusable extension {extension:?}"
        )));
    }
    Ok(StorageKey {
        key: format!("{}/{}.{}", orientation, random_id(), extension),
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_id_is_43_url_safe_chars() {
        let id = random_id();
        assert_eq!(id.len(), 43);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(URL_SAFE_NO_PAD.decode(&id).unwrap().len(), ID_BYTES);
    }

    #[test]
    fn keys_are_partitioned_by_orientation() {
        let landscape = derive_key(Orientation::Landscape, "mp4").unwrap();
        assert!(landscape.as_str().starts_with("landscape/"));
        assert!(landscape.as_str().ends_with(".mp4"));
        assert_eq!(landscape.orientation(), Orientation::Landscape);

        let portrait = derive_key(Orientation::Portrait, "mp4").unwrap();
        assert!(portrait.as_str().starts_with("portrait/"));

        let other = derive_key(Orientation::Other, "mp4").unwrap();
        assert!(other.to_string().starts_with("other/"));
    }

    #[test]
    fn key_has_exactly_one_separator() {
        let key = derive_key(Orientation::Other, "mp4").unwrap();
        assert_eq!(key.as_str().matches('/').count(), 1);
        assert!(!key.as_str().contains(".."));
    }

    #[test]
    fn keys_do_not_repeat() {
        let keys: HashSet<String> = (0..1000)
            .map(|_| derive_key(Orientation::Landscape, "mp4").unwrap().into_string())
            .collect();
        assert_eq!(keys.len(), 1000);
    }

    #[test]
    fn rejects_path_like_extensions() {
        for ext in ["", "mp4/../x", "m p4", "mp4.", "..\\mp4"] {
            assert!(
                matches!(
                    derive_key(Orientation::Landscape, ext),
                    Err(StorageError::InvalidKey(_))
                ),
                "{ext:?}"
            );
        }
    }
}
