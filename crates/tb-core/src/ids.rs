//! Identifiers for videos and the principals that own them.
//!
//! Both are UUIDs underneath. [`Id`] tags the UUID with a marker kind so a
//! [`UserId`] cannot be passed where a [`VideoId`] is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Marker for what an [`Id`] identifies.
pub trait IdKind: 'static {
    /// Name used in `Debug` output.
    const NAME: &'static str;
}

/// Marker for video records.
#[derive(Debug)]
pub enum VideoKind {}

/// Marker for authenticated principals.
#[derive(Debug)]
pub enum UserKind {}

impl IdKind for VideoKind {
    const NAME: &'static str = "VideoId";
}

impl IdKind for UserKind {
    const NAME: &'static str = "UserId";
}

/// A UUID tagged with the kind of thing it names.
pub struct Id<K: IdKind> {
    uuid: Uuid,
    kind: PhantomData<fn() -> K>,
}

/// Unique identifier for a video record.
pub type VideoId = Id<VideoKind>;
/// Unique identifier for an authenticated principal.
pub type UserId = Id<UserKind>;

impl<K: IdKind> Id<K> {
    /// A fresh random (v4) id.
    #[must_use]
    pub fn new() -> Self {
        Self::from(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.uuid
    }
}

// Derives would demand the bounds of `K`, which is never instantiated.
impl<K: IdKind> Clone for Id<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: IdKind> Copy for Id<K> {}

impl<K: IdKind> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl<K: IdKind> Eq for Id<K> {}

impl<K: IdKind> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl<K: IdKind> Default for Id<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdKind> fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self.uuid)
    }
}

impl<K: IdKind> fmt::Display for Id<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uuid, f)
    }
}

impl<K: IdKind> FromStr for Id<K> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from)
    }
}

impl<K: IdKind> From<Uuid> for Id<K> {
    fn from(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: PhantomData,
        }
    }
}

impl<K: IdKind> From<Id<K>> for Uuid {
    fn from(id: Id<K>) -> Self {
        id.uuid
    }
}

impl<K: IdKind> Serialize for Id<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.uuid.serialize(serializer)
    }
}

impl<'de, K: IdKind> Deserialize<'de> for Id<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::from)
    }
}
