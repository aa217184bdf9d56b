//! Typed wrappers over opaque document ids.

/// Declare a string-backed id newtype that converts to and from
/// [`DocumentId`](crate::document::DocumentId).
macro_rules! opaque_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

      pub fn as_str(&self) -> &str { &self.0 }

      /// `true` if the id is empty or only whitespace.
      pub fn is_blank(&self) -> bool { self.0.trim().is_empty() }
    }

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl From<&str> for $name {
      fn from(s: &str) -> Self { Self(s.to_owned()) }
    }

    impl From<String> for $name {
      fn from(s: String) -> Self { Self(s) }
    }

    impl From<crate::document::DocumentId> for $name {
      fn from(id: crate::document::DocumentId) -> Self { Self(id.into_inner()) }
    }

    impl From<$name> for crate::document::DocumentId {
      fn from(id: $name) -> Self { crate::document::DocumentId::new(id.0) }
    }
  };
}

pub(crate) use opaque_id;
