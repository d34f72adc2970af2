use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Identifier of a single build attempt, as assigned by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BuildId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for BuildId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BuildId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
