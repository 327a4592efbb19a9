//! Organization tag (tenant grouping of locations).

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A tenant grouping of locations. Orders are placed against a target
/// organization acting as supplier.
///
/// Organizations are opaque, non-empty, trimmed string tags; the original
/// data model keys them by display name rather than by surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Organization(String);

impl Organization {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("organization cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Organization {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let org = Organization::new("  Acme Norte ").unwrap();
        assert_eq!(org.as_str(), "Acme Norte");
    }

    #[test]
    fn rejects_blank_names() {
        assert!(matches!(
            Organization::new("   "),
            Err(DomainError::Validation(_))
        ));
    }
}
