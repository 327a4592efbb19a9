use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sapitos_core::{DomainError, LocationId, Organization};

/// Kind of site a location represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Office,
    Branch,
    Supplier,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Office => "office",
            LocationKind::Branch => "branch",
            LocationKind::Supplier => "supplier",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "office" => Ok(LocationKind::Office),
            "branch" => Ok(LocationKind::Branch),
            "supplier" => Ok(LocationKind::Supplier),
            other => Err(DomainError::validation(format!(
                "unknown location kind '{other}'"
            ))),
        }
    }
}

/// A physical or logical site holding its own inventory records.
///
/// The `organization` tag groups locations into tenants; supplier locations
/// whose organization matches an order's target organization fulfill it.
/// The 2-D position exists for mapping only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub kind: LocationKind,
    pub organization: Organization,
    pub position_x: f64,
    pub position_y: f64,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(
        id: LocationId,
        name: impl Into<String>,
        kind: LocationKind,
        organization: Organization,
        position_x: f64,
        position_y: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            kind,
            organization,
            position_x,
            position_y,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            LocationKind::Office,
            LocationKind::Branch,
            LocationKind::Supplier,
        ] {
            assert_eq!(LocationKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(LocationKind::parse("warehouse").is_err());
    }
}
