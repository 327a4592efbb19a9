use serde::{Deserialize, Serialize};

use sapitos_core::{ArticleId, DomainError};

/// Catalog article (immutable reference data).
///
/// Prices are held in the smallest currency unit (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub name: String,
    pub category: String,
    pub supplier_price_cents: u64,
    pub sale_price_cents: u64,
    /// Optional season tag (e.g. "Verano"); purely descriptive.
    pub season: Option<String>,
}

impl Article {
    pub fn new(
        id: ArticleId,
        name: impl Into<String>,
        category: impl Into<String>,
        supplier_price_cents: u64,
        sale_price_cents: u64,
        season: Option<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("article name cannot be empty"));
        }
        if sale_price_cents == 0 {
            return Err(DomainError::validation("sale price must be positive"));
        }
        Ok(Self {
            id,
            name,
            category: category.into(),
            supplier_price_cents,
            sale_price_cents,
            season,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let err = Article::new(ArticleId::new(), "  ", "Ropa", 100, 200, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_zero_sale_price() {
        let err = Article::new(ArticleId::new(), "Playera", "Ropa", 100, 0, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
