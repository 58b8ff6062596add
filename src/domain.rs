use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OrthoError;

/// NCBI-style numeric taxon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxonId(u32);

impl TaxonId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonId {
    type Err = OrthoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = value
            .trim()
            .parse::<u32>()
            .map_err(|_| OrthoError::InvalidTaxonId(value.to_string()))?;
        if parsed == 0 {
            return Err(OrthoError::InvalidTaxonId(value.to_string()));
        }
        Ok(Self(parsed))
    }
}

/// Internal gene id, i.e. a gene known to the installation's dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneId(String);

impl GeneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GeneId {
    type Err = OrthoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty() && !trimmed.chars().any(char::is_whitespace);
        if !is_valid {
            return Err(OrthoError::InvalidGeneId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Gene identifier as assigned by the external orthology pipeline.
/// Opaque; not every cross-referenced gene belongs to our dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalGeneId(String);

impl ExternalGeneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalGeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExternalGeneId {
    type Err = OrthoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OrthoError::InvalidGeneId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Identifier of a top-level orthology tree; shared by every record
/// produced from that tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = OrthoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OrthoError::InvalidGroupId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Anatomical or developmental entity id, `PREFIX:LOCAL` shape
/// (e.g. `UBERON:0002048`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = OrthoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = trimmed
            .split_once(':')
            .map(|(prefix, local)| !prefix.is_empty() && !local.is_empty())
            .unwrap_or(false);
        if !is_valid {
            return Err(OrthoError::InvalidEntityId(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Evolutionary relation type. Homoplasy is convergent similarity without
/// shared ancestry and is never eligible for forced-homology expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Homology,
    Homoplasy,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationType::Homology => write!(f, "homology"),
            RelationType::Homoplasy => write!(f, "homoplasy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_taxon_id_valid() {
        let id: TaxonId = "9606".parse().unwrap();
        assert_eq!(id.value(), 9606);
    }

    #[test]
    fn parse_taxon_id_invalid() {
        let err = "0".parse::<TaxonId>().unwrap_err();
        assert_matches!(err, OrthoError::InvalidTaxonId(_));
        let err = "tetrapoda".parse::<TaxonId>().unwrap_err();
        assert_matches!(err, OrthoError::InvalidTaxonId(_));
    }

    #[test]
    fn parse_gene_id_trims() {
        let id: GeneId = " ENSG00000139618 ".parse().unwrap();
        assert_eq!(id.as_str(), "ENSG00000139618");
    }

    #[test]
    fn parse_gene_id_invalid() {
        let err = "  ".parse::<GeneId>().unwrap_err();
        assert_matches!(err, OrthoError::InvalidGeneId(_));
    }

    #[test]
    fn parse_entity_id_requires_prefix() {
        let id: EntityId = "UBERON:0002048".parse().unwrap();
        assert_eq!(id.as_str(), "UBERON:0002048");

        let err = "lung".parse::<EntityId>().unwrap_err();
        assert_matches!(err, OrthoError::InvalidEntityId(_));
    }
}
