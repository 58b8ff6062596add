use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::TaxonId;
use crate::error::OrthoError;

/// Raw installation job file (`orthoscope.json`): paths to the input data
/// files and the taxon scope of this installation.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub groups: String,
    pub gene_map: String,
    pub taxonomy: String,
    #[serde(default)]
    pub relations: Option<String>,
    #[serde(default)]
    pub entities: Option<String>,
    pub scope_taxa: Vec<TaxonId>,
    #[serde(default)]
    pub index_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub groups: Utf8PathBuf,
    pub gene_map: Utf8PathBuf,
    pub taxonomy: Utf8PathBuf,
    pub relations: Option<Utf8PathBuf>,
    pub entities: Option<Utf8PathBuf>,
    pub scope_taxa: BTreeSet<TaxonId>,
    pub index_dir: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, OrthoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("orthoscope.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(OrthoError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| OrthoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| OrthoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, OrthoError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let scope_taxa: BTreeSet<TaxonId> = config.scope_taxa.into_iter().collect();

        Ok(ResolvedConfig {
            schema_version,
            groups: Utf8PathBuf::from(config.groups),
            gene_map: Utf8PathBuf::from(config.gene_map),
            taxonomy: Utf8PathBuf::from(config.taxonomy),
            relations: config.relations.map(Utf8PathBuf::from),
            entities: config.entities.map(Utf8PathBuf::from),
            scope_taxa,
            index_dir: config
                .index_dir
                .map(Utf8PathBuf::from)
                .unwrap_or_else(default_index_dir),
        })
    }
}

pub fn default_index_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(".orthoscope")
}
