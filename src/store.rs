use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::TaxonId;
use crate::error::OrthoError;
use crate::index::{GeneOrthologyAssignment, HierarchicalGroupRecord};

/// Provenance of a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub tool: String,
    pub built_at: String,
    pub records: usize,
    pub assignments: usize,
    pub warnings: usize,
    pub scope_taxa: Vec<TaxonId>,
}

/// File-backed store for the persisted orthology index: one JSON file per
/// artifact, each written atomically via a temp file in the same
/// directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: Utf8PathBuf,
}

impl IndexStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn records_path(&self) -> Utf8PathBuf {
        self.root.join("records.json")
    }

    pub fn assignments_path(&self) -> Utf8PathBuf {
        self.root.join("assignments.json")
    }

    pub fn meta_path(&self) -> Utf8PathBuf {
        self.root.join("meta.json")
    }

    pub fn exists(&self) -> bool {
        self.records_path().as_std_path().exists()
            && self.assignments_path().as_std_path().exists()
    }

    pub fn save(
        &self,
        records: &[HierarchicalGroupRecord],
        assignments: &[GeneOrthologyAssignment],
        meta: &IndexMeta,
    ) -> Result<(), OrthoError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
        write_json_atomic(&self.records_path(), &records)?;
        write_json_atomic(&self.assignments_path(), &assignments)?;
        write_json_atomic(&self.meta_path(), meta)?;
        Ok(())
    }

    pub fn load(
        &self,
    ) -> Result<(Vec<HierarchicalGroupRecord>, Vec<GeneOrthologyAssignment>), OrthoError> {
        if !self.exists() {
            return Err(OrthoError::IndexNotFound(self.root.to_string()));
        }
        let records = read_json(&self.records_path())?;
        let assignments = read_json(&self.assignments_path())?;
        Ok((records, assignments))
    }

    pub fn load_meta(&self) -> Result<IndexMeta, OrthoError> {
        if !self.meta_path().as_std_path().exists() {
            return Err(OrthoError::IndexNotFound(self.root.to_string()));
        }
        read_json(&self.meta_path())
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), OrthoError> {
    let parent = path
        .parent()
        .ok_or_else(|| OrthoError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    let content = serde_json::to_vec_pretty(value)
        .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    let temp = tempfile::Builder::new()
        .prefix("orthoscope")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    fs::write(temp.path(), &content).map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| OrthoError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, OrthoError> {
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|_| OrthoError::InputRead(path.as_std_path().to_path_buf()))?;
    serde_json::from_str(&content)
        .map_err(|err| OrthoError::InputParse(format!("{path}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupId;
    use crate::index::RecordId;

    #[test]
    fn save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("index")).unwrap();
        let store = IndexStore::new(root);

        let records = vec![HierarchicalGroupRecord {
            id: RecordId::new(1),
            group_id: "HOG1".parse::<GroupId>().unwrap(),
            left: 1,
            right: 2,
            taxon_id: Some(TaxonId::new(9606)),
        }];
        let meta = IndexMeta {
            tool: "orthoscope/test".to_string(),
            built_at: "2026-01-01T00:00:00Z".to_string(),
            records: 1,
            assignments: 0,
            warnings: 0,
            scope_taxa: vec![TaxonId::new(9606)],
        };

        store.save(&records, &[], &meta).unwrap();
        let (loaded_records, loaded_assignments) = store.load().unwrap();
        assert_eq!(loaded_records, records);
        assert!(loaded_assignments.is_empty());
        assert_eq!(store.load_meta().unwrap().records, 1);
    }

    #[test]
    fn load_missing_index_reports_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("nowhere")).unwrap();
        let store = IndexStore::new(root);
        let err = store.load().unwrap_err();
        assert!(matches!(err, OrthoError::IndexNotFound(_)));
    }
}
