// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! YAML set files used to seed a store.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{ProgressionFields, Set, SetInfo};
use crate::services::MemoryStore;

/// A set and its library entries as written on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetFile {
    /// Set metadata
    pub set: SetHeader,
    /// Progressions in performance order
    #[serde(default)]
    pub progressions: Vec<ProgressionFields>,
    /// Library templates
    #[serde(default)]
    pub library: Vec<ProgressionFields>,
}

/// Set-level fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetHeader {
    pub name: String,
}

impl SetFile {
    /// Load a set file from YAML on disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read set file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a set file from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML set file")
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize set file to YAML")
    }

    /// Save to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write set file: {:?}", path.as_ref()))
    }

    /// Describe a loaded set
    pub fn from_set(set: &Set) -> Self {
        Self {
            set: SetHeader {
                name: set.name().to_string(),
            },
            progressions: set.progressions().iter().map(|p| p.fields()).collect(),
            library: Vec::new(),
        }
    }

    /// Check every entry has chord text
    pub fn validate(&self) -> Result<()> {
        if self.set.name.trim().is_empty() {
            return Err(anyhow!("set name must not be empty"));
        }
        for (i, fields) in self.progressions.iter().chain(&self.library).enumerate() {
            fields
                .validate()
                .with_context(|| format!("entry {} ({:?})", i + 1, fields.name))?;
        }
        Ok(())
    }

    /// Insert the set and library entries into a store
    pub fn seed(&self, store: &MemoryStore, owner_id: &str) -> SetInfo {
        for fields in &self.library {
            store.insert_library_entry(owner_id, fields.clone());
        }
        store.insert_set(owner_id, &self.set.name, self.progressions.iter().cloned())
    }
}

/// Load and validate a set file
pub fn validate_set_file<P: AsRef<Path>>(path: P) -> Result<SetFile> {
    let file = SetFile::load(path)?;
    file.validate()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Instrument;
    use tempfile::tempdir;

    const YAML: &str = r#"
set:
  name: "Friday Gig"

progressions:
  - name: "Intro"
    chords: "Am F C G"
    instrument: Piano
    notes: "let it ring"
  - chords: "Dm G C"
    audio: "u1/verse.webm"

library:
  - chords: "C G Am F"
    name: "Axis"
"#;

    #[test]
    fn test_parse_set_file() {
        let file = SetFile::from_yaml(YAML).unwrap();
        assert_eq!(file.set.name, "Friday Gig");
        assert_eq!(file.progressions.len(), 2);
        assert_eq!(file.progressions[0].instrument, Some(Instrument::Piano));
        assert_eq!(file.progressions[1].audio.as_ref().unwrap().as_str(), "u1/verse.webm");
        assert_eq!(file.library[0].name.as_deref(), Some("Axis"));
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_chords() {
        let yaml = "set:\n  name: A\nprogressions:\n  - chords: \"\"\n";
        let file = SetFile::from_yaml(yaml).unwrap();
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_seed_store() {
        let file = SetFile::from_yaml(YAML).unwrap();
        let store = MemoryStore::new();
        let info = file.seed(&store, "u1");

        let stored = store.stored_progressions(&info.id);
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].chords, "Am F C G");
        assert_eq!(stored[1].position, 1);
    }

    #[test]
    fn test_save_and_validate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gig.yaml");

        let file = SetFile::from_yaml(YAML).unwrap();
        file.save(&path).unwrap();

        let loaded = validate_set_file(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn test_validate_invalid_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "this is not valid yaml: [").unwrap();

        assert!(validate_set_file(&path).is_err());
    }
}
