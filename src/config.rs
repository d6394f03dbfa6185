use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::hub::Hub;
use crate::ledger::ModuleId;
use crate::reference::{FollowerOnlyReferenceModule, ModuleTable, ReferenceModule, FOLLOWER_ONLY};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    FollowerOnly,
}

impl ModuleKind {
    pub fn build(self) -> Box<dyn ReferenceModule> {
        match self {
            ModuleKind::FollowerOnly => Box::new(FollowerOnlyReferenceModule::new()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModuleSpec {
    pub id: ModuleId,
    pub kind: ModuleKind,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HubConfig {
    pub reference_modules: Vec<ModuleSpec>,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub stop_on_rejection: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            reference_modules: vec![ModuleSpec {
                id: FOLLOWER_ONLY.to_string(),
                kind: ModuleKind::FollowerOnly,
            }],
            log_filter: "info".to_string(),
            stop_on_rejection: false,
        }
    }
}

impl HubConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn build_hub(&self) -> Result<Hub, GateError> {
        let mut modules = ModuleTable::new();
        for spec in &self.reference_modules {
            modules.register(spec.id.clone(), spec.kind.build())?;
        }
        Ok(Hub::with_modules(modules))
    }
}
