use anyhow::{
    Context,
    Result,
    anyhow,
};
use serde::Deserialize;
use starknet::core::types::Felt;
use std::{
    fs,
    path::Path,
};

/// Deployment manifest for a Dojo world, as written by `sozo migrate`
/// (`manifest_dev.json` and friends). Only the fields the client needs are
/// modelled; unknown fields are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct WorldManifest {
    pub world: WorldEntry,
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorldEntry {
    pub address: Felt,
    #[serde(default)]
    pub class_hash: Option<Felt>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContractEntry {
    pub address: Felt,
    /// Namespaced tag, `<namespace>-<name>`.
    pub tag: String,
    #[serde(default)]
    pub class_hash: Option<Felt>,
    #[serde(default)]
    pub systems: Vec<String>,
}

impl WorldManifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| {
            format!("Failed to read world manifest at {}", path.display())
        })?;
        serde_json::from_slice(&data).with_context(|| {
            format!("Failed to parse world manifest at {}", path.display())
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse world manifest JSON")
    }

    pub fn contract_by_name(&self, namespace: &str, name: &str) -> Result<&ContractEntry> {
        let tag = format!("{namespace}-{name}");
        self.contracts
            .iter()
            .find(|contract| contract.tag == tag)
            .ok_or_else(|| anyhow!("No contract tagged '{tag}' in manifest"))
    }
}
