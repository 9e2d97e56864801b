use std::{
    collections::BTreeMap,
    path::Path,
};

use serde::{
    Deserialize,
    Serialize,
};

/// The static mapping from chain identifier to the endpoints and contract
/// addresses deployed on that chain.
///
/// Loaded once at startup; all lookups borrow from the loaded document.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainRegistry {
    chains: BTreeMap<String, ChainEntry>,
}

/// The per-chain endpoints and portal contract addresses.
///
/// Every endpoint is optional: a chain without a query endpoint can still
/// serve deposits, and vice versa. Lookups through [`ChainRegistry`] turn an
/// absent endpoint into an error naming the chain.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainEntry {
    pub label: String,
    pub query_base_url: Option<String>,
    pub inspect_base_url: Option<String>,
    pub rpc_url: Option<String>,
    pub sequencer_url: Option<String>,
    pub portals: PortalAddresses,
}

/// Addresses of the on-chain entry points, hex encoded.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortalAddresses {
    pub input_box: String,
    pub ether_portal: String,
    pub erc20_portal: String,
    pub erc721_portal: String,
    pub erc1155_single_portal: String,
    pub erc1155_batch_portal: String,
}

impl ChainRegistry {
    /// Reads the registry from a JSON file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse as a
    /// registry document.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(RegistryError::read_registry)?;
        Self::from_json(&raw)
    }

    /// Parses the registry from a JSON string.
    ///
    /// # Errors
    /// Returns an error if `raw` does not parse as a registry document.
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(raw).map_err(RegistryError::parse_registry)
    }

    /// Returns the entry for `chain_id`.
    ///
    /// # Errors
    /// Returns an error if the chain is not in the registry.
    pub fn get(&self, chain_id: &str) -> Result<&ChainEntry, RegistryError> {
        self.chains
            .get(chain_id)
            .ok_or_else(|| RegistryError::unknown_chain(chain_id))
    }

    /// Constructs the query endpoint URL for one (chain, application) pair.
    ///
    /// # Errors
    /// Returns an error if the chain is unknown or carries no query endpoint.
    pub fn graphql_url(&self, chain_id: &str, application: &str) -> Result<String, RegistryError> {
        let base = self
            .get(chain_id)?
            .query_base_url
            .as_deref()
            .ok_or_else(|| RegistryError::no_query_endpoint(chain_id))?;
        Ok(format!(
            "{}/graphql/{application}",
            base.trim_end_matches('/')
        ))
    }

    /// Constructs the inspect endpoint URL for `chain_id`.
    ///
    /// # Errors
    /// Returns an error if the chain is unknown or carries no inspect
    /// endpoint.
    pub fn inspect_url(&self, chain_id: &str) -> Result<String, RegistryError> {
        let base = self
            .get(chain_id)?
            .inspect_base_url
            .as_deref()
            .ok_or_else(|| RegistryError::no_inspect_endpoint(chain_id))?;
        Ok(format!("{}/inspect", base.trim_end_matches('/')))
    }

    /// Returns the chain's JSON-RPC endpoint.
    ///
    /// # Errors
    /// Returns an error if the chain is unknown or carries no RPC endpoint.
    pub fn rpc_url(&self, chain_id: &str) -> Result<&str, RegistryError> {
        self.get(chain_id)?
            .rpc_url
            .as_deref()
            .ok_or_else(|| RegistryError::no_rpc_endpoint(chain_id))
    }

    /// Returns the chain's sequencer submission endpoint.
    ///
    /// # Errors
    /// Returns an error if the chain is unknown or carries no sequencer
    /// endpoint.
    pub fn sequencer_url(&self, chain_id: &str) -> Result<&str, RegistryError> {
        self.get(chain_id)?
            .sequencer_url
            .as_deref()
            .ok_or_else(|| RegistryError::no_sequencer_endpoint(chain_id))
    }
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct RegistryError(RegistryErrorKind);

impl RegistryError {
    #[must_use]
    fn read_registry(source: std::io::Error) -> Self {
        Self(RegistryErrorKind::ReadRegistry {
            source,
        })
    }

    #[must_use]
    fn parse_registry(source: serde_json::Error) -> Self {
        Self(RegistryErrorKind::ParseRegistry {
            source,
        })
    }

    #[must_use]
    fn unknown_chain(chain_id: &str) -> Self {
        Self(RegistryErrorKind::UnknownChain {
            chain_id: chain_id.to_string(),
        })
    }

    #[must_use]
    fn no_query_endpoint(chain_id: &str) -> Self {
        Self(RegistryErrorKind::NoQueryEndpoint {
            chain_id: chain_id.to_string(),
        })
    }

    #[must_use]
    fn no_inspect_endpoint(chain_id: &str) -> Self {
        Self(RegistryErrorKind::NoInspectEndpoint {
            chain_id: chain_id.to_string(),
        })
    }

    #[must_use]
    fn no_rpc_endpoint(chain_id: &str) -> Self {
        Self(RegistryErrorKind::NoRpcEndpoint {
            chain_id: chain_id.to_string(),
        })
    }

    #[must_use]
    fn no_sequencer_endpoint(chain_id: &str) -> Self {
        Self(RegistryErrorKind::NoSequencerEndpoint {
            chain_id: chain_id.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum RegistryErrorKind {
    #[error("failed reading chain registry file")]
    ReadRegistry { source: std::io::Error },
    #[error("failed parsing chain registry document")]
    ParseRegistry { source: serde_json::Error },
    #[error("chain `{chain_id}` is not in the registry")]
    UnknownChain { chain_id: String },
    #[error("no query endpoint defined for chain `{chain_id}`")]
    NoQueryEndpoint { chain_id: String },
    #[error("no inspect endpoint defined for chain `{chain_id}`")]
    NoInspectEndpoint { chain_id: String },
    #[error("no rpc endpoint defined for chain `{chain_id}`")]
    NoRpcEndpoint { chain_id: String },
    #[error("no sequencer endpoint defined for chain `{chain_id}`")]
    NoSequencerEndpoint { chain_id: String },
}

#[cfg(test)]
mod tests {
    use super::ChainRegistry;

    const EXAMPLE_REGISTRY: &str = r#"{
        "chains": {
            "0x7a69": {
                "label": "localhost",
                "query_base_url": "http://localhost:8080",
                "inspect_base_url": "http://localhost:8080",
                "rpc_url": "http://localhost:8545",
                "sequencer_url": "http://localhost:8080",
                "portals": {
                    "input_box": "0x593e5bcf894d6829dd26d0810da7f064406aebb6",
                    "ether_portal": "0xfa2292f6d85ea4e629b068f10a8ad617526bc37a",
                    "erc20_portal": "0x05355c2f9bd1c04c4f6db34bf0c9af2b29254bd8",
                    "erc721_portal": "0x874c6fbad3a3e307b359efb1e3dfa36b0c68b1b8",
                    "erc1155_single_portal": "0xa94546aa9f62a32b9cd82e1b5031b40c9c171bd9",
                    "erc1155_batch_portal": "0x4a218d331c0933d5fac5b3ead4641a08d5b7ce23"
                }
            },
            "0xaa36a7": {
                "label": "sepolia",
                "query_base_url": null,
                "inspect_base_url": null,
                "rpc_url": null,
                "sequencer_url": null,
                "portals": {
                    "input_box": "0x593e5bcf894d6829dd26d0810da7f064406aebb6",
                    "ether_portal": "0xfa2292f6d85ea4e629b068f10a8ad617526bc37a",
                    "erc20_portal": "0x05355c2f9bd1c04c4f6db34bf0c9af2b29254bd8",
                    "erc721_portal": "0x874c6fbad3a3e307b359efb1e3dfa36b0c68b1b8",
                    "erc1155_single_portal": "0xa94546aa9f62a32b9cd82e1b5031b40c9c171bd9",
                    "erc1155_batch_portal": "0x4a218d331c0933d5fac5b3ead4641a08d5b7ce23"
                }
            }
        }
    }"#;

    #[test]
    fn graphql_url_is_scoped_to_the_application() {
        let registry = ChainRegistry::from_json(EXAMPLE_REGISTRY).unwrap();
        let url = registry
            .graphql_url("0x7a69", "0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e")
            .unwrap();
        assert_eq!(
            url,
            "http://localhost:8080/graphql/0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e"
        );
    }

    #[test]
    fn unknown_chain_is_an_error() {
        let registry = ChainRegistry::from_json(EXAMPLE_REGISTRY).unwrap();
        let err = registry.get("0xdeadbeef").unwrap_err();
        assert!(err.to_string().contains("not in the registry"));
    }

    #[test]
    fn chain_without_query_endpoint_is_an_error() {
        let registry = ChainRegistry::from_json(EXAMPLE_REGISTRY).unwrap();
        let err = registry
            .graphql_url("0xaa36a7", "0xab7528bb862fb57e8a2bcd567a2e929a0be56a5e")
            .unwrap_err();
        assert!(err.to_string().contains("no query endpoint"));
    }

    #[test]
    fn registry_rejects_unknown_fields() {
        let raw = r#"{"chains": {}, "extra": true}"#;
        assert!(ChainRegistry::from_json(raw).is_err());
    }
}
