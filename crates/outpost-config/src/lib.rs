//! Configuration for the outpost console.
//!
//! Two kinds of configuration live here:
//!
//! 1. [`Config`], a trait to read a process config from prefixed environment
//!    variables.
//! 2. [`ChainRegistry`], the static mapping from a chain identifier to the
//!    endpoints and portal contract addresses deployed on that chain. The
//!    registry is loaded once at startup and read-only thereafter.
//!
//! # Example
//! ```no_run
//! use outpost_config as config;
//! use serde::{
//!     Deserialize,
//!     Serialize,
//! };
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! #[serde(deny_unknown_fields)]
//! pub struct MyConfig {
//!     pub log: String,
//!     pub registry_path: String,
//! }
//!
//! impl config::Config for MyConfig {
//!     const PREFIX: &'static str = "MY_SERVICE_";
//! }
//!
//! let config: MyConfig = config::get().unwrap();
//! ```
use serde::{
    de::DeserializeOwned,
    Serialize,
};

mod registry;

pub use registry::{
    ChainEntry,
    ChainRegistry,
    PortalAddresses,
    RegistryError,
};

/// Utility function to get a config without having to import the `Config` trait.
///
/// # Errors
/// Returns the same errors as [`Config::get`].
pub fn get<T: Config>() -> Result<T, figment::Error> {
    T::get()
}

pub trait Config: Serialize + DeserializeOwned {
    const PREFIX: &'static str;

    /// Reads the config from the environment.
    ///
    /// # Errors
    /// Returns an error if a required variable is unset or fails to
    /// deserialize into the config's field type.
    fn get() -> Result<Self, figment::Error> {
        Self::get_with_prefix(Self::PREFIX, _internal::Internal)
    }

    #[doc(hidden)]
    fn get_with_prefix(
        prefix: &str,
        _internal: _internal::Internal,
    ) -> Result<Self, figment::Error> {
        use figment::{
            providers::Env as FigmentEnv,
            Figment,
        };
        Figment::new()
            .merge(FigmentEnv::prefixed("RUST_").split("_").only(&["log"]))
            .merge(FigmentEnv::prefixed(prefix))
            .extract()
    }
}

mod _internal {
    pub struct Internal;
}
