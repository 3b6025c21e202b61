//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! KeyStore (ephemeral | file | env)
//!     → keys.rs (LocalSigner: owner address, message signing)
//!     → provisioner.rs (faucet wallet → key → owner → chain claim)
//!     → ProvisionedIdentity consumed by the Connection Bootstrap
//! ```
//!
//! # Security Constraints
//! - Private keys are never logged or serialized, except by `FileKeyStore` writing its own file
//! - Key persistence is pluggable; the ephemeral store reproduces one-identity-per-session behavior

pub mod keys;
pub mod provisioner;

pub use keys::{
    key_store_from_config, EnvKeyStore, EphemeralKeyStore, FileKeyStore, KeyStore, KeyStoreError,
    LocalSigner, Signer,
};
pub use provisioner::{IdentityProvisioner, ProvisionedIdentity, ProvisioningError, ProvisioningStage};
