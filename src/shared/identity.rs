use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of a sub-service within the accessory representation
/// Hex-encoded SHA-256 digest (64 lowercase characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceIdentity(String);

impl ServiceIdentity {
    /// Wrap an already-derived identity string
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// IdentityResolver trait for abstracting sub-service identity derivation
pub trait IdentityResolver: Send + Sync {
    /// Derive the identity of sub-service `name` under `site_key`
    /// Identical inputs must always produce the identical identity
    fn identity(&self, site_key: &str, name: &str) -> ServiceIdentity;
}

/// Production implementation hashing the full `(site_key, name)` composite
#[derive(Debug, Clone, Default)]
pub struct Sha256IdentityResolver;

impl Sha256IdentityResolver {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for Sha256IdentityResolver {
    fn identity(&self, site_key: &str, name: &str) -> ServiceIdentity {
        identity(site_key, name)
    }
}

/// Derive a service identity from `(site_key, name)`
///
/// The site key is length-prefixed so that no two distinct pairs share an
/// encoding ("A_B" + "C" and "A" + "B_C" hash differently).
pub fn identity(site_key: &str, name: &str) -> ServiceIdentity {
    debug_assert!(!site_key.is_empty(), "site key must not be empty");
    debug_assert!(!name.is_empty(), "service name must not be empty");

    let mut hasher = Sha256::new();
    hasher.update((site_key.len() as u64).to_be_bytes());
    hasher.update(site_key.as_bytes());
    hasher.update(name.as_bytes());
    ServiceIdentity(hex::encode(hasher.finalize()))
}

/// Test implementation that ignores its inputs and returns a fixed identity
/// Useful for forcing identity collisions
#[derive(Debug, Clone)]
pub struct FixedIdentityResolver {
    identity: ServiceIdentity,
}

impl FixedIdentityResolver {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: ServiceIdentity(identity.into()),
        }
    }
}

impl IdentityResolver for FixedIdentityResolver {
    fn identity(&self, _site_key: &str, _name: &str) -> ServiceIdentity {
        self.identity.clone()
    }
}
