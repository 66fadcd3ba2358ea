// ABOUTME: On-disk cache for resolved AWS credentials.
// ABOUTME: Keyed by profile name, entries expire with the session token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::PathBuf;

/// A resolved credential set, serialized verbatim into the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiration: DateTime<Utc>,
    pub profile: String,
}

impl CachedCredentials {
    pub fn is_expired(&self) -> bool {
        self.expiration <= Utc::now()
    }
}

/// File-per-profile credential cache. Profiles with SSO or MFA resolution
/// are slow to resolve, so a still-valid session is reused across runs.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    /// Cache under the platform cache directory, `cirrus/credentials`.
    pub fn open_default() -> Option<Self> {
        dirs::cache_dir().map(|base| Self {
            dir: base.join("cirrus").join("credentials"),
        })
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, profile: &str) -> PathBuf {
        let digest = Sha256::digest(profile.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// A missing, corrupt or expired entry all read as a miss.
    pub fn load(&self, profile: &str) -> Option<CachedCredentials> {
        let data = fs::read_to_string(self.path_for(profile)).ok()?;
        let creds: CachedCredentials = serde_json::from_str(&data).ok()?;
        if creds.is_expired() { None } else { Some(creds) }
    }

    pub fn store(&self, creds: &CachedCredentials) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let data = serde_json::to_string(creds)?;
        fs::write(self.path_for(&creds.profile), data)
    }
}
