// ============================
// backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Every credential record carries its own random salt and the tag of the
//! algorithm that produced its hash, so the default algorithm can change
//! without re-hashing existing records.
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, TryRngCore};
use scrypt::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

/// Default salt size in bytes
pub const DEFAULT_SALT_BYTES: usize = 16;

/// Accepted bcrypt cost range
pub const BCRYPT_MIN_COST: u32 = 4;
pub const BCRYPT_MAX_COST: u32 = 31;

/// bcrypt only reads this many bytes of its input
pub const BCRYPT_MAX_INPUT_BYTES: usize = 72;

/// Errors raised by the hasher
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// Salted input would be silently truncated by bcrypt
    #[error("password is too long (at most {max} bytes)")]
    TooLong { max: usize },

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Algorithm tag stored next to every hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Bcrypt,
    Scrypt,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Bcrypt => "bcrypt",
            HashAlgorithm::Scrypt => "scrypt",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(HashAlgorithm::Bcrypt),
            "scrypt" => Ok(HashAlgorithm::Scrypt),
            other => Err(PasswordError::Hashing(format!("unknown hash algorithm `{other}`"))),
        }
    }
}

/// Output of [`PasswordHasher::hash`]
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub hash: String,
    pub algorithm: HashAlgorithm,
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordDigest")
            .field("hash", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Fill `n` bytes from the OS entropy source and encode them as base64
pub fn generate_salt(n: usize) -> Result<String, PasswordError> {
    let mut buffer = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut buffer)
        .map_err(|e| PasswordError::RandomSource(e.to_string()))?;
    Ok(STANDARD.encode(buffer))
}

/// Salted, slow, one-way password hashing
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    algorithm: HashAlgorithm,
    bcrypt_cost: u32,
    scrypt_log_n: u8,
}

impl PasswordHasher {
    /// Create a hasher producing `algorithm` hashes.
    ///
    /// Verification accepts every supported algorithm regardless of this choice.
    pub fn new(algorithm: HashAlgorithm, bcrypt_cost: u32, scrypt_log_n: u8) -> Result<Self, PasswordError> {
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&bcrypt_cost) {
            return Err(PasswordError::Hashing(format!("bcrypt cost {bcrypt_cost} out of range")));
        }
        let hasher = Self {
            algorithm,
            bcrypt_cost,
            scrypt_log_n,
        };
        hasher.scrypt_params()?;
        Ok(hasher)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn scrypt_params(&self) -> Result<Params, PasswordError> {
        Params::new(self.scrypt_log_n, 8, 1, 32).map_err(|e| PasswordError::Hashing(e.to_string()))
    }

    /// Longest password accepted next to `salt`, if the algorithm has a limit
    pub fn max_password_len(&self, salt: &str) -> Option<usize> {
        match self.algorithm {
            HashAlgorithm::Bcrypt => Some(BCRYPT_MAX_INPUT_BYTES.saturating_sub(salt.len())),
            HashAlgorithm::Scrypt => None,
        }
    }

    /// Hash `password‖salt` with the configured algorithm.
    ///
    /// bcrypt inputs longer than [`BCRYPT_MAX_INPUT_BYTES`] are rejected, never truncated.
    pub fn hash(&self, password: &str, salt: &str) -> Result<PasswordDigest, PasswordError> {
        if let Some(max) = self.max_password_len(salt) {
            if password.len() > max {
                return Err(PasswordError::TooLong { max });
            }
        }

        let mut combined = format!("{password}{salt}");
        let result = match self.algorithm {
            HashAlgorithm::Bcrypt => bcrypt::hash(combined.as_bytes(), self.bcrypt_cost)
                .map_err(|e| PasswordError::Hashing(e.to_string())),
            HashAlgorithm::Scrypt => self.scrypt_hash(combined.as_bytes()),
        };
        combined.zeroize();

        Ok(PasswordDigest {
            hash: result?,
            algorithm: self.algorithm,
        })
    }

    fn scrypt_hash(&self, input: &[u8]) -> Result<String, PasswordError> {
        let mut raw = [0u8; DEFAULT_SALT_BYTES];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| PasswordError::RandomSource(e.to_string()))?;
        let phc_salt = SaltString::encode_b64(&raw).map_err(|e| PasswordError::Hashing(e.to_string()))?;

        let hash = Scrypt
            .hash_password_customized(input, None, None, self.scrypt_params()?, &phc_salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Recompute and compare; any malformed input simply fails verification
    pub fn verify(&self, hash: &str, algorithm: HashAlgorithm, salt: &str, candidate: &str) -> bool {
        let mut combined = format!("{candidate}{salt}");
        let ok = match algorithm {
            // Anything longer could only match through truncation
            HashAlgorithm::Bcrypt if combined.len() > BCRYPT_MAX_INPUT_BYTES => false,
            HashAlgorithm::Bcrypt => bcrypt::verify(combined.as_bytes(), hash).unwrap_or(false),
            HashAlgorithm::Scrypt => match PasswordHash::new(hash) {
                Ok(parsed) => Scrypt.verify_password(combined.as_bytes(), &parsed).is_ok(),
                Err(_) => false,
            },
        };
        combined.zeroize();
        ok
    }

    /// [`Self::hash`] on the blocking pool
    pub async fn hash_blocking(&self, password: String, salt: String) -> Result<PasswordDigest, PasswordError> {
        let hasher = self.clone();
        let mut password = password;
        tokio::task::spawn_blocking(move || {
            let digest = hasher.hash(&password, &salt);
            password.zeroize();
            digest
        })
        .await
        .map_err(|e| PasswordError::Hashing(e.to_string()))?
    }

    /// [`Self::verify`] on the blocking pool
    pub async fn verify_blocking(
        &self,
        hash: String,
        algorithm: HashAlgorithm,
        salt: String,
        candidate: String,
    ) -> bool {
        let hasher = self.clone();
        let mut candidate = candidate;
        tokio::task::spawn_blocking(move || {
            let ok = hasher.verify(&hash, algorithm, &salt, &candidate);
            candidate.zeroize();
            ok
        })
        .await
        .unwrap_or(false)
    }
}
