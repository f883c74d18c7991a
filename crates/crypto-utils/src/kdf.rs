use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::random::try_random_bytes_fixed;

/// Argon2id cost parameters.
///
/// Stored next to every sealed record so a record stays openable after the
/// defaults change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Number of passes.
    pub t_cost: u32,
    /// Degree of parallelism.
    pub p_cost: u32,
}

impl KdfParams {
    /// Cheapest parameters argon2 accepts. Only suitable for tests.
    pub const MINIMAL: KdfParams = KdfParams {
        m_cost: 8,
        t_cost: 1,
        p_cost: 1,
    };

    /// Upper bounds accepted from a stored record: 4 GiB, 64 passes, 16 lanes.
    pub const MAX: KdfParams = KdfParams {
        m_cost: 4 * 1024 * 1024,
        t_cost: 64,
        p_cost: 16,
    };

    /// Rejects parameters argon2 would refuse or that exceed [`KdfParams::MAX`].
    pub fn check_bounds(&self) -> Result<(), CryptoError> {
        let max = Self::MAX;
        if self.p_cost == 0 || self.p_cost > max.p_cost {
            return Err(CryptoError::InvalidInput(format!(
                "argon2 parallelism {} outside 1..={}",
                self.p_cost, max.p_cost
            )));
        }
        if self.t_cost == 0 || self.t_cost > max.t_cost {
            return Err(CryptoError::InvalidInput(format!(
                "argon2 passes {} outside 1..={}",
                self.t_cost, max.t_cost
            )));
        }
        let min_m = 8 * self.p_cost;
        if self.m_cost < min_m || self.m_cost > max.m_cost {
            return Err(CryptoError::InvalidInput(format!(
                "argon2 memory {} KiB outside {min_m}..={}",
                self.m_cost, max.m_cost
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 4 lanes.
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

/// Derives a 32-byte AES-256 key from `password` and `salt` using Argon2id v1.3.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; 16],
    params: &KdfParams,
) -> Result<[u8; 32], CryptoError> {
    let argon_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| CryptoError::KdfFailed(format!("invalid argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password, salt, &mut output)
        .map_err(|e| CryptoError::KdfFailed(format!("argon2 hash failed: {e}")))?;

    Ok(output)
}

/// Generates a random 16-byte salt.
pub fn generate_salt() -> Result<[u8; 16], CryptoError> {
    try_random_bytes_fixed::<16>()
}
