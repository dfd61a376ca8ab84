use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-issued computational challenge. The solution is a nonce whose
/// Keccak-256 digest over `seed || nonce_le` has at least `difficulty`
/// leading zero bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowChallenge {
    pub seed: String,
    pub difficulty: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of one solved challenge, as reported by the gateway grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeCompletion {
    pub solved_duration_ms: u64,
    pub next_allowance_ms: u64,
    pub next_difficulty: u32,
    pub current_difficulty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowSigningGrant {
    pub allowed_cycles: u128,
    pub next_allowance_ms: u64,
    pub next_difficulty: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowProtectionStatus {
    Idle,
    RequestingChallenge,
    Solving,
    Granting,
    Allowed,
}

/// Mirror of the worker-reported gate state; mutated only by PoW worker
/// messages, read by the signing path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowProtectionState {
    pub status: PowProtectionStatus,
    pub completion: Option<ChallengeCompletion>,
    pub allowed_cycles: u128,
    pub allowed_until: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Default for PowProtectionState {
    fn default() -> Self {
        Self {
            status: PowProtectionStatus::Idle,
            completion: None,
            allowed_cycles: 0,
            allowed_until: None,
            last_error: None,
        }
    }
}

impl PowProtectionState {
    /// Whether a sign request may proceed right now.
    pub fn is_allowed_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PowProtectionStatus::Allowed
            && self.allowed_until.is_some_and(|until| until > now)
    }
}
