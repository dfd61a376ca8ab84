use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sha3::{Digest, Keccak256};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::{PollJob, PowProtectionMessage};
use crate::chains::PowApi;
use crate::constants::{POW_MAX_DIFFICULTY, POW_SOLVE_TIMEOUT_SECS, TRANSIENT_BACKOFF_MAX_SECS};
use crate::error::{Result, SyncError};
use crate::models::{
    ChallengeCompletion, PowProtectionState, PowProtectionStatus,
};

/// Nonces checked between deadline looks in the solve loop.
const SOLVE_BATCH_SIZE: u64 = 4096;

fn leading_zero_bits(digest: &[u8]) -> u32 {
    let mut bits = 0;
    for byte in digest {
        if *byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// Whether `nonce` solves the challenge at the given difficulty.
pub fn meets_difficulty(seed: &str, nonce: u64, difficulty: u32) -> bool {
    let mut hasher = Keccak256::new();
    hasher.update(seed.as_bytes());
    hasher.update(nonce.to_le_bytes());
    leading_zero_bits(&hasher.finalize()) >= difficulty
}

/// Search the nonce space until a solution is found or `deadline` passes.
///
/// Starts from a random nonce so repeated challenges with the same seed do
/// not retread the same prefix of the space.
pub fn solve_challenge(seed: &str, difficulty: u32, deadline: Instant) -> Option<u64> {
    if difficulty == 0 {
        return Some(0);
    }
    let mut nonce: u64 = rand::random();
    loop {
        for _ in 0..SOLVE_BATCH_SIZE {
            if meets_difficulty(seed, nonce, difficulty) {
                return Some(nonce);
            }
            nonce = nonce.wrapping_add(1);
        }
        if Instant::now() >= deadline {
            return None;
        }
    }
}

/// Exponential backoff after consecutive challenge failures, capped so a
/// flaky gateway cannot push retries out indefinitely.
fn failure_backoff(base: Duration, failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(5);
    let multiplier = 1_u64 << exponent;
    let secs = base
        .as_secs()
        .max(1)
        .saturating_mul(multiplier)
        .min(TRANSIENT_BACKOFF_MAX_SECS);
    Duration::from_secs(secs)
}

/// Drives the allowance cycle:
/// `Idle → RequestChallenge → Solve → Grant → Allowed`, then a cooldown of
/// `next_allowance_ms` before the next cycle.
///
/// Failure anywhere in the cycle reports an error message, returns the
/// gate to `Idle` and schedules a retry on capped exponential backoff, so
/// the gate never deadlocks.
pub struct PowWorker<A> {
    api: A,
    out: mpsc::Sender<PowProtectionMessage>,
    state: PowProtectionState,
    base_interval: Duration,
    failures: u32,
    retry_at: Option<Instant>,
}

impl<A: PowApi> PowWorker<A> {
    pub fn new(api: A, base_interval: Duration, out: mpsc::Sender<PowProtectionMessage>) -> Self {
        Self {
            api,
            out,
            state: PowProtectionState::default(),
            base_interval,
            failures: 0,
            retry_at: None,
        }
    }

    async fn report(&mut self, status: PowProtectionStatus) {
        self.state.status = status;
        let _ = self
            .out
            .send(PowProtectionMessage::Sync(self.state.clone()))
            .await;
    }

    async fn run_cycle(&mut self) -> Result<()> {
        self.report(PowProtectionStatus::RequestingChallenge).await;
        let challenge = self.api.create_challenge().await?;
        if challenge.difficulty > POW_MAX_DIFFICULTY {
            return Err(SyncError::ChallengeFailed(format!(
                "Difficulty {} above client maximum {POW_MAX_DIFFICULTY}",
                challenge.difficulty
            )));
        }

        self.report(PowProtectionStatus::Solving).await;
        let solve_started = Instant::now();
        let deadline = match challenge.expires_at {
            Some(expiry) => {
                let remaining = (expiry - Utc::now()).to_std().map_err(|_| {
                    SyncError::ChallengeFailed(
                        "Challenge already expired when issued".to_string(),
                    )
                })?;
                Instant::now() + remaining
            }
            None => Instant::now() + Duration::from_secs(POW_SOLVE_TIMEOUT_SECS),
        };

        let seed = challenge.seed.clone();
        let difficulty = challenge.difficulty;
        let nonce = tokio::task::spawn_blocking(move || solve_challenge(&seed, difficulty, deadline))
            .await
            .map_err(|e| SyncError::Internal(format!("Solver task failed: {e}")))?
            .ok_or_else(|| {
                SyncError::ChallengeFailed("Challenge expired before a solution was found".into())
            })?;
        let solved_duration = solve_started.elapsed();

        self.report(PowProtectionStatus::Granting).await;
        let grant = self.api.allow_signing(&challenge.seed, nonce).await?;

        self.state.completion = Some(ChallengeCompletion {
            solved_duration_ms: solved_duration.as_millis() as u64,
            next_allowance_ms: grant.next_allowance_ms,
            next_difficulty: grant.next_difficulty,
            current_difficulty: challenge.difficulty,
        });
        self.state.allowed_cycles = grant.allowed_cycles;
        self.state.allowed_until =
            Some(Utc::now() + ChronoDuration::milliseconds(grant.next_allowance_ms as i64));
        self.report(PowProtectionStatus::Allowed).await;
        Ok(())
    }
}

#[async_trait]
impl<A: PowApi + Send + 'static> PollJob for PowWorker<A> {
    fn name(&self) -> &'static str {
        "pow-protection"
    }

    async fn tick(&mut self) {
        if self.retry_at.is_some_and(|at| Instant::now() < at) {
            return;
        }
        if self.state.is_allowed_at(Utc::now()) {
            return;
        }

        match self.run_cycle().await {
            Ok(()) => {
                self.failures = 0;
                self.retry_at = None;
                self.state.last_error = None;
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                let backoff = failure_backoff(self.base_interval, self.failures);
                self.retry_at = Some(Instant::now() + backoff);
                tracing::warn!(
                    failures = self.failures,
                    backoff_secs = backoff.as_secs(),
                    "PoW cycle failed: {err}"
                );

                self.state.allowed_cycles = 0;
                self.state.allowed_until = None;
                self.state.last_error = Some(err.to_string());
                self.report(PowProtectionStatus::Idle).await;
                let _ = self
                    .out
                    .send(PowProtectionMessage::Error(err.to_string()))
                    .await;
            }
        }
    }
}
