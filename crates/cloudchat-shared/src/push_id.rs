//! Chronologically sortable child keys.
//!
//! A push id is 20 characters: 8 characters encoding the creation time in
//! milliseconds, then 12 random characters. The alphabet is in ASCII order,
//! so comparing ids as strings compares creation times. Two ids generated in
//! the same millisecond reuse the previous random suffix incremented by one,
//! which keeps ids from a single generator strictly increasing.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::Rng;

use crate::constants::{PUSH_CHARS, PUSH_ID_LEN};
use crate::types::MessageId;

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = PUSH_ID_LEN - TIME_CHARS;

#[derive(Debug, Default)]
struct PushState {
    last_ms: i64,
    last_random: [u8; RANDOM_CHARS],
}

/// Generates push ids. Share one generator per backend.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<PushState>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> MessageId {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Generate an id for the given wall-clock time. A clock that steps
    /// backwards is clamped to the last time seen.
    pub fn next_id_at(&self, now_ms: i64) -> MessageId {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let now = now_ms.max(state.last_ms);
        if now == state.last_ms && state.last_ms != 0 {
            increment(&mut state.last_random);
        } else {
            let mut rng = rand::thread_rng();
            for slot in state.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }
        state.last_ms = now;

        let mut id = [0u8; PUSH_ID_LEN];
        let mut remaining = now.max(0) as u64;
        for slot in id[..TIME_CHARS].iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        for (slot, digit) in id[TIME_CHARS..].iter_mut().zip(state.last_random.iter()) {
            *slot = PUSH_CHARS[*digit as usize];
        }

        // Every byte comes from PUSH_CHARS, which is ASCII.
        MessageId(id.iter().map(|b| *b as char).collect())
    }
}

fn increment(digits: &mut [u8; RANDOM_CHARS]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
