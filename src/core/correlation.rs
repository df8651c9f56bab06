//! Generator correlation id: 9 karakter alphanumeric acak.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::protocol::{CorrelationId, CORRELATION_ID_LEN};

pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministik, untuk test
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Id baru yang belum dipakai call lain yang masih aktif
    pub fn fresh(&mut self, in_use: impl Fn(&CorrelationId) -> bool) -> CorrelationId {
        loop {
            let id = self.next_id();
            if !in_use(&id) {
                return id;
            }
        }
    }

    fn next_id(&mut self) -> CorrelationId {
        let mut raw = [0u8; CORRELATION_ID_LEN];
        for b in raw.iter_mut() {
            *b = self.rng.sample(Alphanumeric);
        }
        CorrelationId::from_alphanumeric(raw)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
