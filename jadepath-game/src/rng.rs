//! Deterministic RNG streams segregated by simulation domain.
//!
//! Every stream derives from one user-visible seed via HMAC-SHA256 domain
//! separation, so trial generation, resolution rolls, and vitality rolls
//! never perturb one another's sequences.

use hmac::{Hmac, Mac};
use rand_chacha::ChaCha20Rng;
use rand::SeedableRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by resolution domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    trial: RefCell<CountingRng<ChaCha20Rng>>,
    resolve: RefCell<CountingRng<ChaCha20Rng>>,
    vitality: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let trial = CountingRng::new(derive_stream_seed(seed, b"trial"));
        let resolve = CountingRng::new(derive_stream_seed(seed, b"resolve"));
        let vitality = CountingRng::new(derive_stream_seed(seed, b"vitality"));
        Self {
            trial: RefCell::new(trial),
            resolve: RefCell::new(resolve),
            vitality: RefCell::new(vitality),
        }
    }

    /// Access the trial-generation RNG stream.
    #[must_use]
    pub fn trial(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.trial.borrow_mut()
    }

    /// Access the resolution-roll RNG stream.
    #[must_use]
    pub fn resolve(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.resolve.borrow_mut()
    }

    /// Access the vitality (HP-loss) RNG stream.
    #[must_use]
    pub fn vitality(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.vitality.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
