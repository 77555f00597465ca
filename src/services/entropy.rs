use std::sync::atomic::{AtomicU64, Ordering};

use uuid::{Builder, Uuid};

/// Source of the random bits used for ids and coordinate jitter.
pub trait Entropy: Send + Sync + std::fmt::Debug {
    fn next_u64(&self) -> u64;

    /// Uniform sample in `[0, 1)`.
    fn next_unit(&self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Symmetric offset in `[-spread / 2, spread / 2)`.
    fn jitter(&self, spread: f64) -> f64 {
        (self.next_unit() - 0.5) * spread
    }

    /// Fresh v4-shaped UUID string.
    fn token(&self) -> String {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.next_u64().to_le_bytes());
        bytes[8..].copy_from_slice(&self.next_u64().to_le_bytes());
        Builder::from_random_bytes(bytes).into_uuid().to_string()
    }
}

/// Operating-system randomness via `uuid`'s v4 generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEntropy;

impl Entropy for SystemEntropy {
    fn next_u64(&self) -> u64 {
        let value = Uuid::new_v4().as_u128();
        (value as u64) ^ ((value >> 64) as u64)
    }

    fn token(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Reproducible SplitMix64 stream for tests and offline fixtures.
#[derive(Debug)]
pub struct SeededEntropy {
    state: AtomicU64,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            state: AtomicU64::new(seed),
        }
    }
}

impl Entropy for SeededEntropy {
    fn next_u64(&self) -> u64 {
        let mut z = self
            .state
            .fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed)
            .wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}
