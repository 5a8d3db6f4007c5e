use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Display names handed out to forum authors.
pub const ANONYMOUS_NAMES: [&str; 15] = [
    "Gentle Cloud",
    "Quiet River",
    "Soft Moon",
    "Warm Breeze",
    "Bright Star",
    "Calm Wave",
    "Kind Heart",
    "Peaceful Mind",
    "Brave Soul",
    "Hopeful Light",
    "Silent Storm",
    "Tender Leaf",
    "Wise Owl",
    "Swift Fox",
    "Steady Mountain",
];

/// Picks anonymous names uniformly from [`ANONYMOUS_NAMES`].
pub struct AnonymousNamer {
    rng: Mutex<StdRng>,
}

impl Default for AnonymousNamer {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl AnonymousNamer {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn next_name(&self) -> &'static str {
        let index = self.rng.lock().random_range(0..ANONYMOUS_NAMES.len());
        ANONYMOUS_NAMES[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_namers_agree() {
        let a = AnonymousNamer::seeded(42);
        let b = AnonymousNamer::seeded(42);
        let first: Vec<_> = (0..20).map(|_| a.next_name()).collect();
        let second: Vec<_> = (0..20).map(|_| b.next_name()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_names_come_from_pool() {
        let namer = AnonymousNamer::from_entropy();
        for _ in 0..100 {
            assert!(ANONYMOUS_NAMES.contains(&namer.next_name()));
        }
    }

    #[test]
    fn test_pool_covered_eventually() {
        let namer = AnonymousNamer::seeded(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            seen.insert(namer.next_name());
        }
        assert_eq!(seen.len(), ANONYMOUS_NAMES.len());
    }
}
