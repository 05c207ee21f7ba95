use rand::SeedableRng;
use rand::rngs::StdRng;

/// Where a session's question sampling gets its randomness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sampling {
    /// Fresh OS-seeded randomness per session.
    #[default]
    Entropy,
    /// Reproducible draws, for tests and `--seed`.
    Seeded(u64),
}

impl Sampling {
    #[must_use]
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(Self::Entropy, Self::Seeded)
    }

    pub(crate) fn rng(self) -> StdRng {
        match self {
            Sampling::Entropy => StdRng::from_rng(&mut rand::rng()),
            Sampling::Seeded(seed) => StdRng::seed_from_u64(seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_sampling_is_reproducible() {
        let a: u64 = Sampling::Seeded(7).rng().random();
        let b: u64 = Sampling::Seeded(7).rng().random();
        assert_eq!(a, b);
    }

    #[test]
    fn from_seed_picks_variant() {
        assert_eq!(Sampling::from_seed(None), Sampling::Entropy);
        assert_eq!(Sampling::from_seed(Some(3)), Sampling::Seeded(3));
    }
}
