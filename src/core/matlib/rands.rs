use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Build the generator every stochastic step draws from.
///
/// `Some(seed)` gives a reproducible stream, `None` seeds from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Derive a child seed, so that sub-components seeded from one parent seed
/// do not share a stream.
pub fn child_seed(seed: Option<u64>, stream: u64) -> Option<u64> {
    seed.map(|s| s ^ (stream.wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Generate a uniform random number in [0, 1)
pub fn unifrand<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.r#gen::<f64>()
}

/// One inverted-dropout mask entry: 0 with probability `rate`,
/// otherwise `1 / (1 - rate)`.
pub fn dropout_keep<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> f64 {
    if rate <= 0.0 {
        return 1.0;
    }
    let keep = 1.0 - rate;
    if unifrand(rng) < keep { 1.0 / keep } else { 0.0 }
}

/// Random permutation of `0..n`
pub fn shuffled_indices<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unifrand() {
        let mut rng = seeded_rng(Some(1));
        for _ in 0..1000 {
            let u = unifrand(&mut rng);
            assert!(u >= 0.0 && u < 1.0);
        }
    }

    #[test]
    fn test_seeded_streams_repeat() {
        let a: Vec<f64> = {
            let mut rng = seeded_rng(Some(42));
            (0..5).map(|_| unifrand(&mut rng)).collect()
        };
        let b: Vec<f64> = {
            let mut rng = seeded_rng(Some(42));
            (0..5).map(|_| unifrand(&mut rng)).collect()
        };
        assert_eq!(a, b);
        assert_ne!(child_seed(Some(42), 0), child_seed(Some(42), 1));
        assert_eq!(child_seed(None, 3), None);
    }

    #[test]
    fn test_dropout_keep() {
        let mut rng = seeded_rng(Some(3));
        let mask: Vec<f64> = (0..10_000).map(|_| dropout_keep(&mut rng, 0.2)).collect();
        let dropped = mask.iter().filter(|&&m| m == 0.0).count();
        assert!(dropped > 1500 && dropped < 2500);
        for &m in &mask {
            assert!(m == 0.0 || (m - 1.25).abs() < 1e-12);
        }
        assert!((0..4).all(|_| dropout_keep(&mut rng, 0.0) == 1.0));
    }

    #[test]
    fn test_shuffled_indices_is_permutation() {
        let mut rng = seeded_rng(Some(4));
        let mut idx = shuffled_indices(&mut rng, 50);
        idx.sort_unstable();
        assert_eq!(idx, (0..50).collect::<Vec<_>>());
    }
}
