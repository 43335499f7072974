//! Walker's alias method over a fixed weight table.

use super::Xoshiro256;

/// Draws indexes with probability proportional to their weight in O(1).
#[derive(Clone, Debug)]
pub(crate) struct WeightedSampler {
    probs: Vec<f64>,
    aliases: Vec<usize>,
}

impl WeightedSampler {
    /// `weights` must be non-empty with a positive sum.
    pub(crate) fn new(weights: &[f64]) -> Self {
        let count = weights.len();
        let sum: f64 = weights.iter().sum();
        let mut probs: Vec<f64> = weights.iter().map(|w| w * count as f64 / sum).collect();
        let mut aliases = vec![0; count];

        let mut small = Vec::with_capacity(count);
        let mut large = Vec::with_capacity(count);
        for j in (0..count).rev() {
            if probs[j] < 1.0 {
                small.push(j);
            } else {
                large.push(j);
            }
        }

        while let (Some(&a), Some(&g)) = (small.last(), large.last()) {
            small.pop();
            large.pop();
            aliases[a] = g;
            probs[g] += probs[a] - 1.0;
            if probs[g] < 1.0 {
                small.push(g);
            } else {
                large.push(g);
            }
        }
        for i in large.into_iter().chain(small) {
            probs[i] = 1.0;
        }

        Self { probs, aliases }
    }

    pub(crate) fn next(&self, rng: &mut Xoshiro256) -> usize {
        let r1 = rng.next_double();
        let r2 = rng.next_double();
        let i = (self.probs.len() as f64 * r1) as usize;
        if r2 < self.probs[i] {
            i
        } else {
            self.aliases[i]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_follows_weights() {
        let sampler = WeightedSampler::new(&[1.0, 2.0, 4.0, 8.0]);
        let mut rng = Xoshiro256::from_seed_bytes(b"Wolf");
        let mut counts = [0usize; 4];
        for _ in 0..30_000 {
            counts[sampler.next(&mut rng)] += 1;
        }
        // expected 2000, 4000, 8000, 16000
        assert!((1700..2300).contains(&counts[0]), "{:?}", counts);
        assert!((3600..4400).contains(&counts[1]), "{:?}", counts);
        assert!((7400..8600).contains(&counts[2]), "{:?}", counts);
        assert!((15000..17000).contains(&counts[3]), "{:?}", counts);
    }

    #[test]
    fn test_single_weight() {
        let sampler = WeightedSampler::new(&[0.5]);
        let mut rng = Xoshiro256::from_seed_bytes(b"one");
        for _ in 0..10 {
            assert_eq!(sampler.next(&mut rng), 0);
        }
    }
}
