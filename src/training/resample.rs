//! Class-balancing by random undersampling.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Positions to keep so every present class has the minority count.
///
/// Returned positions are sorted. Classes without members are ignored.
pub fn undersample(labels: &[usize], n_classes: usize, seed: u64) -> Vec<usize> {
    let mut by_class = vec![Vec::new(); n_classes];
    for (position, &label) in labels.iter().enumerate() {
        if let Some(bucket) = by_class.get_mut(label) {
            bucket.push(position);
        }
    }

    let Some(minority) = by_class.iter().map(Vec::len).filter(|&n| n > 0).min() else {
        return Vec::new();
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut kept = Vec::with_capacity(minority * n_classes);
    for mut positions in by_class {
        if positions.len() > minority {
            positions.shuffle(&mut rng);
            positions.truncate(minority);
        }
        kept.extend(positions);
    }
    kept.sort_unstable();
    kept
}
