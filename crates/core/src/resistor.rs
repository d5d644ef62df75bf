//! Standard resistor values used when rounding a computed divider.

/// Stocked values from 1 kΩ to 1 MΩ, ascending.
pub const STANDARD_RESISTANCES: &[f64] = &[
    1e3, 1.1e3, 1.2e3, 1.3e3, 1.5e3, 1.6e3, 1.8e3, 2e3, 2.2e3, 2.4e3, 2.7e3, 3e3, //
    3.3e3, 3.6e3, 3.9e3, 4.3e3, 4.7e3, 5.1e3, 5.6e3, 6.2e3, 6.8e3, 7.5e3, 8.2e3, 9.1e3, 10e3, //
    11e3, 12e3, 13e3, 15e3, 16e3, 18e3, 20e3, 22e3, 24e3, 26e3, 27e3, //
    30e3, 33e3, 36e3, 39e3, 43e3, 47e3, 51e3, 56e3, 62e3, 68e3, 75e3, 82e3, 91e3, //
    100e3, 110e3, 120e3, 130e3, 150e3, 160e3, 180e3, 200e3, 220e3, 240e3, 270e3, //
    300e3, 330e3, 360e3, 390e3, 430e3, 470e3, 510e3, 560e3, 620e3, 680e3, 750e3, //
    820e3, 910e3, 1e6,
];

/// Nearest standard value by absolute difference. On a tie the smaller value
/// wins. Targets outside the table clamp to its ends.
pub fn closest_resistance(target: f64) -> f64 {
    let mut best = STANDARD_RESISTANCES[0];
    let mut best_distance = (best - target).abs();
    for &candidate in &STANDARD_RESISTANCES[1..] {
        let distance = (candidate - target).abs();
        if distance < best_distance {
            best = candidate;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ascending() {
        assert!(STANDARD_RESISTANCES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn snaps_divider_values() {
        assert_eq!(closest_resistance(304_017.0), 300e3);
        assert_eq!(closest_resistance(68_182.0), 68e3);
    }
}
