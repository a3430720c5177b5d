//! Deterministic smooth noise for organic idle motion.
//!
//! Everything here is a pure function of its inputs, so two avatars with the
//! same seed move identically and nothing needs to be stored between frames.

/// Noise level above which [`impulse`] treats a quantum as a spike.
pub const IMPULSE_THRESHOLD: f64 = 0.8;

/// Pseudo-random value in `[0, 1)` for an integer lattice point.
pub fn hash(n: f64, seed: i32) -> f64 {
    let v = ((n + seed as f64).sin() * 43758.5453).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if v >= 1.0 {
        0.0
    } else {
        v
    }
}

/// 1-D value noise in `[0, 1)`, smoothstep-blended between lattice points.
pub fn noise1d(x: f64, seed: i32) -> f64 {
    let lo = x.floor();
    let hi = x.ceil();
    let t = x - lo;
    let weight = t * t * (3.0 - 2.0 * t);
    let a = hash(lo, seed);
    let b = hash(hi, seed);
    a + (b - a) * weight
}

/// Sum of `octaves` noise layers at doubling frequency, each weighted by
/// `persistence` relative to the previous one, normalised back to `[0, 1)`.
pub fn fractal_noise(x: f64, seed: i32, octaves: u32, persistence: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut norm = 0.0;
    for octave in 0..octaves.max(1) {
        total += noise1d(x * frequency, seed.wrapping_add(octave as i32)) * amplitude;
        norm += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }
    if norm > 0.0 {
        total / norm
    } else {
        0.0
    }
}

/// Occasional decaying spike. Each unit interval of `t` is one quantum; when
/// the noise at the quantum's start crosses [`IMPULSE_THRESHOLD`], the result
/// decays exponentially from that point, otherwise it is 0.
pub fn impulse(t: f64, seed: i32, decay: f64) -> f64 {
    let spike_at = t.floor();
    if noise1d(spike_at, seed) > IMPULSE_THRESHOLD {
        (-(t - spike_at) * decay * 10.0).exp()
    } else {
        0.0
    }
}
