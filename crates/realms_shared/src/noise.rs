pub const DEFAULT_OCTAVES: u32 = 4;

const OCTAVE_SEED_STRIDE: u32 = 17;

fn fract(value: f64) -> f64 {
    let fractional = value - value.floor();
    // Tiny negative inputs round up to exactly 1.0.
    if fractional >= 1.0 {
        0.0
    } else {
        fractional
    }
}

pub fn hash2(x: f64, z: f64, seed: u32) -> f64 {
    fract((x * 127.1 + z * 311.7 + f64::from(seed) * 91.7).sin() * 43_758.545_312_3)
}

pub fn hash3(x: f64, y: f64, z: f64, seed: u32) -> f64 {
    fract(
        (x * 127.1 + y * 311.7 + z * 74.7 + f64::from(seed) * 151.3).sin() * 43_758.545_312_3,
    )
}

pub fn value_noise(x: f64, z: f64, seed: u32) -> f64 {
    let x0 = x.floor();
    let z0 = z.floor();
    let tx = x - x0;
    let tz = z - z0;

    let a = hash2(x0, z0, seed);
    let b = hash2(x0 + 1.0, z0, seed);
    let c = hash2(x0, z0 + 1.0, seed);
    let d = hash2(x0 + 1.0, z0 + 1.0, seed);

    let ux = tx * tx * (3.0 - 2.0 * tx);
    let uz = tz * tz * (3.0 - 2.0 * tz);

    let ab = a + (b - a) * ux;
    let cd = c + (d - c) * ux;
    ab + (cd - ab) * uz
}

/// Fractal sum of [`value_noise`] octaves, normalized by the total amplitude so
/// the result stays in `[0, 1)` for any octave count.
pub fn fbm(x: f64, z: f64, seed: u32, octaves: u32) -> f64 {
    let mut amplitude = 0.5;
    let mut frequency = 1.0;
    let mut total = 0.0;
    let mut norm = 0.0;

    for octave in 0..octaves {
        let octave_seed = seed.wrapping_add(octave.wrapping_mul(OCTAVE_SEED_STRIDE));
        total += value_noise(x * frequency, z * frequency, octave_seed) * amplitude;
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    if norm > 0.0 {
        total / norm
    } else {
        0.0
    }
}
