//! # Simplex Noise
//!
//! Deterministic 2D simplex noise used by the noise-terrain manipulators.
//!
//! Samples are always taken at world-absolute coordinates, so two flats
//! generated with the same seed line up seamlessly along their shared edge.

/// Permutation and gradient tables derived from a seed.
struct PermutationTable {
    /// 256 entries, doubled to avoid index wrapping.
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient directions for 2D simplex.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    fn new(seed: u64) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; zero would lock the generator.
        let mut state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);
        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index & 511])
    }

    #[inline]
    fn gradient(hash: usize) -> [i8; 2] {
        Self::GRADIENTS[hash % 12]
    }
}

/// 2D simplex noise generator producing values in `[-1, 1]`.
pub struct SimplexNoise {
    table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor: (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_438_6;
    /// Unskewing factor: (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187_1;

    /// Creates a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            table: PermutationTable::new(seed),
        }
    }

    /// Samples noise at a point.
    #[must_use]
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let skew = (x + z) * Self::F2;
        let i = (x + skew).floor() as i64;
        let j = (z + skew).floor() as i64;

        let unskew = (i + j) as f64 * Self::G2;
        let x0 = x - (i as f64 - unskew);
        let z0 = z - (j as f64 - unskew);

        let (i1, j1) = if x0 > z0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let z1 = z0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let z2 = z0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;

        let g0 = self.table.get(ii + self.table.get(jj));
        let g1 = self.table.get(ii + i1 + self.table.get(jj + j1));
        let g2 = self.table.get(ii + 1 + self.table.get(jj + 1));

        70.0 * (Self::corner(x0, z0, g0) + Self::corner(x1, z1, g1) + Self::corner(x2, z2, g2))
    }

    #[inline]
    fn corner(x: f64, z: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - z * z;
        if t < 0.0 {
            return 0.0;
        }
        let grad = PermutationTable::gradient(hash);
        let t2 = t * t;
        t2 * t2 * (x * f64::from(grad[0]) + z * f64::from(grad[1]))
    }

    /// Fractal noise with geometric frequency/amplitude progression,
    /// normalized back to roughly `[-1, 1]`.
    #[must_use]
    pub fn octaved(&self, x: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        }
    }

    /// Sum of octaves given as explicit `(scale, weight)` pairs.
    ///
    /// `scale` is the feature size in blocks; the result lies within
    /// `[-Σweight, Σweight]`.
    #[must_use]
    pub fn weighted_octaves(&self, x: f64, z: f64, octaves: &[(f64, f64)]) -> f64 {
        octaves
            .iter()
            .filter(|(scale, _)| *scale > 0.0)
            .map(|(scale, weight)| self.sample(x / scale, z / scale) * weight)
            .sum()
    }
}
