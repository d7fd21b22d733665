//! # Painter
//!
//! Drawing primitives over a flat. Shapes only decide *which* columns are
//! touched; *what* a touched column becomes is delegated to two pluggable
//! combinators:
//!
//! - a [`LevelPainter`] turns `(current, proposed)` into the committed level
//! - a [`ColumnPainter`] picks the committed material
//!
//! so one line routine serves "set", "raise-only", "lower-only", "additive"
//! and jittered painting alike.
//!
//! All writes go through the flat's protection check and are clipped to the
//! painter's region.

use std::collections::HashSet;
use std::f64::consts::TAU;

use flatland_core::material::{self, MaterialId};
use flatland_core::Flat;

use crate::random::TerrainRng;
use crate::region::Region;

/// Combines a proposed level with the current raster value.
pub trait LevelPainter {
    /// Returns the level to commit at `(x, z)`.
    fn paint(&mut self, flat: &Flat, x: usize, z: usize, level: i32) -> u8;
}

/// Picks the material to commit at a column after its level was written.
pub trait ColumnPainter {
    /// Returns the material to commit at `(x, z)`.
    fn paint(&mut self, flat: &Flat, x: usize, z: usize) -> MaterialId;
}

#[inline]
fn clamp_level(level: i32) -> u8 {
    level.clamp(0, 255) as u8
}

/// Built-in deterministic level combinators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelMode {
    /// Replace the level.
    #[default]
    Set,
    /// Add the proposed value to the current level.
    Additive,
    /// Keep the higher of current and proposed (raise-only).
    Higher,
    /// Keep the lower of current and proposed (lower-only).
    Lower,
}

impl LevelPainter for LevelMode {
    fn paint(&mut self, flat: &Flat, x: usize, z: usize, level: i32) -> u8 {
        let current = i32::from(flat.level(x, z));
        clamp_level(match self {
            Self::Set => level,
            Self::Additive => current + level,
            Self::Higher => current.max(level),
            Self::Lower => current.min(level),
        })
    }
}

/// Sets the proposed level plus a uniform offset in `[-spread, spread]`.
pub struct Jitter {
    rng: TerrainRng,
    spread: i32,
}

impl Jitter {
    /// Creates a uniform jitter painter.
    #[must_use]
    pub fn new(rng: TerrainRng, spread: i32) -> Self {
        Self {
            rng,
            spread: spread.abs(),
        }
    }
}

impl LevelPainter for Jitter {
    fn paint(&mut self, _flat: &Flat, _x: usize, _z: usize, level: i32) -> u8 {
        clamp_level(level + self.rng.range(-self.spread, self.spread))
    }
}

/// Sets the proposed level plus a bell-shaped offset in `[-spread, spread]`:
/// the rounded mean of three uniform draws.
pub struct GaussianJitter {
    rng: TerrainRng,
    spread: i32,
}

impl GaussianJitter {
    /// Creates a bell-shaped jitter painter.
    #[must_use]
    pub fn new(rng: TerrainRng, spread: i32) -> Self {
        Self {
            rng,
            spread: spread.abs(),
        }
    }
}

impl LevelPainter for GaussianJitter {
    fn paint(&mut self, _flat: &Flat, _x: usize, _z: usize, level: i32) -> u8 {
        if self.spread == 0 {
            return clamp_level(level);
        }
        let spread = self.spread;
        let sum: i32 = (0..3).map(|_| self.rng.range(-spread, spread)).sum();
        let offset = (f64::from(sum) / 3.0).round() as i32;
        clamp_level(level + offset)
    }
}

/// Built-in material combinators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnMode {
    /// Leave the material as it is.
    #[default]
    Keep,
    /// Always write this material.
    Set(MaterialId),
    /// Sand at or below the ocean level, grass above.
    ByOcean,
}

impl ColumnPainter for ColumnMode {
    fn paint(&mut self, flat: &Flat, x: usize, z: usize) -> MaterialId {
        match *self {
            Self::Keep => flat.column(x, z),
            Self::Set(id) => id,
            Self::ByOcean => {
                if flat.level(x, z) <= flat.ocean_level {
                    material::SAND
                } else {
                    material::GRASS
                }
            }
        }
    }
}

/// Drawing context bound to one flat and one clip region.
pub struct Painter<'a> {
    flat: &'a mut Flat,
    clip: Region,
    level: Box<dyn LevelPainter + 'a>,
    column: Box<dyn ColumnPainter + 'a>,
    touched: usize,
}

impl<'a> Painter<'a> {
    /// Painter with [`LevelMode::Set`] and [`ColumnMode::Keep`].
    #[must_use]
    pub fn new(flat: &'a mut Flat, clip: Region) -> Self {
        Self {
            flat,
            clip,
            level: Box::new(LevelMode::Set),
            column: Box::new(ColumnMode::Keep),
            touched: 0,
        }
    }

    /// Replaces the level combinator, builder style.
    #[must_use]
    pub fn with_level(mut self, painter: impl LevelPainter + 'a) -> Self {
        self.level = Box::new(painter);
        self
    }

    /// Replaces the material combinator, builder style.
    #[must_use]
    pub fn with_column(mut self, painter: impl ColumnPainter + 'a) -> Self {
        self.column = Box::new(painter);
        self
    }

    /// Replaces the level combinator.
    pub fn set_level_painter(&mut self, painter: impl LevelPainter + 'a) {
        self.level = Box::new(painter);
    }

    /// Replaces the material combinator.
    pub fn set_column_painter(&mut self, painter: impl ColumnPainter + 'a) {
        self.column = Box::new(painter);
    }

    /// Read access to the flat being painted.
    #[must_use]
    pub fn flat(&self) -> &Flat {
        self.flat
    }

    /// Clip region.
    #[must_use]
    pub fn clip(&self) -> Region {
        self.clip
    }

    /// Number of successful single-column writes so far.
    #[must_use]
    pub fn touched(&self) -> usize {
        self.touched
    }

    /// Current level at a clipped point.
    #[must_use]
    pub fn level_at(&self, x: i32, z: i32) -> Option<u8> {
        self.writable(x, z).then(|| self.flat.level(x as usize, z as usize))
    }

    #[inline]
    fn writable(&self, x: i32, z: i32) -> bool {
        self.clip.contains(x, z) && self.flat.contains(x, z)
    }

    /// Paints one column. Returns false if clipped or protected.
    pub fn paint(&mut self, x: i32, z: i32, level: i32) -> bool {
        if !self.writable(x, z) {
            return false;
        }
        let (ux, uz) = (x as usize, z as usize);
        if self.flat.is_protected(ux, uz) {
            return false;
        }
        let committed = self.level.paint(self.flat, ux, uz, level);
        self.flat.set_level(ux, uz, committed);
        let material = self.column.paint(self.flat, ux, uz);
        self.flat.set_column(ux, uz, material);
        self.touched += 1;
        true
    }

    /// Straight line at a constant level.
    pub fn line(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, level: i32) {
        self.line_graded(x1, z1, level, x2, z2, level);
    }

    /// Straight line whose level is interpolated between the end points.
    ///
    /// Steps the longer axis one column at a time and rounds the other to
    /// the nearest column; a degenerate line paints exactly one column.
    pub fn line_graded(&mut self, x1: i32, z1: i32, l1: i32, x2: i32, z2: i32, l2: i32) {
        let dx = f64::from(x2 - x1);
        let dz = f64::from(z2 - z1);
        let steps = (x2 - x1).abs().max((z2 - z1).abs());
        if steps == 0 {
            self.paint(x1, z1, l1);
            return;
        }
        let dl = f64::from(l2 - l1);
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let x = (f64::from(x1) + dx * t).round() as i32;
            let z = (f64::from(z1) + dz * t).round() as i32;
            let l = (f64::from(l1) + dl * t).round() as i32;
            self.paint(x, z, l);
        }
    }

    /// Filled disc.
    pub fn fill_circle(&mut self, cx: i32, cz: i32, radius: f64, level: i32) {
        self.fill_radial(f64::from(cx), f64::from(cz), radius, |_| Some(level));
    }

    /// Filled disc whose level is a function of the distance to the center.
    /// Returning `None` leaves that column untouched.
    pub fn fill_radial<F>(&mut self, cx: f64, cz: f64, radius: f64, mut level_at: F)
    where
        F: FnMut(f64) -> Option<i32>,
    {
        if radius < 0.0 {
            return;
        }
        let r2 = radius * radius;
        let x0 = (cx - radius).floor() as i32;
        let x1 = (cx + radius).ceil() as i32;
        let z0 = (cz - radius).floor() as i32;
        let z1 = (cz + radius).ceil() as i32;
        let Some((lx, lz, hx, hz)) = self.clip.clip(x0, z0, x1, z1) else {
            return;
        };
        for z in lz..=hz {
            for x in lx..=hx {
                let ddx = f64::from(x) - cx;
                let ddz = f64::from(z) - cz;
                let d2 = ddx * ddx + ddz * ddz;
                if d2 <= r2 {
                    if let Some(level) = level_at(d2.sqrt()) {
                        self.paint(x, z, level);
                    }
                }
            }
        }
    }

    /// Circle outline sampled at `max(12, 2πr)` angles; each column once.
    pub fn circle_outline(&mut self, cx: i32, cz: i32, radius: f64, level: i32) {
        let steps = (TAU * radius).ceil().max(12.0) as usize;
        let mut seen = HashSet::with_capacity(steps);
        for i in 0..steps {
            let angle = TAU * i as f64 / steps as f64;
            let x = (f64::from(cx) + radius * angle.cos()).round() as i32;
            let z = (f64::from(cz) + radius * angle.sin()).round() as i32;
            if seen.insert((x, z)) {
                self.paint(x, z, level);
            }
        }
    }

    /// Filled rectangle between inclusive corners.
    pub fn fill_rectangle(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, level: i32) {
        let Some((lx, lz, hx, hz)) = self.clip.clip(x1, z1, x2, z2) else {
            return;
        };
        for z in lz..=hz {
            for x in lx..=hx {
                self.paint(x, z, level);
            }
        }
    }

    /// Rectangle edges only; corners are painted once.
    pub fn rectangle_outline(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, level: i32) {
        let (lx, hx) = (x1.min(x2), x1.max(x2));
        let (lz, hz) = (z1.min(z2), z1.max(z2));
        for x in lx..=hx {
            self.paint(x, lz, level);
            if hz != lz {
                self.paint(x, hz, level);
            }
        }
        for z in lz + 1..hz {
            self.paint(lx, z, level);
            if hx != lx {
                self.paint(hx, z, level);
            }
        }
    }

    /// Neighborhood means over the clipped rectangle, read before any write.
    fn neighborhood_means(&self, lx: i32, lz: i32, hx: i32, hz: i32, radius: i32) -> Vec<f64> {
        let width = (hx - lx + 1) as usize;
        let height = (hz - lz + 1) as usize;
        let mut means = Vec::with_capacity(width * height);
        for z in lz..=hz {
            for x in lx..=hx {
                let mut sum = 0u32;
                let mut count = 0u32;
                for nz in (z - radius).max(lz)..=(z + radius).min(hz) {
                    for nx in (x - radius).max(lx)..=(x + radius).min(hx) {
                        sum += u32::from(self.flat.level(nx as usize, nz as usize));
                        count += 1;
                    }
                }
                means.push(f64::from(sum) / f64::from(count.max(1)));
            }
        }
        means
    }

    fn commit_filtered<F>(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, radius: i32, blend: F)
    where
        F: Fn(f64, f64) -> f64,
    {
        let Some((lx, lz, hx, hz)) = self.clip.clip(x1, z1, x2, z2) else {
            return;
        };
        let means = self.neighborhood_means(lx, lz, hx, hz, radius.max(0));
        let mut values = means.into_iter();
        for z in lz..=hz {
            for x in lx..=hx {
                let Some(mean) = values.next() else { return };
                let (ux, uz) = (x as usize, z as usize);
                let original = f64::from(self.flat.level(ux, uz));
                let next = blend(original, mean).round().clamp(0.0, 255.0) as u8;
                if self.flat.set_level(ux, uz, next) {
                    self.touched += 1;
                }
            }
        }
    }

    /// Box blur: `factor * mean + (1 - factor) * original`, `factor` in `[0, 1]`.
    pub fn soften(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, factor: f64, radius: i32) {
        let factor = factor.clamp(0.0, 1.0);
        self.commit_filtered(x1, z1, x2, z2, radius, |original, mean| {
            factor * mean + (1.0 - factor) * original
        });
    }

    /// Unsharp mask: `(1 + factor) * original - factor * mean`, `factor >= 0`.
    pub fn sharpen(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, factor: f64, radius: i32) {
        let factor = factor.max(0.0);
        self.commit_filtered(x1, z1, x2, z2, radius, |original, mean| {
            (1.0 + factor) * original - factor * mean
        });
    }

    /// With probability `factor` per column, swaps level and material with a
    /// random neighbor inside the rectangle.
    pub fn pixel_flip(&mut self, x1: i32, z1: i32, x2: i32, z2: i32, factor: f64, rng: &mut TerrainRng) {
        const NEIGHBORS: [(i32, i32); 8] = [
            (-1, -1), (0, -1), (1, -1),
            (-1, 0), (1, 0),
            (-1, 1), (0, 1), (1, 1),
        ];
        let Some((lx, lz, hx, hz)) = self.clip.clip(x1, z1, x2, z2) else {
            return;
        };
        for z in lz..=hz {
            for x in lx..=hx {
                if !rng.chance(factor) {
                    continue;
                }
                let (ox, oz) = NEIGHBORS[rng.index(NEIGHBORS.len())];
                let (nx, nz) = (x + ox, z + oz);
                if nx < lx || nx > hx || nz < lz || nz > hz {
                    continue;
                }
                let (a, b) = ((x as usize, z as usize), (nx as usize, nz as usize));
                if self.flat.is_protected(a.0, a.1) || self.flat.is_protected(b.0, b.1) {
                    continue;
                }
                let (la, ma) = (self.flat.level(a.0, a.1), self.flat.column(a.0, a.1));
                let (lb, mb) = (self.flat.level(b.0, b.1), self.flat.column(b.0, b.1));
                self.flat.set_level(a.0, a.1, lb);
                self.flat.set_column(a.0, a.1, mb);
                self.flat.set_level(b.0, b.1, la);
                self.flat.set_column(b.0, b.1, ma);
                self.touched += 2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatland_core::material::{GRASS, NOT_SET, NOT_SET_MUTABLE, SAND, STONE};

    fn flat(size: usize, level: u8) -> Flat {
        let mut flat = Flat::new("w", "l", "f", size, size);
        for z in 0..size {
            for x in 0..size {
                flat.set_level(x, z, level);
                flat.set_column(x, z, STONE);
            }
        }
        flat
    }

    fn total_level(flat: &Flat) -> u32 {
        flat.levels().iter().map(|&l| u32::from(l)).sum()
    }

    #[test]
    fn test_degenerate_line_paints_one_column() {
        let mut flat = flat(8, 0);
        let region = Region::whole(&flat);
        let mut painter = Painter::new(&mut flat, region);
        painter.line(3, 3, 3, 3, 9);
        let touched = painter.touched();
        drop(painter);
        assert_eq!(touched, 1);
        assert_eq!(flat.level(3, 3), 9);
    }

    #[test]
    fn test_line_steps_longer_axis() {
        let mut flat = flat(10, 0);
        let region = Region::whole(&flat);
        let mut painter = Painter::new(&mut flat, region);
        painter.line(0, 0, 9, 3, 5);
        let touched = painter.touched();
        drop(painter);
        assert_eq!(touched, 10);
        assert_eq!(flat.level(0, 0), 5);
        assert_eq!(flat.level(9, 3), 5);
    }

    #[test]
    fn test_higher_never_lowers() {
        let mut flat = flat(12, 0);
        for z in 0..12 {
            for x in 0..12 {
                flat.set_level(x, z, ((x * 7 + z * 13) % 40) as u8);
            }
        }
        let before = flat.clone();
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region)
            .with_level(LevelMode::Higher)
            .fill_circle(6, 6, 5.0, 20);
        for z in 0..12 {
            for x in 0..12 {
                let old = before.level(x, z);
                let new = flat.level(x, z);
                assert!(new >= old);
                let (dx, dz) = (x as f64 - 6.0, z as f64 - 6.0);
                if dx * dx + dz * dz <= 25.0 {
                    assert_eq!(new, old.max(20));
                }
            }
        }
    }

    #[test]
    fn test_lower_never_raises() {
        let mut flat = flat(10, 30);
        flat.set_level(2, 2, 5);
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region)
            .with_level(LevelMode::Lower)
            .fill_rectangle(0, 0, 9, 9, 12);
        assert_eq!(flat.level(2, 2), 5);
        assert_eq!(flat.level(7, 7), 12);
    }

    #[test]
    fn test_additive_clamps() {
        let mut flat = flat(4, 250);
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region)
            .with_level(LevelMode::Additive)
            .fill_rectangle(0, 0, 3, 3, 10);
        assert_eq!(flat.level(1, 1), 255);
    }

    #[test]
    fn test_jitter_stays_in_spread() {
        let mut flat = flat(16, 0);
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region)
            .with_level(Jitter::new(TerrainRng::new(1), 3))
            .fill_rectangle(0, 0, 15, 15, 100);
        assert!(flat.levels().iter().all(|&l| (97..=103).contains(&l)));

        let region = Region::whole(&flat);
        Painter::new(&mut flat, region)
            .with_level(GaussianJitter::new(TerrainRng::new(2), 4))
            .fill_rectangle(0, 0, 15, 15, 100);
        assert!(flat.levels().iter().all(|&l| (96..=104).contains(&l)));
    }

    #[test]
    fn test_clip_and_protection() {
        let mut flat = flat(10, 0);
        flat.unknown_protected = true;
        flat.set_column(5, 5, NOT_SET_MUTABLE);
        flat.unknown_protected = false;
        flat.set_column(4, 4, NOT_SET);
        flat.unknown_protected = true;

        let mut painter = Painter::new(&mut flat, Region::new(2, 2, 5, 5));
        painter.fill_rectangle(0, 0, 9, 9, 50);
        let touched = painter.touched();
        drop(painter);
        assert_eq!(touched, 24);
        assert_eq!(flat.level(0, 0), 0);
        assert_eq!(flat.level(4, 4), 0);
        assert_eq!(flat.level(5, 5), 50);
        assert_eq!(flat.level(6, 6), 50);
        assert_eq!(flat.level(7, 7), 0);
    }

    #[test]
    fn test_by_ocean_material() {
        let mut flat = flat(6, 0);
        flat.ocean_level = 10;
        let region = Region::whole(&flat);
        let mut painter = Painter::new(&mut flat, region).with_column(ColumnMode::ByOcean);
        painter.paint(1, 1, 10);
        painter.paint(2, 2, 11);
        drop(painter);
        assert_eq!(flat.column(1, 1), SAND);
        assert_eq!(flat.column(2, 2), GRASS);
    }

    #[test]
    fn test_outlines_touch_boundary_once() {
        let mut flat = flat(20, 0);
        let region = Region::whole(&flat);
        let mut painter = Painter::new(&mut flat, region).with_level(LevelMode::Additive);
        painter.rectangle_outline(2, 2, 6, 5, 1);
        assert_eq!(painter.touched(), 14);
        painter.circle_outline(12, 12, 4.0, 1);
        drop(painter);
        assert!(flat.levels().iter().all(|&l| l <= 1));
        assert_eq!(flat.level(4, 4), 0);
        assert_eq!(flat.level(16, 12), 1);
    }

    #[test]
    fn test_soften_zero_is_identity() {
        let mut flat = flat(9, 0);
        for z in 0..9 {
            for x in 0..9 {
                flat.set_level(x, z, ((x * 31 + z * 17) % 90) as u8);
            }
        }
        let before = flat.clone();
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region).soften(0, 0, 8, 8, 0.0, 1);
        assert_eq!(flat, before);
    }

    #[test]
    fn test_soften_full_uses_pre_pass_mean() {
        // A single spike: with a scratch buffer the result is symmetric.
        let mut flat = flat(5, 0);
        flat.set_level(2, 2, 90);
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region).soften(0, 0, 4, 4, 1.0, 1);
        for z in 1..=3 {
            for x in 1..=3 {
                assert_eq!(flat.level(x, z), 10, "({x},{z})");
            }
        }
        // Corner neighborhoods are clipped to 2x2 and do not see the spike.
        assert_eq!(flat.level(0, 0), 0);
        // Edge column (2,0) averages a 3x2 window that contains no spike.
        assert_eq!(flat.level(2, 0), 0);
    }

    #[test]
    fn test_sharpen_amplifies_difference() {
        let mut flat = flat(3, 10);
        flat.set_level(1, 1, 19);
        let region = Region::whole(&flat);
        Painter::new(&mut flat, region).sharpen(0, 0, 2, 2, 1.0, 1);
        // mean = (8*10 + 19) / 9 = 11 -> 2*19 - 11 = 27
        assert_eq!(flat.level(1, 1), 27);
    }

    #[test]
    fn test_pixel_flip_conserves_mass() {
        let mut flat = flat(16, 0);
        for z in 0..16 {
            for x in 0..16 {
                flat.set_level(x, z, ((x * 5 + z * 11) % 60) as u8);
            }
        }
        let before = total_level(&flat);
        let region = Region::whole(&flat);
        let mut rng = TerrainRng::new(11);
        let mut painter = Painter::new(&mut flat, region);
        painter.pixel_flip(0, 0, 15, 15, 0.8, &mut rng);
        let touched = painter.touched();
        drop(painter);
        assert!(touched > 0);
        assert_eq!(total_level(&flat), before);
    }
}
