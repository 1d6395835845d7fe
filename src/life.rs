/**
 * Life-like cellular automata on top of `Grid<bool>`
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::grid::Grid;

/// Birth/survival rule in `B3/S23` notation, indexed by live-neighbor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub birth: [bool; 9],
    pub survival: [bool; 9],
}

impl Rule {
    /// Conway's Game of Life, `B3/S23`.
    pub fn conway() -> Self {
        let mut birth = [false; 9];
        let mut survival = [false; 9];
        birth[3] = true;
        survival[2] = true;
        survival[3] = true;
        Self { birth, survival }
    }

    pub fn next_state(&self, alive: bool, neighbors: u32) -> bool {
        let table = if alive { &self.survival } else { &self.birth };
        table.get(neighbors as usize).copied().unwrap_or(false)
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::conway()
    }
}

impl FromStr for Rule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut birth = None;
        let mut survival = None;

        for part in s.trim().split('/') {
            let mut chars = part.chars();
            let slot = match chars.next().map(|c| c.to_ascii_uppercase()) {
                Some('B') => &mut birth,
                Some('S') => &mut survival,
                _ => bail!("invalid rule section {part:?} in {s:?}, expected B.. or S.."),
            };
            if slot.is_some() {
                bail!("duplicate rule section {part:?} in {s:?}");
            }

            let mut counts = [false; 9];
            for c in chars {
                match c.to_digit(10) {
                    Some(d) if d <= 8 => counts[d as usize] = true,
                    _ => bail!("invalid neighbor count {c:?} in {s:?}"),
                }
            }
            *slot = Some(counts);
        }

        match (birth, survival) {
            (Some(birth), Some(survival)) => Ok(Self { birth, survival }),
            _ => bail!("rule {s:?} needs both a B and an S section"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |table: &[bool; 9]| -> String {
            (0..9)
                .filter(|&n| table[n])
                .map(|n| char::from(b'0' + n as u8))
                .collect()
        };
        write!(f, "B{}/S{}", digits(&self.birth), digits(&self.survival))
    }
}

pub struct Generation {
    pub number: usize,
    pub cells: Grid<bool>, // true = alive
    pub rule: Rule,
}

impl Generation {
    pub fn new(cells: Grid<bool>, rule: Rule) -> Self {
        Self {
            number: 0,
            cells,
            rule,
        }
    }

    /// Random soup where each cell is alive with probability `density`.
    /// The same seed always yields the same soup.
    pub fn seeded(width: i32, height: i32, density: f64, seed: u64, rule: Rule) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        let mut cells = Grid::new(width, height);

        for y in 0..cells.height() {
            for x in 0..cells.width() {
                cells.set(x, y, rng.gen_bool(density));
            }
        }

        Self::new(cells, rule)
    }

    pub fn population(&self) -> usize {
        let mut alive = 0;
        for y in 0..self.cells.height() {
            for x in 0..self.cells.width() {
                if let Some(true) = self.cells.cell(x, y) {
                    alive += 1;
                }
            }
        }
        alive
    }

    /// Computes the next generation. Cells beyond the edge count as dead.
    pub fn step(&self) -> Self {
        let mut next = Grid::new(self.cells.width(), self.cells.height());

        for y in 0..self.cells.height() {
            for x in 0..self.cells.width() {
                let alive = self.cells.cell(x, y).copied().unwrap_or(false);
                let neighbors = self.cells.get_bitmask(x, y, false, |c| *c).count_ones();
                next.set(x, y, self.rule.next_state(alive, neighbors));
            }
        }

        trace!("generation {} -> {}", self.number, self.number + 1);
        Self {
            number: self.number + 1,
            cells: next,
            rule: self.rule,
        }
    }

    pub fn advance(&mut self) {
        *self = self.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_cells(width: i32, height: i32, alive: &[(i32, i32)]) -> Generation {
        let mut cells = Grid::new(width, height);
        for &(x, y) in alive {
            cells.set(x, y, true);
        }
        Generation::new(cells, Rule::conway())
    }

    #[test]
    fn parses_rule_notation() -> Result<()> {
        assert_eq!("B3/S23".parse::<Rule>()?, Rule::conway());
        assert_eq!("s23/b3".parse::<Rule>()?, Rule::conway());

        let highlife: Rule = "B36/S23".parse()?;
        assert!(highlife.birth[6]);
        assert_eq!(highlife.to_string(), "B36/S23");

        let seeds: Rule = "B2/S".parse()?;
        assert_eq!(seeds.survival, [false; 9]);
        Ok(())
    }

    #[test]
    fn rejects_bad_rules() {
        for bad in ["", "B3", "B9/S23", "X3/S23", "B3/S2/S3", "B3a/S23"] {
            assert!(bad.parse::<Rule>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn blinker_oscillates() {
        let mut g = with_cells(5, 5, &[(1, 2), (2, 2), (3, 2)]);
        let start = g.cells.clone();

        g.advance();
        assert_eq!(g.number, 1);
        assert_eq!(g.cells.get(2, 1), (true, true));
        assert_eq!(g.cells.get(2, 3), (true, true));
        assert_eq!(g.cells.get(1, 2), (false, true));
        assert_eq!(g.population(), 3);

        g.advance();
        assert_eq!(g.cells, start);
    }

    #[test]
    fn block_is_still_life() {
        let g = with_cells(4, 4, &[(1, 1), (2, 1), (1, 2), (2, 2)]);
        assert_eq!(g.step().cells, g.cells);
    }

    #[test]
    fn edge_counts_as_dead() {
        // a block in the corner survives since the outside is dead, not alive
        let g = with_cells(2, 2, &[(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert_eq!(g.step().population(), 4);
    }

    #[test]
    fn empty_stays_empty() {
        let g = with_cells(6, 6, &[]);
        assert_eq!(g.step().population(), 0);
    }

    #[test]
    fn seeded_is_deterministic() {
        let a = Generation::seeded(16, 16, 0.4, 7, Rule::conway());
        let b = Generation::seeded(16, 16, 0.4, 7, Rule::conway());
        assert_eq!(a.cells, b.cells);

        assert_eq!(Generation::seeded(8, 8, 0.0, 1, Rule::conway()).population(), 0);
        assert_eq!(Generation::seeded(8, 8, 1.0, 1, Rule::conway()).population(), 64);
    }
}
