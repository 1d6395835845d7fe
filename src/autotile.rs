//! Tile variant selection from neighbor bitmasks.
//!
//! Bit positions follow [`NEIGHBOR_OFFSETS`](crate::grid::NEIGHBOR_OFFSETS).

use crate::grid::Grid;

pub const NORTH_WEST: u8 = 1 << 0;
pub const NORTH: u8 = 1 << 1;
pub const NORTH_EAST: u8 = 1 << 2;
pub const WEST: u8 = 1 << 3;
pub const EAST: u8 = 1 << 4;
pub const SOUTH_WEST: u8 = 1 << 5;
pub const SOUTH: u8 = 1 << 6;
pub const SOUTH_EAST: u8 = 1 << 7;

/// Number of distinct masks left after [`reduce_corners`].
pub const BLOB_VARIANT_COUNT: usize = 47;

/// Every corner-reduced mask, ascending. Index into this is the blob tile id.
pub const BLOB_VARIANTS: [u8; BLOB_VARIANT_COUNT] = blob_variants();

// Indexed by cardinal_index: N=1, W=2, E=4, S=8.
const WALL_GLYPHS: [char; 16] = [
    '■', '│', '─', '┘', '─', '└', '─', '┴', '│', '│', '┐', '┤', '┌', '├', '┬', '┼',
];

/// Collapses a full mask to a 4-bit index over the cardinal neighbors
/// (`N=1, W=2, E=4, S=8`), for 16-tile sets.
pub const fn cardinal_index(mask: u8) -> u8 {
    let mut idx = 0;
    if mask & NORTH != 0 {
        idx |= 1;
    }
    if mask & WEST != 0 {
        idx |= 2;
    }
    if mask & EAST != 0 {
        idx |= 4;
    }
    if mask & SOUTH != 0 {
        idx |= 8;
    }
    idx
}

/// Clears each diagonal bit unless both cardinals next to it are set.
pub const fn reduce_corners(mask: u8) -> u8 {
    let mut out = mask;
    if mask & (NORTH | WEST) != (NORTH | WEST) {
        out &= !NORTH_WEST;
    }
    if mask & (NORTH | EAST) != (NORTH | EAST) {
        out &= !NORTH_EAST;
    }
    if mask & (SOUTH | WEST) != (SOUTH | WEST) {
        out &= !SOUTH_WEST;
    }
    if mask & (SOUTH | EAST) != (SOUTH | EAST) {
        out &= !SOUTH_EAST;
    }
    out
}

const fn blob_variants() -> [u8; BLOB_VARIANT_COUNT] {
    let mut table = [0u8; BLOB_VARIANT_COUNT];
    let mut n = 0;
    let mut mask = 0usize;
    while mask < 256 {
        if reduce_corners(mask as u8) == mask as u8 {
            table[n] = mask as u8;
            n += 1;
        }
        mask += 1;
    }
    table
}

/// Blob tile id (`0..47`) for any 8-neighbor mask.
pub fn blob_index(mask: u8) -> usize {
    let reduced = reduce_corners(mask);
    // Every reduced mask is in the table; the fallback is unreachable.
    BLOB_VARIANTS.binary_search(&reduced).unwrap_or(0)
}

/// Box-drawing glyph joining a wall cell to its cardinal wall neighbors.
pub fn wall_glyph(mask: u8) -> char {
    WALL_GLYPHS[cardinal_index(mask) as usize]
}

/// Computes the neighbor bitmask of every cell.
pub fn autotile<T, F>(grid: &Grid<T>, default: T, mut predicate: F) -> Grid<u8>
where
    T: Clone + Default,
    F: FnMut(&T) -> bool,
{
    let mut masks = Grid::new(grid.width(), grid.height());
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            masks.set(x, y, grid.get_bitmask(x, y, default.clone(), &mut predicate));
        }
    }
    masks
}

/// Renders solid cells as connected walls, empty cells as spaces.
pub fn render_walls(solid: &Grid<bool>) -> String {
    let masks = autotile(solid, false, |c| *c);
    let mut out = String::with_capacity(solid.len() * 4 + solid.height() as usize);

    for y in 0..solid.height() {
        for x in 0..solid.width() {
            let ch = match (solid.get(x, y), masks.get(x, y)) {
                ((true, _), (mask, _)) => wall_glyph(mask),
                _ => ' ',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}
