use log::debug;

/// Moore neighborhood offsets, scanned row by row around the center.
///
/// ```text
/// 0 1 2
/// 3 x 4
/// 5 6 7
/// ```
///
/// Bit `i` of [`Grid::get_bitmask`] corresponds to offset `i`, so this order
/// must never change.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Fixed-size 2D grid stored row-major in a flat vector.
///
/// Out-of-bounds coordinates are never an error: reads report `found = false`
/// together with `T::default()`, writes are ignored, and neighbor queries
/// substitute a caller-supplied default. Callers that ignore the `found` flag
/// of [`Grid::get`] silently see the default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    data: Vec<T>,
}

impl<T: Default> Grid<T> {
    /// Creates a `width` x `height` grid with every cell set to `T::default()`.
    ///
    /// Negative dimensions are clamped to zero, giving an empty grid on which
    /// every coordinate is out of bounds.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let len = width as usize * height as usize;
        debug!("allocating {width}x{height} grid ({len} cells)");

        Self {
            width,
            height,
            data: std::iter::repeat_with(T::default).take(len).collect(),
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells, always `width * height`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        // Both coordinates are non-negative here.
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Borrows the cell at `(x, y)`, or `None` when out of bounds.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|i| &self.data[i])
    }

    /// Overwrites the cell at `(x, y)`. Out-of-bounds writes are a no-op.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(i) = self.index(x, y) {
            self.data[i] = value;
        }
    }

    /// Cell `i` of the Moore neighborhood of `(x, y)`, `None` when that
    /// neighbor lies outside the grid (or outside `i32`).
    #[inline]
    fn neighbor(&self, x: i32, y: i32, i: usize) -> Option<&T> {
        let (dx, dy) = NEIGHBOR_OFFSETS[i];
        let nx = x.checked_add(dx)?;
        let ny = y.checked_add(dy)?;
        self.cell(nx, ny)
    }
}

impl<T: Clone + Default> Grid<T> {
    /// Returns a copy of the value at `(x, y)` and `true`, or
    /// `(T::default(), false)` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> (T, bool) {
        match self.cell(x, y) {
            Some(v) => (v.clone(), true),
            None => (T::default(), false),
        }
    }

    /// Returns the 8 neighbors of `(x, y)` in [`NEIGHBOR_OFFSETS`] order.
    /// Neighbors outside the grid are replaced by `default`.
    pub fn get_neighbors(&self, x: i32, y: i32, default: T) -> [T; 8] {
        std::array::from_fn(|i| match self.neighbor(x, y, i) {
            Some(v) => v.clone(),
            None => default.clone(),
        })
    }

    /// Packs `predicate` over the neighbors of `(x, y)` into a byte: bit `i`
    /// is set when neighbor `i` (see [`NEIGHBOR_OFFSETS`]) matches.
    /// `default` stands in for neighbors outside the grid.
    pub fn get_bitmask<F>(&self, x: i32, y: i32, default: T, mut predicate: F) -> u8
    where
        F: FnMut(&T) -> bool,
    {
        let neighbors = self.get_neighbors(x, y, default);
        let mut bitmask = 0u8;

        for (i, n) in neighbors.iter().enumerate() {
            if predicate(n) {
                bitmask |= 1 << i;
            }
        }

        bitmask
    }
}
