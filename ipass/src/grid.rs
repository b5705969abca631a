//! Square grids addressed by explicit `(u, v)` coordinates.

use itertools::iproduct;

/// A `side × side` grid stored row-major, `u` selecting the row.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    side: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(side: usize, value: T) -> Self {
        Self {
            side,
            cells: vec![value; side * side],
        }
    }
}

impl<T> Grid<T> {
    /// Create a grid by evaluating `f(u, v)` for every cell.
    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        Self {
            side,
            cells: iproduct!(0..side, 0..side).map(|(u, v)| f(u, v)).collect(),
        }
    }

    /// Number of cells along each axis.
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, u: usize, v: usize) -> Option<&T> {
        if u < self.side && v < self.side {
            self.cells.get(u * self.side + v)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, u: usize, v: usize) -> Option<&mut T> {
        if u < self.side && v < self.side {
            self.cells.get_mut(u * self.side + v)
        } else {
            None
        }
    }

    /// Iterate over `((u, v), cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let side = self.side;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / side, i % side), cell))
    }

    /// Build a new grid of the same size by mapping every cell.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            side: self.side,
            cells: self.cells.iter().map(|cell| f(cell)).collect(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T> std::ops::Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (u, v): (usize, usize)) -> &T {
        assert!(u < self.side && v < self.side, "grid index ({u}, {v}) out of bounds");
        &self.cells[u * self.side + v]
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (u, v): (usize, usize)) -> &mut T {
        assert!(u < self.side && v < self.side, "grid index ({u}, {v}) out of bounds");
        &mut self.cells[u * self.side + v]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_coordinates() {
        let grid = Grid::from_fn(3, |u, v| u * 10 + v);
        assert_eq!(grid[(2, 1)], 21);
        assert_eq!(grid.get(1, 2), Some(&12));
        assert_eq!(grid.get(3, 0), None);

        let coords: Vec<_> = grid.iter().map(|(uv, _)| uv).take(4).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
    }
}
