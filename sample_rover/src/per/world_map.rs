//! # World Map
//!
//! The world map counts, for every ground cell, how many times each class of pixel has been
//! projected into it over the run. Counts only ever increase.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::{s, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::coords::WorldCell;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Accumulation grid with one layer per [`MapLayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    /// Raw map data, dimension order y cell, x cell, layer
    data: Array3<u32>,
}

/// Summary of how much of the world has been seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MapCoverage {
    /// Cells with at least one navigable or obstacle hit
    pub observed_cells: usize,

    /// Observed cells with more navigable hits than obstacle hits
    pub navigable_cells: usize,

    /// Cells with at least one sample hit
    pub sample_cells: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Layers of the [`WorldMap`]. The discriminant is the layer's index in the map data, which
/// matches the channel used for the class in the vision image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapLayer {
    Obstacle = 0,
    Sample = 1,
    Navigable = 2,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WorldMap {
    /// Create a new zeroed map of `size` by `size` cells.
    pub fn new(size: usize) -> Self {
        Self {
            data: Array3::zeros((size, size, 3)),
        }
    }

    /// Number of cells along each side.
    pub fn size(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Count of the layer in the given cell, or `None` if the cell is outside the map.
    pub fn get(&self, layer: MapLayer, cell: WorldCell) -> Option<u32> {
        self.data.get((cell.y, cell.x, layer as usize)).copied()
    }

    /// View of a single layer, indexed `[y, x]`.
    pub fn layer(&self, layer: MapLayer) -> ArrayView2<u32> {
        self.data.slice(s![.., .., layer as usize])
    }

    /// Add one to the layer in every given cell. A cell listed several times is incremented
    /// once per listing. Cells outside the map are ignored.
    pub fn accumulate(&mut self, layer: MapLayer, cells: &[WorldCell]) {
        for cell in cells {
            if let Some(count) = self.data.get_mut((cell.y, cell.x, layer as usize)) {
                *count = count.saturating_add(1);
            }
        }
    }

    /// Compute the coverage of the map.
    pub fn coverage(&self) -> MapCoverage {
        let mut cov = MapCoverage::default();

        for cell in self.data.lanes(Axis(2)) {
            let obstacle = cell[MapLayer::Obstacle as usize];
            let sample = cell[MapLayer::Sample as usize];
            let navigable = cell[MapLayer::Navigable as usize];

            if obstacle > 0 || navigable > 0 {
                cov.observed_cells += 1;
            }
            if navigable > obstacle {
                cov.navigable_cells += 1;
            }
            if sample > 0 {
                cov.sample_cells += 1;
            }
        }

        cov
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut map = WorldMap::new(10);
        let a = WorldCell { x: 2, y: 7 };
        let b = WorldCell { x: 9, y: 0 };

        map.accumulate(MapLayer::Navigable, &[a, a, b]);
        map.accumulate(MapLayer::Obstacle, &[b]);

        assert_eq!(map.get(MapLayer::Navigable, a), Some(2));
        assert_eq!(map.get(MapLayer::Navigable, b), Some(1));
        assert_eq!(map.get(MapLayer::Obstacle, b), Some(1));
        assert_eq!(map.get(MapLayer::Sample, a), Some(0));

        // Stored as [y, x]
        assert_eq!(map.layer(MapLayer::Navigable)[[7, 2]], 2);
    }

    #[test]
    fn test_accumulate_is_monotonic() {
        let mut map = WorldMap::new(5);
        let cells: Vec<WorldCell> = (0..5).map(|i| WorldCell { x: i, y: 4 - i }).collect();

        let mut last = map.clone();
        for _ in 0..3 {
            map.accumulate(MapLayer::Sample, &cells);
            let now = map.layer(MapLayer::Sample);
            let before = last.layer(MapLayer::Sample);
            assert!(now.iter().zip(before.iter()).all(|(n, b)| n >= b));
            last = map.clone();
        }
    }

    #[test]
    fn test_outside_cells_ignored() {
        let mut map = WorldMap::new(3);
        map.accumulate(MapLayer::Sample, &[WorldCell { x: 3, y: 0 }]);

        assert_eq!(map, WorldMap::new(3));
        assert_eq!(map.get(MapLayer::Sample, WorldCell { x: 3, y: 0 }), None);
    }

    #[test]
    fn test_coverage() {
        let mut map = WorldMap::new(4);
        let a = WorldCell { x: 0, y: 0 };
        let b = WorldCell { x: 1, y: 0 };

        map.accumulate(MapLayer::Navigable, &[a, a, b]);
        map.accumulate(MapLayer::Obstacle, &[a, b, b]);
        map.accumulate(MapLayer::Sample, &[WorldCell { x: 3, y: 3 }]);

        assert_eq!(
            map.coverage(),
            MapCoverage {
                observed_cells: 2,
                navigable_cells: 1,
                sample_cells: 1,
            }
        );
    }
}
