//! Axial hex grid primitives used to generate the board graph.
//!
//! Tiles live on axial coordinates (q, r). Corners are identified as the
//! north or south pole of a single hex: with pointy-top hexes every physical
//! corner is the north pole of exactly one hex, so `(hex, pole)` is already a
//! canonical identity and both corner adjacency and the corner-to-tile
//! incidence reduce to integer arithmetic.

use serde::{Deserialize, Serialize};

/// Axial coordinate of a hex tile. `q` grows east, `r` grows south-east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The six neighbouring hexes, clockwise from east.
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),
            HexCoord::new(self.q + 1, self.r - 1),
            HexCoord::new(self.q, self.r - 1),
            HexCoord::new(self.q - 1, self.r),
            HexCoord::new(self.q - 1, self.r + 1),
            HexCoord::new(self.q, self.r + 1),
        ]
    }

    /// The six corners of this hex, clockwise from the top.
    pub fn corners(&self) -> [Corner; 6] {
        let HexCoord { q, r } = *self;
        [
            Corner::north(HexCoord::new(q, r)),
            Corner::south(HexCoord::new(q + 1, r - 1)),
            Corner::north(HexCoord::new(q, r + 1)),
            Corner::south(HexCoord::new(q, r)),
            Corner::north(HexCoord::new(q - 1, r + 1)),
            Corner::south(HexCoord::new(q, r - 1)),
        ]
    }
}

/// Which pole of its identifying hex a corner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pole {
    North,
    South,
}

/// A corner of the hex grid, where up to three tiles meet.
///
/// Settlement locations are corners; road edges connect adjacent corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Corner {
    pub hex: HexCoord,
    pub pole: Pole,
}

impl Corner {
    pub const fn north(hex: HexCoord) -> Self {
        Self {
            hex,
            pole: Pole::North,
        }
    }

    pub const fn south(hex: HexCoord) -> Self {
        Self {
            hex,
            pole: Pole::South,
        }
    }

    /// The three corners exactly one edge away.
    pub fn adjacent(&self) -> [Corner; 3] {
        let HexCoord { q, r } = self.hex;
        match self.pole {
            Pole::North => [
                Corner::south(HexCoord::new(q + 1, r - 2)),
                Corner::south(HexCoord::new(q, r - 1)),
                Corner::south(HexCoord::new(q + 1, r - 1)),
            ],
            Pole::South => [
                Corner::north(HexCoord::new(q - 1, r + 2)),
                Corner::north(HexCoord::new(q - 1, r + 1)),
                Corner::north(HexCoord::new(q, r + 1)),
            ],
        }
    }

    /// The hexes that meet at this corner.
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        let HexCoord { q, r } = self.hex;
        match self.pole {
            Pole::North => [
                HexCoord::new(q, r),
                HexCoord::new(q, r - 1),
                HexCoord::new(q + 1, r - 1),
            ],
            Pole::South => [
                HexCoord::new(q, r),
                HexCoord::new(q, r + 1),
                HexCoord::new(q - 1, r + 1),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hex_has_six_distinct_neighbors() {
        let center = HexCoord::new(0, 0);
        let unique: HashSet<_> = center.neighbors().into_iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn hex_has_six_distinct_corners() {
        let hex = HexCoord::new(2, -1);
        let unique: HashSet<_> = hex.corners().into_iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn consecutive_corners_share_an_edge() {
        let corners = HexCoord::new(0, 0).corners();
        for i in 0..6 {
            let next = corners[(i + 1) % 6];
            assert!(
                corners[i].adjacent().contains(&next),
                "corner {i} should touch corner {}",
                (i + 1) % 6
            );
        }
    }

    #[test]
    fn corner_adjacency_is_mutual() {
        for corner in [
            Corner::north(HexCoord::new(0, 0)),
            Corner::south(HexCoord::new(-1, 2)),
            Corner::north(HexCoord::new(3, -2)),
        ] {
            for other in corner.adjacent() {
                assert!(other.adjacent().contains(&corner));
            }
        }
    }

    #[test]
    fn every_corner_of_a_hex_touches_it() {
        let hex = HexCoord::new(1, 1);
        for corner in hex.corners() {
            assert!(corner.touching_hexes().contains(&hex));
        }
    }

    #[test]
    fn adjacent_corners_share_two_hexes() {
        let corner = Corner::north(HexCoord::new(0, 0));
        for other in corner.adjacent() {
            let mine: HashSet<_> = corner.touching_hexes().into_iter().collect();
            let shared = other
                .touching_hexes()
                .into_iter()
                .filter(|h| mine.contains(h))
                .count();
            assert_eq!(shared, 2, "an edge lies between exactly two hexes");
        }
    }
}
