//! Board topology, tile layout, and infrastructure occupancy.
//!
//! The board graph is fixed once generated: corners of the 19 land hexes
//! become densely numbered [`Location`]s and the sides between adjacent
//! corners become [`Edge`]s. Tiles carry a produced resource and a dice
//! token; the barren variant carries neither and therefore yields the zero
//! clutch everywhere.
//!
//! All occupancy mutations re-check their preconditions at call time and
//! fail with a [`PlacementError`] rather than corrupting state, even when a
//! validator has already screened the request.

use crate::grid::{Corner, HexCoord};
use crate::player::PlayerId;
use crate::resources::{Resource, ResourceClutch};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

/// A numbered corner of the board graph. Numbering is dense, deterministic,
/// and fixed for the lifetime of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location(pub u8);

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A road slot between two adjacent locations, stored with its endpoints in
/// ascending order so the same edge always compares equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    a: Location,
    b: Location,
}

impl Edge {
    pub fn between(a: Location, b: Location) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    pub fn endpoints(&self) -> (Location, Location) {
        (self.a, self.b)
    }

    pub fn touches(&self, location: Location) -> bool {
        self.a == location || self.b == location
    }

    /// The endpoint this edge shares with `other`, if any.
    pub fn shared_endpoint(&self, other: &Edge) -> Option<Location> {
        if other.touches(self.a) {
            Some(self.a)
        } else if other.touches(self.b) {
            Some(self.b)
        } else {
            None
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.a, self.b)
    }
}

/// Why a placement was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    #[error("location {0} is not on the board")]
    UnknownLocation(Location),

    #[error("edge {0} is not on the board")]
    UnknownEdge(Edge),

    #[error("that spot is already occupied")]
    Occupied,

    #[error("too close to another settlement")]
    TooClose,

    #[error("not connected to your network")]
    Disconnected,

    #[error("you have no settlement to upgrade at {0}")]
    NoSettlement(Location),
}

/// What stands on a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    Settlement,
    City,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub owner: PlayerId,
    pub kind: BuildingKind,
}

impl Building {
    /// Units of an adjacent tile's resource produced per trigger.
    pub fn multiplier(&self) -> u32 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A single hex tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub hex: HexCoord,
    /// `None` for the desert (and for every tile of a barren board).
    pub produce: Option<Resource>,
    /// Dice total that triggers production.
    pub token: Option<u8>,
}

/// The 19 land hexes: centre, inner ring, outer ring.
const LAND: [HexCoord; 19] = [
    HexCoord::new(0, 0),
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
    HexCoord::new(2, 0),
    HexCoord::new(2, -1),
    HexCoord::new(2, -2),
    HexCoord::new(1, -2),
    HexCoord::new(0, -2),
    HexCoord::new(-1, -1),
    HexCoord::new(-2, 0),
    HexCoord::new(-2, 1),
    HexCoord::new(-2, 2),
    HexCoord::new(-1, 2),
    HexCoord::new(0, 2),
    HexCoord::new(1, 1),
];

/// Token pool: one 2 and 12, two of everything else except 7.
const TOKENS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

/// The game board: fixed topology plus current infrastructure occupancy.
#[derive(Debug, Clone)]
pub struct Board {
    tiles: Vec<Tile>,
    tile_by_hex: HashMap<HexCoord, usize>,
    corners: Vec<Corner>,
    neighbors: Vec<Vec<Location>>,
    edges: BTreeSet<Edge>,
    tile_corners: Vec<[Location; 6]>,
    buildings: BTreeMap<Location, Building>,
    roads: BTreeMap<Edge, PlayerId>,
}

impl Board {
    /// A randomized standard layout.
    pub fn standard() -> Self {
        Self::standard_with_rng(&mut rand::thread_rng())
    }

    /// A standard layout drawn from the caller's RNG, for deterministic
    /// generation.
    pub fn standard_with_rng<R: Rng>(rng: &mut R) -> Self {
        let mut pool: Vec<Option<Resource>> = Vec::with_capacity(LAND.len());
        pool.extend(std::iter::repeat(Some(Resource::Lumber)).take(4));
        pool.extend(std::iter::repeat(Some(Resource::Grain)).take(4));
        pool.extend(std::iter::repeat(Some(Resource::Wool)).take(4));
        pool.extend(std::iter::repeat(Some(Resource::Ore)).take(3));
        pool.extend(std::iter::repeat(Some(Resource::Brick)).take(3));
        pool.push(None);
        pool.shuffle(rng);

        let tokens = Self::deal_tokens(&pool, rng);
        let tiles = LAND
            .iter()
            .zip(pool.iter().zip(tokens))
            .map(|(&hex, (&produce, token))| Tile {
                hex,
                produce,
                token,
            })
            .collect();

        Self::from_tiles(tiles)
    }

    /// Same topology, no production anywhere: every yield is the zero clutch.
    pub fn barren() -> Self {
        let tiles = LAND
            .iter()
            .map(|&hex| Tile {
                hex,
                produce: None,
                token: None,
            })
            .collect();
        Self::from_tiles(tiles)
    }

    /// Shuffle tokens onto the producing tiles, retrying so that no two of
    /// the high-frequency tokens (6 and 8) end up on adjacent tiles.
    fn deal_tokens<R: Rng>(pool: &[Option<Resource>], rng: &mut R) -> Vec<Option<u8>> {
        const ATTEMPTS: usize = 100;

        let mut tokens = TOKENS.to_vec();
        for _ in 0..ATTEMPTS {
            tokens.shuffle(rng);
            let assigned = Self::spread_tokens(pool, &tokens);
            if Self::tokens_well_spread(&assigned) {
                return assigned;
            }
        }

        // Extremely unlikely; accept the last shuffle rather than spin.
        tokens.shuffle(rng);
        Self::spread_tokens(pool, &tokens)
    }

    fn spread_tokens(pool: &[Option<Resource>], tokens: &[u8]) -> Vec<Option<u8>> {
        let mut supply = tokens.iter().copied();
        pool.iter()
            .map(|produce| produce.and_then(|_| supply.next()))
            .collect()
    }

    fn tokens_well_spread(assigned: &[Option<u8>]) -> bool {
        let index: HashMap<HexCoord, usize> =
            LAND.iter().copied().enumerate().map(|(i, h)| (h, i)).collect();

        for (i, token) in assigned.iter().enumerate() {
            if !matches!(token, Some(6) | Some(8)) {
                continue;
            }
            for neighbor in LAND[i].neighbors() {
                if let Some(&j) = index.get(&neighbor) {
                    if matches!(assigned[j], Some(6) | Some(8)) {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn from_tiles(tiles: Vec<Tile>) -> Self {
        let corner_set: BTreeSet<Corner> = tiles
            .iter()
            .flat_map(|t| t.hex.corners())
            .collect();
        let corners: Vec<Corner> = corner_set.into_iter().collect();
        let ids: HashMap<Corner, Location> = corners
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, Location(i as u8)))
            .collect();

        let mut edges = BTreeSet::new();
        for tile in &tiles {
            let ring = tile.hex.corners();
            for i in 0..6 {
                edges.insert(Edge::between(ids[&ring[i]], ids[&ring[(i + 1) % 6]]));
            }
        }

        let mut neighbors = vec![Vec::new(); corners.len()];
        for edge in &edges {
            neighbors[edge.a.0 as usize].push(edge.b);
            neighbors[edge.b.0 as usize].push(edge.a);
        }
        for list in &mut neighbors {
            list.sort();
        }

        let tile_corners = tiles
            .iter()
            .map(|t| t.hex.corners().map(|c| ids[&c]))
            .collect();
        let tile_by_hex = tiles
            .iter()
            .enumerate()
            .map(|(i, t)| (t.hex, i))
            .collect();

        Self {
            tiles,
            tile_by_hex,
            corners,
            neighbors,
            edges,
            tile_corners,
            buildings: BTreeMap::new(),
            roads: BTreeMap::new(),
        }
    }

    // ==================== Topology queries ====================

    pub fn location_count(&self) -> usize {
        self.corners.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.corners.len()).map(|i| Location(i as u8))
    }

    pub fn contains_location(&self, location: Location) -> bool {
        (location.0 as usize) < self.corners.len()
    }

    pub fn contains_edge(&self, edge: Edge) -> bool {
        self.edges.contains(&edge)
    }

    pub fn adjacent_locations(&self, location: Location) -> &[Location] {
        self.neighbors
            .get(location.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The edges incident to a location.
    pub fn edges_at(&self, location: Location) -> Vec<Edge> {
        self.adjacent_locations(location)
            .iter()
            .map(|&other| Edge::between(location, other))
            .collect()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The six locations around the tile at `index` into [`Board::tiles`].
    pub fn tile_locations(&self, index: usize) -> &[Location] {
        self.tile_corners
            .get(index)
            .map(|ring| ring.as_slice())
            .unwrap_or(&[])
    }

    /// The land tiles adjacent to a location.
    pub fn tiles_at(&self, location: Location) -> Vec<&Tile> {
        let Some(corner) = self.corners.get(location.0 as usize) else {
            return Vec::new();
        };
        corner
            .touching_hexes()
            .iter()
            .filter_map(|hex| self.tile_by_hex.get(hex))
            .map(|&i| &self.tiles[i])
            .collect()
    }

    // ==================== Occupancy queries ====================

    pub fn building_at(&self, location: Location) -> Option<Building> {
        self.buildings.get(&location).copied()
    }

    pub fn road_at(&self, edge: Edge) -> Option<PlayerId> {
        self.roads.get(&edge).copied()
    }

    pub fn placed_buildings(&self) -> impl Iterator<Item = (Location, Building)> + '_ {
        self.buildings.iter().map(|(&l, &b)| (l, b))
    }

    pub fn placed_roads(&self) -> impl Iterator<Item = (Edge, PlayerId)> + '_ {
        self.roads.iter().map(|(&e, &p)| (e, p))
    }

    // ==================== Legality ====================

    /// Settlement preconditions: a real, unoccupied location, no building on
    /// any adjacent location, and - outside setup - one of the player's own
    /// roads touching it.
    pub fn check_settlement(
        &self,
        location: Location,
        player: PlayerId,
        setup: bool,
    ) -> Result<(), PlacementError> {
        if !self.contains_location(location) {
            return Err(PlacementError::UnknownLocation(location));
        }
        if self.buildings.contains_key(&location) {
            return Err(PlacementError::Occupied);
        }
        if self
            .adjacent_locations(location)
            .iter()
            .any(|n| self.buildings.contains_key(n))
        {
            return Err(PlacementError::TooClose);
        }
        if !setup
            && !self
                .edges_at(location)
                .iter()
                .any(|e| self.roads.get(e) == Some(&player))
        {
            return Err(PlacementError::Disconnected);
        }
        Ok(())
    }

    pub fn can_place_settlement(&self, location: Location, player: PlayerId, setup: bool) -> bool {
        self.check_settlement(location, player, setup).is_ok()
    }

    /// Road preconditions: a real, unoccupied edge that either touches the
    /// setup `anchor` settlement or connects to the player's network.
    pub fn check_road(
        &self,
        edge: Edge,
        player: PlayerId,
        anchor: Option<Location>,
    ) -> Result<(), PlacementError> {
        if !self.edges.contains(&edge) {
            return Err(PlacementError::UnknownEdge(edge));
        }
        if self.roads.contains_key(&edge) {
            return Err(PlacementError::Occupied);
        }
        let connected = match anchor {
            Some(anchor) => edge.touches(anchor),
            None => self.connects_to_network(edge, player),
        };
        if connected {
            Ok(())
        } else {
            Err(PlacementError::Disconnected)
        }
    }

    pub fn can_place_road(&self, edge: Edge, player: PlayerId, anchor: Option<Location>) -> bool {
        self.check_road(edge, player, anchor).is_ok()
    }

    fn connects_to_network(&self, edge: Edge, player: PlayerId) -> bool {
        let (a, b) = edge.endpoints();
        for end in [a, b] {
            match self.buildings.get(&end) {
                Some(building) if building.owner == player => return true,
                // an opposing building blocks continuation through this corner
                Some(_) => continue,
                None => {
                    if self
                        .edges_at(end)
                        .iter()
                        .any(|e| *e != edge && self.roads.get(e) == Some(&player))
                    {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Legality of placing `first` and then `second` in one stroke, as the
    /// road-building card does: `second` may connect through `first`.
    pub fn check_road_pair(
        &self,
        first: Edge,
        second: Edge,
        player: PlayerId,
    ) -> Result<(), PlacementError> {
        self.check_road(first, player, None)?;
        if second == first {
            return Err(PlacementError::Occupied);
        }
        if !self.edges.contains(&second) {
            return Err(PlacementError::UnknownEdge(second));
        }
        if self.roads.contains_key(&second) {
            return Err(PlacementError::Occupied);
        }
        if self.connects_to_network(second, player) || self.chains_from(second, first, player) {
            Ok(())
        } else {
            Err(PlacementError::Disconnected)
        }
    }

    fn chains_from(&self, second: Edge, first: Edge, player: PlayerId) -> bool {
        match second.shared_endpoint(&first) {
            Some(corner) => self
                .buildings
                .get(&corner)
                .map_or(true, |b| b.owner == player),
            None => false,
        }
    }

    pub fn check_city(&self, location: Location, player: PlayerId) -> Result<(), PlacementError> {
        if !self.contains_location(location) {
            return Err(PlacementError::UnknownLocation(location));
        }
        match self.buildings.get(&location) {
            Some(Building {
                owner,
                kind: BuildingKind::Settlement,
            }) if *owner == player => Ok(()),
            _ => Err(PlacementError::NoSettlement(location)),
        }
    }

    pub fn can_upgrade_to_city(&self, location: Location, player: PlayerId) -> bool {
        self.check_city(location, player).is_ok()
    }

    pub fn valid_settlement_spots(&self, player: PlayerId, setup: bool) -> Vec<Location> {
        self.locations()
            .filter(|&l| self.can_place_settlement(l, player, setup))
            .collect()
    }

    pub fn valid_road_spots(&self, player: PlayerId, anchor: Option<Location>) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|&&e| self.can_place_road(e, player, anchor))
            .copied()
            .collect()
    }

    pub fn valid_city_spots(&self, player: PlayerId) -> Vec<Location> {
        self.buildings
            .iter()
            .filter(|(_, b)| b.kind == BuildingKind::Settlement && b.owner == player)
            .map(|(&l, _)| l)
            .collect()
    }

    // ==================== Mutation ====================

    pub fn place_settlement(
        &mut self,
        location: Location,
        player: PlayerId,
        setup: bool,
    ) -> Result<(), PlacementError> {
        self.check_settlement(location, player, setup)?;
        self.buildings.insert(
            location,
            Building {
                owner: player,
                kind: BuildingKind::Settlement,
            },
        );
        Ok(())
    }

    pub fn place_road(
        &mut self,
        edge: Edge,
        player: PlayerId,
        anchor: Option<Location>,
    ) -> Result<(), PlacementError> {
        self.check_road(edge, player, anchor)?;
        self.roads.insert(edge, player);
        Ok(())
    }

    /// Place two roads atomically; nothing is placed unless both fit.
    pub fn place_road_pair(
        &mut self,
        first: Edge,
        second: Edge,
        player: PlayerId,
    ) -> Result<(), PlacementError> {
        self.check_road_pair(first, second, player)?;
        self.roads.insert(first, player);
        self.roads.insert(second, player);
        Ok(())
    }

    pub fn upgrade_to_city(
        &mut self,
        location: Location,
        player: PlayerId,
    ) -> Result<(), PlacementError> {
        self.check_city(location, player)?;
        self.buildings.insert(
            location,
            Building {
                owner: player,
                kind: BuildingKind::City,
            },
        );
        Ok(())
    }

    // ==================== Production ====================

    /// One unit of each producing adjacent tile's resource.
    pub fn yield_for(&self, location: Location) -> ResourceClutch {
        let mut clutch = ResourceClutch::zero();
        for tile in self.tiles_at(location) {
            if let Some(resource) = tile.produce {
                clutch = clutch + ResourceClutch::single(resource, 1);
            }
        }
        clutch
    }

    /// Everything produced by a dice total, aggregated per player in seat
    /// order. Settlements collect one unit per matching tile, cities two.
    pub fn production_for_roll(&self, roll: u8) -> Vec<(PlayerId, ResourceClutch)> {
        let mut gains: BTreeMap<PlayerId, ResourceClutch> = BTreeMap::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            if tile.token != Some(roll) {
                continue;
            }
            let Some(resource) = tile.produce else {
                continue;
            };
            for location in self.tile_locations(i) {
                if let Some(building) = self.buildings.get(location) {
                    let gained = ResourceClutch::single(resource, building.multiplier());
                    let entry = gains.entry(building.owner).or_insert_with(ResourceClutch::zero);
                    *entry = *entry + gained;
                }
            }
        }
        gains.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded() -> Board {
        Board::standard_with_rng(&mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn standard_board_dimensions() {
        let board = seeded();
        assert_eq!(board.location_count(), 54);
        assert_eq!(board.edge_count(), 72);
        assert_eq!(board.tiles().len(), 19);
    }

    #[test]
    fn numbering_is_deterministic() {
        let a = Board::barren();
        let b = seeded();
        assert_eq!(a.location_count(), b.location_count());
        for loc in a.locations() {
            assert_eq!(a.adjacent_locations(loc), b.adjacent_locations(loc));
        }
    }

    #[test]
    fn every_location_has_two_or_three_neighbors() {
        let board = Board::barren();
        for loc in board.locations() {
            let n = board.adjacent_locations(loc).len();
            assert!((2..=3).contains(&n), "location {loc} has {n} neighbors");
        }
    }

    #[test]
    fn standard_resource_distribution() {
        let board = seeded();
        let count = |kind| {
            board
                .tiles()
                .iter()
                .filter(|t| t.produce == Some(kind))
                .count()
        };
        assert_eq!(count(Resource::Lumber), 4);
        assert_eq!(count(Resource::Grain), 4);
        assert_eq!(count(Resource::Wool), 4);
        assert_eq!(count(Resource::Ore), 3);
        assert_eq!(count(Resource::Brick), 3);
        assert_eq!(board.tiles().iter().filter(|t| t.produce.is_none()).count(), 1);
    }

    #[test]
    fn desert_carries_no_token() {
        let board = seeded();
        for tile in board.tiles() {
            if tile.produce.is_none() {
                assert_eq!(tile.token, None);
            } else {
                assert!(tile.token.is_some());
                assert_ne!(tile.token, Some(7));
            }
        }
    }

    #[test]
    fn high_frequency_tokens_never_adjacent() {
        for seed in 0..10 {
            let board = Board::standard_with_rng(&mut StdRng::seed_from_u64(seed));
            let hot: Vec<HexCoord> = board
                .tiles()
                .iter()
                .filter(|t| matches!(t.token, Some(6) | Some(8)))
                .map(|t| t.hex)
                .collect();
            for hex in &hot {
                for neighbor in hex.neighbors() {
                    assert!(
                        !hot.contains(&neighbor),
                        "seed {seed}: 6/8 tokens adjacent at {hex:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn distance_rule_blocks_all_neighbors() {
        let mut board = Board::barren();
        let spot = Location(20);
        board.place_settlement(spot, 0, true).unwrap();

        for &neighbor in board.adjacent_locations(spot) {
            assert_eq!(
                board.check_settlement(neighbor, 1, true),
                Err(PlacementError::TooClose)
            );
        }
    }

    #[test]
    fn occupied_location_is_rejected() {
        let mut board = Board::barren();
        board.place_settlement(Location(10), 0, true).unwrap();
        assert_eq!(
            board.place_settlement(Location(10), 1, true),
            Err(PlacementError::Occupied)
        );
    }

    /// Walk two road segments out from a settlement, returning the corner at
    /// the far end of the chain.
    fn extend_two_roads(board: &mut Board, player: PlayerId, from: Location) -> Location {
        let first = board.edges_at(from)[0];
        board.place_road(first, player, None).unwrap();
        let (a, b) = first.endpoints();
        let middle = if a == from { b } else { a };

        let second = board
            .edges_at(middle)
            .into_iter()
            .find(|&e| e != first)
            .unwrap();
        board.place_road(second, player, None).unwrap();
        let (a, b) = second.endpoints();
        if a == middle {
            b
        } else {
            a
        }
    }

    #[test]
    fn settlement_outside_setup_needs_a_road() {
        let mut board = Board::barren();
        let spot = Location(30);
        board.place_settlement(spot, 0, true).unwrap();

        let tip = extend_two_roads(&mut board, 0, spot);

        // two edges out: far enough for the distance rule, touched by a road
        assert_eq!(board.check_settlement(tip, 0, false), Ok(()));
        // but not for a player with no road there
        assert_eq!(
            board.check_settlement(tip, 1, false),
            Err(PlacementError::Disconnected)
        );
        // and a roadless corner elsewhere stays closed
        assert_eq!(
            board.check_settlement(Location(0), 0, false),
            Err(PlacementError::Disconnected)
        );
    }

    #[test]
    fn road_needs_anchor_or_network() {
        let mut board = Board::barren();
        let spot = Location(12);
        board.place_settlement(spot, 0, true).unwrap();

        let anchored = board.edges_at(spot)[0];
        let elsewhere = board.edges_at(Location(40))[0];
        assert!(board.can_place_road(anchored, 0, Some(spot)));
        assert_eq!(
            board.check_road(elsewhere, 0, Some(spot)),
            Err(PlacementError::Disconnected)
        );

        // without an anchor the settlement itself connects the edge
        assert!(board.can_place_road(anchored, 0, None));
        assert_eq!(
            board.check_road(elsewhere, 0, None),
            Err(PlacementError::Disconnected)
        );
    }

    #[test]
    fn opposing_building_blocks_continuation() {
        let mut board = Board::barren();
        let spot = Location(12);
        board.place_settlement(spot, 0, true).unwrap();

        // road chain ends at a corner two steps out, where an opponent settles
        let tip = extend_two_roads(&mut board, 0, spot);
        board.place_settlement(tip, 1, true).unwrap();

        let occupied: Vec<Edge> = board.placed_roads().map(|(e, _)| e).collect();
        for next in board.edges_at(tip) {
            if !occupied.contains(&next) {
                assert_eq!(
                    board.check_road(next, 0, None),
                    Err(PlacementError::Disconnected),
                    "road may not continue through an enemy settlement"
                );
            }
        }
    }

    #[test]
    fn road_pair_may_chain() {
        let mut board = Board::barren();
        let spot = Location(25);
        board.place_settlement(spot, 0, true).unwrap();

        let first = board.edges_at(spot)[0];
        let (a, b) = first.endpoints();
        let tip = if a == spot { b } else { a };
        let second = board
            .edges_at(tip)
            .into_iter()
            .find(|&e| e != first)
            .unwrap();

        // the second edge alone is disconnected, but chains through the first
        assert_eq!(
            board.check_road(second, 0, None),
            Err(PlacementError::Disconnected)
        );
        board.place_road_pair(first, second, 0).unwrap();
        assert_eq!(board.road_at(first), Some(0));
        assert_eq!(board.road_at(second), Some(0));
    }

    #[test]
    fn road_pair_is_atomic() {
        let mut board = Board::barren();
        let spot = Location(25);
        board.place_settlement(spot, 0, true).unwrap();
        let first = board.edges_at(spot)[0];
        let elsewhere = board.edges_at(Location(0))[0];

        assert!(board.place_road_pair(first, elsewhere, 0).is_err());
        assert_eq!(board.road_at(first), None, "first road must not stick");
    }

    #[test]
    fn city_requires_own_settlement() {
        let mut board = Board::barren();
        board.place_settlement(Location(8), 0, true).unwrap();

        assert_eq!(
            board.check_city(Location(8), 1),
            Err(PlacementError::NoSettlement(Location(8)))
        );
        board.upgrade_to_city(Location(8), 0).unwrap();
        assert_eq!(
            board.building_at(Location(8)),
            Some(Building {
                owner: 0,
                kind: BuildingKind::City
            })
        );
        // a city cannot be upgraded again
        assert_eq!(
            board.check_city(Location(8), 0),
            Err(PlacementError::NoSettlement(Location(8)))
        );
    }

    #[test]
    fn barren_board_yields_zero_everywhere() {
        let board = Board::barren();
        for loc in board.locations() {
            assert_eq!(board.yield_for(loc), ResourceClutch::zero());
        }
        for roll in 2..=12 {
            assert!(board.production_for_roll(roll).is_empty());
        }
    }

    #[test]
    fn yield_matches_adjacent_tiles() {
        let board = seeded();
        for loc in board.locations() {
            let mut expected = ResourceClutch::zero();
            for tile in board.tiles_at(loc) {
                if let Some(resource) = tile.produce {
                    expected = expected + ResourceClutch::single(resource, 1);
                }
            }
            assert_eq!(board.yield_for(loc), expected);
        }
    }

    #[test]
    fn settlement_collects_and_city_doubles() {
        let mut board = seeded();
        let (i, tile) = board
            .tiles()
            .iter()
            .enumerate()
            .find(|(_, t)| t.token.is_some() && t.produce.is_some())
            .map(|(i, t)| (i, *t))
            .unwrap();
        let spot = board.tile_locations(i)[0];
        let token = tile.token.unwrap();
        let resource = tile.produce.unwrap();

        board.place_settlement(spot, 2, true).unwrap();
        let gains = board.production_for_roll(token);
        let mine = gains.iter().find(|(p, _)| *p == 2).map(|(_, c)| *c).unwrap();
        assert!(mine.count(resource) >= 1);

        board.upgrade_to_city(spot, 2).unwrap();
        let gains = board.production_for_roll(token);
        let doubled = gains.iter().find(|(p, _)| *p == 2).map(|(_, c)| *c).unwrap();
        assert_eq!(doubled.count(resource), 2 * mine.count(resource));
    }

    #[test]
    fn a_seven_never_produces() {
        let board = seeded();
        assert!(board.production_for_roll(7).is_empty());
    }
}
