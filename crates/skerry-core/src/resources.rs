//! Resource kinds, the immutable `ResourceClutch` aggregate, and build costs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// The five tradeable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Grain,
    Lumber,
    Ore,
    Wool,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Grain,
        Resource::Lumber,
        Resource::Ore,
        Resource::Wool,
    ];
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Brick => "brick",
            Resource::Grain => "grain",
            Resource::Lumber => "lumber",
            Resource::Ore => "ore",
            Resource::Wool => "wool",
        };
        f.write_str(name)
    }
}

/// An aggregate count of each resource kind.
///
/// A clutch is an immutable value: operations return new instances instead of
/// mutating in place, and subtraction refuses to go negative in any
/// component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClutch {
    brick: u32,
    grain: u32,
    lumber: u32,
    ore: u32,
    wool: u32,
}

impl ResourceClutch {
    pub const fn new(brick: u32, grain: u32, lumber: u32, ore: u32, wool: u32) -> Self {
        Self {
            brick,
            grain,
            lumber,
            ore,
            wool,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0, 0, 0)
    }

    /// A clutch holding `amount` of a single resource kind.
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut clutch = Self::zero();
        match resource {
            Resource::Brick => clutch.brick = amount,
            Resource::Grain => clutch.grain = amount,
            Resource::Lumber => clutch.lumber = amount,
            Resource::Ore => clutch.ore = amount,
            Resource::Wool => clutch.wool = amount,
        }
        clutch
    }

    pub fn count(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Grain => self.grain,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Wool => self.wool,
        }
    }

    pub fn total(&self) -> u32 {
        self.brick + self.grain + self.lumber + self.ore + self.wool
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Whether every component of `other` fits inside this clutch.
    pub fn contains(&self, other: ResourceClutch) -> bool {
        self.brick >= other.brick
            && self.grain >= other.grain
            && self.lumber >= other.lumber
            && self.ore >= other.ore
            && self.wool >= other.wool
    }

    /// Componentwise subtraction; `None` if any count would go negative.
    pub fn checked_sub(self, other: ResourceClutch) -> Option<ResourceClutch> {
        Some(Self {
            brick: self.brick.checked_sub(other.brick)?,
            grain: self.grain.checked_sub(other.grain)?,
            lumber: self.lumber.checked_sub(other.lumber)?,
            ore: self.ore.checked_sub(other.ore)?,
            wool: self.wool.checked_sub(other.wool)?,
        })
    }

    /// Remove every unit of one resource kind, returning the remainder and
    /// the amount taken.
    pub fn drain(self, resource: Resource) -> (ResourceClutch, u32) {
        let taken = self.count(resource);
        let rest = self
            .checked_sub(ResourceClutch::single(resource, taken))
            .unwrap_or(self);
        (rest, taken)
    }
}

impl Add for ResourceClutch {
    type Output = ResourceClutch;

    fn add(self, rhs: ResourceClutch) -> ResourceClutch {
        Self {
            brick: self.brick + rhs.brick,
            grain: self.grain + rhs.grain,
            lumber: self.lumber + rhs.lumber,
            ore: self.ore + rhs.ore,
            wool: self.wool + rhs.wool,
        }
    }
}

/// Build costs.
pub mod costs {
    use super::ResourceClutch;

    /// Road: 1 brick, 1 lumber.
    pub const ROAD: ResourceClutch = ResourceClutch::new(1, 0, 1, 0, 0);

    /// Settlement: 1 brick, 1 grain, 1 lumber, 1 wool.
    pub const SETTLEMENT: ResourceClutch = ResourceClutch::new(1, 1, 1, 0, 1);

    /// City upgrade: 2 grain, 3 ore.
    pub const CITY: ResourceClutch = ResourceClutch::new(0, 2, 0, 3, 0);

    /// Development card: 1 grain, 1 ore, 1 wool.
    pub const DEVELOPMENT_CARD: ResourceClutch = ResourceClutch::new(0, 1, 0, 1, 1);
}
