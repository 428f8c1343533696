use glam::{IVec2, IVec3};
use serde::{Deserialize, Serialize};

/// Inclusive vertical extent of the world. Horizontal extent is unbounded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min_y: i32,
    pub max_y: i32,
}

impl WorldBounds {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self { min_y, max_y }
    }

    pub fn contains(&self, y: i32) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }
}

pub fn column_key(x: i32, z: i32) -> IVec2 {
    IVec2::new(x, z)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Face {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    pub fn normal_ivec3(&self) -> IVec3 {
        match self {
            Face::PosX => IVec3::X,
            Face::NegX => IVec3::NEG_X,
            Face::PosY => IVec3::Y,
            Face::NegY => IVec3::NEG_Y,
            Face::PosZ => IVec3::Z,
            Face::NegZ => IVec3::NEG_Z,
        }
    }

    pub fn neighbor_of(&self, pos: IVec3) -> IVec3 {
        pos + self.normal_ivec3()
    }
}
