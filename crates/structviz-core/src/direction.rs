use crate::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Named point on an element's bounds used as a connector endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TopCenter,
    BottomCenter,
    LeftCenter,
    RightCenter,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::TopCenter,
        Direction::BottomCenter,
        Direction::LeftCenter,
        Direction::RightCenter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopCenter => "topCenter",
            Direction::BottomCenter => "bottomCenter",
            Direction::LeftCenter => "leftCenter",
            Direction::RightCenter => "rightCenter",
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::TopCenter => Direction::BottomCenter,
            Direction::BottomCenter => Direction::TopCenter,
            Direction::LeftCenter => Direction::RightCenter,
            Direction::RightCenter => Direction::LeftCenter,
        }
    }

    pub fn is_opposite_of(self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::TopCenter | Direction::BottomCenter)
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::InvalidDirection {
                direction: s.to_string(),
            })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
