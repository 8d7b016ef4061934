//! # Orientation
//!
//! The sensor reports which edge of the device points up. We turn that
//! into a clockwise rotation for the displays and a calibration matrix
//! for absolute pointing devices, so both always agree.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Device is upright.
    Normal,
    /// Right edge points up.
    RightUp,
    /// Device is upside down.
    BottomUp,
    /// Left edge points up.
    LeftUp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

/// Rotation plus the matching 2x3 libinput calibration matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub rotation: Rotation,
    pub matrix: [f64; 6],
}

const NORMAL_MATRIX: [f64; 6] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
const RIGHT_UP_MATRIX: [f64; 6] = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0];
const BOTTOM_UP_MATRIX: [f64; 6] = [-1.0, 0.0, 1.0, 0.0, -1.0, 1.0];
const LEFT_UP_MATRIX: [f64; 6] = [0.0, -1.0, 1.0, 1.0, 0.0, 0.0];

impl Orientation {
    /// The name iio-sensor-proxy uses for this orientation.
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Normal => "normal",
            Self::RightUp => "right-up",
            Self::BottomUp => "bottom-up",
            Self::LeftUp => "left-up",
        }
    }

    pub fn transform(&self) -> Transform {
        let matrix = match *self {
            Self::Normal => NORMAL_MATRIX,
            Self::RightUp => RIGHT_UP_MATRIX,
            Self::BottomUp => BOTTOM_UP_MATRIX,
            Self::LeftUp => LEFT_UP_MATRIX,
        };
        Transform {
            rotation: Rotation::from(*self),
            matrix,
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal" => Ok(Self::Normal),
            "right-up" => Ok(Self::RightUp),
            "bottom-up" => Ok(Self::BottomUp),
            "left-up" => Ok(Self::LeftUp),
            other => Err(Error::UnrecognizedOrientation(other.to_owned())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Rotation {
    /// Convert to clockwise degrees.
    pub fn to_degrees(&self) -> isize {
        match *self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Clockwise180 => 180,
            Self::Clockwise270 => 270,
        }
    }
}

impl From<Orientation> for Rotation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Normal => Rotation::None,
            Orientation::RightUp => Rotation::Clockwise90,
            Orientation::BottomUp => Rotation::Clockwise180,
            Orientation::LeftUp => Rotation::Clockwise270,
        }
    }
}

impl Transform {
    pub fn degrees(&self) -> isize {
        self.rotation.to_degrees()
    }
}

/// Look up the transform for an orientation name reported by the sensor.
pub fn map(orientation: &str) -> Result<Transform> {
    Ok(orientation.parse::<Orientation>()?.transform())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_to_degrees() {
        assert_eq!(Rotation::None.to_degrees(), 0);
        assert_eq!(Rotation::Clockwise90.to_degrees(), 90);
        assert_eq!(Rotation::Clockwise180.to_degrees(), 180);
        assert_eq!(Rotation::Clockwise270.to_degrees(), 270);
    }

    #[test]
    fn mapping_table() -> Result<()> {
        let normal = map("normal")?;
        assert_eq!(normal.degrees(), 0);
        assert_eq!(normal.matrix, [1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

        let right_up = map("right-up")?;
        assert_eq!(right_up.degrees(), 90);
        assert_eq!(right_up.matrix, [0.0, 1.0, 0.0, -1.0, 0.0, 1.0]);

        let bottom_up = map("bottom-up")?;
        assert_eq!(bottom_up.degrees(), 180);
        assert_eq!(bottom_up.matrix, [-1.0, 0.0, 1.0, 0.0, -1.0, 1.0]);

        let left_up = map("left-up")?;
        assert_eq!(left_up.degrees(), 270);
        assert_eq!(left_up.matrix, [0.0, -1.0, 1.0, 1.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn names_round_trip() -> Result<()> {
        for orientation in [
            Orientation::Normal,
            Orientation::RightUp,
            Orientation::BottomUp,
            Orientation::LeftUp,
        ] {
            assert_eq!(orientation.to_string().parse::<Orientation>()?, orientation);
        }
        Ok(())
    }

    #[test]
    fn unrecognized_orientations() {
        for name in ["sideways", "", "Normal", "undefined", "\"normal\""] {
            match map(name) {
                Err(Error::UnrecognizedOrientation(got)) => assert_eq!(got, name),
                other => panic!("expected UnrecognizedOrientation for {:?}, got {:?}", name, other),
            }
        }
    }
}
