use std::fmt;
use std::ops;

use serde::Serialize;

/// Integer playfield coordinate as stored in a `.osu` file.
///
/// Hit objects live on a 512x384 grid; all curve math happens on [`Pos2`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Vec2> for Pos2 {
    #[inline]
    fn from(v: Vec2) -> Self {
        Self {
            x: f64::from(v.x),
            y: f64::from(v.y),
        }
    }
}

/// Simple (x, y) coordinate / vector
#[derive(Copy, Clone, Default, PartialEq, Serialize)]
pub struct Pos2 {
    /// Position on the x-axis.
    pub x: f64,
    /// Position on the y-axis.
    pub y: f64,
}

impl Pos2 {
    /// Return the null vector.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Return the position's length squared.
    #[inline]
    pub fn length_squared(&self) -> f64 {
        self.dot(*self)
    }

    /// Return the position's length.
    #[inline]
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Return the dot product.
    #[inline]
    pub fn dot(&self, other: Self) -> f64 {
        (self.x * other.x) + (self.y * other.y)
    }

    /// Return the z-component of the cross product.
    #[inline]
    pub fn cross(&self, other: Self) -> f64 {
        (self.x * other.y) - (self.y * other.x)
    }

    /// Return the distance to another position.
    #[inline]
    pub fn distance(&self, other: Self) -> f64 {
        (*self - other).length()
    }

    /// Normalize the coordinates with respect to the vector's length.
    #[inline]
    pub fn normalize(self) -> Pos2 {
        let len = self.length();

        if len == 0.0 {
            return Pos2::zero();
        }

        self / len
    }

    #[inline]
    pub(crate) fn almost_eq(&self, other: Self) -> bool {
        (self.x - other.x).abs() < 1e-9 && (self.y - other.y).abs() < 1e-9
    }
}

impl ops::Add<Pos2> for Pos2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl ops::Sub<Pos2> for Pos2 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl ops::Mul<f64> for Pos2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl ops::Div<f64> for Pos2 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl ops::AddAssign for Pos2 {
    fn add_assign(&mut self, other: Self) {
        *self = Self {
            x: self.x + other.x,
            y: self.y + other.y,
        };
    }
}

impl fmt::Display for Pos2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Debug for Pos2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
