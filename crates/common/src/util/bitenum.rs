// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{BitOr, BitOrAssign};

/// A barebones bitset over a small enum, used for trigger interest masks.
/// The payload enum provides its bit position via `ToPrimitive`.
use num_traits::ToPrimitive;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = ""))]
pub struct BitEnum<T: ToPrimitive> {
    value: u32,
    phantom: PhantomData<T>,
}

impl<T: ToPrimitive> BitEnum<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: 0,
            phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn to_u32(&self) -> u32 {
        self.value
    }

    pub fn new_with(value: T) -> Self {
        let mut s = Self::new();
        s.set(value);
        s
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }

    pub fn set(&mut self, value: T) {
        self.value |= 1 << value.to_u64().unwrap();
    }

    pub fn contains(&self, value: T) -> bool {
        self.value & (1 << value.to_u64().unwrap()) != 0
    }

    pub fn contains_all(&self, values: BitEnum<T>) -> bool {
        values.value & self.value == values.value
    }

    pub fn intersects(&self, values: BitEnum<T>) -> bool {
        values.value & self.value != 0
    }
}

impl<T: ToPrimitive> BitOr for BitEnum<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            value: self.value | rhs.value,
            phantom: PhantomData,
        }
    }
}

impl<T: ToPrimitive> Default for BitEnum<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ToPrimitive> BitOrAssign<T> for BitEnum<T> {
    fn bitor_assign(&mut self, rhs: T) {
        self.set(rhs);
    }
}

impl<T: ToPrimitive> BitOr<T> for BitEnum<T> {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self::Output {
        let mut s = self;
        s.set(rhs);
        s
    }
}

impl<T: ToPrimitive> From<T> for BitEnum<T> {
    fn from(value: T) -> Self {
        Self::new_with(value)
    }
}

impl<T: ToPrimitive> FromIterator<T> for BitEnum<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = Self::new();
        for v in iter {
            s.set(v);
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive;

    #[derive(Copy, Clone)]
    enum TestBit {
        A,
        B,
        C,
    }

    impl ToPrimitive for TestBit {
        fn to_i64(&self) -> Option<i64> {
            Some(*self as i64)
        }
        fn to_u64(&self) -> Option<u64> {
            Some(*self as u64)
        }
    }

    #[test]
    fn set_and_contains() {
        let mut b = BitEnum::new_with(TestBit::A);
        b |= TestBit::C;
        assert!(b.contains(TestBit::A));
        assert!(!b.contains(TestBit::B));
        assert!(b.contains(TestBit::C));
    }

    #[test]
    fn union_and_intersection() {
        let ab = BitEnum::new_with(TestBit::A) | TestBit::B;
        let bc = BitEnum::new_with(TestBit::B) | TestBit::C;
        assert!(ab.intersects(bc));
        assert!((ab | bc).contains_all(ab));
        assert!(!ab.contains_all(bc));
        assert!(BitEnum::<TestBit>::new().is_empty());
    }
}
