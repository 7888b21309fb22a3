use std::cmp::Ordering;
use std::fmt;

/// Outcome of the most recent comparison.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flag {
    Equal,
    Greater,
    Less,
}

impl Flag {
    /// Compares `a` with `b`.
    pub fn compare(a: u8, b: u8) -> Self {
        match a.cmp(&b) {
            Ordering::Equal => Flag::Equal,
            Ordering::Greater => Flag::Greater,
            Ordering::Less => Flag::Less,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Equal => write!(f, "E"),
            Flag::Greater => write!(f, "G"),
            Flag::Less => write!(f, "L"),
        }
    }
}

/// Flag register: empty until the first CMP, then holds exactly one [`Flag`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FlagRegister(Option<Flag>);

impl FlagRegister {
    /// Replaces the current state with `flag`.
    pub fn set(&mut self, flag: Flag) {
        self.0 = Some(flag);
    }

    /// Returns the last comparison outcome, if any comparison ran.
    pub fn get(&self) -> Option<Flag> {
        self.0
    }

    /// Returns `true` only if the last comparison found its operands equal.
    pub fn is_equal(&self) -> bool {
        self.0 == Some(Flag::Equal)
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}
