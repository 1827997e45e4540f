use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based position of an atom in its molecule's atom list.
///
/// Indices are only stable between structural edits: deleting an atom
/// renumbers every atom after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomIndex(usize);

/// 1-based position of a bond in its molecule's bond list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BondIndex(usize);

macro_rules! one_based_index {
    ($name:ident) => {
        impl $name {
            pub fn new(value: usize) -> Self {
                assert!(value > 0, concat!(stringify!($name), " is 1-based"));
                Self(value)
            }

            pub fn get(self) -> usize {
                self.0
            }

            /// Zero-based offset into the owning vector.
            pub(crate) fn slot(self) -> usize {
                self.0 - 1
            }

            pub(crate) fn from_slot(slot: usize) -> Self {
                Self(slot + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

one_based_index!(AtomIndex);
one_based_index!(BondIndex);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondType {
    #[default]
    Normal,
    /// Wedge pointing up out of the plane, narrow at the `from` atom.
    Inclined,
    /// Hashed wedge pointing down, narrow at the `from` atom.
    Declined,
    /// Unknown stereochemistry (squiggle).
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    pub x: f32,
    pub y: f32,
    pub charge: i32,
    pub unpaired: u8,
    /// Mass number; 0 means natural abundance.
    pub isotope: u16,
    /// Explicit hydrogen count. `None` lets the count be derived from valence.
    pub hydrogens: Option<u8>,
    pub map_num: u32,
    pub extra: Vec<String>,
    pub transient: Vec<String>,
}

impl Atom {
    pub fn new(element: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            element: element.into(),
            x,
            y,
            ..Self::default()
        }
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self {
            element: "C".to_string(),
            x: 0.0,
            y: 0.0,
            charge: 0,
            unpaired: 0,
            isotope: 0,
            hydrogens: None,
            map_num: 0,
            extra: Vec::new(),
            transient: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub from: AtomIndex,
    pub to: AtomIndex,
    /// 0 is an explicit zero-order bond; 1-4 are conventional orders.
    pub order: u8,
    pub kind: BondType,
    pub extra: Vec<String>,
    pub transient: Vec<String>,
}

impl Bond {
    pub fn new(from: AtomIndex, to: AtomIndex, order: u8) -> Self {
        Self {
            from,
            to,
            order,
            kind: BondType::Normal,
            extra: Vec::new(),
            transient: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: BondType) -> Self {
        self.kind = kind;
        self
    }

    pub fn touches(&self, atom: AtomIndex) -> bool {
        self.from == atom || self.to == atom
    }
}
