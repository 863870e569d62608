//! The parsed form of a definition file.
//!
//! A definition file describes, line by line, which tags may appear in a
//! tagfile, what they hold and what their defaults are:
//!
//! ```text
//! # tag  VR  multiplicity  [default]
//! 01     US  1             101
//! 02     GR  1
//!   01   US  3
//!   ff   EN  0
//! ```
//!
//! Nodes live in one arena and refer to each other by [NodeId], so the whole
//! tree is released at once when the owning session goes away.

mod error;
mod parser;

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

pub use self::error::ParseError;

/// Value representation: the declared type of a definition.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub enum Vr {
    Signed,
    Unsigned,
    Float,
    Bool,
    String,
    Group,
    End,
}

impl Vr {
    pub const fn code(self) -> &'static str {
        use Vr::*;

        match self {
            Signed => "SI",
            Unsigned => "US",
            Float => "FP",
            Bool => "BO",
            String => "ST",
            Group => "GR",
            End => "EN",
        }
    }

    pub fn from_code(code: &str) -> Option<Vr> {
        use Vr::*;

        let vr = match code {
            "SI" => Signed,
            "US" => Unsigned,
            "FP" => Float,
            "BO" => Bool,
            "ST" => String,
            "GR" => Group,
            "EN" => End,
            _ => return None,
        };

        Some(vr)
    }

    pub const fn accepts_default(self) -> bool {
        matches!(self, Vr::Signed | Vr::Unsigned | Vr::Float | Vr::Bool)
    }
}

impl fmt::Display for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Debug for Vr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A scalar value, as declared for a default or as decoded from the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Unsigned(u32),
    Signed(i32),
    Float(f32),
    Bool(bool),
}

impl Value {
    /// Value representation a default of this kind is declared with.
    pub const fn vr(self) -> Vr {
        match self {
            Value::Unsigned(_) => Vr::Unsigned,
            Value::Signed(_) => Vr::Signed,
            Value::Float(_) => Vr::Float,
            Value::Bool(_) => Vr::Bool,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Signed(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One line of a definition file.
#[derive(Debug, Clone)]
pub struct Definition {
    pub(crate) tag: u8,
    pub(crate) vr: Vr,
    pub(crate) vm: u32,
    pub(crate) default: Option<Value>,
    pub(crate) line: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) child: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
}

impl Definition {
    /// Group end definitions always report [TAG_GROUP_END](crate::constants::TAG_GROUP_END).
    #[inline(always)]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    #[inline(always)]
    pub fn vr(&self) -> Vr {
        self.vr
    }

    /// Informational element count for scalars, maximum byte length for strings
    /// (0 meaning unbounded).
    #[inline(always)]
    pub fn multiplicity(&self) -> u32 {
        self.vm
    }

    #[inline(always)]
    pub fn default(&self) -> Option<Value> {
        self.default
    }

    #[inline(always)]
    pub fn line(&self) -> usize {
        self.line
    }

    /// The group definition this one is nested in.
    #[inline(always)]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// First definition inside this group. Always set for groups.
    #[inline(always)]
    pub fn first_child(&self) -> Option<NodeId> {
        self.child
    }

    #[inline(always)]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next
    }
}

#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub(crate) nodes: Vec<Definition>,
    pub(crate) root: Option<NodeId>,
}

impl Definitions {
    pub fn parse(text: &str) -> Result<Definitions, ParseError> {
        parser::parse(text)
    }

    /// First top-level definition, if the file declares any.
    #[inline(always)]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn top_level(&self) -> Siblings<'_> {
        self.siblings(self.root)
    }

    /// Contents of a group, including its closing `EN` definition.
    pub fn children(&self, id: NodeId) -> Siblings<'_> {
        self.siblings(self[id].child)
    }

    pub fn siblings(&self, first: Option<NodeId>) -> Siblings<'_> {
        Siblings {
            defs: self,
            next: first,
        }
    }

    /// Walks from `id` up through the groups enclosing it.
    pub(crate) fn ancestry(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Definition)> + '_ {
        std::iter::successors(Some(id), move |id| self[*id].parent).map(move |id| (id, &self[id]))
    }
}

impl Index<NodeId> for Definitions {
    type Output = Definition;

    #[inline(always)]
    fn index(&self, id: NodeId) -> &Definition {
        &self.nodes[id.0]
    }
}

impl FromStr for Definitions {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Definitions::parse(s)
    }
}

pub struct Siblings<'a> {
    defs: &'a Definitions,
    next: Option<NodeId>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = (NodeId, &'a Definition);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let def = &self.defs[id];
        self.next = def.next;
        Some((id, def))
    }
}
