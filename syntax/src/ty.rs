use common::Loc;
use std::fmt;

// the type as written in source, not yet validated against the class table
pub enum SynTyKind<'a> {
  Int,
  Bool,
  IntArray,
  Named(&'a str),
}

pub struct SynTy<'a> {
  pub loc: Loc,
  pub kind: SynTyKind<'a>,
}

// semantic type; equality is structural over the tag, class types compare by name
// `Void` never appears in a well-formed program, it only shows up in error reports
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Ty<'a> {
  Int,
  Bool,
  IntArray,
  Class(&'a str),
  Void,
}

impl<'a> Ty<'a> {
  pub fn from_syn(s: &SynTy<'a>) -> Ty<'a> {
    match s.kind {
      SynTyKind::Int => Ty::Int,
      SynTyKind::Bool => Ty::Bool,
      SynTyKind::IntArray => Ty::IntArray,
      SynTyKind::Named(n) => Ty::Class(n),
    }
  }

  pub fn is_class(&self) -> bool { if let Ty::Class(_) = self { true } else { false } }
}

impl fmt::Debug for Ty<'_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match self {
      Ty::Int => write!(f, "int"),
      Ty::Bool => write!(f, "boolean"),
      Ty::IntArray => write!(f, "int[]"),
      Ty::Class(name) => write!(f, "class {}", name),
      Ty::Void => write!(f, "void"),
    }
  }
}
