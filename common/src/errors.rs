use crate::{Loc, NO_LOC};
use std::fmt;

// a phase stops at its first hard error, so an error value is a single (position, kind) pair
// `Ty` is the semantic type of the checked language; keeping it generic avoids a cyclic
// dependency between this crate and `syntax`
pub struct Error<'a, Ty>(pub Loc, pub ErrorKind<'a, Ty>);

pub enum ErrorKind<'a, Ty> {
  // lexical / syntactic
  UnrecognizedChar(char),
  IntTooLarge(&'a str),
  SyntaxError,
  // context building
  DuplicateClass(&'a str),
  DuplicateField(&'a str),
  DuplicateMethod(&'a str),
  DuplicateParam(&'a str),
  DuplicateLocal(&'a str),
  UnknownType(&'a str),
  UnknownClass(&'a str),
  CyclicInheritance,
  BadMain,
  // typing
  UnboundIdent(&'a str),
  UnboundMethod { name: &'a str, owner: Ty },
  TypeMismatch { expect: Ty, actual: Ty, context: &'static str },
  ArgCountMismatch { name: &'a str, expect: u32, actual: u32 },
}

impl<Ty: fmt::Debug> fmt::Debug for Error<'_, Ty> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.0 {
      NO_LOC => write!(f, "*** Error: {:?}", self.1),
      loc => write!(f, "*** Error at {:?}: {:?}", loc, self.1),
    }
  }
}

impl<Ty: fmt::Debug> fmt::Debug for ErrorKind<'_, Ty> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    use ErrorKind::*;
    match self {
      UnrecognizedChar(ch) => write!(f, "unrecognized character '{}'", ch),
      IntTooLarge(s) => write!(f, "integer literal {} is too large", s),
      SyntaxError => write!(f, "syntax error"),
      DuplicateClass(name) => write!(f, "duplicate declaration of class '{}'", name),
      DuplicateField(name) => write!(f, "duplicate field '{}'", name),
      DuplicateMethod(name) => write!(f, "duplicate method '{}', overloading is not allowed", name),
      DuplicateParam(name) => write!(f, "duplicate parameter '{}'", name),
      DuplicateLocal(name) => write!(f, "duplicate local variable '{}'", name),
      UnknownType(name) => write!(f, "undeclared type '{}'", name),
      UnknownClass(name) => write!(f, "class '{}' not found", name),
      CyclicInheritance => write!(f, "illegal class inheritance (should be acyclic)"),
      BadMain => write!(f, "illegal shape of the main class"),
      UnboundIdent(name) => write!(f, "undeclared variable '{}'", name),
      UnboundMethod { name, owner } => write!(f, "no method '{}' on {:?}", name, owner),
      TypeMismatch { expect, actual, context } => write!(f, "incompatible types in {}: {:?} given, {:?} expected", context, actual, expect),
      ArgCountMismatch { name, expect, actual } => write!(f, "method '{}' expects {} argument(s) but {} given", name, expect, actual),
    }
  }
}
