pub mod errors;
pub mod indent_printer;
pub mod op;

pub use crate::{errors::*, indent_printer::*, op::*};
use hashbrown::hash_map::DefaultHashBuilder;
use std::fmt;

pub const MAIN_METHOD: &str = "main";
pub const LENGTH: &str = "length";
// everything on the vapor heap and stack is word sized
pub const WORD_SIZE: i32 = 4;

// DefaultHashBuilder is the default hash of hashbrown, seems faster than RandomState (the default hash of IndexMap/Set & std HashMap/Set)
// place these type alias here just for convenience
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, DefaultHashBuilder>;
pub type IndexSet<K> = indexmap::IndexSet<K, DefaultHashBuilder>;
pub type HashMap<K, V> = hashbrown::HashMap<K, V>;
pub type HashSet<K> = hashbrown::HashSet<K>;

// Loc(line, column), counting from 1
// so 0 is invalid for both, and Loc(0, 0) means NO_LOC
#[derive(Copy, Clone, Eq, PartialEq, Default, Ord, PartialOrd)]
pub struct Loc(pub u32, pub u32);

pub const NO_LOC: Loc = Loc(0, 0);

impl Loc {
  pub fn next_line(&mut self) {
    self.0 += 1;
    self.1 = 1;
  }

  pub fn next_col(&mut self) { self.1 += 1; }
}

impl fmt::Debug for Loc {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "({},{})", self.0, self.1)
  }
}
