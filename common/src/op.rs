// minijava only has these operators; they are needed by both `syntax` and `vaporgen`,
// placing them here eliminates a dependency between those two crates
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinOp { Add, Sub, Mul, Lt, And }

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnOp { Not }
