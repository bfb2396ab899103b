pub mod liveness;
pub mod lsra;
pub mod vaporm;
pub mod vaporm_gen;

use std::fmt;

// $s registers survive calls, $t registers do not
// $a and $v never leave the calling convention and are not handed out by the allocator;
// $v0 and $v1 double as the scratch registers of the rewriter
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Reg {
  S(u32),
  T(u32),
  A(u32),
  V(u32),
}

pub const CALLEE_N: u32 = 8;
pub const CALLER_N: u32 = 9;
pub const TOTAL_REGISTERS: u32 = CALLEE_N + CALLER_N;

impl Reg {
  pub fn is_callee(self) -> bool { if let Reg::S(_) = self { true } else { false } }
}

impl fmt::Debug for Reg {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Reg::S(i) => write!(f, "$s{}", i),
      Reg::T(i) => write!(f, "$t{}", i),
      Reg::A(i) => write!(f, "$a{}", i),
      Reg::V(i) => write!(f, "$v{}", i),
    }
  }
}

// where a vapor variable lives after allocation
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Slot {
  Reg(Reg),
  Local(u32),
  // parameters past the fourth already have a stack home in `in[i]`
  In(u32),
}
