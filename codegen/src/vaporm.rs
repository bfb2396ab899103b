use crate::Reg;
use std::fmt;
use vapor::BuiltIn;

// operands after allocation: machine registers, named stack slots, literals
#[derive(Clone)]
pub enum MOperand {
  Reg(Reg),
  Local(u32),
  In(u32),
  Out(u32),
  Const(i32),
  Label(String),
  Str(String),
}

pub enum MInstr {
  Assign { dst: MOperand, src: MOperand },
  // arguments are staged into $a0..$a3 / out[i] beforehand, the result sits in $v0
  Call { addr: MOperand },
  BuiltIn { dst: Option<MOperand>, op: BuiltIn, arg: Vec<MOperand> },
  MemWrite { base: Reg, off: i32, src: MOperand },
  MemRead { dst: Reg, base: Reg, off: i32 },
  Branch { z: bool, cond: MOperand, target: String },
  Goto { target: String },
  Label(String),
  Ret,
}

pub struct MFunc {
  pub name: String,
  pub in_count: u32,
  pub out_count: u32,
  pub local_count: u32,
  pub body: Vec<MInstr>,
}

impl fmt::Debug for MOperand {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      MOperand::Reg(r) => write!(f, "{:?}", r),
      MOperand::Local(i) => write!(f, "local[{}]", i),
      MOperand::In(i) => write!(f, "in[{}]", i),
      MOperand::Out(i) => write!(f, "out[{}]", i),
      MOperand::Const(i) => write!(f, "{}", i),
      MOperand::Label(l) => write!(f, ":{}", l),
      MOperand::Str(s) => write!(f, "\"{}\"", s),
    }
  }
}

impl fmt::Debug for MInstr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    use MInstr::*;
    match self {
      Assign { dst, src } => write!(f, "{:?} = {:?}", dst, src),
      Call { addr } => write!(f, "call {:?}", addr),
      BuiltIn { dst, op, arg } => {
        if let Some(dst) = dst {
          write!(f, "{:?} = ", dst)?;
        }
        write!(f, "{}(", op.name())?;
        for (i, a) in arg.iter().enumerate() {
          if i > 0 {
            write!(f, " ")?;
          }
          write!(f, "{:?}", a)?;
        }
        write!(f, ")")
      }
      MemWrite { base, off, src } => {
        if *off == 0 { write!(f, "[{:?}] = {:?}", base, src) } else { write!(f, "[{:?}+{}] = {:?}", base, off, src) }
      }
      MemRead { dst, base, off } => {
        if *off == 0 { write!(f, "{:?} = [{:?}]", dst, base) } else { write!(f, "{:?} = [{:?}+{}]", dst, base, off) }
      }
      Branch { z, cond, target } => write!(f, "{} {:?} goto :{}", if *z { "if0" } else { "if" }, cond, target),
      Goto { target } => write!(f, "goto :{}", target),
      Label(l) => write!(f, "{}:", l),
      Ret => write!(f, "ret"),
    }
  }
}
