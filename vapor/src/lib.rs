pub mod parser;

use std::fmt;

#[derive(Default)]
pub struct VaporProgram {
  pub vtbl: Vec<VTbl>,
  pub func: Vec<VFunc>,
}

// `const vmt_<class>` data segment; one `:<owner>.<method>` entry per vtable slot
pub struct VTbl {
  pub name: String,
  pub func: Vec<String>,
}

pub struct VFunc {
  pub name: String,
  pub param: Vec<String>,
  pub body: Vec<VInstr>,
  // labels are kept out of `body`; their source line orders them between instructions
  pub label: Vec<VLabel>,
  // line of the `func` header, the program point of every parameter
  pub line: u32,
}

pub struct VLabel {
  pub name: String,
  pub line: u32,
}

pub struct VInstr {
  // monotonically increasing program point within the function
  pub line: u32,
  pub kind: VInstrKind,
}

#[derive(Clone)]
pub enum VOperand {
  Const(i32),
  Var(String),
  // an address literal `:name` (a function, a vtable or a jump target)
  Label(String),
  // only `Error` takes a string
  Str(String),
}

pub enum VInstrKind {
  Assign { dst: String, src: VOperand },
  Call { dst: Option<String>, addr: VOperand, arg: Vec<VOperand> },
  BuiltIn { dst: Option<String>, op: BuiltIn, arg: Vec<VOperand> },
  MemWrite { base: VOperand, off: i32, src: VOperand },
  MemRead { dst: String, base: VOperand, off: i32 },
  // z selects `if0` (branch when zero) over `if` (branch when nonzero)
  Branch { z: bool, cond: VOperand, target: String },
  Goto { target: String },
  Ret { val: Option<VOperand> },
}

#[derive(Copy, Clone, Eq, PartialEq)]
pub enum BuiltIn { Add, Sub, MulS, LtS, Eq, HeapAllocZ, PrintIntS, Error }

impl BuiltIn {
  pub fn name(self) -> &'static str {
    use BuiltIn::*;
    match self { Add => "Add", Sub => "Sub", MulS => "MulS", LtS => "LtS", Eq => "Eq", HeapAllocZ => "HeapAllocZ", PrintIntS => "PrintIntS", Error => "Error" }
  }

  pub fn from_name(name: &str) -> Option<BuiltIn> {
    use BuiltIn::*;
    match name {
      "Add" => Some(Add),
      "Sub" => Some(Sub),
      "MulS" => Some(MulS),
      "LtS" => Some(LtS),
      "Eq" => Some(Eq),
      "HeapAllocZ" => Some(HeapAllocZ),
      "PrintIntS" => Some(PrintIntS),
      "Error" => Some(Error),
      _ => None,
    }
  }
}

impl fmt::Debug for VOperand {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      VOperand::Const(i) => write!(f, "{}", i),
      VOperand::Var(v) => write!(f, "{}", v),
      VOperand::Label(l) => write!(f, ":{}", l),
      VOperand::Str(s) => write!(f, "\"{}\"", s),
    }
  }
}
