use codegen::vaporm::MFunc;
use common::{IgnoreResult, IndentPrinter};
use std::fmt::Write;
use ::vapor::VTbl;

// the data segments survive allocation unchanged, only functions are rewritten
pub fn program(vtbl: &[VTbl], func: &[MFunc], p: &mut IndentPrinter) {
  for v in vtbl {
    write!(p, "const {}", v.name).ignore();
    p.indent(|p| for f in &v.func { write!(p, ":{}", f).ignore(); });
    writeln!(p).ignore();
  }
  for f in func {
    write!(p, "func {} [in {}, out {}, local {}]", f.name, f.in_count, f.out_count, f.local_count).ignore();
    p.indent(|p| for i in &f.body { write!(p, "{:?}", i).ignore(); });
    writeln!(p).ignore();
  }
}
