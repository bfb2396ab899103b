use common::{IgnoreResult, IndentPrinter};
use std::fmt::Write;
// `::` because this module shadows the crate's name
use ::vapor::{VFunc, VInstr, VInstrKind, VOperand, VaporProgram};

pub fn program(pr: &VaporProgram, p: &mut IndentPrinter) {
  for v in &pr.vtbl {
    write!(p, "const {}", v.name).ignore();
    p.indent(|p| for f in &v.func { write!(p, ":{}", f).ignore(); });
    writeln!(p).ignore();
  }
  for f in &pr.func {
    func(f, p);
  }
}

pub fn func(f: &VFunc, p: &mut IndentPrinter) {
  write!(p, "func {}({})", f.name, f.param.join(" ")).ignore();
  p.indent(|p| {
    // labels are interleaved with instructions by their source line
    let mut li = 0;
    for i in &f.body {
      while li < f.label.len() && f.label[li].line < i.line {
        write!(p, "{}:", f.label[li].name).ignore();
        li += 1;
      }
      instr(i, p);
    }
    while li < f.label.len() {
      write!(p, "{}:", f.label[li].name).ignore();
      li += 1;
    }
  });
  writeln!(p).ignore();
}

fn instr(i: &VInstr, p: &mut IndentPrinter) {
  use VInstrKind::*;
  match &i.kind {
    Assign { dst, src } => write!(p, "{} = {:?}", dst, src),
    Call { dst: Some(dst), addr, arg } => write!(p, "{} = call {:?}({})", dst, addr, operands(arg)),
    Call { dst: None, addr, arg } => write!(p, "call {:?}({})", addr, operands(arg)),
    BuiltIn { dst: Some(dst), op, arg } => write!(p, "{} = {}({})", dst, op.name(), operands(arg)),
    BuiltIn { dst: None, op, arg } => write!(p, "{}({})", op.name(), operands(arg)),
    MemWrite { base, off: 0, src } => write!(p, "[{:?}] = {:?}", base, src),
    MemWrite { base, off, src } => write!(p, "[{:?} + {}] = {:?}", base, off, src),
    MemRead { dst, base, off: 0 } => write!(p, "{} = [{:?}]", dst, base),
    MemRead { dst, base, off } => write!(p, "{} = [{:?} + {}]", dst, base, off),
    Branch { z, cond, target } => write!(p, "{} {:?} goto :{}", if *z { "if0" } else { "if" }, cond, target),
    Goto { target } => write!(p, "goto :{}", target),
    Ret { val: Some(v) } => write!(p, "ret {:?}", v),
    Ret { val: None } => write!(p, "ret"),
  }
  .ignore();
}

fn operands(args: &[VOperand]) -> String {
  args.iter().map(|a| format!("{:?}", a)).collect::<Vec<_>>().join(" ")
}
