use crate::lsra::{self, Allocation};
use crate::vaporm::{MFunc, MInstr, MOperand};
use crate::{liveness, Reg, Slot};
use vapor::{VFunc, VInstrKind, VOperand};

// $v0 and $v1 are free at every point the rewriter needs them: between instructions
// all allocated values sit in $s/$t or on the stack
const SCRATCH0: Reg = Reg::V(0);
const SCRATCH1: Reg = Reg::V(1);

pub fn work(f: &VFunc) -> MFunc {
  let live = liveness::work(f);
  let alloc = lsra::work(&live, &f.param);
  FuncGen { f, alloc, body: Vec::new() }.build()
}

struct FuncGen<'a> {
  f: &'a VFunc,
  alloc: Allocation,
  body: Vec<MInstr>,
}

impl<'a> FuncGen<'a> {
  fn build(mut self) -> MFunc {
    self.prologue();
    let f = self.f;
    let mut li = 0;
    for i in &f.body {
      while li < f.label.len() && f.label[li].line < i.line {
        self.body.push(MInstr::Label(f.label[li].name.clone()));
        li += 1;
      }
      self.instr(&i.kind);
    }
    while li < f.label.len() {
      self.body.push(MInstr::Label(f.label[li].name.clone()));
      li += 1;
    }
    MFunc {
      name: f.name.clone(),
      in_count: (f.param.len() as u32).saturating_sub(4),
      out_count: self.alloc.out_count,
      local_count: self.alloc.local_count,
      body: self.body,
    }
  }

  // park the callee registers the allocator handed out, then move the incoming
  // parameters ($a0..$a3, then in[i]) to wherever they were allocated
  fn prologue(&mut self) {
    let saves = self.alloc.callee_saved.clone();
    for &(r, slot) in &saves {
      self.body.push(MInstr::Assign { dst: MOperand::Local(slot), src: MOperand::Reg(r) });
    }
    let param = self.f.param.clone();
    for (i, p) in param.iter().enumerate() {
      let src = if i < 4 { MOperand::Reg(Reg::A(i as u32)) } else { MOperand::In(i as u32 - 4) };
      match self.slot(p) {
        Slot::Reg(r) => self.body.push(MInstr::Assign { dst: MOperand::Reg(r), src }),
        Slot::Local(l) => match src {
          MOperand::Reg(_) => self.body.push(MInstr::Assign { dst: MOperand::Local(l), src }),
          src => {
            self.body.push(MInstr::Assign { dst: MOperand::Reg(SCRATCH0), src });
            self.body.push(MInstr::Assign { dst: MOperand::Local(l), src: MOperand::Reg(SCRATCH0) });
          }
        },
        // already home
        Slot::In(_) => {}
      }
    }
  }

  fn slot(&self, v: &str) -> Slot { self.alloc.slot[v] }

  // the operand as the allocation maps it, with no materialization
  fn raw(&self, op: &VOperand) -> MOperand {
    match op {
      VOperand::Const(i) => MOperand::Const(*i),
      VOperand::Label(l) => MOperand::Label(l.clone()),
      VOperand::Str(s) => MOperand::Str(s.clone()),
      VOperand::Var(v) => match self.slot(v) {
        Slot::Reg(r) => MOperand::Reg(r),
        Slot::Local(i) => MOperand::Local(i),
        Slot::In(i) => MOperand::In(i),
      },
    }
  }

  // the operand in a register, loading through `scratch` when it lives on the stack
  // or is a literal
  fn reg(&mut self, op: &VOperand, scratch: Reg) -> Reg {
    match self.raw(op) {
      MOperand::Reg(r) => r,
      m => {
        self.body.push(MInstr::Assign { dst: MOperand::Reg(scratch), src: m });
        scratch
      }
    }
  }

  fn store(&mut self, s: Slot) -> MOperand {
    match s {
      Slot::Reg(r) => MOperand::Reg(r),
      Slot::Local(i) => MOperand::Local(i),
      Slot::In(i) => MOperand::In(i),
    }
  }

  fn instr(&mut self, k: &VInstrKind) {
    use VInstrKind::*;
    match k {
      Assign { dst, src } => match self.slot(dst) {
        Slot::Reg(r) => {
          let src = self.raw(src);
          self.body.push(MInstr::Assign { dst: MOperand::Reg(r), src });
        }
        s => {
          // memory destination wants a register source
          let r = self.reg(src, SCRATCH0);
          let dst = self.store(s);
          self.body.push(MInstr::Assign { dst, src: MOperand::Reg(r) });
        }
      },
      Call { dst, addr, arg } => {
        for (i, a) in arg.iter().enumerate() {
          if i < 4 {
            let src = self.raw(a);
            self.body.push(MInstr::Assign { dst: MOperand::Reg(Reg::A(i as u32)), src });
          } else {
            let r = self.reg(a, SCRATCH0);
            self.body.push(MInstr::Assign { dst: MOperand::Out(i as u32 - 4), src: MOperand::Reg(r) });
          }
        }
        let addr = match addr {
          VOperand::Label(l) => MOperand::Label(l.clone()),
          a => MOperand::Reg(self.reg(a, SCRATCH0)),
        };
        self.body.push(MInstr::Call { addr });
        if let Some(d) = dst {
          let dst = self.store(self.slot(d));
          self.body.push(MInstr::Assign { dst, src: MOperand::Reg(Reg::V(0)) });
        }
      }
      BuiltIn { dst, op, arg } => {
        let mut scratch = [SCRATCH0, SCRATCH1].iter().copied();
        let mut arg_m = Vec::with_capacity(arg.len());
        for a in arg {
          let m = match self.raw(a) {
            m @ MOperand::Local(_) | m @ MOperand::In(_) => {
              let sc = scratch.next().unwrap();
              self.body.push(MInstr::Assign { dst: MOperand::Reg(sc), src: m });
              MOperand::Reg(sc)
            }
            m => m,
          };
          arg_m.push(m);
        }
        match dst {
          None => self.body.push(MInstr::BuiltIn { dst: None, op: *op, arg: arg_m }),
          Some(d) => match self.slot(d) {
            Slot::Reg(r) => self.body.push(MInstr::BuiltIn { dst: Some(MOperand::Reg(r)), op: *op, arg: arg_m }),
            s => {
              self.body.push(MInstr::BuiltIn { dst: Some(MOperand::Reg(SCRATCH0)), op: *op, arg: arg_m });
              let dst = self.store(s);
              self.body.push(MInstr::Assign { dst, src: MOperand::Reg(SCRATCH0) });
            }
          },
        }
      }
      MemWrite { base, off, src } => {
        let base = self.reg(base, SCRATCH0);
        let src = match self.raw(src) {
          m @ MOperand::Local(_) | m @ MOperand::In(_) => {
            self.body.push(MInstr::Assign { dst: MOperand::Reg(SCRATCH1), src: m });
            MOperand::Reg(SCRATCH1)
          }
          m => m,
        };
        self.body.push(MInstr::MemWrite { base, off: *off, src });
      }
      MemRead { dst, base, off } => {
        let base = self.reg(base, SCRATCH0);
        match self.slot(dst) {
          Slot::Reg(r) => self.body.push(MInstr::MemRead { dst: r, base, off: *off }),
          s => {
            self.body.push(MInstr::MemRead { dst: SCRATCH1, base, off: *off });
            let dst = self.store(s);
            self.body.push(MInstr::Assign { dst, src: MOperand::Reg(SCRATCH1) });
          }
        }
      }
      Branch { z, cond, target } => {
        let cond = self.reg(cond, SCRATCH0);
        self.body.push(MInstr::Branch { z: *z, cond: MOperand::Reg(cond), target: target.clone() });
      }
      Goto { target } => self.body.push(MInstr::Goto { target: target.clone() }),
      Ret { val } => {
        if let Some(v) = val {
          let src = self.raw(v);
          self.body.push(MInstr::Assign { dst: MOperand::Reg(Reg::V(0)), src });
        }
        let saves = self.alloc.callee_saved.clone();
        for &(r, slot) in &saves {
          self.body.push(MInstr::Assign { dst: MOperand::Reg(r), src: MOperand::Local(slot) });
        }
        self.body.push(MInstr::Ret);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use vapor::{BuiltIn as B, VInstr, VOperand::*};

  fn func(param: &[&str], body: Vec<VInstrKind>) -> VFunc {
    VFunc {
      name: "f".to_owned(),
      param: param.iter().map(|s| s.to_string()).collect(),
      body: body.into_iter().enumerate().map(|(i, kind)| VInstr { line: i as u32 + 1, kind }).collect(),
      label: Vec::new(),
      line: 0,
    }
  }

  #[test]
  fn annotates_stack_usage() {
    let args = |n: usize| (0..n).map(|_| Const(0)).collect::<Vec<_>>();
    let f = func(&["p0", "p1", "p2", "p3", "p4", "p5"], vec![
      VInstrKind::Call { dst: None, addr: Label("g".into()), arg: args(6) },
      VInstrKind::Ret { val: Some(Var("p5".into())) },
    ]);
    let m = work(&f);
    assert_eq!(m.in_count, 2);
    assert_eq!(m.out_count, 2);
  }

  #[test]
  fn call_stages_arguments_and_reads_v0() {
    let f = func(&["a", "b"], vec![
      VInstrKind::Call { dst: Some("r".into()), addr: Label("g".into()), arg: vec![Var("a".into()), Var("b".into()), Const(7)] },
      VInstrKind::Ret { val: Some(Var("r".into())) },
    ]);
    let m = work(&f);
    let text: Vec<String> = m.body.iter().map(|i| format!("{:?}", i)).collect();
    let call_at = text.iter().position(|l| l == "call :g").unwrap();
    assert!(text[..call_at].iter().any(|l| l.starts_with("$a0 = ")));
    assert!(text[..call_at].iter().any(|l| l.starts_with("$a1 = ")));
    assert!(text[..call_at].iter().any(|l| l == "$a2 = 7"));
    assert!(text[call_at + 1].starts_with("$t") && text[call_at + 1].ends_with("= $v0"));
  }

  #[test]
  fn callee_saves_are_parked_and_restored() {
    // one value alive across a call forces a callee register
    let f = func(&[], vec![
      VInstrKind::Assign { dst: "a".into(), src: Const(1) },
      VInstrKind::Call { dst: None, addr: Label("g".into()), arg: vec![] },
      VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var("a".into())] },
      VInstrKind::Ret { val: None },
    ]);
    let m = work(&f);
    let text: Vec<String> = m.body.iter().map(|i| format!("{:?}", i)).collect();
    assert_eq!(text[0], "local[0] = $s0");
    assert_eq!(text[text.len() - 2], "$s0 = local[0]");
    assert_eq!(text[text.len() - 1], "ret");
    assert_eq!(m.local_count, 1);
  }
}
