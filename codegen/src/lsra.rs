use crate::liveness::{LiveInterval, Liveness};
use crate::{Reg, Slot, CALLEE_N, CALLER_N, TOTAL_REGISTERS};
use common::HashMap;

pub struct Allocation {
  pub slot: HashMap<String, Slot>,
  pub local_count: u32,
  pub out_count: u32,
  // callee registers handed out, with the local slot the prologue parks them in
  pub callee_saved: Vec<(Reg, u32)>,
}

// linear scan register allocation, Poletto & Sarkar figure 1, with two twists:
// an after-call interval only ever receives (or steals) a callee-saved register,
// and spilled parameters past the fourth reuse their incoming `in[i]` slot
pub fn work(live: &Liveness, param: &[String]) -> Allocation {
  let vars: Vec<(&String, &LiveInterval)> = live.var.iter().collect();
  let mut order: Vec<usize> = (0..vars.len()).collect();
  order.sort_by_key(|&i| vars[i].1.start);
  let mut a = Lsra {
    reg: vec![None; vars.len()],
    spill: vec![None; vars.len()],
    active: Vec::new(),
    free: Vec::new(),
    next_callee: 0,
    next_caller: 0,
    local_count: 0,
    callee_saved: Vec::new(),
    param_idx: param.iter().enumerate().map(|(i, p)| (p.as_str(), i as u32)).collect(),
  };
  for &i in &order {
    let v = vars[i].1;
    a.expire(v.start, &vars);
    let callee_available = a.free.iter().any(|r| r.is_callee()) || a.next_callee < CALLEE_N;
    if a.active.len() as u32 == TOTAL_REGISTERS || (v.after_call && !callee_available) {
      a.spill_at(i, &vars);
    } else {
      let r = a.free_register(v.after_call);
      a.reg[i] = Some(r);
      a.insert_active(i, &vars);
    }
  }
  let mut slot = HashMap::new();
  for (i, (name, _)) in vars.iter().enumerate() {
    let s = match (a.reg[i], a.spill[i]) {
      (Some(r), _) => Slot::Reg(r),
      (_, Some(s)) => s,
      _ => unreachable!("every interval is either colored or spilled"),
    };
    slot.insert((*name).clone(), s);
  }
  Allocation { slot, local_count: a.local_count, out_count: live.out_count, callee_saved: a.callee_saved }
}

struct Lsra<'a> {
  reg: Vec<Option<Reg>>,
  spill: Vec<Option<Slot>>,
  // indices into the interval list, kept sorted by interval end
  active: Vec<usize>,
  free: Vec<Reg>,
  next_callee: u32,
  next_caller: u32,
  local_count: u32,
  callee_saved: Vec<(Reg, u32)>,
  param_idx: HashMap<&'a str, u32>,
}

type Vars<'b> = [(&'b String, &'b LiveInterval)];

impl<'a> Lsra<'a> {
  fn expire(&mut self, start: u32, vars: &Vars) {
    while let Some(&j) = self.active.first() {
      if vars[j].1.end >= start {
        return;
      }
      self.active.remove(0);
      self.free.push(self.reg[j].unwrap());
    }
  }

  fn insert_active(&mut self, i: usize, vars: &Vars) {
    let end = vars[i].1.end;
    let pos = self.active.iter().position(|&j| vars[j].1.end > end).unwrap_or(self.active.len());
    self.active.insert(pos, i);
  }

  fn free_register(&mut self, after_call: bool) -> Reg {
    if after_call {
      // never fall back to a caller-saved register here
      if let Some(pos) = self.free.iter().position(|r| r.is_callee()) {
        return self.free.remove(pos);
      }
      return self.fresh_callee();
    }
    if !self.free.is_empty() {
      return self.free.remove(0);
    }
    if self.next_caller < CALLER_N {
      let r = Reg::T(self.next_caller);
      self.next_caller += 1;
      r
    } else {
      self.fresh_callee()
    }
  }

  // taking a fresh $s reserves the local slot its previous value is parked in
  fn fresh_callee(&mut self) -> Reg {
    let r = Reg::S(self.next_callee);
    self.next_callee += 1;
    self.callee_saved.push((r, self.local_count));
    self.local_count += 1;
    r
  }

  fn spill_at(&mut self, i: usize, vars: &Vars) {
    let v = vars[i].1;
    // victim: the furthest-ending active interval; an after-call interval may only
    // inherit a callee register, so restrict the candidates accordingly
    let victim = if v.after_call {
      self.active.iter().rposition(|&j| self.reg[j].map(Reg::is_callee).unwrap_or(false))
    } else if self.active.is_empty() {
      None
    } else {
      Some(self.active.len() - 1)
    };
    match victim {
      Some(pos) if vars[self.active[pos]].1.end > v.end => {
        let j = self.active.remove(pos);
        self.reg[i] = self.reg[j].take();
        self.spill[j] = Some(self.slot_for(vars[j].0));
        self.insert_active(i, vars);
      }
      _ => self.spill[i] = Some(self.slot_for(vars[i].0)),
    }
  }

  fn slot_for(&mut self, name: &str) -> Slot {
    match self.param_idx.get(name) {
      Some(&idx) if idx >= 4 => Slot::In(idx - 4),
      _ => {
        let s = Slot::Local(self.local_count);
        self.local_count += 1;
        s
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::liveness;
  use vapor::{BuiltIn as B, VFunc, VInstr, VInstrKind, VOperand::*};

  fn func(param: &[&str], body: Vec<VInstrKind>) -> VFunc {
    VFunc {
      name: "f".to_owned(),
      param: param.iter().map(|s| s.to_string()).collect(),
      body: body.into_iter().enumerate().map(|(i, kind)| VInstr { line: i as u32 + 1, kind }).collect(),
      label: Vec::new(),
      line: 0,
    }
  }

  fn allocate(f: &VFunc) -> (Liveness, Allocation) {
    let live = liveness::work(f);
    let alloc = work(&live, &f.param);
    (live, alloc)
  }

  // no two intervals that overlap may share a register
  fn assert_no_overlap(live: &Liveness, alloc: &Allocation) {
    let v: Vec<_> = live.var.iter().collect();
    for i in 0..v.len() {
      for j in i + 1..v.len() {
        let (a, b) = (v[i].1, v[j].1);
        if a.start <= b.end && b.start <= a.end {
          if let (Slot::Reg(x), Slot::Reg(y)) = (alloc.slot[v[i].0], alloc.slot[v[j].0]) {
            assert_ne!(x, y, "{} and {} overlap in {:?}", v[i].0, v[j].0, x);
          }
        }
      }
    }
  }

  #[test]
  fn call_crossing_values_get_callee_registers() {
    let mut body = Vec::new();
    for v in &["a", "b", "c", "d", "e"] {
      body.push(VInstrKind::Assign { dst: v.to_string(), src: Const(1) });
    }
    body.push(VInstrKind::Call { dst: Some("x".into()), addr: Label("g".into()), arg: vec![] });
    for v in &["a", "b", "c", "d", "e"] {
      body.push(VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var(v.to_string())] });
    }
    let f = func(&[], body);
    let (live, alloc) = allocate(&f);
    assert_no_overlap(&live, &alloc);
    for v in &["a", "b", "c", "d", "e"] {
      match alloc.slot[*v] {
        Slot::Reg(r) => assert!(r.is_callee(), "{} must survive the call, got {:?}", v, r),
        s => panic!("{} unexpectedly spilled to {:?}", v, s),
      }
    }
    // x is dead after its only use, a caller register is fine
    match alloc.slot["x"] {
      Slot::Reg(_) => {}
      s => panic!("x unexpectedly spilled to {:?}", s),
    }
    assert_eq!(alloc.callee_saved.len() as u32, alloc.local_count);
  }

  #[test]
  fn more_intervals_than_registers_spill() {
    // 20 values all written up front and all read at the bottom, so they overlap
    let n = 20;
    let names: Vec<String> = (0..n).map(|i| format!("v{}", i)).collect();
    let mut body = Vec::new();
    for v in &names {
      body.push(VInstrKind::Assign { dst: v.clone(), src: Const(1) });
    }
    for v in &names {
      body.push(VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var(v.clone())] });
    }
    let f = func(&[], body);
    let (live, alloc) = allocate(&f);
    assert_no_overlap(&live, &alloc);
    let spilled = names.iter().filter(|v| if let Slot::Reg(_) = alloc.slot[v.as_str()] { false } else { true }).count() as u32;
    assert_eq!(spilled, n - TOTAL_REGISTERS);
    // spill slots plus the parking slots of the callee registers that were handed out
    assert_eq!(alloc.local_count, spilled + alloc.callee_saved.len() as u32);
  }

  #[test]
  fn spilled_late_parameters_reuse_their_in_slot() {
    let param: Vec<&str> = vec!["p0", "p1", "p2", "p3", "p4", "p5"];
    // enough long-lived locals to evict the parameters
    let n = 18;
    let names: Vec<String> = (0..n).map(|i| format!("v{}", i)).collect();
    let mut body = Vec::new();
    for v in &names {
      body.push(VInstrKind::Assign { dst: v.clone(), src: Const(1) });
    }
    for v in &names {
      body.push(VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var(v.clone())] });
    }
    for p in &param {
      body.push(VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var(p.to_string())] });
    }
    let f = func(&param, body);
    let (live, alloc) = allocate(&f);
    assert_no_overlap(&live, &alloc);
    for (i, p) in param.iter().enumerate() {
      if let Slot::In(s) = alloc.slot[*p] {
        assert_eq!(s as usize, i - 4, "{} must reuse its incoming slot", p);
      }
    }
  }
}
