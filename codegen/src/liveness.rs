use common::{HashSet, IndexMap};
use vapor::{VFunc, VInstr, VInstrKind, VOperand};

// one record per variable, produced by a single walk over the function in source order
pub struct LiveInterval {
  // inclusive range of program points
  pub start: u32,
  pub end: u32,
  pub before_call: bool,
  pub after_call: bool,
  pub before_labels: HashSet<String>,
  pub after_labels: HashSet<String>,
}

pub struct Liveness {
  // insertion order is parameters first, then first-write order; the allocator
  // uses it as the tie break when sorting by start
  pub var: IndexMap<String, LiveInterval>,
  pub out_count: u32,
}

pub fn work(f: &VFunc) -> Liveness {
  let mut a = Analysis { var: IndexMap::default(), out_count: 0, call_lines: Vec::new() };
  for p in &f.param {
    a.var.insert(p.clone(), interval(f.line));
  }
  let mut li = 0;
  for i in &f.body {
    // a passed label definition goes into before_labels of every variable known so far
    while li < f.label.len() && f.label[li].line < i.line {
      for v in a.var.values_mut() {
        v.before_labels.insert(f.label[li].name.clone());
      }
      li += 1;
    }
    a.instr(i);
  }
  let Analysis { mut var, out_count, call_lines } = a;
  // a variable is live across a call iff some call line falls strictly inside its
  // final range; this is what keeps $t registers away from call-crossing values
  for v in var.values_mut() {
    if call_lines.iter().any(|&c| v.start < c && c < v.end) {
      v.after_call = true;
    }
  }
  Liveness { var, out_count }
}

fn interval(line: u32) -> LiveInterval {
  LiveInterval {
    start: line,
    end: line,
    before_call: false,
    after_call: false,
    before_labels: HashSet::new(),
    after_labels: HashSet::new(),
  }
}

struct Analysis {
  var: IndexMap<String, LiveInterval>,
  out_count: u32,
  call_lines: Vec<u32>,
}

impl Analysis {
  fn instr(&mut self, i: &VInstr) {
    use VInstrKind::*;
    let line = i.line;
    match &i.kind {
      Assign { dst, src } => {
        self.read(src, line);
        self.write(dst, line);
      }
      Call { dst, addr, arg } => {
        for a in arg {
          self.read(a, line);
        }
        self.read(addr, line);
        if arg.len() > 4 {
          self.out_count = self.out_count.max(arg.len() as u32 - 4);
        }
        for v in self.var.values_mut() {
          v.before_call = true;
        }
        self.call_lines.push(line);
        if let Some(d) = dst {
          self.write(d, line);
        }
      }
      // builtins expand to plain instructions or syscalls, they clobber nothing
      BuiltIn { dst, arg, .. } => {
        for a in arg {
          self.read(a, line);
        }
        if let Some(d) = dst {
          self.write(d, line);
        }
      }
      MemWrite { base, src, .. } => {
        self.read(src, line);
        self.read(base, line);
      }
      MemRead { dst, base, .. } => {
        self.read(base, line);
        self.write(dst, line);
      }
      Branch { cond, target, .. } => {
        self.update_labels(target, line);
        self.read(cond, line);
      }
      Goto { target } => self.update_labels(target, line),
      Ret { val } => {
        if let Some(v) = val {
          self.read(v, line);
        }
      }
    }
  }

  fn read(&mut self, op: &VOperand, line: u32) {
    if let VOperand::Var(v) = op {
      if let Some(v) = self.var.get_mut(v) {
        v.end = line;
        if v.before_call {
          v.after_call = true;
        }
        // the value is live across every label definition passed since it appeared
        let passed: Vec<String> = v.before_labels.iter().cloned().collect();
        v.after_labels.extend(passed);
      }
    }
  }

  // a write creates the interval, or extends it; intervals never shrink
  fn write(&mut self, name: &str, line: u32) {
    match self.var.get_mut(name) {
      Some(v) => v.end = line,
      None => {
        self.var.insert(name.to_owned(), interval(line));
      }
    }
  }

  // a branch to a label some variable is live across extends that variable to the branch
  // (this is what keeps loop-carried values live over the back edge)
  fn update_labels(&mut self, label: &str, line: u32) {
    for v in self.var.values_mut() {
      if v.after_labels.contains(label) {
        if line > v.end {
          v.end = line;
        }
        if v.before_call {
          v.after_call = true;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use vapor::{BuiltIn as B, VLabel, VOperand::*};

  fn func(param: &[&str], body: Vec<VInstrKind>, label: Vec<(&str, u32)>) -> VFunc {
    VFunc {
      name: "f".to_owned(),
      param: param.iter().map(|s| s.to_string()).collect(),
      body: body.into_iter().enumerate().map(|(i, kind)| VInstr { line: i as u32 + 1, kind }).collect(),
      label: label.into_iter().map(|(name, line)| VLabel { name: name.to_owned(), line }).collect(),
      line: 0,
    }
  }

  #[test]
  fn parameters_start_at_the_header() {
    let f = func(&["this", "n"], vec![
      VInstrKind::BuiltIn { dst: Some("t.0".into()), op: B::Add, arg: vec![Var("n".into()), Const(1)] },
      VInstrKind::Ret { val: Some(Var("t.0".into())) },
    ], vec![]);
    let l = work(&f);
    assert_eq!(l.var["n"].start, 0);
    assert_eq!(l.var["n"].end, 1);
    assert_eq!(l.var["t.0"].start, 1);
    assert_eq!(l.var["t.0"].end, 2);
  }

  #[test]
  fn call_crossing_values_are_after_call() {
    let f = func(&[], vec![
      /* 1 */ VInstrKind::Assign { dst: "a".into(), src: Const(1) },
      /* 2 */ VInstrKind::Call { dst: Some("x".into()), addr: Label("g".into()), arg: vec![] },
      /* 3 */ VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var("a".into())] },
      /* 4 */ VInstrKind::BuiltIn { dst: None, op: B::PrintIntS, arg: vec![Var("x".into())] },
    ], vec![]);
    let l = work(&f);
    assert!(l.var["a"].after_call);
    assert!(!l.var["x"].after_call);
  }

  #[test]
  fn back_edge_extends_loop_carried_values() {
    // i = 0; loop_top: c = i < 10; if0 c goto :loop_end; i = i + 1; goto :loop_top; loop_end:
    let f = func(&[], vec![
      /* 1 */ VInstrKind::Assign { dst: "i".into(), src: Const(0) },
      /* 3 */ VInstrKind::BuiltIn { dst: Some("c".into()), op: B::LtS, arg: vec![Var("i".into()), Const(10)] },
      /* 4 */ VInstrKind::Branch { z: true, cond: Var("c".into()), target: "loop_end".into() },
      /* 5 */ VInstrKind::BuiltIn { dst: Some("i".into()), op: B::Add, arg: vec![Var("i".into()), Const(1)] },
      /* 6 */ VInstrKind::Goto { target: "loop_top".into() },
    ], vec![("loop_top", 2), ("loop_end", 7)]);
    // renumber: bodies above got lines 1..=5, put the label between 1 and 2
    let mut f = f;
    for (idx, line) in [1u32, 3, 4, 5, 6].iter().enumerate() {
      f.body[idx].line = *line;
    }
    let l = work(&f);
    // without the back-edge rule i would end at line 5 and lose its register inside the loop
    assert_eq!(l.var["i"].start, 1);
    assert_eq!(l.var["i"].end, 6);
  }

  #[test]
  fn out_count_takes_the_maximum() {
    let args = |n: usize| (0..n).map(|_| Const(0)).collect::<Vec<_>>();
    let f = func(&[], vec![
      VInstrKind::Call { dst: None, addr: Label("g".into()), arg: args(7) },
      VInstrKind::Call { dst: None, addr: Label("g".into()), arg: args(6) },
    ], vec![]);
    assert_eq!(work(&f).out_count, 3);
  }
}
