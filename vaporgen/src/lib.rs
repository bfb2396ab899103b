pub mod layout;

pub use crate::layout::*;

use common::{BinOp, UnOp, WORD_SIZE};
use syntax::ast::{Expr, ExprKind, MainDef, MethodDef, Program, Stmt, StmtKind};
use typeck::{MethodInfo, SymbolTable};
use vapor::{VFunc, VInstr, VInstrKind::{self, *}, VLabel, VOperand::*, VTbl, VaporProgram};
use vapor::BuiltIn::{Add, Eq, Error, HeapAllocZ, LtS, MulS, PrintIntS, Sub};

pub fn work<'a>(p: &'a Program<'a>, table: &SymbolTable<'a>, layouts: &Layouts<'a>) -> VaporProgram {
  let mut g = VaporGen {
    table,
    layouts,
    cur_class: None,
    cur_method: None,
    temp_num: 0,
    null_cnt: 1,
    bounds_cnt: 1,
    if_cnt: 1,
    while_cnt: 1,
    line: 0,
    body: Vec::new(),
    label: Vec::new(),
    uses_alloc_array: false,
  };
  let mut vp = VaporProgram::default();
  // layouts iterate parents first, which is the emission order of the data segments
  for l in layouts.iter() {
    vp.vtbl.push(VTbl {
      name: format!("vmt_{}", l.name),
      func: l.vtbl.iter().map(|&(m, owner)| format!("{}.{}", owner, m)).collect(),
    });
  }
  vp.func.push(g.main_func(&p.main));
  for &c in &p.class {
    for &m in &c.method {
      vp.func.push(g.method_func(c.name, m));
    }
  }
  if g.uses_alloc_array {
    vp.func.push(g.alloc_array_func());
  }
  vp
}

struct VaporGen<'a, 'b> {
  table: &'b SymbolTable<'a>,
  layouts: &'b Layouts<'a>,
  // None while lowering main
  cur_class: Option<&'a str>,
  cur_method: Option<&'b MethodInfo<'a>>,
  // all of these are reset at every function entry
  temp_num: u32,
  null_cnt: u32,
  bounds_cnt: u32,
  if_cnt: u32,
  while_cnt: u32,
  line: u32,
  body: Vec<VInstr>,
  label: Vec<VLabel>,
  // the AllocArray helper is emitted once, at the end, iff some array allocation needs it
  uses_alloc_array: bool,
}

impl<'a, 'b> VaporGen<'a, 'b> {
  fn reset(&mut self) {
    self.temp_num = 0;
    self.null_cnt = 1;
    self.bounds_cnt = 1;
    self.if_cnt = 1;
    self.while_cnt = 1;
    self.line = 0;
  }

  // the function header is line 0, every instruction and label after it gets the next line
  fn push(&mut self, kind: VInstrKind) {
    self.line += 1;
    self.body.push(VInstr { line: self.line, kind });
  }

  fn put_label(&mut self, name: String) {
    self.line += 1;
    self.label.push(VLabel { name, line: self.line });
  }

  fn temp(&mut self) -> String {
    let t = format!("t.{}", self.temp_num);
    self.temp_num += 1;
    t
  }

  fn finish(&mut self, name: String, param: Vec<String>) -> VFunc {
    VFunc { name, param, body: std::mem::take(&mut self.body), label: std::mem::take(&mut self.label), line: 0 }
  }

  fn main_func(&mut self, m: &'a MainDef<'a>) -> VFunc {
    self.reset();
    self.cur_class = None;
    self.cur_method = None;
    for v in &m.local {
      // declared locals start as zero
      self.push(Assign { dst: v.name.to_owned(), src: Const(0) });
    }
    for s in &m.stmt {
      self.stmt(s);
    }
    self.push(Ret { val: None });
    self.finish("Main".to_owned(), Vec::new())
  }

  fn method_func(&mut self, class: &'a str, m: &'a MethodDef<'a>) -> VFunc {
    self.reset();
    self.cur_class = Some(class);
    self.cur_method = self.table.lookup_method(class, m.name);
    for v in &m.local {
      self.push(Assign { dst: v.name.to_owned(), src: Const(0) });
    }
    for s in &m.body {
      self.stmt(s);
    }
    let v = self.expr(&m.ret_expr);
    self.push(Ret { val: Some(v) });
    let param = std::iter::once("this".to_owned()).chain(m.param.iter().map(|p| p.name.to_owned())).collect();
    self.finish(format!("{}.{}", class, m.name), param)
  }

  // bytes = size * 4 + 4, zeroed allocation, length stored at offset 0
  fn alloc_array_func(&mut self) -> VFunc {
    self.reset();
    self.push(BuiltIn { dst: Some("bytes".to_owned()), op: MulS, arg: vec![Var("size".to_owned()), Const(WORD_SIZE)] });
    self.push(BuiltIn { dst: Some("bytes".to_owned()), op: Add, arg: vec![Var("bytes".to_owned()), Const(WORD_SIZE)] });
    self.push(BuiltIn { dst: Some("v".to_owned()), op: HeapAllocZ, arg: vec![Var("bytes".to_owned())] });
    self.push(MemWrite { base: Var("v".to_owned()), off: 0, src: Var("size".to_owned()) });
    self.push(Ret { val: Some(Var("v".to_owned())) });
    self.finish("AllocArray".to_owned(), vec!["size".to_owned()])
  }

  fn stmt(&mut self, s: &Stmt<'a>) {
    use StmtKind::*;
    match &s.kind {
      Assign(a) => {
        let v = self.expr(&a.src);
        self.var_write(a.dst, v);
      }
      IndexAssign(a) => {
        let idx = self.expr(&a.idx);
        let arr = self.var_read(a.dst);
        let q = self.index_ptr(arr, idx);
        let v = self.expr(&a.src);
        self.push(MemWrite { base: Var(q), off: WORD_SIZE, src: v });
      }
      If(i) => {
        let k = self.if_cnt;
        self.if_cnt += 1;
        let cond = self.expr(&i.cond);
        self.push(Branch { z: true, cond, target: format!("if{}_else", k) });
        self.stmt(&i.on_true);
        self.push(Goto { target: format!("if{}_end", k) });
        self.put_label(format!("if{}_else", k));
        self.stmt(&i.on_false);
        self.put_label(format!("if{}_end", k));
      }
      While(w) => {
        let k = self.while_cnt;
        self.while_cnt += 1;
        self.put_label(format!("while{}_top", k));
        let cond = self.expr(&w.cond);
        self.push(Branch { z: true, cond, target: format!("while{}_end", k) });
        self.stmt(&w.body);
        self.push(Goto { target: format!("while{}_top", k) });
        self.put_label(format!("while{}_end", k));
      }
      Print(e) => {
        let v = self.expr(e);
        self.push(BuiltIn { dst: None, op: PrintIntS, arg: vec![v] });
      }
      Block(b) => {
        for s in b {
          self.stmt(s);
        }
      }
    }
  }

  fn expr(&mut self, e: &Expr<'a>) -> vapor::VOperand {
    use ExprKind::*;
    match &e.kind {
      IntLit(i) => Const(*i),
      BoolLit(b) => Const(*b as i32),
      VarSel(v) => self.var_read(v.name),
      This(_) => Var("this".to_owned()),
      Binary(b) => {
        let (l, r) = (self.expr(&b.l), self.expr(&b.r));
        match b.op {
          BinOp::And => {
            // both operands are 0/1, so multiply and compare against 1
            let t = self.temp();
            self.push(BuiltIn { dst: Some(t.clone()), op: MulS, arg: vec![l, r] });
            let t2 = self.temp();
            self.push(BuiltIn { dst: Some(t2.clone()), op: Eq, arg: vec![Const(1), Var(t)] });
            Var(t2)
          }
          op => {
            let op = match op {
              BinOp::Add => Add,
              BinOp::Sub => Sub,
              BinOp::Mul => MulS,
              BinOp::Lt => LtS,
              BinOp::And => unreachable!(),
            };
            let t = self.temp();
            self.push(BuiltIn { dst: Some(t.clone()), op, arg: vec![l, r] });
            Var(t)
          }
        }
      }
      Unary(u) => {
        let r = self.expr(&u.r);
        match u.op {
          // 1 - e keeps the 0/1 contract: !true = 0, !false = 1
          UnOp::Not => {
            let t = self.temp();
            self.push(BuiltIn { dst: Some(t.clone()), op: Sub, arg: vec![Const(1), r] });
            Var(t)
          }
        }
      }
      IndexSel(i) => {
        let (arr, idx) = (self.expr(&i.arr), self.expr(&i.idx));
        let q = self.index_ptr(arr, idx);
        let t = self.temp();
        self.push(MemRead { dst: t.clone(), base: Var(q), off: WORD_SIZE });
        Var(t)
      }
      Length(l) => {
        let arr = self.expr(&l.arr);
        let p = self.temp();
        self.push(Assign { dst: p.clone(), src: arr });
        self.null_check(&p);
        let t = self.temp();
        self.push(MemRead { dst: t.clone(), base: Var(p), off: 0 });
        Var(t)
      }
      Call(c) => {
        let recv = self.expr(&c.owner);
        let r = self.force_var(recv);
        let cls = c.owner_class.get().unwrap();
        let slot = self.layouts.get(cls).method_slot(c.name).unwrap();
        let vt = self.temp();
        self.push(MemRead { dst: vt.clone(), base: Var(r.clone()), off: 0 });
        let fp = self.temp();
        self.push(MemRead { dst: fp.clone(), base: Var(vt), off: slot });
        let mut arg = vec![Var(r)];
        for a in &c.arg {
          let v = self.expr(a);
          arg.push(v);
        }
        let t = self.temp();
        self.push(VInstrKind::Call { dst: Some(t.clone()), addr: Var(fp), arg });
        Var(t)
      }
      NewClass(n) => {
        let size = self.layouts.get(n.name).object_size();
        let t = self.temp();
        self.push(BuiltIn { dst: Some(t.clone()), op: HeapAllocZ, arg: vec![Const(size)] });
        self.push(MemWrite { base: Var(t.clone()), off: 0, src: Label(format!("vmt_{}", n.name)) });
        self.null_check(&t);
        Var(t)
      }
      NewArray(n) => {
        let len = self.expr(&n.len);
        self.uses_alloc_array = true;
        let t = self.temp();
        self.push(VInstrKind::Call { dst: Some(t.clone()), addr: Label("AllocArray".to_owned()), arg: vec![len] });
        Var(t)
      }
    }
  }

  fn is_local(&self, name: &str) -> bool {
    match self.cur_method {
      Some(m) => m.lookup_var(name).is_some(),
      // everything visible in main is a local
      None => true,
    }
  }

  fn field_offset(&self, name: &str) -> i32 {
    self.layouts.get(self.cur_class.unwrap()).field_offset(name).unwrap()
  }

  fn var_read(&mut self, name: &str) -> vapor::VOperand {
    if self.is_local(name) {
      Var(name.to_owned())
    } else {
      let off = self.field_offset(name);
      let t = self.temp();
      self.push(MemRead { dst: t.clone(), base: Var("this".to_owned()), off });
      Var(t)
    }
  }

  fn var_write(&mut self, name: &str, src: vapor::VOperand) {
    if self.is_local(name) {
      self.push(Assign { dst: name.to_owned(), src });
    } else {
      let off = self.field_offset(name);
      self.push(MemWrite { base: Var("this".to_owned()), off, src });
    }
  }

  // the receiver of a dispatch is read more than once, pin it to a variable
  fn force_var(&mut self, v: vapor::VOperand) -> String {
    match v {
      Var(v) => v,
      v => {
        let t = self.temp();
        self.push(Assign { dst: t.clone(), src: v });
        t
      }
    }
  }

  fn null_check(&mut self, ptr: &str) {
    let k = self.null_cnt;
    self.null_cnt += 1;
    let target = format!("null{}", k);
    self.push(Branch { z: false, cond: Var(ptr.to_owned()), target: target.clone() });
    self.push(BuiltIn { dst: None, op: Error, arg: vec![Str("null pointer".to_owned())] });
    self.put_label(target);
  }

  fn bounds_check(&mut self, ok: &str) {
    let k = self.bounds_cnt;
    self.bounds_cnt += 1;
    let target = format!("bounds{}", k);
    self.push(Branch { z: false, cond: Var(ok.to_owned()), target: target.clone() });
    self.push(BuiltIn { dst: None, op: Error, arg: vec![Str("array index out of bounds".to_owned())] });
    self.put_label(target);
  }

  // dereference the array into a fresh temp, guard against null and the stored length,
  // and return `q` with the element sitting at [q + 4]
  fn index_ptr(&mut self, arr: vapor::VOperand, idx: vapor::VOperand) -> String {
    let p = self.temp();
    self.push(Assign { dst: p.clone(), src: arr });
    self.null_check(&p);
    let q = self.temp();
    self.push(MemRead { dst: q.clone(), base: Var(p.clone()), off: 0 });
    self.push(BuiltIn { dst: Some(q.clone()), op: LtS, arg: vec![idx.clone(), Var(q.clone())] });
    self.bounds_check(&q);
    self.push(BuiltIn { dst: Some(q.clone()), op: MulS, arg: vec![idx, Const(WORD_SIZE)] });
    self.push(BuiltIn { dst: Some(q.clone()), op: Add, arg: vec![Var(q.clone()), Var(p)] });
    q
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use syntax::ASTAlloc;
  use vapor::{BuiltIn, VInstrKind, VaporProgram};

  fn lower(code: &str, f: impl FnOnce(&VaporProgram)) {
    let alloc = ASTAlloc::default();
    let p = syntax::parser::work(code, &alloc).unwrap();
    let table = typeck::work(p).unwrap();
    let layouts = layout::work(&table);
    let vp = work(p, &table, &layouts);
    f(&vp);
  }

  fn func<'v>(vp: &'v VaporProgram, name: &str) -> &'v VFunc {
    vp.func.iter().find(|f| f.name == name).unwrap()
  }

  #[test]
  fn factorial_shape() {
    lower(
      "class M { public static void main(String[] a){ System.out.println(new F().fac(5)); } } \
       class F { public int fac(int n){ int r; if (n < 1) r = 1; else r = n * this.fac(n-1); return r; } }",
      |vp| {
        assert_eq!(vp.vtbl.len(), 1);
        assert_eq!(vp.vtbl[0].name, "vmt_F");
        assert_eq!(vp.vtbl[0].func, ["F.fac"]);
        let f = func(vp, "F.fac");
        assert_eq!(f.param, ["this", "n"]);
        // the recursive call dispatches through the vtable at slot 0
        assert!(f.body.iter().any(|i| match &i.kind {
          VInstrKind::Call { addr: vapor::VOperand::Var(_), arg, .. } => arg.len() == 2,
          _ => false,
        }));
      },
    );
  }

  #[test]
  fn override_keeps_slot_zero() {
    lower(
      "class M { public static void main(String[] a){ A x; x = new B(); System.out.println(x.f()); } } \
       class A { public int f(){ return 1; } } class B extends A { public int f(){ return 2; } }",
      |vp| {
        let a = vp.vtbl.iter().find(|v| v.name == "vmt_A").unwrap();
        let b = vp.vtbl.iter().find(|v| v.name == "vmt_B").unwrap();
        assert_eq!(a.func, ["A.f"]);
        assert_eq!(b.func, ["B.f"]);
      },
    );
  }

  #[test]
  fn forward_reference_layout_matches_parent_first_order() {
    let fwd = "class M { public static void main(String[] a){ System.out.println(0); } } \
               class B extends A { int y; public int g(){ return y; } } \
               class A { int x; public int f(){ return x; } }";
    let straight = "class M { public static void main(String[] a){ System.out.println(0); } } \
                    class A { int x; public int f(){ return x; } } \
                    class B extends A { int y; public int g(){ return y; } }";
    for code in &[fwd, straight] {
      let alloc = ASTAlloc::default();
      let p = syntax::parser::work(code, &alloc).unwrap();
      let table = typeck::work(p).unwrap();
      let layouts = layout::work(&table);
      let b = layouts.get("B");
      assert_eq!(b.object_size(), 12);
      assert_eq!(b.field_offset("x"), Some(4));
      assert_eq!(b.field_offset("y"), Some(8));
      assert_eq!(b.method_slot("f"), Some(0));
      assert_eq!(b.method_slot("g"), Some(4));
    }
  }

  #[test]
  fn indexing_emits_both_guards() {
    lower(
      "class M { public static void main(String[] a){ int[] x; x = new int[3]; System.out.println(x[5]); } }",
      |vp| {
        let main = func(vp, "Main");
        let errors: Vec<_> = main.body.iter().filter_map(|i| match &i.kind {
          VInstrKind::BuiltIn { op: BuiltIn::Error, arg, .. } => match &arg[0] {
            vapor::VOperand::Str(s) => Some(s.as_str()),
            _ => None,
          },
          _ => None,
        }).collect();
        assert_eq!(errors, ["null pointer", "array index out of bounds"]);
        // the helper is emitted because an array was allocated
        assert!(vp.func.iter().any(|f| f.name == "AllocArray"));
      },
    );
  }

  #[test]
  fn object_allocation_stores_vtable_and_guards() {
    lower(
      "class M { public static void main(String[] a){ System.out.println(new A().f()); } } \
       class A { public int f(){ return 1; } }",
      |vp| {
        let main = func(vp, "Main");
        assert!(main.body.iter().any(|i| match &i.kind {
          VInstrKind::BuiltIn { op: BuiltIn::HeapAllocZ, arg, .. } => match arg[0] {
            vapor::VOperand::Const(n) => n == 4,
            _ => false,
          },
          _ => false,
        }));
        assert!(main.body.iter().any(|i| match &i.kind {
          VInstrKind::MemWrite { src: vapor::VOperand::Label(l), off: 0, .. } => l == "vmt_A",
          _ => false,
        }));
      },
    );
  }

  #[test]
  fn not_keeps_the_boolean_contract() {
    lower(
      "class M { public static void main(String[] a){ boolean b; b = !true; if (b) System.out.println(1); else System.out.println(0); } }",
      |vp| {
        let main = func(vp, "Main");
        // !e must be Sub(1 e) so that !true = 0 and !false = 1
        assert!(main.body.iter().any(|i| match &i.kind {
          VInstrKind::BuiltIn { op: BuiltIn::Sub, arg, .. } => match (&arg[0], &arg[1]) {
            (vapor::VOperand::Const(1), vapor::VOperand::Const(1)) => true,
            _ => false,
          },
          _ => false,
        }));
      },
    );
  }
}
