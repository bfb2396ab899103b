use crate::{MethodInfo, SymbolTable};
use common::{BinOp, Error, ErrorKind::*, Loc, UnOp};
use syntax::{ast::*, Ty};

type Checked<'a, T> = Result<T, Error<'a, Ty<'a>>>;

// pass 2: typing
// produces a type for every expression, validates every statement, stops at the first error
pub(crate) fn work<'a>(p: &'a Program<'a>, table: &SymbolTable<'a>) -> Checked<'a, ()> {
  let mut t = TypePass { table, cur_class: None, cur_method: None };
  for s in &p.main.stmt {
    t.stmt(s)?;
  }
  for c in &p.class {
    t.cur_class = Some(c.name);
    for m in &c.method {
      let info = table.lookup_method(c.name, m.name).unwrap();
      t.cur_method = Some(info);
      for s in &m.body {
        t.stmt(s)?;
      }
      let ret = t.expr(&m.ret_expr)?;
      if !table.assignable(ret, info.ret) {
        return Err(Error(m.ret_expr.loc, TypeMismatch { expect: info.ret, actual: ret, context: "return" }));
      }
    }
  }
  Ok(())
}

struct TypePass<'a, 'b> {
  table: &'b SymbolTable<'a>,
  // None while checking the body of main
  cur_class: Option<&'a str>,
  cur_method: Option<&'b MethodInfo<'a>>,
}

impl<'a, 'b> TypePass<'a, 'b> {
  // identifier rule: local, else parameter, else inherited field
  fn var_ty(&self, name: &'a str, loc: Loc) -> Checked<'a, Ty<'a>> {
    match self.cur_method {
      Some(m) => m
        .lookup_var(name)
        .or_else(|| self.table.lookup_field(self.cur_class.unwrap(), name))
        .ok_or(Error(loc, UnboundIdent(name))),
      None => self
        .table
        .main
        .local
        .iter()
        .find(|&&(n, _)| n == name)
        .map(|&(_, ty)| ty)
        .ok_or(Error(loc, UnboundIdent(name))),
    }
  }

  fn stmt(&self, s: &'a Stmt<'a>) -> Checked<'a, ()> {
    match &s.kind {
      StmtKind::Assign(a) => {
        let l = self.var_ty(a.dst, s.loc)?;
        let r = self.expr(&a.src)?;
        if !self.table.assignable(r, l) {
          return Err(Error(s.loc, TypeMismatch { expect: l, actual: r, context: "assignment" }));
        }
      }
      StmtKind::IndexAssign(a) => {
        let arr = self.var_ty(a.dst, s.loc)?;
        if arr != Ty::IntArray {
          return Err(Error(s.loc, TypeMismatch { expect: Ty::IntArray, actual: arr, context: "array assignment" }));
        }
        self.check(&a.idx, Ty::Int, "array index")?;
        self.check(&a.src, Ty::Int, "array assignment")?;
      }
      StmtKind::If(i) => {
        self.check(&i.cond, Ty::Bool, "if condition")?;
        self.stmt(&i.on_true)?;
        self.stmt(&i.on_false)?;
      }
      StmtKind::While(w) => {
        self.check(&w.cond, Ty::Bool, "while condition")?;
        self.stmt(&w.body)?;
      }
      StmtKind::Print(e) => {
        self.check(e, Ty::Int, "println")?;
      }
      StmtKind::Block(b) => {
        for s in b {
          self.stmt(s)?;
        }
      }
    }
    Ok(())
  }

  fn check(&self, e: &'a Expr<'a>, expect: Ty<'a>, context: &'static str) -> Checked<'a, Ty<'a>> {
    let actual = self.expr(e)?;
    if actual != expect {
      return Err(Error(e.loc, TypeMismatch { expect, actual, context }));
    }
    Ok(actual)
  }

  fn expr(&self, e: &'a Expr<'a>) -> Checked<'a, Ty<'a>> {
    use ExprKind::*;
    match &e.kind {
      IntLit(_) => Ok(Ty::Int),
      BoolLit(_) => Ok(Ty::Bool),
      VarSel(v) => self.var_ty(v.name, e.loc),
      This(_) => match self.cur_class {
        Some(c) => Ok(Ty::Class(c)),
        // main is static, there is no receiver
        None => Err(Error(e.loc, BadMain)),
      },
      Binary(b) => {
        let (operand, ret) = match b.op {
          BinOp::And => (Ty::Bool, Ty::Bool),
          BinOp::Lt => (Ty::Int, Ty::Bool),
          BinOp::Add | BinOp::Sub | BinOp::Mul => (Ty::Int, Ty::Int),
        };
        self.check(&b.l, operand, operand_ctx(b.op))?;
        self.check(&b.r, operand, operand_ctx(b.op))?;
        Ok(ret)
      }
      Unary(u) => {
        match u.op {
          UnOp::Not => self.check(&u.r, Ty::Bool, "operand of '!'")?,
        };
        Ok(Ty::Bool)
      }
      IndexSel(i) => {
        let arr = self.expr(&i.arr)?;
        if arr != Ty::IntArray {
          return Err(Error(i.arr.loc, TypeMismatch { expect: Ty::IntArray, actual: arr, context: "array indexing" }));
        }
        self.check(&i.idx, Ty::Int, "array index")?;
        Ok(Ty::Int)
      }
      Length(l) => {
        let arr = self.expr(&l.arr)?;
        if arr != Ty::IntArray {
          return Err(Error(l.arr.loc, TypeMismatch { expect: Ty::IntArray, actual: arr, context: "'.length'" }));
        }
        Ok(Ty::Int)
      }
      Call(c) => self.call(c, e.loc),
      NewClass(n) => {
        if self.table.get(n.name).is_none() { return Err(Error(e.loc, UnknownClass(n.name))); }
        Ok(Ty::Class(n.name))
      }
      NewArray(n) => {
        self.check(&n.len, Ty::Int, "array length")?;
        Ok(Ty::IntArray)
      }
    }
  }

  fn call(&self, c: &'a Call<'a>, loc: Loc) -> Checked<'a, Ty<'a>> {
    let owner = self.expr(&c.owner)?;
    let cls = match owner {
      Ty::Class(n) => n,
      _ => return Err(Error(loc, UnboundMethod { name: c.name, owner })),
    };
    let m = self
      .table
      .lookup_method(cls, c.name)
      .ok_or(Error(loc, UnboundMethod { name: c.name, owner }))?;
    if m.param.len() != c.arg.len() {
      return Err(Error(loc, ArgCountMismatch { name: c.name, expect: m.param.len() as u32, actual: c.arg.len() as u32 }));
    }
    for (arg, &(_, pt)) in c.arg.iter().zip(m.param.iter()) {
      let at = self.expr(arg)?;
      if !self.table.assignable(at, pt) {
        return Err(Error(arg.loc, TypeMismatch { expect: pt, actual: at, context: "argument" }));
      }
    }
    // the lowerer resolves the vtable slot against the receiver's static class
    c.owner_class.set(Some(cls));
    Ok(m.ret)
  }
}

fn operand_ctx(op: BinOp) -> &'static str {
  match op {
    BinOp::Add => "operand of '+'",
    BinOp::Sub => "operand of '-'",
    BinOp::Mul => "operand of '*'",
    BinOp::Lt => "operand of '<'",
    BinOp::And => "operand of '&&'",
  }
}
