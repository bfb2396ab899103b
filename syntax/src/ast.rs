use crate::ty::SynTy;
use common::{BinOp, Loc, UnOp};
use std::cell::Cell;
use typed_arena::Arena;

#[derive(Default)]
pub struct ASTAlloc<'a> {
  pub(crate) class: Arena<ClassDef<'a>>,
  pub(crate) method: Arena<MethodDef<'a>>,
  pub(crate) var: Arena<VarDef<'a>>,
  pub(crate) program: Arena<Program<'a>>,
}

pub struct Program<'a> {
  pub main: MainDef<'a>,
  pub class: Vec<&'a ClassDef<'a>>,
}

// the main class has a fixed shape, so it gets its own node instead of a ClassDef
pub struct MainDef<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub arg: &'a str,
  pub local: Vec<&'a VarDef<'a>>,
  pub stmt: Vec<Stmt<'a>>,
}

pub struct ClassDef<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub parent: Option<&'a str>,
  pub field: Vec<&'a VarDef<'a>>,
  pub method: Vec<&'a MethodDef<'a>>,
}

pub struct MethodDef<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub ret: SynTy<'a>,
  pub param: Vec<&'a VarDef<'a>>,
  pub local: Vec<&'a VarDef<'a>>,
  pub body: Vec<Stmt<'a>>,
  // every minijava method body ends with a single `return <expr>;`
  pub ret_expr: Expr<'a>,
}

pub struct VarDef<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub ty: SynTy<'a>,
}

pub struct Stmt<'a> {
  pub loc: Loc,
  pub kind: StmtKind<'a>,
}

#[derive(derive_more::From)]
pub enum StmtKind<'a> {
  Assign(Assign<'a>),
  IndexAssign(IndexAssign<'a>),
  // rust-clippy tells me this variant's size is too big, use a Box to wrap it
  If(Box<If<'a>>),
  While(While<'a>),
  Print(Expr<'a>),
  Block(Vec<Stmt<'a>>),
}

pub struct Assign<'a> {
  pub dst: &'a str,
  pub src: Expr<'a>,
}

pub struct IndexAssign<'a> {
  pub dst: &'a str,
  pub idx: Expr<'a>,
  pub src: Expr<'a>,
}

pub struct If<'a> {
  pub cond: Expr<'a>,
  pub on_true: Stmt<'a>,
  pub on_false: Stmt<'a>,
}

pub struct While<'a> {
  pub cond: Expr<'a>,
  pub body: Box<Stmt<'a>>,
}

pub struct Expr<'a> {
  pub loc: Loc,
  pub kind: ExprKind<'a>,
}

#[derive(derive_more::From)]
pub enum ExprKind<'a> {
  IntLit(i32),
  BoolLit(bool),
  VarSel(VarSel<'a>),
  This(This),
  Binary(Binary<'a>),
  Unary(Unary<'a>),
  IndexSel(IndexSel<'a>),
  Length(Length<'a>),
  Call(Call<'a>),
  NewClass(NewClass<'a>),
  NewArray(NewArray<'a>),
}

pub struct VarSel<'a> {
  pub name: &'a str,
}

pub struct Binary<'a> {
  pub op: BinOp,
  pub l: Box<Expr<'a>>,
  pub r: Box<Expr<'a>>,
}

pub struct Unary<'a> {
  pub op: UnOp,
  pub r: Box<Expr<'a>>,
}

pub struct IndexSel<'a> {
  pub arr: Box<Expr<'a>>,
  pub idx: Box<Expr<'a>>,
}

pub struct Length<'a> {
  pub arr: Box<Expr<'a>>,
}

pub struct Call<'a> {
  pub owner: Box<Expr<'a>>,
  pub name: &'a str,
  pub arg: Vec<Expr<'a>>,
  // the receiver's static class, filled in by the type checker and read by the lowerer
  pub owner_class: Cell<Option<&'a str>>,
}

pub struct NewClass<'a> {
  pub name: &'a str,
}

pub struct NewArray<'a> {
  pub len: Box<Expr<'a>>,
}

// exists just to make match pattern consistent (all patterns are like Xxx(x))
pub struct This;
