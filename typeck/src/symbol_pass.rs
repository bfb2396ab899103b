use crate::{ClassInfo, MainInfo, MethodInfo, SymbolTable};
use common::{Error, ErrorKind::*, HashSet, IndexMap};
use syntax::{ast::*, Ty};

type Built<'a, T> = Result<T, Error<'a, Ty<'a>>>;

// pass 1: context building
// only declarations are visited here, statements and expressions wait for pass 2
pub(crate) fn work<'a>(p: &'a Program<'a>) -> Built<'a, SymbolTable<'a>> {
  let mut table = SymbolTable { class: IndexMap::default(), main: main_info(&p.main)? };
  for &c in &p.class {
    declare_class(&mut table, c)?;
  }
  for c in table.class.values() {
    // a placeholder that never met its real declaration
    if c.pre_init { return Err(Error(c.loc, UnknownClass(c.name))); }
  }
  check_cycles(&table)?;
  validate(p, &table)?;
  Ok(table)
}

fn main_info<'a>(m: &MainDef<'a>) -> Built<'a, MainInfo<'a>> {
  let mut local = Vec::new();
  for v in &m.local {
    if local.iter().any(|&(n, _)| n == v.name) { return Err(Error(v.loc, DuplicateLocal(v.name))); }
    local.push((v.name, Ty::from_syn(&v.ty)));
  }
  Ok(MainInfo { loc: m.loc, name: m.name, local })
}

fn declare_class<'a>(table: &mut SymbolTable<'a>, c: &'a ClassDef<'a>) -> Built<'a, ()> {
  if c.name == table.main.name { return Err(Error(c.loc, DuplicateClass(c.name))); }
  if let Some(prev) = table.class.get(c.name) {
    if !prev.pre_init { return Err(Error(c.loc, DuplicateClass(c.name))); }
  }
  let mut field = Vec::new();
  for v in &c.field {
    if field.iter().any(|&(n, _)| n == v.name) { return Err(Error(v.loc, DuplicateField(v.name))); }
    field.push((v.name, Ty::from_syn(&v.ty)));
  }
  let mut method: Vec<MethodInfo> = Vec::new();
  for m in &c.method {
    // a second method with this name in the same class is overloading, which minijava forbids
    if method.iter().any(|x| x.name == m.name) { return Err(Error(m.loc, DuplicateMethod(m.name))); }
    let mut param = Vec::new();
    for v in &m.param {
      if param.iter().any(|&(n, _)| n == v.name) { return Err(Error(v.loc, DuplicateParam(v.name))); }
      param.push((v.name, Ty::from_syn(&v.ty)));
    }
    let mut local = Vec::new();
    for v in &m.local {
      if local.iter().chain(param.iter()).any(|&(n, _)| n == v.name) {
        return Err(Error(v.loc, DuplicateLocal(v.name)));
      }
      local.push((v.name, Ty::from_syn(&v.ty)));
    }
    method.push(MethodInfo { loc: m.loc, owner: c.name, name: m.name, param, local, ret: Ty::from_syn(&m.ret) });
  }
  if let Some(p) = c.parent {
    if table.class.get(p).is_none() {
      // forward reference: remember the parent as a placeholder until it is declared
      table.class.insert(p, ClassInfo { loc: c.loc, name: p, parent: None, field: Vec::new(), method: Vec::new(), pre_init: true });
    }
  }
  // replacing a placeholder keeps its position in the map, children keep pointing at the name
  table.class.insert(c.name, ClassInfo { loc: c.loc, name: c.name, parent: c.parent, field, method, pre_init: false });
  Ok(())
}

fn check_cycles<'a>(table: &SymbolTable<'a>) -> Built<'a, ()> {
  for start in table.class.values() {
    let mut vis = HashSet::new();
    let mut cur = Some(start);
    while let Some(c) = cur {
      if !vis.insert(c.name) { return Err(Error(start.loc, CyclicInheritance)); }
      cur = table.parent_of(c);
    }
  }
  Ok(())
}

// everything that needs the fully built table: named types must be declared classes,
// fields may not shadow inherited ones, overrides must keep the signature
fn validate<'a>(p: &'a Program<'a>, table: &SymbolTable<'a>) -> Built<'a, ()> {
  for &v in &p.main.local {
    check_ty(v, table)?;
  }
  for &c in &p.class {
    for &v in &c.field {
      check_ty(v, table)?;
      if let Some(parent) = table.get(c.name).unwrap().parent {
        if table.lookup_field(parent, v.name).is_some() { return Err(Error(v.loc, DuplicateField(v.name))); }
      }
    }
    for &m in &c.method {
      for &v in m.param.iter().chain(m.local.iter()) {
        check_ty(v, table)?;
      }
      let info = table.lookup_method(c.name, m.name).unwrap();
      if let Ty::Class(n) = info.ret {
        if table.get(n).is_none() { return Err(Error(m.loc, UnknownType(n))); }
      }
      if let Some(parent) = table.get(c.name).unwrap().parent {
        if let Some(overridden) = table.lookup_method(parent, m.name) {
          let same_params = overridden.param.len() == info.param.len()
            && overridden.param.iter().zip(info.param.iter()).all(|(a, b)| a.1 == b.1);
          if !same_params || !table.assignable(info.ret, overridden.ret) {
            return Err(Error(m.loc, DuplicateMethod(m.name)));
          }
        }
      }
    }
  }
  Ok(())
}

fn check_ty<'a>(v: &VarDef<'a>, table: &SymbolTable<'a>) -> Built<'a, ()> {
  if let Ty::Class(n) = Ty::from_syn(&v.ty) {
    if table.get(n).is_none() { return Err(Error(v.loc, UnknownType(n))); }
  }
  Ok(())
}
