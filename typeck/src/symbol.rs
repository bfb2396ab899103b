use common::{IndexMap, Loc};
use syntax::Ty;

pub struct SymbolTable<'a> {
  pub class: IndexMap<&'a str, ClassInfo<'a>>,
  pub main: MainInfo<'a>,
}

// the main class has no fields and a single static method, so it is kept out of `class`
pub struct MainInfo<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub local: Vec<(&'a str, Ty<'a>)>,
}

pub struct ClassInfo<'a> {
  pub loc: Loc,
  pub name: &'a str,
  pub parent: Option<&'a str>,
  // declaration order, names unique within the class
  pub field: Vec<(&'a str, Ty<'a>)>,
  pub method: Vec<MethodInfo<'a>>,
  // true while the class is only known as somebody's parent; the real declaration
  // replaces the placeholder in place, which rewires every child at once
  pub pre_init: bool,
}

pub struct MethodInfo<'a> {
  pub loc: Loc,
  pub owner: &'a str,
  pub name: &'a str,
  pub param: Vec<(&'a str, Ty<'a>)>,
  pub local: Vec<(&'a str, Ty<'a>)>,
  pub ret: Ty<'a>,
}

impl<'a> SymbolTable<'a> {
  pub fn get(&self, name: &str) -> Option<&ClassInfo<'a>> { self.class.get(name) }

  pub fn parent_of(&self, c: &ClassInfo<'a>) -> Option<&ClassInfo<'a>> {
    c.parent.and_then(|p| self.class.get(p))
  }

  // reflexive walk up the inheritance chain; only sound once cycles are rejected
  pub fn extends(&self, sub: &str, sup: &str) -> bool {
    let mut cur = self.get(sub);
    while let Some(c) = cur {
      if c.name == sup { return true; }
      cur = self.parent_of(c);
    }
    false
  }

  // `t <: u`: equal, or both class types with `t` transitively extending `u`
  pub fn assignable(&self, t: Ty<'a>, u: Ty<'a>) -> bool {
    t == u || match (t, u) {
      (Ty::Class(a), Ty::Class(b)) => self.extends(a, b),
      _ => false,
    }
  }

  // resolves on `class` or the nearest ancestor defining the method
  pub fn lookup_method(&self, class: &str, name: &str) -> Option<&MethodInfo<'a>> {
    let mut cur = self.get(class);
    while let Some(c) = cur {
      if let Some(m) = c.method.iter().find(|m| m.name == name) { return Some(m); }
      cur = self.parent_of(c);
    }
    None
  }

  pub fn lookup_field(&self, class: &str, name: &str) -> Option<Ty<'a>> {
    let mut cur = self.get(class);
    while let Some(c) = cur {
      if let Some(&(_, ty)) = c.field.iter().find(|(f, _)| *f == name) { return Some(ty); }
      cur = self.parent_of(c);
    }
    None
  }
}

impl<'a> MethodInfo<'a> {
  // locals shadow parameters is rejected at declaration, so the order here is moot,
  // but the identifier rule says local, then parameter
  pub fn lookup_var(&self, name: &str) -> Option<Ty<'a>> {
    self.local.iter().chain(self.param.iter()).find(|(n, _)| *n == name).map(|&(_, ty)| ty)
  }
}
