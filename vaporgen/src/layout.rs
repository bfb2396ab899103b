use common::{IndexMap, WORD_SIZE};
use typeck::{ClassInfo, SymbolTable};

// memory layout of one class: the flattened field list and the dispatch table
// fields are base-to-derived, each exactly once (the checker rejects shadowing),
// so a parent's fields sit at identical offsets in every child
pub struct ClassLayout<'a> {
  pub name: &'a str,
  pub field: Vec<&'a str>,
  // (method name, defining class); an override replaces the parent's entry in place,
  // keeping the slot index
  pub vtbl: Vec<(&'a str, &'a str)>,
}

impl<'a> ClassLayout<'a> {
  // one word for the vtable pointer, one per field
  pub fn object_size(&self) -> i32 { WORD_SIZE + WORD_SIZE * self.field.len() as i32 }

  pub fn field_offset(&self, name: &str) -> Option<i32> {
    self.field.iter().position(|&f| f == name).map(|i| WORD_SIZE + WORD_SIZE * i as i32)
  }

  pub fn method_slot(&self, name: &str) -> Option<i32> {
    self.vtbl.iter().position(|&(m, _)| m == name).map(|i| WORD_SIZE * i as i32)
  }
}

pub struct Layouts<'a> {
  // insertion order is a topological order of the inheritance forest, parents first
  map: IndexMap<&'a str, ClassLayout<'a>>,
}

pub fn work<'a>(table: &SymbolTable<'a>) -> Layouts<'a> {
  let mut l = Layouts { map: IndexMap::default() };
  for c in table.class.values() {
    l.resolve(c, table);
  }
  l
}

impl<'a> Layouts<'a> {
  pub fn get(&self, name: &str) -> &ClassLayout<'a> { &self.map[name] }

  pub fn iter(&self) -> impl Iterator<Item = &ClassLayout<'a>> { self.map.values() }

  fn resolve(&mut self, c: &ClassInfo<'a>, table: &SymbolTable<'a>) {
    if self.map.contains_key(c.name) { return; }
    let (mut field, mut vtbl) = match table.parent_of(c) {
      Some(p) => {
        self.resolve(p, table);
        let p = &self.map[p.name];
        (p.field.clone(), p.vtbl.clone())
      }
      None => (Vec::new(), Vec::new()),
    };
    for &(f, _) in &c.field {
      field.push(f);
    }
    for m in &c.method {
      match vtbl.iter().position(|&(n, _)| n == m.name) {
        Some(slot) => vtbl[slot] = (m.name, c.name),
        None => vtbl.push((m.name, c.name)),
      }
    }
    self.map.insert(c.name, ClassLayout { name: c.name, field, vtbl });
  }
}
