mod symbol;
mod symbol_pass;
mod type_pass;

pub use crate::symbol::*;

use common::Error;
use syntax::{Program, Ty};

pub fn work<'a>(p: &'a Program<'a>) -> Result<SymbolTable<'a>, Error<'a, Ty<'a>>> {
  let table = symbol_pass::work(p)?;
  type_pass::work(p, &table)?;
  Ok(table)
}

#[cfg(test)]
mod tests {
  use super::*;
  use syntax::ASTAlloc;

  // the table borrows the arena, so tests only keep the formatted error kind
  fn check(code: &str) -> Result<(), String> {
    let alloc = ASTAlloc::default();
    match syntax::parser::work(code, &alloc) {
      Ok(p) => match work(p) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("{:?}", e.1)),
      },
      Err(e) => Err(format!("{:?}", e.1)),
    }
  }

  const MAIN: &str = "class M { public static void main(String[] a){ System.out.println(0); } }";

  #[test]
  fn accepts_well_typed_program() {
    check(&format!("{} class A {{ int x; public int get(){{ return x; }} }}", MAIN)).unwrap();
  }

  #[test]
  fn rejects_overloading() {
    let r = check(&format!(
      "{} class A {{ public int f(int x){{ return x; }} public int f(int x, int y){{ return x; }} }}",
      MAIN
    ));
    assert!(r.unwrap_err().contains("overloading"));
  }

  #[test]
  fn rejects_override_with_changed_signature() {
    let r = check(&format!(
      "{} class A {{ public int f(int x){{ return x; }} }} class B extends A {{ public int f(boolean x){{ return 0; }} }}",
      MAIN
    ));
    assert!(r.unwrap_err().contains("overloading"));
  }

  #[test]
  fn accepts_exact_override() {
    check(&format!(
      "{} class A {{ public int f(int x){{ return x; }} }} class B extends A {{ public int f(int x){{ return x + 1; }} }}",
      MAIN
    )).unwrap();
  }

  #[test]
  fn rejects_duplicate_class() {
    let r = check(&format!("{} class A {{ }} class A {{ }}", MAIN));
    assert!(r.unwrap_err().contains("duplicate declaration"));
  }

  #[test]
  fn resolves_forward_referenced_parent() {
    check(&format!(
      "{} class B extends A {{ public int g(){{ return this.f(); }} }} class A {{ public int f(){{ return 1; }} }}",
      MAIN
    )).unwrap();
  }

  #[test]
  fn rejects_undeclared_parent() {
    let r = check(&format!("{} class B extends A {{ }}", MAIN));
    assert!(r.unwrap_err().contains("not found"));
  }

  #[test]
  fn rejects_cyclic_inheritance() {
    let r = check(&format!("{} class A extends B {{ }} class B extends A {{ }}", MAIN));
    assert!(r.unwrap_err().contains("acyclic"));
  }

  #[test]
  fn rejects_field_shadowing() {
    let r = check(&format!("{} class A {{ int x; }} class B extends A {{ int x; }}", MAIN));
    assert!(r.unwrap_err().contains("duplicate field"));
  }

  #[test]
  fn rejects_this_in_main() {
    let r = check("class M { public static void main(String[] a){ System.out.println(this.f()); } }");
    assert!(r.unwrap_err().contains("main"));
  }

  #[test]
  fn rejects_argument_count_mismatch() {
    let r = check(&format!(
      "{} class A {{ public int f(int x){{ return x; }} public int g(){{ return this.f(1, 2); }} }}",
      MAIN
    ));
    assert!(r.unwrap_err().contains("argument"));
  }

  #[test]
  fn subtype_is_assignable() {
    check(
      "class M { public static void main(String[] a){ A x; x = new B(); System.out.println(x.f()); } } \
       class A { public int f(){ return 1; } } class B extends A { public int f(){ return 2; } }",
    ).unwrap();
  }

  #[test]
  fn supertype_is_not_assignable() {
    let r = check(
      "class M { public static void main(String[] a){ B x; x = new A(); System.out.println(0); } } \
       class A { } class B extends A { }",
    );
    assert!(r.unwrap_err().contains("incompatible"));
  }
}
