pub mod test_util;

pub use test_util::*;

use common::{Error, IndentPrinter};
use syntax::{ASTAlloc, Ty};

#[derive(Eq, PartialEq, Copy, Clone)]
pub enum Stage { Check, Vapor, VaporM }

// the whole pipeline over minijava source; `alloc` must outlive the call because the
// error borrows the AST's names
pub fn compile<'a>(code: &'a str, alloc: &'a ASTAlloc<'a>, stage: Stage) -> Result<String, Error<'a, Ty<'a>>> {
  let mut p = IndentPrinter::default();
  let pr = syntax::parser::work(code, alloc)?;
  let table = typeck::work(pr)?;
  if stage == Stage::Check {
    return Ok(String::new());
  }
  let layouts = vaporgen::layout::work(&table);
  let vp = vaporgen::work(pr, &table, &layouts);
  if stage == Stage::Vapor {
    print::vapor::program(&vp, &mut p);
    return Ok(p.finish());
  }
  let funcs: Vec<_> = vp.func.iter().map(codegen::vaporm_gen::work).collect();
  print::vaporm::program(&vp.vtbl, &funcs, &mut p);
  Ok(p.finish())
}

// phase E on its own: textual vapor in, vaporm out
pub fn allocate(code: &str) -> Result<String, Error<'_, ()>> {
  let mut p = IndentPrinter::default();
  let vp = vapor::parser::work(code)?;
  let funcs: Vec<_> = vp.func.iter().map(codegen::vaporm_gen::work).collect();
  print::vaporm::program(&vp.vtbl, &funcs, &mut p);
  Ok(p.finish())
}
