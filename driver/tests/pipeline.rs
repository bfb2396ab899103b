use driver::{allocate, compile, Stage};
use syntax::ASTAlloc;

fn vapor(code: &str) -> String {
  let alloc = ASTAlloc::default();
  compile(code, &alloc, Stage::Vapor).unwrap()
}

fn vaporm(code: &str) -> String {
  let alloc = ASTAlloc::default();
  compile(code, &alloc, Stage::VaporM).unwrap()
}

const FACTORIAL: &str = "class M { public static void main(String[] a){ System.out.println(new F().fac(5)); } } \
  class F { public int fac(int n){ int r; if (n < 1) r = 1; else r = n * this.fac(n-1); return r; } }";

#[test]
fn factorial_vapor_surface() {
  let out = vapor(FACTORIAL);
  assert!(out.contains("const vmt_F\n  :F.fac\n"));
  assert!(out.contains("func Main()\n"));
  assert!(out.contains("func F.fac(this n)\n"));
  // dispatch loads the vtable, then the slot, then calls with the receiver first
  assert!(out.contains("= call "));
  assert!(out.contains("ret"));
}

#[test]
fn out_of_bounds_access_is_guarded() {
  let out = vapor(
    "class M { public static void main(String[] a){ int[] x; x = new int[3]; System.out.println(x[5]); } }",
  );
  assert!(out.contains("Error(\"null pointer\")"));
  assert!(out.contains("Error(\"array index out of bounds\")"));
  assert!(out.contains("LtS(5 "));
  // the runtime helper is emitted once, at the end
  assert!(out.contains("func AllocArray(size)"));
  assert_eq!(out.matches("func AllocArray").count(), 1);
}

#[test]
fn override_dispatches_through_slot_zero() {
  let out = vapor(
    "class M { public static void main(String[] a){ A x; x = new B(); System.out.println(x.f()); } } \
     class A { public int f(){ return 1; } } class B extends A { public int f(){ return 2; } }",
  );
  assert!(out.contains("const vmt_A\n  :A.f\n"));
  assert!(out.contains("const vmt_B\n  :B.f\n"));
}

#[test]
fn type_errors_abort_compilation() {
  let alloc = ASTAlloc::default();
  let r = compile(
    "class M { public static void main(String[] a){ System.out.println(true); } }",
    &alloc,
    Stage::Check,
  );
  assert!(format!("{:?}", r.unwrap_err()).contains("incompatible"));
}

#[test]
fn vaporm_annotates_every_function() {
  let out = vaporm(FACTORIAL);
  assert!(out.contains("func Main [in 0, out 0, local "));
  assert!(out.contains("func F.fac [in 0, out 0, local "));
  // vtables survive allocation untouched
  assert!(out.contains("const vmt_F\n  :F.fac\n"));
  // no named variables survive in function bodies, only registers and stack slots
  let body: Vec<&str> = out
    .lines()
    .filter(|l| l.starts_with("  ") && !l.trim_start().starts_with(':'))
    .collect();
  for l in body {
    assert!(!l.contains("t."), "unallocated temporary left in `{}`", l);
  }
}

#[test]
fn emitted_vapor_round_trips_through_the_allocator() {
  let out = vapor(FACTORIAL);
  let m = allocate(&out).unwrap();
  assert!(m.contains("func F.fac [in 0, out 0, local "));
  assert!(m.contains("call $"));
}

#[test]
fn recursive_call_saves_a_callee_register() {
  // `n` is live across the recursive call, so F.fac must park at least one $s register
  let out = vaporm(FACTORIAL);
  let fac: String = out
    .lines()
    .skip_while(|l| !l.starts_with("func F.fac"))
    .take_while(|l| !l.is_empty())
    .collect::<Vec<_>>()
    .join("\n");
  assert!(fac.contains("local[0] = $s0"));
  assert!(fac.contains("$s0 = local[0]"));
}
