use crate::*;
use common::{Error, ErrorKind, Loc};

// textual vapor is line oriented, so the parser is too
// the 1-based file line doubles as the instruction's program point
pub fn work(code: &str) -> Result<VaporProgram, Error<'_, ()>> {
  let mut p = VaporProgram::default();
  let mut cur: Option<VFunc> = None;
  let lines: Vec<&str> = code.lines().collect();
  let mut i = 0;
  while i < lines.len() {
    let line = (i + 1) as u32;
    let t = lines[i].trim();
    if t.is_empty() {
      i += 1;
      continue;
    }
    if let Some(rest) = t.strip_prefix("const ") {
      if let Some(f) = cur.take() { p.func.push(f); }
      let mut func = Vec::new();
      while i + 1 < lines.len() && !lines[i + 1].trim().is_empty() && lines[i + 1].starts_with(char::is_whitespace) {
        i += 1;
        let entry = lines[i].trim();
        func.push(entry.strip_prefix(':').unwrap_or(entry).to_owned());
      }
      p.vtbl.push(VTbl { name: rest.trim().to_owned(), func });
    } else if let Some(rest) = t.strip_prefix("func ") {
      if let Some(f) = cur.take() { p.func.push(f); }
      let (name, param) = header(rest, line)?;
      cur = Some(VFunc { name, param, body: Vec::new(), label: Vec::new(), line });
    } else {
      let f = match cur.as_mut() {
        Some(f) => f,
        None => return Err(syntax_err(line)),
      };
      if t.ends_with(':') && !t.contains(' ') {
        f.label.push(VLabel { name: t[..t.len() - 1].to_owned(), line });
      } else {
        f.body.push(VInstr { line, kind: instr(t, line)? });
      }
    }
    i += 1;
  }
  if let Some(f) = cur.take() { p.func.push(f); }
  Ok(p)
}

fn syntax_err<'a>(line: u32) -> Error<'a, ()> { Error(Loc(line, 1), ErrorKind::SyntaxError) }

fn header(rest: &str, line: u32) -> Result<(String, Vec<String>), Error<'static, ()>> {
  let open = rest.find('(').ok_or_else(|| syntax_err(line))?;
  let close = rest.rfind(')').ok_or_else(|| syntax_err(line))?;
  let name = rest[..open].trim().to_owned();
  let param = rest[open + 1..close].split_whitespace().map(str::to_owned).collect();
  Ok((name, param))
}

fn instr(t: &str, line: u32) -> Result<VInstrKind, Error<'static, ()>> {
  if let Some(rest) = t.strip_prefix("if0 ") {
    return branch(rest, true, line);
  }
  if let Some(rest) = t.strip_prefix("if ") {
    return branch(rest, false, line);
  }
  if let Some(rest) = t.strip_prefix("goto :") {
    return Ok(VInstrKind::Goto { target: rest.trim().to_owned() });
  }
  if t == "ret" {
    return Ok(VInstrKind::Ret { val: None });
  }
  if let Some(rest) = t.strip_prefix("ret ") {
    return Ok(VInstrKind::Ret { val: Some(operand(rest.trim())) });
  }
  if let Some(rest) = t.strip_prefix("call ") {
    let (addr, arg) = call(rest, line)?;
    return Ok(VInstrKind::Call { dst: None, addr, arg });
  }
  if let Some(eq) = t.find(" = ") {
    let (lhs, rhs) = (t[..eq].trim(), t[eq + 3..].trim());
    if lhs.starts_with('[') {
      let (base, off) = memref(lhs, line)?;
      return Ok(VInstrKind::MemWrite { base, off, src: operand(rhs) });
    }
    if let Some(rest) = rhs.strip_prefix("call ") {
      let (addr, arg) = call(rest, line)?;
      return Ok(VInstrKind::Call { dst: Some(lhs.to_owned()), addr, arg });
    }
    if rhs.starts_with('[') {
      let (base, off) = memref(rhs, line)?;
      return Ok(VInstrKind::MemRead { dst: lhs.to_owned(), base, off });
    }
    if let Some((op, arg)) = builtin(rhs) {
      return Ok(VInstrKind::BuiltIn { dst: Some(lhs.to_owned()), op, arg });
    }
    return Ok(VInstrKind::Assign { dst: lhs.to_owned(), src: operand(rhs) });
  }
  if let Some((op, arg)) = builtin(t) {
    return Ok(VInstrKind::BuiltIn { dst: None, op, arg });
  }
  Err(syntax_err(line))
}

fn branch(rest: &str, z: bool, line: u32) -> Result<VInstrKind, Error<'static, ()>> {
  let goto = rest.find(" goto :").ok_or_else(|| syntax_err(line))?;
  Ok(VInstrKind::Branch {
    z,
    cond: operand(rest[..goto].trim()),
    target: rest[goto + " goto :".len()..].trim().to_owned(),
  })
}

fn call(rest: &str, line: u32) -> Result<(VOperand, Vec<VOperand>), Error<'static, ()>> {
  let open = rest.find('(').ok_or_else(|| syntax_err(line))?;
  let close = rest.rfind(')').ok_or_else(|| syntax_err(line))?;
  let addr = operand(rest[..open].trim());
  let arg = split_args(&rest[open + 1..close]).iter().map(|a| operand(a)).collect();
  Ok((addr, arg))
}

fn builtin(t: &str) -> Option<(BuiltIn, Vec<VOperand>)> {
  let open = t.find('(')?;
  if !t.ends_with(')') { return None; }
  let op = BuiltIn::from_name(&t[..open])?;
  let arg = split_args(&t[open + 1..t.len() - 1]).iter().map(|a| operand(a)).collect();
  Some((op, arg))
}

fn memref(t: &str, line: u32) -> Result<(VOperand, i32), Error<'static, ()>> {
  let inner = t.strip_prefix('[').and_then(|t| t.strip_suffix(']')).ok_or_else(|| syntax_err(line))?;
  match inner.find('+') {
    Some(plus) => {
      let off = inner[plus + 1..].trim().parse::<i32>().map_err(|_| syntax_err(line))?;
      Ok((operand(inner[..plus].trim()), off))
    }
    None => Ok((operand(inner.trim()), 0)),
  }
}

fn operand(t: &str) -> VOperand {
  if let Some(l) = t.strip_prefix(':') {
    return VOperand::Label(l.to_owned());
  }
  if t.starts_with('"') && t.ends_with('"') && t.len() >= 2 {
    return VOperand::Str(t[1..t.len() - 1].to_owned());
  }
  match t.parse::<i32>() {
    Ok(i) => VOperand::Const(i),
    Err(_) => VOperand::Var(t.to_owned()),
  }
}

// arguments are space separated, except that a quoted string is a single argument
fn split_args(s: &str) -> Vec<String> {
  let mut out = Vec::new();
  let b = s.as_bytes();
  let mut i = 0;
  while i < b.len() {
    if b[i].is_ascii_whitespace() {
      i += 1;
    } else if b[i] == b'"' {
      let start = i;
      i += 1;
      while i < b.len() && b[i] != b'"' { i += 1; }
      i = (i + 1).min(b.len());
      out.push(s[start..i].to_owned());
    } else {
      let start = i;
      while i < b.len() && !b[i].is_ascii_whitespace() { i += 1; }
      out.push(s[start..i].to_owned());
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_function() {
    let p = work(
      "func A.inc(this n)\n  t.0 = Add(n 1)\n  ret t.0\n",
    ).unwrap();
    assert_eq!(p.func.len(), 1);
    let f = &p.func[0];
    assert_eq!(f.name, "A.inc");
    assert_eq!(f.param, ["this", "n"]);
    assert_eq!(f.body.len(), 2);
    assert_eq!(f.line, 1);
    assert_eq!(f.body[0].line, 2);
  }

  #[test]
  fn parses_labels_calls_and_guards() {
    let p = work(
      "const vmt_A\n  :A.f\n\nfunc Main()\n  t.0 = HeapAllocZ(8)\n  [t.0] = :vmt_A\n  if t.0 goto :null1\n    Error(\"null pointer\")\n  null1:\n  t.1 = [t.0]\n  t.2 = [t.1+0]\n  t.3 = call t.2(t.0)\n  PrintIntS(t.3)\n  ret\n",
    ).unwrap();
    assert_eq!(p.vtbl.len(), 1);
    assert_eq!(p.vtbl[0].name, "vmt_A");
    assert_eq!(p.vtbl[0].func, ["A.f"]);
    let f = &p.func[0];
    assert_eq!(f.label.len(), 1);
    assert_eq!(f.label[0].name, "null1");
    match &f.body[2].kind {
      VInstrKind::Branch { z: false, target, .. } => assert_eq!(target, "null1"),
      _ => panic!("expected a branch"),
    }
    match &f.body[3].kind {
      VInstrKind::BuiltIn { op: BuiltIn::Error, arg, .. } => match &arg[0] {
        VOperand::Str(s) => assert_eq!(s, "null pointer"),
        _ => panic!("expected a string operand"),
      },
      _ => panic!("expected Error"),
    }
    match &f.body[6].kind {
      VInstrKind::Call { dst: Some(d), arg, .. } => {
        assert_eq!(d, "t.3");
        assert_eq!(arg.len(), 1);
      }
      _ => panic!("expected a call"),
    }
  }
}
