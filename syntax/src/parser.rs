use crate::ast::*;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::ty::{SynTy, SynTyKind, Ty};
use common::{BinOp, Error, ErrorKind, Loc, UnOp, LENGTH};

pub type Parsed<'a, T> = Result<T, Error<'a, Ty<'a>>>;

pub fn work<'a>(code: &'a str, alloc: &'a ASTAlloc<'a>) -> Parsed<'a, &'a Program<'a>> {
  let mut lexer = Lexer::new(code);
  let cur = lexer.next()?;
  let next = lexer.next()?;
  Parser { lexer, cur, next, alloc }.program()
}

// recursive descent with 2 tokens of lookahead
// the second token is what tells a local declaration `A x;` apart from an assignment `x = ...;`
struct Parser<'a> {
  lexer: Lexer<'a>,
  cur: Token<'a>,
  next: Token<'a>,
  alloc: &'a ASTAlloc<'a>,
}

impl<'a> Parser<'a> {
  fn program(mut self) -> Parsed<'a, &'a Program<'a>> {
    let main = self.main_class()?;
    let mut class = Vec::new();
    while self.cur.kind != TokenKind::Eof {
      class.push(self.class_def()?);
    }
    Ok(&*self.alloc.program.alloc(Program { main, class }))
  }

  fn bump(&mut self) -> Parsed<'a, Token<'a>> {
    let t = self.cur;
    self.cur = self.next;
    self.next = self.lexer.next()?;
    Ok(t)
  }

  fn expect(&mut self, kind: TokenKind<'a>) -> Parsed<'a, Token<'a>> {
    if self.cur.kind == kind { self.bump() } else { Err(Error(self.cur.loc, ErrorKind::SyntaxError)) }
  }

  fn ident(&mut self) -> Parsed<'a, &'a str> { self.ident_loc().map(|x| x.0) }

  fn ident_loc(&mut self) -> Parsed<'a, (&'a str, Loc)> {
    if let TokenKind::Id(n) = self.cur.kind {
      let loc = self.cur.loc;
      self.bump()?;
      Ok((n, loc))
    } else {
      Err(Error(self.cur.loc, ErrorKind::SyntaxError))
    }
  }

  // `class <Id> { public static void main(String[] <Id>) { ... } }`
  // any deviation from the fixed signature is a BadMain, not a plain syntax error
  fn main_class(&mut self) -> Parsed<'a, MainDef<'a>> {
    let loc = self.expect(TokenKind::Class)?.loc;
    let name = self.ident()?;
    self.expect(TokenKind::LBrace)?;
    use TokenKind::{LBrk, LPar, Public, RBrk, RPar, Static, StringTy, Void};
    for &k in &[Public, Static, Void] {
      if self.cur.kind != k { return Err(Error(self.cur.loc, ErrorKind::BadMain)); }
      self.bump()?;
    }
    match self.cur.kind {
      TokenKind::Id(n) if n == common::MAIN_METHOD => { self.bump()?; }
      _ => return Err(Error(self.cur.loc, ErrorKind::BadMain)),
    }
    for &k in &[LPar, StringTy, LBrk, RBrk] {
      if self.cur.kind != k { return Err(Error(self.cur.loc, ErrorKind::BadMain)); }
      self.bump()?;
    }
    let arg = match self.cur.kind {
      TokenKind::Id(n) => { self.bump()?; n }
      _ => return Err(Error(self.cur.loc, ErrorKind::BadMain)),
    };
    if self.cur.kind != RPar { return Err(Error(self.cur.loc, ErrorKind::BadMain)); }
    self.bump()?;
    self.expect(TokenKind::LBrace)?;
    let local = self.var_defs()?;
    let mut stmt = Vec::new();
    while self.cur.kind != TokenKind::RBrace {
      stmt.push(self.stmt()?);
    }
    self.bump()?;
    self.expect(TokenKind::RBrace)?;
    Ok(MainDef { loc, name, arg, local, stmt })
  }

  fn class_def(&mut self) -> Parsed<'a, &'a ClassDef<'a>> {
    let loc = self.expect(TokenKind::Class)?.loc;
    let name = self.ident()?;
    let parent = if self.cur.kind == TokenKind::Extends {
      self.bump()?;
      Some(self.ident()?)
    } else { None };
    self.expect(TokenKind::LBrace)?;
    let field = self.var_defs()?;
    let mut method = Vec::new();
    while self.cur.kind == TokenKind::Public {
      method.push(self.method_def()?);
    }
    self.expect(TokenKind::RBrace)?;
    Ok(&*self.alloc.class.alloc(ClassDef { loc, name, parent, field, method }))
  }

  fn method_def(&mut self) -> Parsed<'a, &'a MethodDef<'a>> {
    let loc = self.expect(TokenKind::Public)?.loc;
    let ret = self.ty()?;
    let name = self.ident()?;
    self.expect(TokenKind::LPar)?;
    let mut param = Vec::new();
    if self.cur.kind != TokenKind::RPar {
      loop {
        let ty = self.ty()?;
        let (name, loc) = self.ident_loc()?;
        param.push(&*self.alloc.var.alloc(VarDef { loc, name, ty }));
        if self.cur.kind == TokenKind::Comma { self.bump()?; } else { break; }
      }
    }
    self.expect(TokenKind::RPar)?;
    self.expect(TokenKind::LBrace)?;
    let local = self.var_defs()?;
    let mut body = Vec::new();
    while self.cur.kind != TokenKind::Return {
      body.push(self.stmt()?);
    }
    self.bump()?;
    let ret_expr = self.expr()?;
    self.expect(TokenKind::Semi)?;
    self.expect(TokenKind::RBrace)?;
    Ok(&*self.alloc.method.alloc(MethodDef { loc, name, ret, param, local, body, ret_expr }))
  }

  fn var_defs(&mut self) -> Parsed<'a, Vec<&'a VarDef<'a>>> {
    let mut v = Vec::new();
    loop {
      let decl = match self.cur.kind {
        TokenKind::Int | TokenKind::Boolean => true,
        TokenKind::Id(_) => if let TokenKind::Id(_) = self.next.kind { true } else { false },
        _ => false,
      };
      if !decl { break Ok(v); }
      let ty = self.ty()?;
      let (name, loc) = self.ident_loc()?;
      self.expect(TokenKind::Semi)?;
      v.push(&*self.alloc.var.alloc(VarDef { loc, name, ty }));
    }
  }

  fn ty(&mut self) -> Parsed<'a, SynTy<'a>> {
    let loc = self.cur.loc;
    let kind = match self.cur.kind {
      TokenKind::Int => {
        self.bump()?;
        if self.cur.kind == TokenKind::LBrk {
          self.bump()?;
          self.expect(TokenKind::RBrk)?;
          SynTyKind::IntArray
        } else { SynTyKind::Int }
      }
      TokenKind::Boolean => {
        self.bump()?;
        SynTyKind::Bool
      }
      TokenKind::Id(n) => {
        self.bump()?;
        SynTyKind::Named(n)
      }
      _ => return Err(Error(loc, ErrorKind::SyntaxError)),
    };
    Ok(SynTy { loc, kind })
  }

  fn stmt(&mut self) -> Parsed<'a, Stmt<'a>> {
    let loc = self.cur.loc;
    let kind = match self.cur.kind {
      TokenKind::LBrace => {
        self.bump()?;
        let mut s = Vec::new();
        while self.cur.kind != TokenKind::RBrace {
          s.push(self.stmt()?);
        }
        self.bump()?;
        StmtKind::Block(s)
      }
      TokenKind::If => {
        self.bump()?;
        self.expect(TokenKind::LPar)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RPar)?;
        let on_true = self.stmt()?;
        self.expect(TokenKind::Else)?;
        let on_false = self.stmt()?;
        Box::new(If { cond, on_true, on_false }).into()
      }
      TokenKind::While => {
        self.bump()?;
        self.expect(TokenKind::LPar)?;
        let cond = self.expr()?;
        self.expect(TokenKind::RPar)?;
        let body = Box::new(self.stmt()?);
        While { cond, body }.into()
      }
      TokenKind::Println => {
        self.bump()?;
        self.expect(TokenKind::LPar)?;
        let e = self.expr()?;
        self.expect(TokenKind::RPar)?;
        self.expect(TokenKind::Semi)?;
        StmtKind::Print(e)
      }
      TokenKind::Id(dst) => {
        self.bump()?;
        match self.cur.kind {
          TokenKind::Assign => {
            self.bump()?;
            let src = self.expr()?;
            self.expect(TokenKind::Semi)?;
            Assign { dst, src }.into()
          }
          TokenKind::LBrk => {
            self.bump()?;
            let idx = self.expr()?;
            self.expect(TokenKind::RBrk)?;
            self.expect(TokenKind::Assign)?;
            let src = self.expr()?;
            self.expect(TokenKind::Semi)?;
            IndexAssign { dst, idx, src }.into()
          }
          _ => return Err(Error(self.cur.loc, ErrorKind::SyntaxError)),
        }
      }
      _ => return Err(Error(loc, ErrorKind::SyntaxError)),
    };
    Ok(Stmt { loc, kind })
  }

  fn expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let mut l = self.cmp_expr()?;
    while self.cur.kind == TokenKind::AndAnd {
      self.bump()?;
      let r = self.cmp_expr()?;
      l = bin(BinOp::And, l, r);
    }
    Ok(l)
  }

  fn cmp_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let mut l = self.add_expr()?;
    while self.cur.kind == TokenKind::Lt {
      self.bump()?;
      let r = self.add_expr()?;
      l = bin(BinOp::Lt, l, r);
    }
    Ok(l)
  }

  fn add_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let mut l = self.mul_expr()?;
    loop {
      let op = match self.cur.kind {
        TokenKind::Add => BinOp::Add,
        TokenKind::Sub => BinOp::Sub,
        _ => break Ok(l),
      };
      self.bump()?;
      let r = self.mul_expr()?;
      l = bin(op, l, r);
    }
  }

  fn mul_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let mut l = self.unary_expr()?;
    while self.cur.kind == TokenKind::Mul {
      self.bump()?;
      let r = self.unary_expr()?;
      l = bin(BinOp::Mul, l, r);
    }
    Ok(l)
  }

  fn unary_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    if self.cur.kind == TokenKind::Not {
      let loc = self.cur.loc;
      self.bump()?;
      let r = Box::new(self.unary_expr()?);
      Ok(Expr { loc, kind: Unary { op: UnOp::Not, r }.into() })
    } else {
      self.postfix_expr()
    }
  }

  // indexing, `.length` and method calls bind tightest
  fn postfix_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let mut e = self.primary_expr()?;
    loop {
      match self.cur.kind {
        TokenKind::LBrk => {
          let loc = e.loc;
          self.bump()?;
          let idx = Box::new(self.expr()?);
          self.expect(TokenKind::RBrk)?;
          e = Expr { loc, kind: IndexSel { arr: Box::new(e), idx }.into() };
        }
        TokenKind::Dot => {
          self.bump()?;
          let (name, loc) = self.ident_loc()?;
          if name == LENGTH && self.cur.kind != TokenKind::LPar {
            e = Expr { loc: e.loc, kind: Length { arr: Box::new(e) }.into() };
          } else {
            self.expect(TokenKind::LPar)?;
            let mut arg = Vec::new();
            if self.cur.kind != TokenKind::RPar {
              loop {
                arg.push(self.expr()?);
                if self.cur.kind == TokenKind::Comma { self.bump()?; } else { break; }
              }
            }
            self.expect(TokenKind::RPar)?;
            e = Expr { loc, kind: Call { owner: Box::new(e), name, arg, owner_class: std::cell::Cell::new(None) }.into() };
          }
        }
        _ => break Ok(e),
      }
    }
  }

  fn primary_expr(&mut self) -> Parsed<'a, Expr<'a>> {
    let loc = self.cur.loc;
    let kind = match self.cur.kind {
      TokenKind::IntLit(i) => {
        self.bump()?;
        i.into()
      }
      TokenKind::True => {
        self.bump()?;
        true.into()
      }
      TokenKind::False => {
        self.bump()?;
        false.into()
      }
      TokenKind::Id(name) => {
        self.bump()?;
        VarSel { name }.into()
      }
      TokenKind::This => {
        self.bump()?;
        This.into()
      }
      TokenKind::New => {
        self.bump()?;
        match self.cur.kind {
          TokenKind::Int => {
            self.bump()?;
            self.expect(TokenKind::LBrk)?;
            let len = Box::new(self.expr()?);
            self.expect(TokenKind::RBrk)?;
            NewArray { len }.into()
          }
          TokenKind::Id(name) => {
            self.bump()?;
            self.expect(TokenKind::LPar)?;
            self.expect(TokenKind::RPar)?;
            NewClass { name }.into()
          }
          _ => return Err(Error(self.cur.loc, ErrorKind::SyntaxError)),
        }
      }
      TokenKind::LPar => {
        self.bump()?;
        let e = self.expr()?;
        self.expect(TokenKind::RPar)?;
        return Ok(e);
      }
      _ => return Err(Error(loc, ErrorKind::SyntaxError)),
    };
    Ok(Expr { loc, kind })
  }
}

fn bin<'a>(op: BinOp, l: Expr<'a>, r: Expr<'a>) -> Expr<'a> {
  Expr { loc: l.loc, kind: Binary { op, l: Box::new(l), r: Box::new(r) }.into() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_factorial() {
    let alloc = ASTAlloc::default();
    let p = work(
      "class M { public static void main(String[] a){ System.out.println(new F().fac(5)); } } \
       class F { public int fac(int n){ int r; if (n < 1) r = 1; else r = n * this.fac(n-1); return r; } }",
      &alloc,
    ).unwrap();
    assert_eq!(p.main.name, "M");
    assert_eq!(p.class.len(), 1);
    let f = p.class[0];
    assert_eq!(f.name, "F");
    assert_eq!(f.method.len(), 1);
    assert_eq!(f.method[0].param.len(), 1);
    assert_eq!(f.method[0].local.len(), 1);
  }

  #[test]
  fn length_is_not_a_call() {
    let alloc = ASTAlloc::default();
    let p = work(
      "class M { public static void main(String[] a){ int[] x; x = new int[2]; System.out.println(x.length); } }",
      &alloc,
    ).unwrap();
    match &p.main.stmt[1].kind {
      StmtKind::Print(e) => match &e.kind {
        ExprKind::Length(_) => {}
        _ => panic!("expected a Length node"),
      },
      _ => panic!("expected a Print statement"),
    }
  }

  #[test]
  fn rejects_broken_main_signature() {
    let alloc = ASTAlloc::default();
    let r = work("class M { public void main(String[] a){ } }", &alloc);
    match r {
      Err(Error(_, ErrorKind::BadMain)) => {}
      _ => panic!("expected BadMain"),
    }
  }
}
