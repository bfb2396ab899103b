use clap::{App, Arg};
use driver::{allocate, compile, Stage};
use std::io::Read;
use std::{fs, io, process};
use syntax::ASTAlloc;

fn main() -> io::Result<()> {
  let matches = App::new("mjavac")
    .arg(Arg::with_name("input"))
    .arg(Arg::with_name("output").long("output").short("o").takes_value(true))
    .arg(Arg::with_name("target").long("target").short("t").takes_value(true).default_value("vaporm"))
    .get_matches();
  let stage = match matches.value_of("target").unwrap() {
    t if t.eq_ignore_ascii_case("check") => Stage::Check,
    t if t.eq_ignore_ascii_case("vapor") => Stage::Vapor,
    t if t.eq_ignore_ascii_case("vaporm") => Stage::VaporM,
    t => {
      eprintln!("invalid target: `{}`", t);
      process::exit(1);
    }
  };
  let input = matches.value_of("input");
  let code = match input {
    Some(f) => fs::read_to_string(f)?,
    None => {
      let mut buf = String::new();
      io::stdin().read_to_string(&mut buf)?;
      buf
    }
  };
  // a `.vapor` input skips the front end and only runs register allocation
  let from_vapor = input.map(|f| f.ends_with(".vapor")).unwrap_or(false);
  let alloc = ASTAlloc::default();
  let result = if from_vapor {
    allocate(&code).map_err(|e| format!("{:?}", e))
  } else {
    compile(&code, &alloc, stage).map_err(|e| format!("{:?}", e))
  };
  match result {
    Ok(out) => match matches.value_of("output") {
      Some(o) => fs::write(o, out),
      None => {
        print!("{}", out);
        Ok(())
      }
    },
    Err(e) => {
      eprintln!("{}", e);
      process::exit(1);
    }
  }
}
