use crate::{compile, Stage};
use colored::*;
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};
use syntax::ASTAlloc;

// directory harness: compiles every `*.java` under `path`, writes the output next to
// the expected results and reports line-level differences
// `path/result/x.result` is the expected output, `path/out/x.result` the actual one
pub fn test_all(path: impl AsRef<Path>, stage: Stage) -> io::Result<Vec<TestResult>> {
  let path = path.as_ref();
  let ans = path.join("result");
  let out = path.join("out");
  if !out.exists() {
    fs::create_dir_all(&out)?;
  }
  let mut files = fs::read_dir(path)?
    .filter_map(|f| {
      let path = f.ok()?.path();
      let name = path.file_name()?.to_str()?;
      if path.is_file() && name.ends_with(".java") { Some(name.to_owned()) } else { None }
    })
    .collect::<Vec<_>>();
  // the order of fs::read_dir may be strange, sort for better debugging
  files.sort_unstable();
  let ret = files
    .iter()
    .map(|f| test_one(path.join(f), out.join(f).with_extension("result"), ans.join(f).with_extension("result"), stage))
    .collect();
  Ok(ret)
}

pub fn test_one(i: impl AsRef<Path>, o: impl AsRef<Path>, ans: impl AsRef<Path>, stage: Stage) -> TestResult {
  let kind = run(&i, &o, stage)
    .and_then(|out| Ok((out, fs::read_to_string(&ans)?)))
    .map(|(out, ans)| ResultKind::new(&out, &ans))
    .unwrap_or_else(ResultKind::IOError);
  TestResult::new(i, o, ans, kind)
}

// a compile error becomes the output, so error tests just diff against the diagnostic
pub fn run(i: impl AsRef<Path>, o: impl AsRef<Path>, stage: Stage) -> io::Result<String> {
  let code = fs::read_to_string(i)?;
  let alloc = ASTAlloc::default();
  let out = match compile(&code, &alloc, stage) {
    Ok(p) => p,
    Err(e) => format!("{:?}\n", e),
  };
  fs::write(o, &out)?;
  Ok(out)
}

pub struct TestResult {
  pub file: PathBuf,
  pub out: PathBuf,
  pub ans: PathBuf,
  pub kind: ResultKind,
}

impl TestResult {
  pub fn new(file: impl AsRef<Path>, out: impl AsRef<Path>, ans: impl AsRef<Path>, kind: ResultKind) -> TestResult {
    TestResult { file: file.as_ref().into(), out: out.as_ref().into(), ans: ans.as_ref().into(), kind }
  }
}

pub enum ResultKind {
  Pass,
  Fail { first_diff: usize, out: String, ans: String },
  IOError(io::Error),
}

impl ResultKind {
  pub fn new(out: &str, ans: &str) -> ResultKind {
    let (mut out_lines, mut ans_lines) = (out.lines(), ans.lines());
    let mut first_diff = 1;
    // zip and pad the shorter side with empty lines
    loop {
      match (out_lines.next(), ans_lines.next()) {
        (None, None) => break ResultKind::Pass,
        (out, ans) => {
          let (out, ans) = (out.unwrap_or(""), ans.unwrap_or(""));
          if out != ans {
            break ResultKind::Fail { first_diff, out: out.to_owned(), ans: ans.to_owned() };
          }
        }
      }
      first_diff += 1;
    }
  }
}

impl fmt::Debug for TestResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
    write!(f, "{}: ", self.file.display())?;
    match &self.kind {
      ResultKind::Pass => write!(f, "{}", "Pass".green()),
      ResultKind::Fail { first_diff, out, ans } => {
        writeln!(f, "{}: {}", "Fail".red(), format!("first different line on {}", first_diff).yellow())?;
        writeln!(f, "{}", format!("your line: \"{}\" ({}:{})", out, self.out.display(), first_diff).yellow())?;
        write!(f, "{}", format!("ans  line: \"{}\" ({}:{})", ans, self.ans.display(), first_diff).yellow())
      }
      ResultKind::IOError(e) => write!(f, "{}: {}", "IOError".red(), e.to_string().yellow()),
    }
  }
}
