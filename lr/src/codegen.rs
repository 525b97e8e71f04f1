use crate::engine::{Engine, RuleInfo};
use crate::parse_table::{Action, ParseTable};
use grammar::Map;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Everything a host needs to persist to rebuild a parser: the tables,
/// the rule table and the end marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
  pub parse_table: ParseTable,
  pub rule_table: Map<i32, RuleInfo>,
  pub end_marker: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub override_table: Option<ParseTable>,
}

impl ParserConfig {
  pub fn from_engine(engine: &Engine) -> ParserConfig {
    let overrides = engine.overrides();
    ParserConfig {
      parse_table: engine.table().clone(),
      rule_table: engine.rules().clone(),
      end_marker: engine.end_marker().to_owned(),
      override_table: if overrides.table.is_empty() {
        None
      } else {
        Some(overrides.clone())
      },
    }
  }

  pub fn to_json(&self) -> serde_json::Value {
    serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
  }
}

struct IndentWriter<W> {
  inner: W,
  bol: bool,
  indent: usize,
}

impl<W: Write> IndentWriter<W> {
  fn new(inner: W) -> Self {
    Self {
      inner,
      bol: true,
      indent: 0,
    }
  }

  fn indent(&mut self) {
    self.indent += 1;
  }

  fn dedent(&mut self) {
    assert!(self.indent > 0);
    self.indent -= 1;
  }

  fn into_inner(self) -> W {
    self.inner
  }
}

impl<W: Write> Write for IndentWriter<W> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    let mut first_line = true;
    for line in s.split('\n') {
      if !first_line {
        self.inner.write_char('\n')?;
        self.bol = true;
      }

      if self.bol && !line.is_empty() {
        write!(&mut self.inner, "{:1$}", "", self.indent * 2)?;
        self.bol = false;
      }

      self.inner.write_str(line)?;

      first_line = false;
    }
    Ok(())
  }
}

fn render_action(action: &Action) -> String {
  match action {
    Action::Shift { destination } => format!("Action::Shift({})", destination),
    Action::Goto { destination } => format!("Action::Goto({})", destination),
    Action::Reduce { rule } => format!("Action::Reduce({})", rule),
    Action::Accept => "Action::Accept".to_owned(),
    Action::ShiftReduce { rule } => format!("Action::ShiftReduce({})", rule),
  }
}

fn write_cell_arms(w: &mut IndentWriter<String>, table: &ParseTable) {
  for (state, row) in &table.table {
    for (symbol, cell) in row {
      if cell.is_empty() {
        continue;
      }
      let actions = cell
        .iter()
        .map(render_action)
        .collect::<Vec<_>>()
        .join(", ");
      writeln!(w, "({}, {:?}) => &[{}],", state, symbol, actions).unwrap();
    }
  }
}

/// Emits a single-file, dependency-free Rust program that drives the
/// embedded tables over command-line tokens, printing a per-step trace
/// and ACCEPT or an error.
pub fn generate_parser(config: &ParserConfig) -> String {
  let mut w = IndentWriter::new(String::new());

  writeln!(w, "// Generated LR parser. Tokens are command-line arguments.").unwrap();
  writeln!(w).unwrap();
  writeln!(w, "#[derive(Clone, Copy, Debug)]").unwrap();
  writeln!(w, "enum Action {{").unwrap();
  w.indent();
  writeln!(w, "Shift(u32),").unwrap();
  writeln!(w, "Goto(u32),").unwrap();
  writeln!(w, "Reduce(i32),").unwrap();
  writeln!(w, "Accept,").unwrap();
  writeln!(w, "ShiftReduce(i32),").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  writeln!(w, "const END_MARKER: &str = {:?};", config.end_marker).unwrap();
  writeln!(w).unwrap();

  writeln!(w, "fn actions(state: u32, symbol: &str) -> &'static [Action] {{").unwrap();
  w.indent();
  writeln!(w, "match (state, symbol) {{").unwrap();
  w.indent();
  write_cell_arms(&mut w, &config.parse_table);
  writeln!(w, "_ => &[],").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  writeln!(
    w,
    "fn overrides(state: u32, symbol: &str) -> &'static [Action] {{"
  )
  .unwrap();
  w.indent();
  writeln!(w, "match (state, symbol) {{").unwrap();
  w.indent();
  if let Some(overrides) = &config.override_table {
    write_cell_arms(&mut w, overrides);
  }
  writeln!(w, "_ => &[],").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  writeln!(w, "fn rule(no: i32) -> (&'static str, usize) {{").unwrap();
  w.indent();
  writeln!(w, "match no {{").unwrap();
  w.indent();
  for (no, info) in &config.rule_table {
    writeln!(w, "{} => ({:?}, {}),", no, info.lhs, info.rhs_len).unwrap();
  }
  writeln!(w, "_ => die(\"unknown rule number.\"),").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  writeln!(w, "fn lookup(state: u32, symbol: &str) -> &'static [Action] {{").unwrap();
  w.indent();
  writeln!(w, "let cell = overrides(state, symbol);").unwrap();
  writeln!(w, "if !cell.is_empty() {{").unwrap();
  w.indent();
  writeln!(w, "return cell;").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w, "actions(state, symbol)").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  writeln!(w, "fn die(msg: &str) -> ! {{").unwrap();
  w.indent();
  writeln!(w, "eprintln!(\"error: {{}}\", msg);").unwrap();
  writeln!(w, "std::process::exit(1);").unwrap();
  w.dedent();
  writeln!(w, "}}").unwrap();
  writeln!(w).unwrap();

  let body = r#"fn main() {
  let mut tokens: Vec<String> = std::env::args().skip(1).collect();
  if tokens.last().map(|t| t.as_str()) != Some(END_MARKER) {
    tokens.push(END_MARKER.to_string());
  }

  let mut stack: Vec<u32> = vec![1];
  let mut dot = 0usize;
  let mut step = 0usize;

  loop {
    step += 1;
    let state = match stack.last() {
      Some(&state) => state,
      None => die("parse stack can not be empty."),
    };
    let token = match tokens.get(dot) {
      Some(token) => token.as_str(),
      None => die("there are no more tokens to parse."),
    };
    let cell = lookup(state, token);
    if cell.is_empty() {
      die("no actions exist for the next token at the current state.");
    }
    if cell.len() > 1 {
      die("there are more than one action for the current state with next token.");
    }

    let action = cell[0];
    println!("step {:3}: state {:3}, token {:?}, {:?}", step, state, token, action);
    match action {
      Action::Accept => {
        println!("ACCEPT");
        return;
      }
      Action::Shift(dest) => {
        stack.push(dest);
        dot += 1;
      }
      Action::Goto(_) => {
        die("no actions exist for the next token at the current state.");
      }
      Action::Reduce(no) => {
        reduce(&mut stack, no, false);
      }
      Action::ShiftReduce(no) => {
        dot += 1;
        reduce(&mut stack, no, true);
      }
    }
  }
}

fn reduce(stack: &mut Vec<u32>, no: i32, fused: bool) {
  let (lhs, rhs_len) = rule(no);
  let pops = if fused { rhs_len.saturating_sub(1) } else { rhs_len };
  if stack.len() <= pops {
    die("parse stack is empty after popping the last #rhsl states.");
  }
  stack.truncate(stack.len() - pops);
  let top = *stack.last().unwrap();
  match lookup(top, lhs) {
    [Action::Goto(dest)] => stack.push(*dest),
    _ => die("goto action for this non-terminal does not exist."),
  }
}
"#;
  w.write_str(body).unwrap();

  w.into_inner()
}
