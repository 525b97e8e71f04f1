use getopts::Options;
use grammar::Grammar;
use lr::codegen::{generate_parser, ParserConfig};
use lr::tables::gen_table;
use lr::{DfaGenerator, Engine, Flavor, ParseTable};
use std::env;
use std::fs;
use std::process;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = env::args().collect::<Vec<_>>();
  let prog = args[0].clone();
  let mut opts = Options::new();
  opts.optopt(
    "t",
    "type",
    "Type of parser construction algorithm. Defaults to lalr1.\n\
      Supported types: lr0, slr1, lalr1, lr1 (case insensitive)",
    "TYPE",
  );
  opts.optopt("s", "start", "Start symbol (defaults to the first LHS)", "SYM");
  opts.optopt("i", "input", "Token stream to parse, whitespace separated", "TOKENS");
  opts.optflag("", "states", "Print the state collection");
  opts.optflag("", "table", "Print the parse table as JSON");
  opts.optflag("", "optimize", "Optimize the table and print the state remapping");
  opts.optopt("o", "emit", "Write a standalone parser program to FILE", "FILE");
  opts.optopt("", "override", "JSON override table consulted before the main table", "FILE");
  opts.optflag("h", "help", "Print this message");

  let matches = match opts.parse(&args[1..]) {
    Ok(m) => m,
    Err(err) => {
      eprintln!("{}", err);
      process::exit(1);
    }
  };

  if matches.opt_present("h") {
    print_usage(prog, opts);
    return;
  }

  if matches.free.len() > 1 {
    print_usage(prog, opts);
    process::exit(1);
  }

  if let Err(err) = run(&matches) {
    eprintln!("{}", err);
    process::exit(1);
  }
}

fn print_usage(prog: String, opts: Options) {
  let brief = format!(
    "Usage: {} [options] [GRAMMAR_FILE]\n\n\
      GRAMMAR_FILE holds one production per line, as in: E -> E + T\n\
      Without a file, the built-in expression grammar is used.",
    prog
  );
  print!("{}", opts.usage(&brief));
}

fn run(matches: &getopts::Matches) -> Result<(), String> {
  let flavor = match matches.opt_str("t") {
    Some(name) => Flavor::parse(&name).ok_or_else(|| format!("unknown parser type: {}", name))?,
    None => Flavor::Lalr1,
  };

  let start = matches.opt_str("s");
  let grammar = match matches.free.first() {
    Some(path) => {
      let text =
        fs::read_to_string(path).map_err(|err| format!("cannot read {}: {}", path, err))?;
      let lines = text.lines().collect::<Vec<_>>();
      Grammar::parse(&lines, start.as_deref()).map_err(|err| err.to_string())?
    }
    None => Grammar::default_example(),
  };

  let dfa = DfaGenerator::new(&grammar).generate(flavor);
  if matches.opt_present("states") {
    println!("{}", dfa);
  }

  let mut table = gen_table(&dfa);
  for (state, symbol, cell) in table.conflicts() {
    eprintln!(
      "conflict: state {} on {}: {}",
      state,
      symbol,
      serde_json::to_string(&cell).unwrap_or_default()
    );
  }

  if matches.opt_present("optimize") {
    let optimized = table.optimize();
    println!(
      "{}",
      serde_json::to_string_pretty(&serde_json::json!({
        "stateMapping": optimized.state_mapping,
        "removed": optimized.removed,
        "kept": optimized.kept,
      }))
      .map_err(|err| err.to_string())?
    );
    table = optimized.table;
  }

  if matches.opt_present("table") {
    println!(
      "{}",
      serde_json::to_string_pretty(&table).map_err(|err| err.to_string())?
    );
  }

  let mut engine = Engine::new(table, &dfa.grammar);

  if let Some(path) = matches.opt_str("override") {
    let text = fs::read_to_string(&path).map_err(|err| format!("cannot read {}: {}", path, err))?;
    let overrides: ParseTable =
      serde_json::from_str(&text).map_err(|err| format!("bad override table: {}", err))?;
    engine.set_overrides(overrides);
  }

  if let Some(input) = matches.opt_str("i") {
    engine.parse(&input);
    for step in engine.history() {
      println!(
        "{}",
        serde_json::to_string(&step.to_json()).map_err(|err| err.to_string())?
      );
    }
    let status = engine.status();
    if status.accepted {
      println!(
        "{}",
        serde_json::to_string_pretty(&status.tree_stack).map_err(|err| err.to_string())?
      );
    } else if let Some(error) = status.error {
      return Err(error.to_string());
    }
  }

  if let Some(path) = matches.opt_str("o") {
    let config = ParserConfig::from_engine(&engine);
    fs::write(&path, generate_parser(&config))
      .map_err(|err| format!("cannot write {}: {}", path, err))?;
  }

  Ok(())
}
