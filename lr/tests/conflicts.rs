use grammar::Grammar;
use lr::tables::gen_table;
use lr::{Action, DfaGenerator, Engine, Flavor, ParseError};
use pretty_assertions::assert_eq;

// if-then-else with an ambiguous else: conflicts under every flavor
fn dangling_else() -> Grammar {
  Grammar::parse(&["S -> i S e S", "S -> i S", "S -> a"], None).unwrap()
}

#[test]
fn dangling_else_conflicts_under_every_flavor() {
  let grammar = dangling_else();
  for &flavor in &Flavor::ALL {
    let dfa = DfaGenerator::new(&grammar).generate(flavor);
    let table = gen_table(&dfa);
    let conflicts = table.conflicts();
    assert!(!conflicts.is_empty(), "{} should conflict", flavor);

    // the classic cell: shift e versus reduce S -> i S
    let (state, symbol, cell) = conflicts
      .iter()
      .find(|(_, symbol, _)| symbol == "e")
      .expect("conflict on e")
      .clone();
    assert!(table.is_conflict(state, &symbol));
    assert!(cell
      .iter()
      .any(|action| matches!(action, Action::Shift { .. })));
    assert!(cell
      .iter()
      .any(|action| matches!(action, Action::Reduce { rule: 1 })));
  }
}

#[test]
fn running_into_a_conflict_cell_stops_the_engine() {
  let grammar = dangling_else();
  let dfa = DfaGenerator::new(&grammar).generate(Flavor::Lalr1);
  let mut engine = Engine::new(gen_table(&dfa), &dfa.grammar);

  let status = engine.parse("i a e a");
  assert_eq!(status.error, Some(ParseError::ConflictingActions));
  assert!(!status.accepted);
}

#[test]
fn an_override_resolves_the_conflict() {
  let grammar = dangling_else();
  let dfa = DfaGenerator::new(&grammar).generate(Flavor::Lalr1);
  let table = gen_table(&dfa);

  let (state, symbol, cell) = table
    .conflicts()
    .into_iter()
    .find(|(_, symbol, _)| symbol == "e")
    .expect("conflict on e");
  let shift = *cell
    .iter()
    .find(|action| matches!(action, Action::Shift { .. }))
    .unwrap();

  let mut engine = Engine::new(table, &dfa.grammar);
  engine.set_override(state, &symbol, vec![shift]);

  let status = engine.parse("i a e a");
  assert!(status.accepted, "error: {:?}", status.error);

  // the log shows the overridden action being taken
  let taken = engine
    .history()
    .iter()
    .find(|step| step.before.state_number() == Some(state) && step.before.next_token() == Some("e"))
    .unwrap();
  assert_eq!(taken.action, Some(shift));

  engine.clear_overrides();
  let status = engine.parse("i a e a");
  assert_eq!(status.error, Some(ParseError::ConflictingActions));
}

#[test]
fn lambda_rules_conflict_under_lr0_but_not_lalr1() {
  let grammar = Grammar::default_example();
  let lr0 = DfaGenerator::new(&grammar).generate(Flavor::Lr0);
  let lalr1 = DfaGenerator::new(&grammar).generate(Flavor::Lalr1);

  assert!(!gen_table(&lr0).conflicts().is_empty());
  assert!(gen_table(&lalr1).conflicts().is_empty());
}
