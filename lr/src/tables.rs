use crate::dfa::{Dfa, TransitionKind};
use crate::parse_table::{Action, ParseTable};
use grammar::SymbolId;
use tracing::debug;

/// Builds the action/goto table of an automaton.
///
/// Transitions become shift/goto actions; every reducible item appends a
/// reduce action over its lookahead set, which the state generator has
/// already specialized per flavor. Conflicting actions pile up in the
/// cell; the accept state's end-marker cell is forced to `accept` last.
pub fn gen_table(dfa: &Dfa) -> ParseTable {
  let grammar = &dfa.grammar;
  let mut table = ParseTable::new();

  for numbered in &dfa.states {
    table.ensure_row(numbered.no);
  }

  for t in &dfa.transitions {
    let action = match t.kind {
      TransitionKind::Shift => Action::Shift { destination: t.dest },
      TransitionKind::Goto => Action::Goto { destination: t.dest },
    };
    table.push_action(t.source, grammar.symbols.name(t.symbol), action);
  }

  for numbered in &dfa.states {
    for item in numbered.state.items() {
      if !item.is_reducible(grammar) {
        continue;
      }
      for la in item.lookahead.iter() {
        let symbol = grammar.symbols.name(SymbolId::from_index(la));
        table.push_action(numbered.no, symbol, Action::Reduce { rule: item.prod });
      }
    }
  }

  let end = grammar.symbols.name(grammar.end);
  table.set_cell(dfa.accept, end, vec![Action::Accept]);

  for (state, symbol, cell) in table.conflicts() {
    debug!(
      flavor = %dfa.flavor,
      state,
      symbol = symbol.as_str(),
      actions = cell.len(),
      "conflict cell"
    );
  }

  table
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dfa_gen::DfaGenerator;
  use crate::Flavor;
  use grammar::Grammar;
  use pretty_assertions::assert_eq;

  #[test]
  fn expression_grammar_lalr_table_is_conflict_free() {
    let grammar = Grammar::default_example();
    let dfa = DfaGenerator::new(&grammar).generate(Flavor::Lalr1);
    let table = gen_table(&dfa);

    assert!(table.conflicts().is_empty());
    assert!(table.is_shift(1, "id"));
    assert!(table.is_goto(1, "E"));
    assert!(table.is_accept(dfa.accept, "$"));
    assert!(table.is_error(1, "+"));
  }

  #[test]
  fn lr0_reduces_over_the_whole_alphabet() {
    let grammar = Grammar::default_example();
    let dfa = DfaGenerator::new(&grammar).generate(Flavor::Lr0);
    let table = gen_table(&dfa);

    // lambda rules make the expression grammar conflict under LR(0)
    assert!(!table.conflicts().is_empty());
  }

  #[test]
  fn accept_cell_wins_over_competing_actions() {
    let grammar = Grammar::default_example();
    for &flavor in &Flavor::ALL {
      let dfa = DfaGenerator::new(&grammar).generate(flavor);
      let table = gen_table(&dfa);
      assert_eq!(
        table.get(dfa.accept, "$").map(|cell| cell.to_vec()),
        Some(vec![Action::Accept])
      );
    }
  }

  #[test]
  fn slr_reduce_cells_follow_the_lhs() {
    let grammar = Grammar::default_example();
    let dfa = DfaGenerator::new(&grammar).generate(Flavor::Slr1);
    let table = gen_table(&dfa);

    // F -> id reduce appears exactly on FOLLOW(F) = {+, *, ), $}
    let state = dfa
      .states
      .iter()
      .find(|numbered| {
        numbered
          .state
          .items()
          .any(|item| item.prod == 6 && item.is_reducible(&dfa.grammar))
      })
      .unwrap();
    for symbol in &["+", "*", ")", "$"] {
      assert_eq!(
        table.single(state.no, symbol),
        Some(&Action::Reduce { rule: 6 })
      );
    }
    assert!(table.is_error(state.no, "id"));
  }
}
