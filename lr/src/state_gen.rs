use crate::ffn::{union_grew, Ffn};
use crate::item::Item;
use crate::state::State;
use crate::Flavor;
use bittyset::BitSet;
use grammar::{Grammar, Set};

/// Closes a kernel into a full state and assigns lookaheads per flavor.
///
/// The closure itself is flavor-independent (cores only); flavors differ
/// only in the lookahead pass:
/// - `Lr1`/`Lalr1`: contextual propagation to a fixpoint;
/// - `Slr1`: every item gets FOLLOW of its LHS;
/// - `Lr0`: every item gets the whole terminal alphabet.
pub fn close_state(grammar: &Grammar, ffn: &Ffn, kernel: Vec<Item>, flavor: Flavor) -> State {
  let state = State::from_kernel(kernel);
  let mut items = state.base;
  let base_len = items.len();

  // closure on cores
  let mut seen = items.iter().map(|item| item.core()).collect::<Set<u64>>();
  let mut i = 0;
  while i < items.len() {
    if let Some(sym) = items[i].symbol_after_dot(grammar) {
      if grammar.is_nonterminal(sym) {
        for &prod_ix in grammar.prods_for(sym) {
          let item = Item::new(grammar, grammar.prods[prod_ix].no, 0, BitSet::new());
          if seen.insert(item.core()) {
            items.push(item);
          }
        }
      }
    }
    i += 1;
  }

  match flavor {
    Flavor::Lr1 | Flavor::Lalr1 => loop {
      let mut changed = false;
      for i in 0..items.len() {
        let sym = match items[i].symbol_after_dot(grammar) {
          Some(sym) if grammar.is_nonterminal(sym) => sym,
          _ => continue,
        };
        let rest = items[i].rest_after_dot(grammar).to_vec();
        let gain = ffn.first_of_seq(grammar, &rest, Some(&items[i].lookahead));
        for j in base_len..items.len() {
          if items[j].dot == 0 && items[j].lhs(grammar) == sym {
            changed |= union_grew(&mut items[j].lookahead, &gain);
          }
        }
      }
      if !changed {
        break;
      }
    },
    Flavor::Slr1 => {
      for i in 0..items.len() {
        let lhs = items[i].lhs(grammar);
        items[i].lookahead = ffn.follow_of(lhs).clone();
      }
    }
    Flavor::Lr0 => {
      let alphabet = grammar.terminal_alphabet();
      for item in items.iter_mut() {
        item.lookahead = alphabet.clone();
      }
    }
  }

  let derived = items.split_off(base_len);
  State {
    base: items,
    derived,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn lookaheads(grammar: &Grammar, item: &Item) -> Vec<String> {
    let mut names = item
      .lookahead
      .iter()
      .map(|i| {
        grammar
          .symbols
          .name(grammar::SymbolId::from_index(i))
          .to_owned()
      })
      .collect::<Vec<_>>();
    names.sort();
    names
  }

  fn initial_kernel(grammar: &Grammar) -> Vec<Item> {
    vec![Item::new(grammar, -1, 0, BitSet::new())]
  }

  #[test]
  fn lr1_closure_of_initial_state() {
    let grammar = Grammar::default_example().augmented();
    let ffn = Ffn::compute(&grammar);
    let state = close_state(&grammar, &ffn, initial_kernel(&grammar), Flavor::Lr1);

    assert_eq!(state.base().len(), 1);
    let rendered = state
      .derived()
      .iter()
      .map(|item| (item.to_string(&grammar), lookaheads(&grammar, item)))
      .collect::<Vec<_>>();
    assert_eq!(rendered.len(), 4);
    assert_eq!(
      rendered[0],
      ("E -> • T E' , {$}".to_owned(), vec!["$".to_owned()])
    );
    assert_eq!(lookaheads(&grammar, &state.derived()[1]), vec!["$", "+"]);
    assert_eq!(lookaheads(&grammar, &state.derived()[2]), vec!["$", "*", "+"]);
    assert_eq!(lookaheads(&grammar, &state.derived()[3]), vec!["$", "*", "+"]);
  }

  #[test]
  fn slr_uses_follow_of_lhs() {
    let grammar = Grammar::default_example().augmented();
    let ffn = Ffn::compute(&grammar);
    let state = close_state(&grammar, &ffn, initial_kernel(&grammar), Flavor::Slr1);

    for item in state.items() {
      let lhs = item.lhs(&grammar);
      assert_eq!(
        item.lookahead.iter().collect::<Vec<_>>(),
        ffn.follow_of(lhs).iter().collect::<Vec<_>>()
      );
    }
  }

  #[test]
  fn lr0_uses_the_whole_alphabet() {
    let grammar = Grammar::default_example().augmented();
    let ffn = Ffn::compute(&grammar);
    let state = close_state(&grammar, &ffn, initial_kernel(&grammar), Flavor::Lr0);

    let alphabet = grammar.terminal_alphabet().iter().collect::<Vec<_>>();
    for item in state.items() {
      assert_eq!(item.lookahead.iter().collect::<Vec<_>>(), alphabet);
    }
  }

  #[test]
  fn closure_is_pure_over_cores() {
    let grammar = Grammar::default_example().augmented();
    let ffn = Ffn::compute(&grammar);
    let a = close_state(&grammar, &ffn, initial_kernel(&grammar), Flavor::Lr1);
    let b = close_state(&grammar, &ffn, initial_kernel(&grammar), Flavor::Lr0);
    assert_eq!(
      a.items().map(|i| i.core()).collect::<Vec<_>>(),
      b.items().map(|i| i.core()).collect::<Vec<_>>()
    );
  }
}
