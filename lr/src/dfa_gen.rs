use crate::dfa::{Dfa, NumberedState, Transition, TransitionKind};
use crate::ffn::Ffn;
use crate::item::Item;
use crate::state::State;
use crate::state_gen::close_state;
use crate::Flavor;
use bittyset::BitSet;
use grammar::{BiMap, Grammar, HashMap, Map, Set, SymbolId};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Builds the state collection for any flavor.
///
/// The canonical LR(1) collection is always built first; LALR(1) merges
/// its states by kernel core, and SLR(1)/LR(0) reuse the merged state
/// skeleton with their own lookahead rule.
pub struct DfaGenerator<'a> {
  grammar: &'a Grammar,
}

impl<'a> DfaGenerator<'a> {
  pub fn new(grammar: &'a Grammar) -> Self {
    DfaGenerator { grammar }
  }

  pub fn generate(&self, flavor: Flavor) -> Dfa {
    let grammar = self.grammar.augmented();
    let ffn = Ffn::compute(&grammar);

    let (mut states, mut transitions, initial, mut accept) = build_lr1(&grammar, &ffn);
    debug!(
      flavor = %flavor,
      states = states.len(),
      "built canonical LR(1) collection"
    );

    if flavor != Flavor::Lr1 {
      let (s, t, a) = merge_cores(&grammar, &ffn, flavor, states, transitions, accept);
      states = s;
      transitions = t;
      accept = a;
      debug!(flavor = %flavor, states = states.len(), "merged states by kernel core");
    }

    Dfa::new(flavor, grammar, states, initial, accept, transitions)
  }
}

fn build_lr1(grammar: &Grammar, ffn: &Ffn) -> (Vec<NumberedState>, Vec<Transition>, u32, u32) {
  let mut states: Vec<NumberedState> = vec![];
  let mut keys = BiMap::<Vec<u64>, u32>::new();
  let mut transitions: Vec<Transition> = vec![];
  let mut accept = 0u32;

  let kernel = vec![Item::new(grammar, -1, 0, BitSet::new())];
  let (initial, _) = intern_state(grammar, ffn, &mut states, &mut keys, kernel);

  let mut queue = VecDeque::new();
  queue.push_back(initial);

  while let Some(no) = queue.pop_front() {
    let groups = group_by_symbol(grammar, &states[(no - 1) as usize].state);
    for (sym, origins) in groups {
      if grammar.is_end(sym) {
        // the dot sits before the end marker; this is the accept state
        accept = no;
        continue;
      }
      let kernel = origins.iter().map(|item| item.advanced()).collect::<Vec<_>>();
      let (dest, is_new) = intern_state(grammar, ffn, &mut states, &mut keys, kernel);
      if is_new {
        trace!(state = dest, on = grammar.symbols.name(sym), "discovered state");
        queue.push_back(dest);
      }
      let kind = if grammar.is_nonterminal(sym) {
        TransitionKind::Goto
      } else {
        TransitionKind::Shift
      };
      transitions.push(Transition {
        kind,
        source: no,
        dest,
        symbol: sym,
        origins,
      });
    }
  }

  (states, transitions, initial, accept)
}

fn intern_state(
  grammar: &Grammar,
  ffn: &Ffn,
  states: &mut Vec<NumberedState>,
  keys: &mut BiMap<Vec<u64>, u32>,
  kernel: Vec<Item>,
) -> (u32, bool) {
  let key = State::from_kernel(kernel.clone()).lr1_key();
  if let Some(&no) = keys.get_by_left(&key) {
    return (no, false);
  }
  let no = states.len() as u32 + 1;
  let state = close_state(grammar, ffn, kernel, Flavor::Lr1);
  keys.insert(key, no);
  states.push(NumberedState { no, state });
  (no, true)
}

fn group_by_symbol(grammar: &Grammar, state: &State) -> Map<SymbolId, Vec<Item>> {
  let mut groups = Map::<SymbolId, Vec<Item>>::default();
  for item in state.items() {
    if let Some(sym) = item.symbol_after_dot(grammar) {
      groups
        .entry(sym)
        .or_insert_with(Vec::new)
        .push(item.clone());
    }
  }
  groups
}

fn merge_cores(
  grammar: &Grammar,
  ffn: &Ffn,
  flavor: Flavor,
  states: Vec<NumberedState>,
  transitions: Vec<Transition>,
  accept: u32,
) -> (Vec<NumberedState>, Vec<Transition>, u32) {
  // pools of states sharing a kernel core, in first-occurrence order, so
  // the initial state keeps number 1
  let mut pools = Map::<Vec<u64>, Vec<u32>>::default();
  for numbered in &states {
    pools
      .entry(numbered.state.core_key())
      .or_insert_with(Vec::new)
      .push(numbered.no);
  }

  let mut old_to_new = HashMap::<u32, u32>::default();
  let mut merged = Vec::with_capacity(pools.len());
  for (i, members) in pools.values().enumerate() {
    let new_no = i as u32 + 1;
    let mut kernel = states[(members[0] - 1) as usize].state.base().to_vec();
    for &member in &members[1..] {
      let other = states[(member - 1) as usize].state.base();
      for (item, pooled) in kernel.iter_mut().zip(other) {
        debug_assert_eq!(item.core(), pooled.core());
        item.lookahead.union_with(&pooled.lookahead);
      }
    }
    let state = close_state(grammar, ffn, kernel, flavor);
    for &member in members {
      old_to_new.insert(member, new_no);
    }
    merged.push(NumberedState { no: new_no, state });
  }

  let mut seen = Set::<(u32, u32, SymbolId)>::default();
  let mut new_transitions = Vec::new();
  for t in transitions {
    let source = old_to_new[&t.source];
    let dest = old_to_new[&t.dest];
    if !seen.insert((source, dest, t.symbol)) {
      continue;
    }
    let origins = merged[(source - 1) as usize]
      .state
      .items()
      .filter(|item| item.symbol_after_dot(grammar) == Some(t.symbol))
      .cloned()
      .collect();
    new_transitions.push(Transition {
      kind: t.kind,
      source,
      dest,
      symbol: t.symbol,
      origins,
    });
  }

  (merged, new_transitions, old_to_new[&accept])
}
