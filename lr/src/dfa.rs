use crate::item::Item;
use crate::state::State;
use crate::Flavor;
use grammar::{Grammar, HashMap, SymbolId};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
  Shift,
  Goto,
}

/// An edge of the handle-finding automaton. `origins` are the source
/// state's items whose dot sits before `symbol`; advancing them yields
/// the destination kernel.
#[derive(Debug, Clone)]
pub struct Transition {
  pub kind: TransitionKind,
  pub source: u32,
  pub dest: u32,
  pub symbol: SymbolId,
  pub origins: Vec<Item>,
}

#[derive(Debug, Clone)]
pub struct NumberedState {
  pub no: u32,
  pub state: State,
}

/// The finished state collection for one flavor.
///
/// State numbers start at 1 (the initial state) and follow discovery
/// order. The automaton owns the augmented grammar it was built from.
#[derive(Debug, Clone)]
pub struct Dfa {
  pub flavor: Flavor,
  pub grammar: Grammar,
  pub states: Vec<NumberedState>,
  pub initial: u32,
  pub accept: u32,
  pub transitions: Vec<Transition>,
  table: HashMap<(u32, u32), (TransitionKind, SymbolId)>,
}

impl Dfa {
  pub(crate) fn new(
    flavor: Flavor,
    grammar: Grammar,
    states: Vec<NumberedState>,
    initial: u32,
    accept: u32,
    transitions: Vec<Transition>,
  ) -> Dfa {
    let mut table = HashMap::default();
    for t in &transitions {
      table.insert((t.source, t.dest), (t.kind, t.symbol));
    }
    Dfa {
      flavor,
      grammar,
      states,
      initial,
      accept,
      transitions,
      table,
    }
  }

  pub fn state(&self, no: u32) -> &NumberedState {
    &self.states[(no - 1) as usize]
  }

  /// The (kind, symbol) labelling the edge between two states, if any.
  pub fn edge(&self, source: u32, dest: u32) -> Option<(TransitionKind, SymbolId)> {
    self.table.get(&(source, dest)).copied()
  }

  pub fn transitions_from(&self, source: u32) -> impl Iterator<Item = &Transition> {
    self.transitions.iter().filter(move |t| t.source == source)
  }
}

impl std::fmt::Display for Dfa {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    writeln!(
      f,
      "{} automaton: {} states, initial {}, accept {}",
      self.flavor,
      self.states.len(),
      self.initial,
      self.accept
    )?;
    for numbered in &self.states {
      writeln!(f, "\nstate {}", numbered.no)?;
      for item in numbered.state.items() {
        writeln!(f, "  {}", item.to_string(&self.grammar))?;
      }
      let mut edges = String::new();
      for t in self.transitions_from(numbered.no) {
        let kind = match t.kind {
          TransitionKind::Shift => "shift",
          TransitionKind::Goto => "goto",
        };
        write!(
          edges,
          "  {} {} on {}\n",
          kind,
          t.dest,
          self.grammar.symbols.name(t.symbol)
        )?;
      }
      f.write_str(&edges)?;
    }
    Ok(())
  }
}
