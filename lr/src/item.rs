use bittyset::BitSet;
use grammar::{Grammar, SymbolId};
use itertools::Itertools;
use std::fmt::Write;

/// A dotted production with a lookahead set.
///
/// `prod` is the production number (`-1` for the augmenting production).
/// The core of an item is (prod, dot); the lookahead never participates
/// in core identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  pub prod: i32,
  pub dot: u32,
  pub lookahead: BitSet,
}

impl Item {
  pub fn new(grammar: &Grammar, prod: i32, dot: u32, lookahead: BitSet) -> Item {
    assert!(dot as usize <= grammar.production(prod).rhs.len());
    Item {
      prod,
      dot,
      lookahead,
    }
  }

  /// Encodes (prod, dot) into a single key. The augmenting production's
  /// `-1` maps to zero, so every core is non-negative.
  pub fn core(&self) -> u64 {
    (((self.prod + 1) as u64) << 32) | self.dot as u64
  }

  pub fn advanced(&self) -> Item {
    Item {
      prod: self.prod,
      dot: self.dot + 1,
      lookahead: self.lookahead.clone(),
    }
  }

  pub fn lhs(&self, grammar: &Grammar) -> SymbolId {
    grammar.production(self.prod).lhs
  }

  pub fn symbol_after_dot(&self, grammar: &Grammar) -> Option<SymbolId> {
    grammar
      .production(self.prod)
      .rhs
      .get(self.dot as usize)
      .copied()
  }

  pub fn rest_after_dot<'a>(&self, grammar: &'a Grammar) -> &'a [SymbolId] {
    let rhs = &grammar.production(self.prod).rhs;
    let from = ((self.dot as usize) + 1).min(rhs.len());
    &rhs[from..]
  }

  pub fn is_reducible(&self, grammar: &Grammar) -> bool {
    self.dot as usize == grammar.production(self.prod).rhs.len()
  }

  pub fn to_string(&self, grammar: &Grammar) -> String {
    let prod = grammar.production(self.prod);
    let mut buf = format!("{} ->", grammar.symbols.name(prod.lhs));
    for (i, &sym) in prod.rhs.iter().enumerate() {
      if i == self.dot as usize {
        buf.push_str(" •");
      }
      buf.push(' ');
      buf.push_str(grammar.symbols.name(sym));
    }
    if self.dot as usize == prod.rhs.len() {
      buf.push_str(" •");
    }
    let lookahead = self
      .lookahead
      .iter()
      .map(|i| grammar.symbols.name(SymbolId::from_index(i)))
      .join(" ");
    write!(buf, " , {{{}}}", lookahead).unwrap();
    buf
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn lookahead_of(grammar: &Grammar, names: &[&str]) -> BitSet {
    names
      .iter()
      .map(|n| grammar.symbols.get(n).unwrap().index())
      .collect()
  }

  #[test]
  fn core_ignores_lookahead() {
    let grammar = Grammar::default_example();
    let a = Item::new(&grammar, 0, 1, lookahead_of(&grammar, &["$"]));
    let b = Item::new(&grammar, 0, 1, lookahead_of(&grammar, &["+", ")"]));
    assert_eq!(a.core(), b.core());
    assert_ne!(a.core(), a.advanced().core());
  }

  #[test]
  fn navigation() {
    let grammar = Grammar::default_example().augmented();
    // E'' -> • E $
    let item = Item::new(&grammar, -1, 0, BitSet::new());
    let e = grammar.symbols.get("E").unwrap();
    assert_eq!(item.symbol_after_dot(&grammar), Some(e));
    assert_eq!(item.rest_after_dot(&grammar), &[grammar.end]);
    assert!(!item.is_reducible(&grammar));

    let done = item.advanced().advanced();
    assert_eq!(done.symbol_after_dot(&grammar), None);
    assert!(done.rest_after_dot(&grammar).is_empty());
    assert!(done.is_reducible(&grammar));
  }

  #[test]
  fn rendering() {
    let grammar = Grammar::default_example();
    let item = Item::new(&grammar, 0, 1, lookahead_of(&grammar, &["$", ")"]));
    assert_eq!(item.to_string(&grammar), "E -> T • E' , {) $}");

    let lambda = Item::new(&grammar, 1, 0, lookahead_of(&grammar, &["+"]));
    assert_eq!(lambda.to_string(&grammar), "E' -> • , {+}");
  }
}
