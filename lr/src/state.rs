use crate::item::Item;
use grammar::Grammar;
use itertools::Itertools;

const LOOKAHEAD_TAG: u64 = 1 << 63;

/// An item set split into its kernel (`base`) and closure-derived items.
///
/// Base items stay sorted by core and hold no duplicate cores, so the
/// identity keys below are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
  pub(crate) base: Vec<Item>,
  pub(crate) derived: Vec<Item>,
}

impl State {
  /// Builds a state from kernel items, merging lookaheads of items that
  /// share a core.
  pub fn from_kernel(items: Vec<Item>) -> State {
    let mut base: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
      match base.binary_search_by_key(&item.core(), |i| i.core()) {
        Ok(ix) => {
          base[ix].lookahead.union_with(&item.lookahead);
        }
        Err(ix) => base.insert(ix, item),
      }
    }
    State {
      base,
      derived: vec![],
    }
  }

  pub fn base(&self) -> &[Item] {
    &self.base
  }

  pub fn derived(&self) -> &[Item] {
    &self.derived
  }

  pub fn items(&self) -> impl Iterator<Item = &Item> {
    self.base.iter().chain(self.derived.iter())
  }

  /// Lookahead-blind identity of the kernel.
  pub fn core_key(&self) -> Vec<u64> {
    self.base.iter().map(|item| item.core()).collect()
  }

  /// Full LR(1) identity of the kernel: each item's core followed by its
  /// lookahead ids, tagged to keep them apart from cores.
  pub fn lr1_key(&self) -> Vec<u64> {
    let mut key = Vec::with_capacity(self.base.len() * 2);
    for item in &self.base {
      key.push(item.core());
      for la in item.lookahead.iter() {
        key.push(LOOKAHEAD_TAG | la as u64);
      }
    }
    key
  }

  pub fn to_string(&self, grammar: &Grammar) -> String {
    self
      .items()
      .map(|item| item.to_string(grammar))
      .join("\n")
  }
}
