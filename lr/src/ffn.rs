use bittyset::BitSet;
use grammar::{Grammar, Map, SymbolId};

/// Unions `src` into `dst`, reporting whether `dst` grew.
///
/// `BitSet::union_with` returns nothing, but the fixpoint loops below
/// need to observe growth.
pub(crate) fn union_grew(dst: &mut BitSet, src: &BitSet) -> bool {
  let mut changed = false;
  for i in src.iter() {
    if !dst.contains(i) {
      dst.insert(i);
      changed = true;
    }
  }
  changed
}

/// Nullable/FIRST/FOLLOW analysis of a grammar.
///
/// All three are computed as monotonic fixpoints at construction; the
/// query surface below is total. A symbol that is not a nonterminal of
/// the grammar (a terminal, the end marker, or an undefined name) is its
/// own FIRST and is never nullable.
#[derive(Debug, Clone)]
pub struct Ffn {
  pub nullable: BitSet,
  pub first: Map<SymbolId, BitSet>,
  pub follow: Map<SymbolId, BitSet>,
  empty: BitSet,
}

impl Ffn {
  pub fn compute(grammar: &Grammar) -> Ffn {
    let nullable = compute_nullable(grammar);
    let first = compute_first(grammar, &nullable);
    let follow = compute_follow(grammar, &nullable, &first);
    Ffn {
      nullable,
      first,
      follow,
      empty: BitSet::new(),
    }
  }

  pub fn is_nullable(&self, sym: SymbolId) -> bool {
    self.nullable.contains(sym.index())
  }

  pub fn is_seq_nullable(&self, seq: &[SymbolId]) -> bool {
    seq.iter().all(|&sym| self.is_nullable(sym))
  }

  /// FIRST of a single nonterminal. Empty for anything else; callers
  /// that may hold a terminal should go through [`Ffn::first_of_seq`].
  pub fn first_of(&self, sym: SymbolId) -> &BitSet {
    self.first.get(&sym).unwrap_or(&self.empty)
  }

  pub fn follow_of(&self, sym: SymbolId) -> &BitSet {
    self.follow.get(&sym).unwrap_or(&self.empty)
  }

  /// FIRST of a sequence, with an optional trailing lookahead set that
  /// applies when the whole sequence is nullable.
  pub fn first_of_seq(
    &self,
    grammar: &Grammar,
    seq: &[SymbolId],
    extra: Option<&BitSet>,
  ) -> BitSet {
    let mut out = BitSet::new();
    if self.seq_first_into(grammar, seq, &mut out) {
      if let Some(extra) = extra {
        out.union_with(extra);
      }
    }
    out
  }

  /// FOLLOW of a sequence occurrence, scanned from the right: the FOLLOW
  /// of the last symbol, plus that of each preceding symbol while the
  /// scanned suffix stays nullable.
  pub fn follow_of_seq(&self, seq: &[SymbolId]) -> BitSet {
    let mut out = BitSet::new();
    for &sym in seq.iter().rev() {
      out.union_with(self.follow_of(sym));
      if !self.is_nullable(sym) {
        break;
      }
    }
    out
  }

  /// Accumulates FIRST(seq) into `out`; returns true when seq is nullable.
  pub(crate) fn seq_first_into(
    &self,
    grammar: &Grammar,
    seq: &[SymbolId],
    out: &mut BitSet,
  ) -> bool {
    for &sym in seq {
      if grammar.is_nonterminal(sym) {
        out.union_with(self.first_of(sym));
        if !self.is_nullable(sym) {
          return false;
        }
      } else {
        out.insert(sym.index());
        return false;
      }
    }
    true
  }
}

fn compute_nullable(grammar: &Grammar) -> BitSet {
  let mut nullable = BitSet::new();
  loop {
    let mut changed = false;
    for prod in &grammar.prods {
      if nullable.contains(prod.lhs.index()) {
        continue;
      }
      if prod.rhs.iter().all(|sym| nullable.contains(sym.index())) {
        nullable.insert(prod.lhs.index());
        changed = true;
      }
    }
    if !changed {
      break;
    }
  }
  nullable
}

fn compute_first(grammar: &Grammar, nullable: &BitSet) -> Map<SymbolId, BitSet> {
  let mut first = Map::<SymbolId, BitSet>::default();
  for nt in grammar.nonterminals.iter() {
    first.insert(SymbolId::from_index(nt), BitSet::new());
  }

  loop {
    let mut changed = false;
    for prod in &grammar.prods {
      let mut gain = BitSet::new();
      for &sym in &prod.rhs {
        if grammar.is_nonterminal(sym) {
          gain.union_with(&first[&sym]);
          if !nullable.contains(sym.index()) {
            break;
          }
        } else {
          gain.insert(sym.index());
          break;
        }
      }
      changed |= union_grew(first.get_mut(&prod.lhs).unwrap(), &gain);
    }
    if !changed {
      break;
    }
  }
  first
}

fn compute_follow(
  grammar: &Grammar,
  nullable: &BitSet,
  first: &Map<SymbolId, BitSet>,
) -> Map<SymbolId, BitSet> {
  let mut follow = Map::<SymbolId, BitSet>::default();
  for nt in grammar.nonterminals.iter() {
    follow.insert(SymbolId::from_index(nt), BitSet::new());
  }
  follow
    .get_mut(&grammar.start)
    .unwrap()
    .insert(grammar.end.index());

  loop {
    let mut changed = false;
    for prod in &grammar.prods {
      for (i, &sym) in prod.rhs.iter().enumerate() {
        if !grammar.is_nonterminal(sym) {
          continue;
        }
        let rest = &prod.rhs[i + 1..];
        let mut gain = BitSet::new();
        let mut rest_nullable = true;
        for &r in rest {
          if grammar.is_nonterminal(r) {
            gain.union_with(&first[&r]);
            if !nullable.contains(r.index()) {
              rest_nullable = false;
              break;
            }
          } else {
            gain.insert(r.index());
            rest_nullable = false;
            break;
          }
        }
        if rest_nullable {
          let lhs_follow = follow[&prod.lhs].clone();
          gain.union_with(&lhs_follow);
        }
        changed |= union_grew(follow.get_mut(&sym).unwrap(), &gain);
      }
    }
    if !changed {
      break;
    }
  }
  follow
}
