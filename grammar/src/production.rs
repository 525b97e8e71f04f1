use crate::{SymbolId, SymbolTable};

/// A numbered production rule.
///
/// `no` is the rule's position in the source grammar; the augmenting
/// production gets `no == -1`. An empty `rhs` is a lambda rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
  pub no: i32,
  pub lhs: SymbolId,
  pub rhs: Vec<SymbolId>,
}

impl Production {
  pub fn is_lambda(&self) -> bool {
    self.rhs.is_empty()
  }

  pub fn rhs_len(&self) -> usize {
    self.rhs.len()
  }

  pub fn to_string(&self, symbols: &SymbolTable) -> String {
    let mut buf = format!("{} ->", symbols.name(self.lhs));
    if self.is_lambda() {
      buf.push_str(" λ");
    } else {
      for &sym in &self.rhs {
        buf.push(' ');
        buf.push_str(symbols.name(sym));
      }
    }
    buf
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn display_forms() {
    let mut symbols = SymbolTable::new();
    let e = symbols.intern("E");
    let t = symbols.intern("T");
    let plus = symbols.intern("+");

    let prod = Production { no: 0, lhs: e, rhs: vec![e, plus, t] };
    assert_eq!(prod.to_string(&symbols), "E -> E + T");

    let lambda = Production { no: 1, lhs: t, rhs: vec![] };
    assert!(lambda.is_lambda());
    assert_eq!(lambda.to_string(&symbols), "T -> λ");
  }
}
