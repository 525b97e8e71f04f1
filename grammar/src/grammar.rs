use bittyset::BitSet;
use crate::{Map, Production, SymbolId, SymbolTable};

pub const END_MARKER: &str = "$";

/// An immutable context-free grammar with derived symbol classification.
///
/// Productions are numbered `0..` in declaration order. Augmenting a
/// grammar appends the production `S' -> S $` under the number `-1`;
/// that production is never shown in user-facing listings.
#[derive(Debug, Clone)]
pub struct Grammar {
  pub symbols: SymbolTable,
  pub prods: Vec<Production>,
  pub start: SymbolId,
  pub end: SymbolId,
  pub terminals: BitSet,
  pub nonterminals: BitSet,
  prods_by_lhs: Map<SymbolId, Vec<usize>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
  Empty,
  MalformedRule(String),
  InvalidStartSymbol(String),
}

impl std::fmt::Display for GrammarError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      GrammarError::Empty => write!(f, "grammar has no productions"),
      GrammarError::MalformedRule(line) => {
        write!(f, "malformed production: {:?}", line)
      }
      GrammarError::InvalidStartSymbol(name) => {
        write!(f, "start symbol {} is not a nonterminal", name)
      }
    }
  }
}

impl std::error::Error for GrammarError {}

impl Grammar {
  /// Parses an ordered list of `LHS -> S1 S2 ... Sn` rules.
  ///
  /// An empty RHS is a lambda rule. The start symbol defaults to the LHS
  /// of the first rule. The end marker `$` is interned after all rule
  /// symbols, so user symbols keep their declaration-order ids.
  pub fn parse(rules: &[&str], start: Option<&str>) -> Result<Grammar, GrammarError> {
    let mut symbols = SymbolTable::new();
    let mut prods = Vec::new();

    for line in rules {
      let mut tokens = line.split_whitespace();
      let lhs = match tokens.next() {
        Some(lhs) => lhs,
        None => continue,
      };
      if tokens.next() != Some("->") {
        return Err(GrammarError::MalformedRule((*line).to_owned()));
      }
      let lhs = symbols.intern(lhs);
      let rhs = tokens.map(|sym| symbols.intern(sym)).collect::<Vec<_>>();
      prods.push(Production {
        no: prods.len() as i32,
        lhs,
        rhs,
      });
    }

    if prods.is_empty() {
      return Err(GrammarError::Empty);
    }

    let start = match start {
      Some(name) => {
        match symbols.get(name) {
          Some(id) if prods.iter().any(|p| p.lhs == id) => id,
          _ => return Err(GrammarError::InvalidStartSymbol(name.to_owned())),
        }
      }
      None => prods[0].lhs,
    };
    let end = symbols.intern(END_MARKER);

    let mut grammar = Grammar {
      symbols,
      prods,
      start,
      end,
      terminals: BitSet::new(),
      nonterminals: BitSet::new(),
      prods_by_lhs: Map::default(),
    };
    grammar.classify();
    Ok(grammar)
  }

  /// The classic expression grammar used as the built-in example.
  pub fn default_example() -> Grammar {
    Grammar::parse(
      &[
        "E -> T E'",
        "E' ->",
        "E' -> + T E'",
        "T -> F T'",
        "T' ->",
        "T' -> * F T'",
        "F -> id",
        "F -> ( E )",
      ],
      Some("E"),
    )
    .unwrap()
  }

  /// Returns a new grammar with a fresh start symbol `S'` and the
  /// augmenting production `S' -> S $`, numbered `-1`.
  pub fn augmented(&self) -> Grammar {
    let mut grammar = self.clone();
    let start_name = grammar.symbols.name(grammar.start).to_owned();
    let fresh = grammar.symbols.fresh_suffixed(&start_name);
    grammar.prods.push(Production {
      no: -1,
      lhs: fresh,
      rhs: vec![grammar.start, grammar.end],
    });
    grammar.start = fresh;
    grammar.classify();
    grammar
  }

  /// Looks up a production by number. `-1` is the augmenting production.
  pub fn production(&self, no: i32) -> &Production {
    if no < 0 {
      let prod = self.prods.last().unwrap();
      debug_assert_eq!(prod.no, -1);
      prod
    } else {
      &self.prods[no as usize]
    }
  }

  /// Production indices (into `prods`) whose LHS is `sym`.
  pub fn prods_for(&self, sym: SymbolId) -> &[usize] {
    self
      .prods_by_lhs
      .get(&sym)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn is_terminal(&self, sym: SymbolId) -> bool {
    self.terminals.contains(sym.index())
  }

  pub fn is_nonterminal(&self, sym: SymbolId) -> bool {
    self.nonterminals.contains(sym.index())
  }

  pub fn is_end(&self, sym: SymbolId) -> bool {
    sym == self.end
  }

  /// Terminals plus the end marker.
  pub fn terminal_alphabet(&self) -> BitSet {
    let mut set = self.terminals.clone();
    set.insert(self.end.index());
    set
  }

  fn classify(&mut self) {
    let mut nonterminals = BitSet::new();
    for prod in &self.prods {
      nonterminals.insert(prod.lhs.index());
    }

    let mut terminals = BitSet::new();
    for prod in &self.prods {
      for &sym in &prod.rhs {
        if !nonterminals.contains(sym.index()) && sym != self.end {
          terminals.insert(sym.index());
        }
      }
    }

    let mut prods_by_lhs = Map::<SymbolId, Vec<usize>>::default();
    for (i, prod) in self.prods.iter().enumerate() {
      prods_by_lhs
        .entry(prod.lhs)
        .or_insert_with(Vec::new)
        .push(i);
    }

    self.terminals = terminals;
    self.nonterminals = nonterminals;
    self.prods_by_lhs = prods_by_lhs;
  }
}
