use crate::BiMap;

/// Index into a [`SymbolTable`].
///
/// Terminals and nonterminals share the same id space; classification
/// lives on [`Grammar`](crate::Grammar), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
  pub fn id(self) -> u32 {
    self.0
  }

  pub fn index(self) -> usize {
    self.0 as usize
  }

  pub fn from_index(index: usize) -> Self {
    SymbolId(index as u32)
  }
}

impl std::fmt::Display for SymbolId {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Bijective mapping between symbol names and their ids.
///
/// Ids are assigned in interning order, starting at zero.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
  map: BiMap<SymbolId, String>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the id of `name`, interning it if unseen.
  pub fn intern(&mut self, name: &str) -> SymbolId {
    if let Some(&id) = self.map.get_by_right(&name.to_owned()) {
      return id;
    }
    let id = SymbolId(self.map.len() as u32);
    self.map.insert(id, name.to_owned());
    id
  }

  pub fn get(&self, name: &str) -> Option<SymbolId> {
    self.map.get_by_right(&name.to_owned()).copied()
  }

  pub fn name(&self, id: SymbolId) -> &str {
    self.map.get_by_left(&id).map(|s| s.as_str()).unwrap_or("?")
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = SymbolId> {
    (0..self.map.len()).map(SymbolId::from_index)
  }

  /// Interns `base` with primes appended until the name is fresh.
  ///
  /// Used when augmenting a grammar: `E` becomes `E'`, or `E''` if the
  /// grammar already uses `E'`.
  pub fn fresh_suffixed(&mut self, base: &str) -> SymbolId {
    let mut name = format!("{}'", base);
    while self.get(&name).is_some() {
      name.push('\'');
    }
    self.intern(&name)
  }
}
