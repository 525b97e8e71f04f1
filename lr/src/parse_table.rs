use grammar::{Map, Set};
use serde::{Deserialize, Serialize};

/// A single parse-table action.
///
/// `ShiftReduce` is produced only by [`ParseTable::optimize`]: it shifts
/// the token and immediately reduces by `rule` without entering the
/// deleted intermediate state, so it carries a rule number rather than a
/// destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
  Shift {
    destination: u32,
  },
  Goto {
    destination: u32,
  },
  Reduce {
    #[serde(rename = "ruleNumber")]
    rule: i32,
  },
  Accept,
  ShiftReduce {
    #[serde(rename = "ruleNumber")]
    rule: i32,
  },
}

/// Action/goto table: state number -> symbol name -> actions.
///
/// An absent (or empty) cell is an error cell; a cell with more than one
/// action is a conflict. Cells are append-only while the table is being
/// generated, so conflicting actions are kept side by side instead of
/// overwriting each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParseTable {
  pub table: Map<u32, Map<String, Vec<Action>>>,
}

/// Result of [`ParseTable::optimize`]. `state_mapping` sends every
/// surviving original state to its representative; folded-away states
/// appear only in `removed`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimized {
  pub table: ParseTable,
  pub state_mapping: Map<u32, u32>,
  pub removed: Vec<u32>,
  pub kept: Vec<u32>,
}

impl ParseTable {
  pub fn new() -> ParseTable {
    ParseTable::default()
  }

  pub fn ensure_row(&mut self, state: u32) {
    self.table.entry(state).or_insert_with(Map::default);
  }

  /// Appends an action to a cell, forming a conflict list if the cell is
  /// already occupied. Exact duplicates are dropped.
  pub fn push_action(&mut self, state: u32, symbol: &str, action: Action) {
    let cell = self
      .table
      .entry(state)
      .or_insert_with(Map::default)
      .entry(symbol.to_owned())
      .or_insert_with(Vec::new);
    if !cell.contains(&action) {
      cell.push(action);
    }
  }

  /// Replaces a cell outright. Used for the forced accept cell.
  pub fn set_cell(&mut self, state: u32, symbol: &str, actions: Vec<Action>) {
    self
      .table
      .entry(state)
      .or_insert_with(Map::default)
      .insert(symbol.to_owned(), actions);
  }

  pub fn get(&self, state: u32, symbol: &str) -> Option<&[Action]> {
    self
      .table
      .get(&state)
      .and_then(|row| row.get(symbol))
      .map(|cell| cell.as_slice())
      .filter(|cell| !cell.is_empty())
  }

  /// The cell's action if it holds exactly one.
  pub fn single(&self, state: u32, symbol: &str) -> Option<&Action> {
    match self.get(state, symbol) {
      Some([action]) => Some(action),
      _ => None,
    }
  }

  pub fn is_error(&self, state: u32, symbol: &str) -> bool {
    self.get(state, symbol).is_none()
  }

  pub fn is_conflict(&self, state: u32, symbol: &str) -> bool {
    self.get(state, symbol).map_or(false, |cell| cell.len() > 1)
  }

  pub fn is_shift(&self, state: u32, symbol: &str) -> bool {
    matches!(self.single(state, symbol), Some(Action::Shift { .. }))
  }

  pub fn is_goto(&self, state: u32, symbol: &str) -> bool {
    matches!(self.single(state, symbol), Some(Action::Goto { .. }))
  }

  pub fn is_reduce(&self, state: u32, symbol: &str) -> bool {
    matches!(self.single(state, symbol), Some(Action::Reduce { .. }))
  }

  pub fn is_accept(&self, state: u32, symbol: &str) -> bool {
    matches!(self.single(state, symbol), Some(Action::Accept))
  }

  /// All conflict cells, in table order.
  pub fn conflicts(&self) -> Vec<(u32, String, Vec<Action>)> {
    let mut out = Vec::new();
    for (&state, row) in &self.table {
      for (symbol, cell) in row {
        if cell.len() > 1 {
          out.push((state, symbol.clone(), cell.clone()));
        }
      }
    }
    out
  }

  pub fn to_json(&self) -> serde_json::Value {
    serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
  }

  /// Best-effort table shrinking:
  /// 1. merge states with structurally identical rows (state 1 and any
  ///    accept state are always kept; the lowest number survives),
  ///    rewriting shift/goto destinations, to a fixpoint;
  /// 2. delete each state whose every cell reduces by one same rule and
  ///    which no goto targets, turning shifts into it into
  ///    `shift_reduce` of that rule.
  pub fn optimize(&self) -> Optimized {
    let mut table = self.clone();
    let mut mapping: Map<u32, u32> = table.table.keys().map(|&s| (s, s)).collect();

    let accept_states: Set<u32> = table
      .table
      .iter()
      .filter(|(_, row)| row.values().any(|cell| cell.contains(&Action::Accept)))
      .map(|(&s, _)| s)
      .collect();
    let pinned = |s: u32| s == 1 || accept_states.contains(&s);

    loop {
      let mut groups = Map::<Vec<(String, Vec<Action>)>, Vec<u32>>::default();
      for (&state, row) in &table.table {
        let mut key = row
          .iter()
          .map(|(symbol, cell)| {
            let mut cell = cell.clone();
            cell.sort();
            (symbol.clone(), cell)
          })
          .collect::<Vec<_>>();
        key.sort();
        groups.entry(key).or_insert_with(Vec::new).push(state);
      }

      let mut replace = Map::<u32, u32>::default();
      for members in groups.values() {
        if members.len() < 2 {
          continue;
        }
        let keeper = members
          .iter()
          .copied()
          .filter(|&s| pinned(s))
          .min()
          .unwrap_or_else(|| *members.iter().min().unwrap());
        for &member in members {
          if member != keeper && !pinned(member) {
            replace.insert(member, keeper);
          }
        }
      }
      if replace.is_empty() {
        break;
      }

      for &old in replace.keys() {
        table.table.shift_remove(&old);
      }
      table.rewrite_destinations(|dest| replace.get(&dest).copied());
      for target in mapping.values_mut() {
        if let Some(&new) = replace.get(target) {
          *target = new;
        }
      }
    }

    // fold all-reduce states into shift_reduce actions
    let mut goto_targets = Set::<u32>::default();
    for row in table.table.values() {
      for cell in row.values() {
        for action in cell {
          if let Action::Goto { destination } = action {
            goto_targets.insert(*destination);
          }
        }
      }
    }

    let mut folds = Map::<u32, i32>::default();
    for (&state, row) in &table.table {
      if pinned(state) || row.is_empty() || goto_targets.contains(&state) {
        continue;
      }
      let mut rule = None;
      let foldable = row.values().all(|cell| match cell.as_slice() {
        [Action::Reduce { rule: r }] if rule.map_or(true, |prev| prev == *r) => {
          rule = Some(*r);
          true
        }
        _ => false,
      });
      if foldable {
        if let Some(rule) = rule {
          folds.insert(state, rule);
        }
      }
    }

    for &state in folds.keys() {
      table.table.shift_remove(&state);
      mapping.shift_remove(&state);
    }
    for row in table.table.values_mut() {
      for cell in row.values_mut() {
        for action in cell.iter_mut() {
          if let Action::Shift { destination } = *action {
            if let Some(&rule) = folds.get(&destination) {
              *action = Action::ShiftReduce { rule };
            }
          }
        }
      }
    }

    let kept = table.table.keys().copied().collect::<Vec<_>>();
    let removed = self
      .table
      .keys()
      .copied()
      .filter(|s| !table.table.contains_key(s))
      .collect();

    Optimized {
      table,
      state_mapping: mapping,
      removed,
      kept,
    }
  }

  fn rewrite_destinations(&mut self, f: impl Fn(u32) -> Option<u32>) {
    for row in self.table.values_mut() {
      for cell in row.values_mut() {
        for action in cell.iter_mut() {
          match action {
            Action::Shift { destination } | Action::Goto { destination } => {
              if let Some(new) = f(*destination) {
                *destination = new;
              }
            }
            _ => {}
          }
        }
      }
    }
  }
}
