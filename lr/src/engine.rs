use crate::parse_table::{Action, ParseTable};
use grammar::{Grammar, Map};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::trace;

/// A parse-tree node. Leaves have no children; a lambda reduce produces
/// a node whose single child is the synthetic `λ` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
  pub symbol: String,
  pub children: Option<Vec<TreeNode>>,
  pub is_lambda: bool,
}

impl TreeNode {
  pub fn leaf(symbol: &str) -> TreeNode {
    TreeNode {
      symbol: symbol.to_owned(),
      children: None,
      is_lambda: false,
    }
  }

  pub fn lambda() -> TreeNode {
    TreeNode {
      symbol: "λ".to_owned(),
      children: None,
      is_lambda: true,
    }
  }

  pub fn node(symbol: &str, children: Vec<TreeNode>) -> TreeNode {
    TreeNode {
      symbol: symbol.to_owned(),
      children: Some(children),
      is_lambda: false,
    }
  }
}

/// Why a step could not be taken. Errors are data on the status, never
/// panics; a status carrying one is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseError {
  EmptyParseStack,
  NoMoreTokens,
  NoActions,
  ConflictingActions,
  EmptyParseStackAfterReducing,
  NoWhereToGoto,
}

impl std::fmt::Display for ParseError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let msg = match self {
      ParseError::EmptyParseStack => "parse stack can not be empty.",
      ParseError::NoMoreTokens => "there are no more tokens to parse.",
      ParseError::NoActions => "no actions exist for the next token at the current state.",
      ParseError::ConflictingActions => {
        "there are more than one action for the current state with next token."
      }
      ParseError::EmptyParseStackAfterReducing => {
        "parse stack is empty after popping the last #rhsl states."
      }
      ParseError::NoWhereToGoto => "goto action for this non-terminal does not exist.",
    };
    f.write_str(msg)
  }
}

/// A full snapshot of the machine between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
  pub parse_stack: Vec<u32>,
  pub dot_position: usize,
  pub token_stream: Vec<String>,
  pub tree_stack: Vec<TreeNode>,
  pub error: Option<ParseError>,
  pub accepted: bool,
}

impl Status {
  pub fn new(tokens: Vec<String>) -> Status {
    Status {
      parse_stack: vec![1],
      dot_position: 0,
      token_stream: tokens,
      tree_stack: vec![],
      error: None,
      accepted: false,
    }
  }

  pub fn state_number(&self) -> Option<u32> {
    self.parse_stack.last().copied()
  }

  pub fn next_token(&self) -> Option<&str> {
    self.token_stream.get(self.dot_position).map(|s| s.as_str())
  }

  /// The token stream with `•` inserted at the dot.
  pub fn progress(&self) -> Vec<String> {
    let mut out = self.token_stream.clone();
    let at = self.dot_position.min(out.len());
    out.insert(at, "•".to_owned());
    out
  }

  pub fn is_terminal(&self) -> bool {
    self.accepted || self.error.is_some()
  }
}

/// One entry of the append-only step log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
  pub step_number: usize,
  pub action: Option<Action>,
  pub before: Status,
  pub after: Status,
}

impl Step {
  /// Flat per-step record for host output.
  pub fn to_json(&self) -> serde_json::Value {
    json!({
      "stepNumber": self.step_number,
      "action": self.action,
      "parseStack": self.after.parse_stack,
      "dotPosition": self.after.dot_position,
      "nextToken": self.after.next_token(),
      "error": self.after.error,
      "progress": self.after.progress(),
    })
  }
}

/// What a reduce needs to know about a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInfo {
  pub lhs: String,
  #[serde(rename = "rhsl")]
  pub rhs_len: usize,
}

/// Replayable shift-reduce machine over a parse table.
///
/// Overrides are a sparse second table consulted first; a present cell
/// shadows the main table for that exact (state, symbol), which is how a
/// conflict cell gets resolved interactively.
#[derive(Debug, Clone)]
pub struct Engine {
  table: ParseTable,
  overrides: ParseTable,
  rules: Map<i32, RuleInfo>,
  end_marker: String,
  status: Status,
  history: Vec<Step>,
}

impl Engine {
  pub fn new(table: ParseTable, grammar: &Grammar) -> Engine {
    let mut rules = Map::default();
    for prod in &grammar.prods {
      if prod.no < 0 {
        continue;
      }
      rules.insert(
        prod.no,
        RuleInfo {
          lhs: grammar.symbols.name(prod.lhs).to_owned(),
          rhs_len: prod.rhs.len(),
        },
      );
    }
    Engine::from_parts(
      table,
      ParseTable::new(),
      rules,
      grammar.symbols.name(grammar.end).to_owned(),
    )
  }

  pub fn from_parts(
    table: ParseTable,
    overrides: ParseTable,
    rules: Map<i32, RuleInfo>,
    end_marker: String,
  ) -> Engine {
    Engine {
      table,
      overrides,
      rules,
      end_marker,
      status: Status::new(vec![]),
      history: vec![],
    }
  }

  pub fn table(&self) -> &ParseTable {
    &self.table
  }

  pub fn overrides(&self) -> &ParseTable {
    &self.overrides
  }

  pub fn rules(&self) -> &Map<i32, RuleInfo> {
    &self.rules
  }

  pub fn end_marker(&self) -> &str {
    &self.end_marker
  }

  pub fn status(&self) -> &Status {
    &self.status
  }

  pub fn history(&self) -> &[Step] {
    &self.history
  }

  /// Tokenizes on whitespace and appends the end marker if absent.
  pub fn set_input(&mut self, input: &str) {
    let mut tokens = input
      .split_whitespace()
      .map(|t| t.to_owned())
      .collect::<Vec<_>>();
    if tokens.last().map(|t| t.as_str()) != Some(self.end_marker.as_str()) {
      tokens.push(self.end_marker.clone());
    }
    self.set_tokens(tokens);
  }

  pub fn set_tokens(&mut self, tokens: Vec<String>) {
    self.status = Status::new(tokens);
    self.history.clear();
  }

  /// Replaces the whole machine state. The step log is cleared, since it
  /// no longer describes how we got here.
  pub fn set_status(&mut self, status: Status) {
    self.status = status;
    self.history.clear();
  }

  pub fn set_override(&mut self, state: u32, symbol: &str, actions: Vec<Action>) {
    self.overrides.set_cell(state, symbol, actions);
  }

  pub fn set_overrides(&mut self, overrides: ParseTable) {
    self.overrides = overrides;
  }

  pub fn clear_overrides(&mut self) {
    self.overrides = ParseTable::new();
  }

  /// The effective cell: overrides shadow the main table.
  pub fn lookup(&self, state: u32, symbol: &str) -> Option<Vec<Action>> {
    if let Some(cell) = self.overrides.get(state, symbol) {
      return Some(cell.to_vec());
    }
    self.table.get(state, symbol).map(|cell| cell.to_vec())
  }

  /// Takes one transition and logs it. A terminal status is a no-op.
  pub fn step(&mut self) -> &Status {
    if self.status.is_terminal() {
      return &self.status;
    }
    let before = self.status.clone();
    let action = self.apply_step();
    trace!(
      step = self.history.len() + 1,
      stack = ?self.status.parse_stack,
      "step"
    );
    self.history.push(Step {
      step_number: self.history.len() + 1,
      action,
      before,
      after: self.status.clone(),
    });
    &self.status
  }

  /// Runs to acceptance or error.
  pub fn run(&mut self) -> &Status {
    while !self.status.is_terminal() {
      self.step();
    }
    &self.status
  }

  /// Sets the input, then runs.
  pub fn parse(&mut self, input: &str) -> &Status {
    self.set_input(input);
    self.run()
  }

  /// Undoes the most recent step by restoring its logged prior status.
  pub fn back(&mut self) -> &Status {
    if let Some(step) = self.history.pop() {
      self.status = step.before;
    }
    &self.status
  }

  /// Back to the initial status over the current tokens.
  pub fn reset(&mut self) {
    let tokens = std::mem::take(&mut self.status.token_stream);
    self.set_tokens(tokens);
  }

  fn apply_step(&mut self) -> Option<Action> {
    let state = match self.status.parse_stack.last() {
      Some(&state) => state,
      None => {
        self.status.error = Some(ParseError::EmptyParseStack);
        return None;
      }
    };
    let token = match self.status.next_token() {
      Some(token) => token.to_owned(),
      None => {
        self.status.error = Some(ParseError::NoMoreTokens);
        return None;
      }
    };
    let cell = match self.lookup(state, &token) {
      Some(cell) => cell,
      None => {
        self.status.error = Some(ParseError::NoActions);
        return None;
      }
    };
    if cell.len() > 1 {
      self.status.error = Some(ParseError::ConflictingActions);
      return None;
    }

    let action = cell[0];
    match action {
      Action::Accept => {
        self.status.accepted = true;
        self.status.dot_position += 1;
      }
      Action::Shift { destination } => {
        self.status.parse_stack.push(destination);
        self.status.tree_stack.push(TreeNode::leaf(&token));
        self.status.dot_position += 1;
      }
      // a token landed on a goto cell: nothing a token can do there
      Action::Goto { .. } => {
        self.status.error = Some(ParseError::NoActions);
      }
      Action::Reduce { rule } => {
        self.reduce(rule, false);
      }
      Action::ShiftReduce { rule } => {
        // shift without entering the deleted state, then reduce; the
        // stack pops one state fewer than the rule's RHS length
        self.status.tree_stack.push(TreeNode::leaf(&token));
        self.status.dot_position += 1;
        self.reduce(rule, true);
      }
    }
    Some(action)
  }

  fn reduce(&mut self, rule: i32, fused: bool) {
    let info = match self.rules.get(&rule) {
      Some(info) => info.clone(),
      None => {
        self.status.error = Some(ParseError::NoActions);
        return;
      }
    };

    let pops = if fused {
      info.rhs_len.saturating_sub(1)
    } else {
      info.rhs_len
    };
    if self.status.parse_stack.len() <= pops || self.status.tree_stack.len() < info.rhs_len {
      self.status.error = Some(ParseError::EmptyParseStackAfterReducing);
      return;
    }

    let top = self.status.parse_stack[self.status.parse_stack.len() - 1 - pops];
    let dest = match self.lookup(top, &info.lhs) {
      Some(cell) if cell.len() == 1 => match cell[0] {
        Action::Goto { destination } => destination,
        _ => {
          self.status.error = Some(ParseError::NoWhereToGoto);
          return;
        }
      },
      _ => {
        self.status.error = Some(ParseError::NoWhereToGoto);
        return;
      }
    };

    let new_len = self.status.parse_stack.len() - pops;
    self.status.parse_stack.truncate(new_len);
    self.status.parse_stack.push(dest);

    let children = if info.rhs_len == 0 {
      vec![TreeNode::lambda()]
    } else {
      self
        .status
        .tree_stack
        .split_off(self.status.tree_stack.len() - info.rhs_len)
    };
    self.status.tree_stack.push(TreeNode::node(&info.lhs, children));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dfa_gen::DfaGenerator;
  use crate::tables::gen_table;
  use crate::Flavor;
  use pretty_assertions::assert_eq;

  fn lalr_engine() -> Engine {
    let grammar = Grammar::default_example();
    let dfa = DfaGenerator::new(&grammar).generate(Flavor::Lalr1);
    Engine::new(gen_table(&dfa), &dfa.grammar)
  }

  #[test]
  fn accepts_the_default_input() {
    let mut engine = lalr_engine();
    let status = engine.parse("id + id * id");
    assert!(status.accepted);
    assert_eq!(status.error, None);
    assert_eq!(status.tree_stack.len(), 1);
    assert_eq!(status.tree_stack[0].symbol, "E");
    assert!(!engine.history().is_empty());
  }

  #[test]
  fn rejects_malformed_input() {
    let mut engine = lalr_engine();
    let status = engine.parse("id + + id");
    assert_eq!(status.error, Some(ParseError::NoActions));
    assert!(!status.accepted);
  }

  #[test]
  fn lambda_reduce_pushes_a_lambda_leaf() {
    let mut engine = lalr_engine();
    let status = engine.parse("id");
    assert!(status.accepted);
    // E -> T E' where E' reduced by the lambda rule
    let root = &status.tree_stack[0];
    let children = root.children.as_ref().unwrap();
    let e_prime = children.iter().find(|c| c.symbol == "E'").unwrap();
    assert_eq!(e_prime.children.as_ref().unwrap()[0], TreeNode::lambda());
  }

  #[test]
  fn back_rewinds_to_the_initial_status() {
    let mut engine = lalr_engine();
    engine.parse("id + id * id");
    let steps = engine.history().len();
    for _ in 0..steps {
      engine.back();
    }
    assert_eq!(engine.status().parse_stack, vec![1]);
    assert_eq!(engine.status().dot_position, 0);
    assert!(engine.status().tree_stack.is_empty());
    assert!(engine.history().is_empty());
  }

  #[test]
  fn crafted_statuses_report_stack_errors() {
    let mut engine = lalr_engine();
    engine.set_input("id");

    let mut empty_stack = engine.status().clone();
    empty_stack.parse_stack.clear();
    engine.set_status(empty_stack);
    engine.step();
    assert_eq!(engine.status().error, Some(ParseError::EmptyParseStack));

    engine.set_tokens(vec![]);
    engine.step();
    assert_eq!(engine.status().error, Some(ParseError::NoMoreTokens));
  }

  #[test]
  fn reset_keeps_the_tokens_and_drops_the_run() {
    let mut engine = lalr_engine();
    engine.parse("id + id");
    assert!(engine.status().accepted);

    engine.reset();
    assert_eq!(engine.status().parse_stack, vec![1]);
    assert_eq!(engine.status().dot_position, 0);
    assert_eq!(engine.status().token_stream, vec!["id", "+", "id", "$"]);
    assert!(engine.history().is_empty());
    assert!(engine.run().accepted);
  }

  #[test]
  fn step_is_a_no_op_once_terminal() {
    let mut engine = lalr_engine();
    engine.parse("id");
    let steps = engine.history().len();
    engine.step();
    assert_eq!(engine.history().len(), steps);
  }

  #[test]
  fn set_input_appends_the_end_marker_once() {
    let mut engine = lalr_engine();
    engine.set_input("id + id");
    assert_eq!(engine.status().token_stream, vec!["id", "+", "id", "$"]);
    engine.set_input("id $");
    assert_eq!(engine.status().token_stream, vec!["id", "$"]);
  }

  #[test]
  fn shift_reduce_fuses_the_intermediate_state() {
    // S -> a over a hand-built optimized table
    let mut table = ParseTable::new();
    table.push_action(1, "a", Action::ShiftReduce { rule: 0 });
    table.push_action(1, "S", Action::Goto { destination: 2 });
    table.set_cell(2, "$", vec![Action::Accept]);

    let mut rules = Map::default();
    rules.insert(
      0,
      RuleInfo {
        lhs: "S".to_owned(),
        rhs_len: 1,
      },
    );

    let mut engine = Engine::from_parts(table, ParseTable::new(), rules, "$".to_owned());
    let status = engine.parse("a");
    assert!(status.accepted);
    assert_eq!(status.parse_stack, vec![1, 2]);
    assert_eq!(
      status.tree_stack,
      vec![TreeNode::node("S", vec![TreeNode::leaf("a")])]
    );
    assert_eq!(
      engine.history()[0].action,
      Some(Action::ShiftReduce { rule: 0 })
    );
  }

  #[test]
  fn overrides_shadow_conflict_cells() {
    let mut table = ParseTable::new();
    table.push_action(1, "a", Action::Shift { destination: 2 });
    table.push_action(1, "a", Action::Reduce { rule: 1 });
    table.push_action(2, "$", Action::Reduce { rule: 0 });
    table.push_action(1, "S", Action::Goto { destination: 3 });
    table.set_cell(3, "$", vec![Action::Accept]);

    let mut rules = Map::default();
    rules.insert(
      0,
      RuleInfo {
        lhs: "S".to_owned(),
        rhs_len: 1,
      },
    );
    rules.insert(
      1,
      RuleInfo {
        lhs: "S".to_owned(),
        rhs_len: 0,
      },
    );

    let mut engine = Engine::from_parts(table, ParseTable::new(), rules, "$".to_owned());
    let status = engine.parse("a");
    assert_eq!(status.error, Some(ParseError::ConflictingActions));

    engine.set_override(1, "a", vec![Action::Shift { destination: 2 }]);
    let status = engine.parse("a");
    assert!(status.accepted);
    assert_eq!(
      engine.history()[0].action,
      Some(Action::Shift { destination: 2 })
    );

    engine.clear_overrides();
    let status = engine.parse("a");
    assert_eq!(status.error, Some(ParseError::ConflictingActions));
  }

  #[test]
  fn progress_marks_the_dot() {
    let mut engine = lalr_engine();
    engine.set_input("id + id");
    assert_eq!(engine.status().progress(), vec!["•", "id", "+", "id", "$"]);
    engine.step();
    assert_eq!(engine.status().progress(), vec!["id", "•", "+", "id", "$"]);
    let status = engine.run().clone();
    assert!(status.accepted);
    // accept advances the dot past the end marker
    assert_eq!(status.progress(), vec!["id", "+", "id", "$", "•"]);
  }
}
