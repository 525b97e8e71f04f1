pub mod ffn;
pub mod item;
pub mod state;
pub mod state_gen;
pub mod dfa;
pub mod dfa_gen;
pub mod tables;
pub mod parse_table;
pub mod engine;
pub mod codegen;

pub use self::dfa::Dfa;
pub use self::dfa_gen::DfaGenerator;
pub use self::engine::{Engine, ParseError, Status, Step, TreeNode};
pub use self::ffn::Ffn;
pub use self::parse_table::{Action, Optimized, ParseTable};

/// LR table-construction flavor.
///
/// A strategy tag, not a type hierarchy: every flavor shares the item,
/// state and table machinery and differs only in how lookaheads are
/// assigned and how states are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
  Lr0,
  Slr1,
  Lalr1,
  Lr1,
}

impl Flavor {
  pub const ALL: [Flavor; 4] = [Flavor::Lr0, Flavor::Slr1, Flavor::Lalr1, Flavor::Lr1];

  pub fn parse(s: &str) -> Option<Flavor> {
    match s.to_ascii_lowercase().as_str() {
      "lr0" => Some(Flavor::Lr0),
      "slr1" => Some(Flavor::Slr1),
      "lalr1" => Some(Flavor::Lalr1),
      "lr1" => Some(Flavor::Lr1),
      _ => None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Flavor::Lr0 => "lr0",
      Flavor::Slr1 => "slr1",
      Flavor::Lalr1 => "lalr1",
      Flavor::Lr1 => "lr1",
    }
  }
}

impl std::fmt::Display for Flavor {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.write_str(self.name())
  }
}
