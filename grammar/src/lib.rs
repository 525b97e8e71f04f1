pub mod symbol;
pub mod production;
pub mod grammar;

pub use self::grammar::{Grammar, GrammarError, END_MARKER};
pub use self::production::Production;
pub use self::symbol::{SymbolId, SymbolTable};

pub type Map<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;
pub type Set<T> = indexmap::IndexSet<T, fnv::FnvBuildHasher>;
pub type HashMap<K, V> = fnv::FnvHashMap<K, V>;

pub type BiMap<L, R> = bimap::BiHashMap<L, R>;
