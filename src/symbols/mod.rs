//! Symbol database: scope tree, declarations and heuristic resolution

pub mod ast;
pub mod database;
pub mod scope;

pub use database::{
    Function, Parameter, Resolution, SymbolDatabase, ValueType, Variable,
};
pub use scope::{Scope, ScopeKind};

/// Index of a scope in the symbol database arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// Index of a variable in the symbol database arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub usize);

/// Index of a function in the symbol database arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);
