//! Scope tree nodes
//!
//! Scopes form a tree owned by the symbol database arena. Parent and child
//! references are ids into that arena, never pointers, so the back-reference
//! from child to parent cannot create an ownership cycle.

use super::{FunctionId, ScopeId, VariableId};
use crate::lexer::TokenId;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Struct,
    Union,
    Function,
    Block,
    Loop,
    Switch,
}

impl ScopeKind {
    /// Scopes whose bodies contain executable statements
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            ScopeKind::Function | ScopeKind::Block | ScopeKind::Loop | ScopeKind::Switch
        )
    }

    /// Scopes that can hold type and function declarations
    pub fn is_declarative(self) -> bool {
        matches!(
            self,
            ScopeKind::Global
                | ScopeKind::Namespace
                | ScopeKind::Class
                | ScopeKind::Struct
                | ScopeKind::Union
        )
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Variables declared directly in this scope, by name
    pub variables: HashMap<String, VariableId>,
    /// Function overload sets declared directly in this scope, by name
    pub functions: HashMap<String, Vec<FunctionId>>,
    /// Brace tokens delimiting this scope; None for the global scope
    pub open_brace: Option<TokenId>,
    pub close_brace: Option<TokenId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, name: Option<String>, parent: Option<ScopeId>) -> Self {
        Self {
            kind,
            name,
            parent,
            children: Vec::new(),
            variables: HashMap::new(),
            functions: HashMap::new(),
            open_brace: None,
            close_brace: None,
        }
    }
}
