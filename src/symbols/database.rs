//! Symbol database construction
//!
//! One walk over the simplified token stream builds the scope tree, records
//! variable and function declarations, then a second walk binds identifier
//! references by the shadowing rule. Resolution is heuristic: a reference
//! that cannot be bound stays unbound and only degrades checker precision,
//! never aborts the file.

use super::scope::{Scope, ScopeKind};
use super::{ast, FunctionId, ScopeId, VariableId};
use crate::lexer::{TokenId, TokenKind, TokenList};
use std::collections::HashSet;

/// Builtin base-type keywords
static TYPE_KEYWORDS: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double", "signed", "unsigned",
    "wchar_t",
];

/// Declaration qualifiers tolerated before a type
static QUALIFIERS: &[&str] = &[
    "static", "const", "extern", "register", "volatile", "mutable", "constexpr", "inline",
];

/// Type description for a variable or parameter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValueType {
    pub base: String,
    pub pointer_depth: usize,
    pub is_reference: bool,
    pub is_array: bool,
    pub is_const: bool,
    pub is_static: bool,
}

impl ValueType {
    pub fn is_pointer(&self) -> bool {
        self.pointer_depth > 0
    }

    /// True for builtin integer-family types
    pub fn is_integral(&self) -> bool {
        !self.is_pointer()
            && self
                .base
                .split_whitespace()
                .all(|w| matches!(w, "char" | "short" | "int" | "long" | "signed" | "unsigned" | "bool"))
            && !self.base.is_empty()
    }

    pub fn is_floating(&self) -> bool {
        !self.is_pointer() && matches!(self.base.as_str(), "float" | "double" | "long double")
    }

    /// True for builtin scalar types (the ones the uninitialized-variable
    /// checker can reason about)
    pub fn is_builtin(&self) -> bool {
        self.base
            .split_whitespace()
            .all(|w| TYPE_KEYWORDS.contains(&w))
            && !self.base.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub decl_token: TokenId,
    pub scope: ScopeId,
    pub value_type: ValueType,
    pub is_parameter: bool,
    pub has_initializer: bool,
    /// Locally derived constant value, cleared when the variable is
    /// reassigned or its address escapes
    pub known_value: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Option<String>,
    pub value_type: ValueType,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub scope: ScopeId,
    pub decl_token: TokenId,
    pub parameters: Vec<Parameter>,
    pub return_type: ValueType,
    pub body_scope: Option<ScopeId>,
}

/// Outcome of best-effort call resolution. `Unknown` is an explicit state:
/// checkers must treat it as a reason to stay silent, never as a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Function(FunctionId),
    Unknown,
}

/// Rough classification of a call argument, derived from the call site only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArgKind {
    Int,
    Float,
    Str,
    Chr,
    Unknown,
}

#[derive(Debug, Default)]
pub struct SymbolDatabase {
    scopes: Vec<Scope>,
    variables: Vec<Variable>,
    functions: Vec<Function>,
    /// Directed (derived, base) class relationship edges
    pub base_classes: Vec<(String, String)>,
}

impl SymbolDatabase {
    /// Build the database from a simplified token stream, attaching symbol
    /// and AST back-references to the tokens as it goes.
    pub fn build(tokens: &mut TokenList) -> Self {
        let mut db = Builder::default().run(tokens);
        ast::build_expression_asts(tokens);
        db.invalidate_reassigned_values(tokens);
        db
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.variables
            .iter()
            .enumerate()
            .map(|(i, v)| (VariableId(i), v))
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i), f))
    }

    /// True when the variable lives in function-local (executable) scope
    pub fn is_local(&self, id: VariableId) -> bool {
        self.scope(self.variable(id).scope).kind.is_executable()
    }

    /// Resolve a name from the given scope outward, nearest declaration wins
    pub fn resolve_variable(&self, from: ScopeId, name: &str) -> Option<VariableId> {
        let mut current = Some(from);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id);
            if let Some(&var) = scope.variables.get(name) {
                return Some(var);
            }
            current = scope.parent;
        }
        None
    }

    /// The nearest enclosing overload set for a name
    fn overloads(&self, from: ScopeId, name: &str) -> Option<&[FunctionId]> {
        let mut current = Some(from);
        while let Some(scope_id) = current {
            let scope = self.scope(scope_id);
            if let Some(set) = scope.functions.get(name) {
                return Some(set);
            }
            current = scope.parent;
        }
        None
    }

    /// Best-effort overload resolution: exact argument-count match first,
    /// then non-converting type matches; no unique best means `Unknown`.
    fn resolve_call(&self, from: ScopeId, name: &str, args: &[ArgKind]) -> Resolution {
        let Some(set) = self.overloads(from, name) else {
            return Resolution::Unknown;
        };
        let count_matches: Vec<FunctionId> = set
            .iter()
            .copied()
            .filter(|&f| self.function(f).parameters.len() == args.len())
            .collect();
        match count_matches.len() {
            0 => Resolution::Unknown,
            1 => Resolution::Function(count_matches[0]),
            _ => self.rank_by_types(&count_matches, args),
        }
    }

    fn rank_by_types(&self, candidates: &[FunctionId], args: &[ArgKind]) -> Resolution {
        let scores: Vec<usize> = candidates
            .iter()
            .map(|&f| {
                self.function(f)
                    .parameters
                    .iter()
                    .zip(args)
                    .filter(|(param, arg)| exact_match(&param.value_type, **arg))
                    .count()
            })
            .collect();
        let best = *scores.iter().max().unwrap_or(&0);
        let winners: Vec<FunctionId> = candidates
            .iter()
            .zip(&scores)
            .filter(|(_, &s)| s == best)
            .map(|(&f, _)| f)
            .collect();
        if winners.len() == 1 && best > 0 {
            Resolution::Function(winners[0])
        } else {
            Resolution::Unknown
        }
    }

    /// True when `derived` transitively inherits from `base`. The class
    /// graph is an explicit edge set; traversal carries a visited set so a
    /// malformed cyclic hierarchy cannot loop forever.
    pub fn is_derived_from(&self, derived: &str, base: &str) -> bool {
        let mut visited = HashSet::new();
        let mut queue = vec![derived];
        while let Some(name) = queue.pop() {
            if !visited.insert(name) {
                continue;
            }
            for (d, b) in &self.base_classes {
                if d == name {
                    if b == base {
                        return true;
                    }
                    queue.push(b);
                }
            }
        }
        false
    }

    /// Clear known values of variables that are reassigned or whose address
    /// is taken after declaration.
    fn invalidate_reassigned_values(&mut self, tokens: &TokenList) {
        for id in tokens.ids() {
            let token = tokens.at(id);
            let Some(var) = token.variable else { continue };
            if id == self.variables[var.0].decl_token {
                continue;
            }
            // `*p = x` assigns through the pointer, not to it; the operand
            // of a unary `*` keeps its known value
            let deref_store = token.ast_parent.is_some_and(|parent| {
                tokens.matches(parent, "*") && tokens.at(parent).ast_op2.is_none()
            });
            let reassigned = !deref_store
                && tokens.next(id).is_some_and(|next| {
                    let t = tokens.text(next);
                    matches!(
                        t,
                        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<="
                            | ">>=" | "++" | "--"
                    )
                });
            let address_taken = tokens
                .prev(id)
                .is_some_and(|prev| tokens.matches(prev, "&") || tokens.matches(prev, "++") || tokens.matches(prev, "--"));
            if reassigned || address_taken {
                self.variables[var.0].known_value = None;
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PendingScope {
    kind: ScopeKind,
    name: Option<String>,
    /// Set when the scope is a function body: parameters to register inside
    function: Option<FunctionId>,
    parameters: Vec<Parameter>,
}

#[derive(Default)]
struct Builder {
    db: SymbolDatabase,
    stack: Vec<ScopeId>,
    pending: Option<PendingScope>,
    skip_until: Option<TokenId>,
    skip_next_brace: bool,
    decl_tokens: HashSet<TokenId>,
}

impl Builder {
    fn current(&self) -> ScopeId {
        *self.stack.last().expect("scope stack never empty")
    }

    fn run(mut self, tokens: &mut TokenList) -> SymbolDatabase {
        self.db
            .scopes
            .push(Scope::new(ScopeKind::Global, None, None));
        self.stack.push(ScopeId(0));

        let ids: Vec<TokenId> = tokens.ids().collect();
        self.walk_declarations(tokens, &ids);
        self.resolve_references(tokens, &ids);
        self.db
    }

    fn walk_declarations(&mut self, tokens: &mut TokenList, ids: &[TokenId]) {
        let mut at_statement_start = true;
        for (i, &id) in ids.iter().enumerate() {
            tokens.at_mut(id).scope = Some(self.current());

            if let Some(stop) = self.skip_until {
                if id == stop {
                    self.skip_until = None;
                }
                continue;
            }

            let kind = tokens.kind(id);
            match kind {
                TokenKind::Keyword => self.on_keyword(tokens, ids, i),
                TokenKind::OpenBrace => self.on_open_brace(tokens, id),
                TokenKind::CloseBrace => self.on_close_brace(id),
                _ => {}
            }

            if at_statement_start && !matches!(kind, TokenKind::OpenBrace | TokenKind::CloseBrace)
            {
                if self.db.scope(self.current()).kind.is_declarative() {
                    if !self.try_parse_function(tokens, ids, i) {
                        self.try_parse_variables(tokens, ids, i);
                    }
                } else {
                    self.try_parse_variables(tokens, ids, i);
                }
            }

            at_statement_start = match kind {
                TokenKind::Semicolon | TokenKind::OpenBrace | TokenKind::CloseBrace => true,
                // The init clause of `for (...)` declares loop variables
                TokenKind::OpenParen => tokens
                    .prev(id)
                    .is_some_and(|p| tokens.matches(p, "for")),
                _ => false,
            };
        }
    }

    fn on_keyword(&mut self, tokens: &TokenList, ids: &[TokenId], i: usize) {
        let id = ids[i];
        match tokens.text(id) {
            "namespace" => {
                if let Some(&name_id) = ids.get(i + 1) {
                    if tokens.kind(name_id) == TokenKind::Identifier {
                        self.decl_tokens.insert(name_id);
                        self.pending = Some(PendingScope {
                            kind: ScopeKind::Namespace,
                            name: Some(tokens.text(name_id).to_string()),
                            function: None,
                            parameters: Vec::new(),
                        });
                    }
                }
            }
            "class" | "struct" | "union" => self.on_class_keyword(tokens, ids, i),
            "enum" => {
                // Only enum definitions carry a body to skip; an elaborated
                // `enum Color c;` has no brace before the semicolon
                for &tid in &ids[i + 1..] {
                    match tokens.kind(tid) {
                        TokenKind::OpenBrace => {
                            self.skip_next_brace = true;
                            break;
                        }
                        TokenKind::Semicolon => break,
                        _ => {}
                    }
                }
            }
            "if" | "else" => self.set_control_pending(ScopeKind::Block),
            "while" | "for" | "do" => self.set_control_pending(ScopeKind::Loop),
            "switch" => self.set_control_pending(ScopeKind::Switch),
            "try" | "catch" => self.set_control_pending(ScopeKind::Block),
            _ => {}
        }
    }

    fn set_control_pending(&mut self, kind: ScopeKind) {
        // Control scopes only exist inside executable code
        if self.db.scope(self.current()).kind.is_executable() {
            self.pending = Some(PendingScope {
                kind,
                name: None,
                function: None,
                parameters: Vec::new(),
            });
        }
    }

    fn on_class_keyword(&mut self, tokens: &TokenList, ids: &[TokenId], i: usize) {
        let keyword = tokens.text(ids[i]);
        let Some(&name_id) = ids.get(i + 1) else { return };
        if tokens.kind(name_id) != TokenKind::Identifier {
            return;
        }
        let name = tokens.text(name_id).to_string();
        // Scan ahead to `{` (definition), `;` (forward declaration) or
        // anything else (elaborated type in a declaration, handled there)
        let mut j = i + 2;
        let mut saw_colon = false;
        while let Some(&tid) = ids.get(j) {
            match tokens.kind(tid) {
                TokenKind::OpenBrace => {
                    self.decl_tokens.insert(name_id);
                    let kind = match keyword {
                        "class" => ScopeKind::Class,
                        "union" => ScopeKind::Union,
                        _ => ScopeKind::Struct,
                    };
                    self.pending = Some(PendingScope {
                        kind,
                        name: Some(name.clone()),
                        function: None,
                        parameters: Vec::new(),
                    });
                    return;
                }
                TokenKind::Semicolon => {
                    self.decl_tokens.insert(name_id);
                    return;
                }
                TokenKind::Operator if tokens.matches(tid, ":") => saw_colon = true,
                TokenKind::Identifier if saw_colon => {
                    self.decl_tokens.insert(tid);
                    self.db
                        .base_classes
                        .push((name.clone(), tokens.text(tid).to_string()));
                }
                TokenKind::Keyword
                    if matches!(
                        tokens.text(tid),
                        "public" | "protected" | "private" | "virtual"
                    ) => {}
                TokenKind::Comma => {}
                TokenKind::Operator if tokens.matches(tid, "::") => {}
                _ => return,
            }
            j += 1;
        }
    }

    fn on_open_brace(&mut self, tokens: &TokenList, id: TokenId) {
        if self.skip_next_brace {
            self.skip_next_brace = false;
            self.skip_until = tokens.at(id).link;
            return;
        }
        let close = tokens.at(id).link;
        if let Some(pending) = self.pending.take() {
            let scope_id = self.open_scope(pending.kind, pending.name, id, close);
            if let Some(function_id) = pending.function {
                self.db.functions[function_id.0].body_scope = Some(scope_id);
                for param in &pending.parameters {
                    let Some(name) = &param.name else { continue };
                    let var_id = VariableId(self.db.variables.len());
                    self.db.variables.push(Variable {
                        name: name.clone(),
                        decl_token: id,
                        scope: scope_id,
                        value_type: param.value_type.clone(),
                        is_parameter: true,
                        has_initializer: true,
                        known_value: None,
                    });
                    self.db.scopes[scope_id.0]
                        .variables
                        .insert(name.clone(), var_id);
                }
            }
        } else if self.db.scope(self.current()).kind.is_executable() {
            self.open_scope(ScopeKind::Block, None, id, close);
        } else {
            // e.g. a brace initializer at global scope
            self.skip_until = close;
        }
    }

    fn open_scope(
        &mut self,
        kind: ScopeKind,
        name: Option<String>,
        open: TokenId,
        close: Option<TokenId>,
    ) -> ScopeId {
        let parent = self.current();
        let id = ScopeId(self.db.scopes.len());
        let mut scope = Scope::new(kind, name, Some(parent));
        scope.open_brace = Some(open);
        scope.close_brace = close;
        self.db.scopes.push(scope);
        self.db.scopes[parent.0].children.push(id);
        self.stack.push(id);
        id
    }

    fn on_close_brace(&mut self, id: TokenId) {
        if self.stack.len() > 1 && self.db.scope(self.current()).close_brace == Some(id) {
            self.stack.pop();
        }
    }

    /// Try to parse `ret-type name ( params ) [const|noexcept|override]* { or ;`
    /// starting at ids[i]. Returns true when a function was registered.
    fn try_parse_function(&mut self, tokens: &TokenList, ids: &[TokenId], i: usize) -> bool {
        let mut j = i;
        let mut is_static = false;
        while let Some(&tid) = ids.get(j) {
            let text = tokens.text(tid);
            if tokens.kind(tid) == TokenKind::Keyword
                && (QUALIFIERS.contains(&text) || matches!(text, "virtual" | "explicit"))
            {
                is_static |= text == "static";
                j += 1;
            } else {
                break;
            }
        }
        let Some(mut return_type) = self.parse_base_type(tokens, ids, &mut j) else {
            return false;
        };
        return_type.is_static = is_static;
        while ids
            .get(j)
            .is_some_and(|&tid| tokens.matches(tid, "*") || tokens.matches(tid, "&"))
        {
            if tokens.matches(ids[j], "*") {
                return_type.pointer_depth += 1;
            } else {
                return_type.is_reference = true;
            }
            j += 1;
        }
        let Some(&name_id) = ids.get(j) else {
            return false;
        };
        if tokens.kind(name_id) != TokenKind::Identifier {
            return false;
        }
        let Some(&open_paren) = ids.get(j + 1) else {
            return false;
        };
        if tokens.kind(open_paren) != TokenKind::OpenParen {
            return false;
        }
        let Some(close_paren) = tokens.at(open_paren).link else {
            return false;
        };
        // After the parameter list: trailing specifiers, then `{` or `;`
        let mut after = tokens.next(close_paren);
        while let Some(tid) = after {
            if tokens.kind(tid) == TokenKind::Keyword
                && matches!(tokens.text(tid), "const" | "noexcept" | "override" | "final")
            {
                after = tokens.next(tid);
            } else {
                break;
            }
        }
        let has_body = match after.map(|tid| tokens.kind(tid)) {
            Some(TokenKind::OpenBrace) => true,
            Some(TokenKind::Semicolon) => false,
            _ => return false,
        };

        let parameters = self.parse_parameters(tokens, open_paren, close_paren);
        let name = tokens.text(name_id).to_string();
        let function_id = FunctionId(self.db.functions.len());
        self.db.functions.push(Function {
            name: name.clone(),
            scope: self.current(),
            decl_token: name_id,
            parameters: parameters.clone(),
            return_type,
            body_scope: None,
        });
        self.decl_tokens.insert(name_id);
        let current = self.current();
        self.db.scopes[current.0]
            .functions
            .entry(name)
            .or_default()
            .push(function_id);
        if has_body {
            self.pending = Some(PendingScope {
                kind: ScopeKind::Function,
                name: Some(tokens.text(name_id).to_string()),
                function: Some(function_id),
                parameters,
            });
        }
        true
    }

    fn parse_parameters(
        &mut self,
        tokens: &TokenList,
        open: TokenId,
        close: TokenId,
    ) -> Vec<Parameter> {
        let mut segments: Vec<Vec<TokenId>> = vec![Vec::new()];
        let mut current = tokens.next(open);
        while let Some(id) = current {
            if id == close {
                break;
            }
            match tokens.kind(id) {
                TokenKind::Comma => segments.push(Vec::new()),
                TokenKind::OpenParen | TokenKind::OpenBracket => {
                    // Function-pointer or array parameter internals are
                    // opaque to this heuristic
                    segments.last_mut().unwrap().push(id);
                    current = tokens.at(id).link;
                    continue;
                }
                _ => segments.last_mut().unwrap().push(id),
            }
            current = tokens.next(id);
        }

        let mut parameters = Vec::new();
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            if segment.len() == 1 && tokens.matches(segment[0], "void") {
                continue;
            }
            if let Some(param) = self.parse_one_parameter(tokens, &segment) {
                parameters.push(param);
            } else {
                parameters.push(Parameter {
                    name: None,
                    value_type: ValueType::default(),
                });
            }
        }
        parameters
    }

    fn parse_one_parameter(&mut self, tokens: &TokenList, segment: &[TokenId]) -> Option<Parameter> {
        let mut value_type = ValueType::default();
        let mut words = Vec::new();
        let mut name = None;
        for &id in segment {
            let text = tokens.text(id);
            match tokens.kind(id) {
                TokenKind::Keyword if text == "const" => value_type.is_const = true,
                TokenKind::Keyword if QUALIFIERS.contains(&text) => {}
                TokenKind::Keyword if matches!(text, "struct" | "class" | "union" | "enum") => {}
                TokenKind::Keyword | TokenKind::Identifier => words.push((id, text.to_string())),
                TokenKind::Operator if text == "*" => value_type.pointer_depth += 1,
                TokenKind::Operator if text == "&" => value_type.is_reference = true,
                TokenKind::Operator if text == "..." || text == "::" => {}
                _ => return None,
            }
        }
        // A trailing identifier after at least one type word is the name
        if words.len() >= 2 {
            if let Some((id, last)) = words.last().cloned() {
                if tokens.kind(id) == TokenKind::Identifier {
                    name = Some(last);
                    words.pop();
                    self.decl_tokens.insert(id);
                }
            }
        }
        if words.is_empty() {
            return None;
        }
        value_type.base = words
            .iter()
            .map(|(_, w)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Parameter { name, value_type })
    }

    /// Parse a base type at ids[j]: one or more builtin type keywords, an
    /// elaborated `struct Name`, or a plain identifier type name.
    fn parse_base_type(
        &self,
        tokens: &TokenList,
        ids: &[TokenId],
        j: &mut usize,
    ) -> Option<ValueType> {
        let mut value_type = ValueType::default();
        let &tid = ids.get(*j)?;
        match tokens.kind(tid) {
            TokenKind::Keyword if TYPE_KEYWORDS.contains(&tokens.text(tid)) => {
                let mut words = Vec::new();
                while let Some(&tid) = ids.get(*j) {
                    let text = tokens.text(tid);
                    if tokens.kind(tid) == TokenKind::Keyword && TYPE_KEYWORDS.contains(&text) {
                        words.push(text.to_string());
                        *j += 1;
                    } else if tokens.kind(tid) == TokenKind::Keyword && text == "const" {
                        value_type.is_const = true;
                        *j += 1;
                    } else {
                        break;
                    }
                }
                value_type.base = words.join(" ");
                Some(value_type)
            }
            TokenKind::Keyword if matches!(tokens.text(tid), "struct" | "class" | "union" | "enum") => {
                let &name_id = ids.get(*j + 1)?;
                if tokens.kind(name_id) != TokenKind::Identifier {
                    return None;
                }
                value_type.base = tokens.text(name_id).to_string();
                *j += 2;
                Some(value_type)
            }
            TokenKind::Identifier => {
                value_type.base = tokens.text(tid).to_string();
                *j += 1;
                Some(value_type)
            }
            _ => None,
        }
    }

    /// Try to parse one variable declaration statement starting at ids[i]
    fn try_parse_variables(&mut self, tokens: &mut TokenList, ids: &[TokenId], i: usize) {
        let mut j = i;
        let mut is_const = false;
        let mut is_static = false;
        while let Some(&tid) = ids.get(j) {
            let text = tokens.text(tid);
            if tokens.kind(tid) == TokenKind::Keyword && QUALIFIERS.contains(&text) {
                is_const |= text == "const";
                is_static |= text == "static";
                j += 1;
            } else {
                break;
            }
        }
        // A plain identifier only begins a declaration when a declarator
        // follows; `parse_base_type` accepts it, the declarator check below
        // rejects expressions like `x = 1;`.
        let Some(mut base_type) = self.parse_base_type(tokens, ids, &mut j) else {
            return;
        };
        base_type.is_const = base_type.is_const || is_const;
        base_type.is_static = is_static;
        if base_type.base.is_empty() {
            return;
        }

        let mut declared = Vec::new();
        loop {
            let mut value_type = base_type.clone();
            while let Some(&tid) = ids.get(j) {
                if tokens.matches(tid, "*") {
                    value_type.pointer_depth += 1;
                    j += 1;
                } else if tokens.matches(tid, "&") {
                    value_type.is_reference = true;
                    j += 1;
                } else {
                    break;
                }
            }
            let Some(&name_id) = ids.get(j) else { return };
            if tokens.kind(name_id) != TokenKind::Identifier {
                return;
            }
            j += 1;
            // Array suffix
            if ids.get(j).is_some_and(|&tid| tokens.matches(tid, "[")) {
                value_type.is_array = true;
                let close = tokens.at(ids[j]).link;
                while ids.get(j).is_some_and(|&tid| Some(tid) != close) {
                    j += 1;
                }
                j += 1;
            }
            let Some(&next_id) = ids.get(j) else { return };
            match tokens.kind(next_id) {
                TokenKind::Semicolon => {
                    declared.push((name_id, value_type, None, false));
                    break;
                }
                TokenKind::Comma => {
                    declared.push((name_id, value_type, None, false));
                    j += 1;
                }
                TokenKind::Operator if tokens.matches(next_id, "=") => {
                    let (value, end) = self.scan_initializer(tokens, ids, j + 1);
                    declared.push((name_id, value_type, value, true));
                    j = end;
                    if ids.get(j).is_some_and(|&tid| tokens.kind(tid) == TokenKind::Comma) {
                        j += 1;
                    } else {
                        break;
                    }
                }
                // `(` would make this a function or call; anything else
                // means we misread an expression
                _ => return,
            }
        }

        for (name_id, value_type, value, has_initializer) in declared {
            let var_id = VariableId(self.db.variables.len());
            let name = tokens.text(name_id).to_string();
            self.db.variables.push(Variable {
                name: name.clone(),
                decl_token: name_id,
                scope: self.current(),
                value_type,
                is_parameter: false,
                has_initializer,
                known_value: value,
            });
            let current = self.current();
            self.db.scopes[current.0].variables.insert(name, var_id);
            self.decl_tokens.insert(name_id);
            tokens.at_mut(name_id).variable = Some(var_id);
        }
    }

    /// Scan an initializer expression, returning its constant value when it
    /// is a single folded literal, plus the index of the terminator.
    fn scan_initializer(
        &self,
        tokens: &TokenList,
        ids: &[TokenId],
        start: usize,
    ) -> (Option<i64>, usize) {
        let mut j = start;
        let mut depth = 0usize;
        let mut token_count = 0usize;
        let mut single_value = None;
        while let Some(&tid) = ids.get(j) {
            match tokens.kind(tid) {
                TokenKind::Semicolon | TokenKind::Comma if depth == 0 => break,
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            if token_count == 0 {
                single_value = tokens.at(tid).known_value;
            } else {
                single_value = None;
            }
            token_count += 1;
            j += 1;
        }
        (single_value, j)
    }

    /// Second walk: bind identifier references to declarations
    fn resolve_references(&mut self, tokens: &mut TokenList, ids: &[TokenId]) {
        for &id in ids {
            if tokens.kind(id) != TokenKind::Identifier || self.decl_tokens.contains(&id) {
                continue;
            }
            // Member accesses resolve through the object type, which this
            // heuristic database does not model
            if tokens
                .prev(id)
                .is_some_and(|p| tokens.matches(p, ".") || tokens.matches(p, "->"))
            {
                continue;
            }
            let Some(scope) = tokens.at(id).scope else { continue };
            let name = tokens.text(id).to_string();
            let is_call = tokens
                .next(id)
                .is_some_and(|n| tokens.kind(n) == TokenKind::OpenParen);
            if is_call {
                let args = self.call_arguments(tokens, id);
                if let Resolution::Function(f) = self.db.resolve_call(scope, &name, &args) {
                    tokens.at_mut(id).function = Some(f);
                }
            } else if let Some(var) = self.db.resolve_variable(scope, &name) {
                tokens.at_mut(id).variable = Some(var);
            }
        }
    }

    /// Classify call arguments from the call site token shapes
    fn call_arguments(&self, tokens: &TokenList, name_id: TokenId) -> Vec<ArgKind> {
        let Some(open) = tokens.next(name_id) else {
            return Vec::new();
        };
        let Some(close) = tokens.at(open).link else {
            return Vec::new();
        };
        let mut segments: Vec<Vec<TokenId>> = vec![Vec::new()];
        let mut current = tokens.next(open);
        while let Some(id) = current {
            if id == close {
                break;
            }
            match tokens.kind(id) {
                TokenKind::Comma => segments.push(Vec::new()),
                TokenKind::OpenParen | TokenKind::OpenBracket => {
                    segments.last_mut().unwrap().push(id);
                    current = tokens.at(id).link;
                    continue;
                }
                _ => segments.last_mut().unwrap().push(id),
            }
            current = tokens.next(id);
        }
        segments.retain(|s| !s.is_empty());
        segments
            .iter()
            .map(|segment| {
                if segment.len() != 1 {
                    return ArgKind::Unknown;
                }
                let id = segment[0];
                match tokens.kind(id) {
                    TokenKind::Number if tokens.text(id).contains('.') => ArgKind::Float,
                    TokenKind::Number => ArgKind::Int,
                    TokenKind::String => ArgKind::Str,
                    TokenKind::Char => ArgKind::Chr,
                    _ => ArgKind::Unknown,
                }
            })
            .collect()
    }
}

/// Non-converting match between a parameter type and a call-site argument
fn exact_match(param: &ValueType, arg: ArgKind) -> bool {
    match arg {
        ArgKind::Int => param.is_integral() && param.base != "char",
        ArgKind::Float => param.is_floating(),
        ArgKind::Str => param.base == "char" && param.is_pointer(),
        ArgKind::Chr => param.base == "char" && !param.is_pointer(),
        ArgKind::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::lexer::tokenize;
    use crate::simplify::simplify;

    fn build(source: &str) -> (TokenList, SymbolDatabase) {
        let mut result = tokenize(source).unwrap();
        simplify(&mut result.tokens, &Settings::default()).unwrap();
        let db = SymbolDatabase::build(&mut result.tokens);
        (result.tokens, db)
    }

    fn find_var<'d>(db: &'d SymbolDatabase, name: &str) -> Vec<(VariableId, &'d Variable)> {
        db.variables().filter(|(_, v)| v.name == name).collect()
    }

    #[test]
    fn test_scope_tree_shape() {
        let (_, db) = build("namespace ns { class C { }; } void f() { if (1) { } }");
        let kinds: Vec<ScopeKind> = db.scopes().map(|(_, s)| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ScopeKind::Global,
                ScopeKind::Namespace,
                ScopeKind::Class,
                ScopeKind::Function,
                ScopeKind::Block,
            ]
        );
        // Every non-global scope has a parent back-reference
        for (id, scope) in db.scopes() {
            if id != db.global_scope() {
                let parent = scope.parent.expect("non-global scope has a parent");
                assert!(db.scope(parent).children.contains(&id));
            }
        }
    }

    #[test]
    fn test_local_variable_registered() {
        let (_, db) = build("void f() { int x = 3; }");
        let vars = find_var(&db, "x");
        assert_eq!(vars.len(), 1);
        let (_, x) = vars[0];
        assert_eq!(x.value_type.base, "int");
        assert!(db.scope(x.scope).kind.is_executable());
        assert_eq!(x.known_value, Some(3));
    }

    #[test]
    fn test_pointer_and_array_types() {
        let (_, db) = build("void f() { char *s; int a[10]; const int c = 1; }");
        assert_eq!(find_var(&db, "s")[0].1.value_type.pointer_depth, 1);
        assert!(find_var(&db, "a")[0].1.value_type.is_array);
        assert!(find_var(&db, "c")[0].1.value_type.is_const);
    }

    #[test]
    fn test_comma_declarator_list() {
        let (_, db) = build("void f() { int a, *b, c = 2; }");
        assert_eq!(find_var(&db, "a").len(), 1);
        assert_eq!(find_var(&db, "b")[0].1.value_type.pointer_depth, 1);
        assert_eq!(find_var(&db, "c")[0].1.known_value, Some(2));
    }

    #[test]
    fn test_shadowing_resolves_innermost_then_outer() {
        let (tokens, db) = build("void f() { int x = 1; { int x = 2; x; } x; }");
        let refs: Vec<VariableId> = tokens
            .ids()
            .filter(|&id| {
                tokens.matches(id, "x")
                    && tokens.at(id).variable.is_some()
                    && tokens.next(id).is_some_and(|n| tokens.matches(n, ";"))
            })
            .filter_map(|id| tokens.at(id).variable)
            .collect();
        assert_eq!(refs.len(), 2);
        let inner = db.variable(refs[0]);
        let outer = db.variable(refs[1]);
        assert_eq!(inner.known_value, Some(2));
        assert_eq!(outer.known_value, Some(1));
        assert_ne!(refs[0], refs[1]);
    }

    #[test]
    fn test_function_parameters_become_scope_variables() {
        let (_, db) = build("int add(int a, int b) { return a + b; }");
        let functions: Vec<_> = db.functions().collect();
        assert_eq!(functions.len(), 1);
        let (_, add) = functions[0];
        assert_eq!(add.parameters.len(), 2);
        assert_eq!(find_var(&db, "a")[0].1.is_parameter, true);
        let body = add.body_scope.expect("definition has a body scope");
        assert!(db.scope(body).variables.contains_key("b"));
    }

    #[test]
    fn test_overload_resolution_by_argument_count() {
        let (tokens, db) = build(
            "void g(int a); void g(int a, int b); void f() { g(1, 2); }",
        );
        let call = tokens
            .ids()
            .find(|&id| {
                tokens.matches(id, "g")
                    && tokens.next(id).is_some_and(|n| tokens.matches(n, "("))
                    && tokens.at(id).scope.is_some_and(|s| db.scope(s).kind.is_executable())
            })
            .unwrap();
        let f = tokens.at(call).function.expect("call resolves");
        assert_eq!(db.function(f).parameters.len(), 2);
    }

    #[test]
    fn test_overload_resolution_by_type_tier() {
        let (tokens, db) = build(
            "void g(int a); void g(double a); void f() { g(2.5); }",
        );
        let call = tokens
            .ids()
            .find(|&id| {
                tokens.matches(id, "g")
                    && tokens.at(id).scope.is_some_and(|s| db.scope(s).kind.is_executable())
            })
            .unwrap();
        let f = tokens.at(call).function.expect("call resolves");
        assert_eq!(db.function(f).parameters[0].value_type.base, "double");
    }

    #[test]
    fn test_ambiguous_overload_stays_unknown() {
        // Two candidates, the argument matches neither exactly
        let (tokens, _db) = build(
            "void g(char *a); void g(double a); void f() { int v; g(v); }",
        );
        let call = tokens
            .ids()
            .find(|&id| {
                tokens.matches(id, "g")
                    && tokens.next(id).is_some_and(|n| tokens.matches(n, "("))
                    && tokens.prev(id).is_some_and(|p| tokens.matches(p, ";"))
            })
            .unwrap();
        assert!(tokens.at(call).function.is_none());
    }

    #[test]
    fn test_unresolved_reference_is_not_an_error() {
        let (tokens, _db) = build("void f() { undeclared = 1; }");
        let reference = tokens.ids().find(|&id| tokens.matches(id, "undeclared")).unwrap();
        assert!(tokens.at(reference).variable.is_none());
    }

    #[test]
    fn test_base_class_edges() {
        let (_, db) = build(
            "class A { }; class B : public A { }; class C : public B { };",
        );
        assert!(db.is_derived_from("B", "A"));
        assert!(db.is_derived_from("C", "A"));
        assert!(!db.is_derived_from("A", "C"));
    }

    #[test]
    fn test_reassignment_clears_known_value() {
        let (_, db) = build("void f() { int x = 5; x = unknown(); }");
        assert_eq!(find_var(&db, "x")[0].1.known_value, None);
    }

    #[test]
    fn test_every_token_has_a_scope() {
        let (tokens, _db) = build("int g; void f() { int x; { x = g; } }");
        for id in tokens.ids() {
            assert!(tokens.at(id).scope.is_some());
        }
    }

    #[test]
    fn test_for_loop_declaration() {
        let (_, db) = build("void f() { for (int i = 0; i < 10; i = i + 1) { } }");
        assert_eq!(find_var(&db, "i").len(), 1);
    }
}
