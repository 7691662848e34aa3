use mgen_types::SemanticType;
use std::collections::HashMap;

/// Represents the kind of a symbol in the symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// A local or global variable binding
    Variable,
    /// A function parameter
    Parameter,
    /// A function declaration
    Function,
    /// A class declaration
    Class,
}

/// Represents a symbol in the symbol table
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The name of the symbol as it appears in source code
    pub name: String,
    /// The kind of symbol
    pub kind: SymbolKind,
    /// The semantic type associated with the symbol
    pub ty: SemanticType,
    /// Whether the binding was introduced with an explicit annotation
    ///
    /// An annotated binding has a fixed type for its scope; assigning a
    /// value of a different type to it is a type-consistency error.
    pub annotated: bool,
}

/// A lexically scoped symbol table
///
/// Scopes form a stack: the module scope at the bottom, one scope per
/// function body, and one per nested block that introduces bindings.
/// Lookup walks the stack from the innermost scope outwards.
pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// Creates a table containing only the module scope
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    /// Opens a new innermost scope
    pub fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Closes the innermost scope, dropping its bindings
    ///
    /// The module scope is never popped.
    pub fn end_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Defines a symbol in the innermost scope
    ///
    /// ### Returns
    /// * `Ok(())` if the symbol was defined
    /// * `Err(String)` if the name is already bound in the innermost scope
    ///   to a function or class
    pub fn define(
        &mut self,
        name: String,
        kind: SymbolKind,
        ty: SemanticType,
        annotated: bool,
    ) -> Result<(), String> {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if let Some(existing) = scope.get(&name) {
            if matches!(existing.kind, SymbolKind::Function | SymbolKind::Class) {
                return Err(format!(
                    "'{}' is already defined in the current scope.",
                    name
                ));
            }
        }
        scope.insert(
            name.clone(),
            Symbol {
                name,
                kind,
                ty,
                annotated,
            },
        );
        Ok(())
    }

    /// Looks up a symbol by name, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Replaces the type of an existing binding, innermost match first
    ///
    /// Used by the flow-sensitive refinement pass when later evidence
    /// resolves a provisional container type.
    pub fn update_type(&mut self, name: &str, ty: SemanticType) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(symbol) = scope.get_mut(name) {
                symbol.ty = ty;
                return true;
            }
        }
        false
    }

    /// The current scope depth (1 is the module scope)
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}
