use crate::symbol_table::{Symbol, SymbolKind, SymbolTable};
use mgen_types::{Mutability, SemanticType};
use std::collections::{BTreeMap, BTreeSet};

/// The callable shape of a function or method
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Function name
    pub name: String,
    /// Parameter names and their declared types, excluding `self`
    pub params: Vec<(String, SemanticType)>,
    /// Declared return type
    pub return_type: SemanticType,
}

impl FunctionSignature {
    /// The callable semantic type of this signature
    pub fn callable_type(&self) -> SemanticType {
        SemanticType::Callable(
            self.params.iter().map(|(_, ty)| ty.clone()).collect(),
            Box::new(self.return_type.clone()),
        )
    }
}

/// Everything analysis learned about a user-defined class
#[derive(Debug, Clone, Default)]
pub struct ClassInfo {
    /// Instance fields in declaration order, with their types
    pub fields: Vec<(String, SemanticType)>,
    /// Method signatures, keyed by name
    pub methods: BTreeMap<String, FunctionSignature>,
}

impl ClassInfo {
    /// The declared type of an instance field
    pub fn field_type(&self, name: &str) -> Option<&SemanticType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }
}

/// Compilation context threaded through every phase of a translation
///
/// Owns the scoped symbol table, the function and class registries filled
/// during analysis, the per-parameter mutability classes, and the runtime
/// requirement flags the conversion strategies register. Registries use
/// ordered maps so iteration during generation is deterministic.
pub struct CompilationContext {
    /// The scoped symbol table
    symbols: SymbolTable,
    /// Signatures of module-level functions
    functions: BTreeMap<String, FunctionSignature>,
    /// User-defined classes
    classes: BTreeMap<String, ClassInfo>,
    /// Mutability classes: function name -> parameter name -> class
    mutability: BTreeMap<String, BTreeMap<String, Mutability>>,
    /// Runtime container instantiations the generated code needs
    runtime_requirements: BTreeSet<String>,
}

impl Default for CompilationContext {
    fn default() -> Self {
        CompilationContext::new()
    }
}

impl CompilationContext {
    /// Creates an empty compilation context
    pub fn new() -> Self {
        CompilationContext {
            symbols: SymbolTable::new(),
            functions: BTreeMap::new(),
            classes: BTreeMap::new(),
            mutability: BTreeMap::new(),
            runtime_requirements: BTreeSet::new(),
        }
    }

    /// Defines a symbol in the current scope
    ///
    /// ### Arguments
    /// * `name` - The name of the symbol
    /// * `kind` - The kind of symbol (variable, parameter, function, class)
    /// * `ty` - The semantic type associated with the symbol
    /// * `annotated` - Whether the binding carries an explicit annotation
    pub fn define_symbol(
        &mut self,
        name: String,
        kind: SymbolKind,
        ty: SemanticType,
        annotated: bool,
    ) -> Result<(), String> {
        self.symbols.define(name, kind, ty, annotated)
    }

    /// Looks up a symbol by name, innermost scope first
    pub fn lookup_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.lookup(name)
    }

    /// Replaces the type of an existing binding
    pub fn update_symbol_type(&mut self, name: &str, ty: SemanticType) -> bool {
        self.symbols.update_type(name, ty)
    }

    /// Opens a new lexical scope
    pub fn begin_scope(&mut self) {
        self.symbols.begin_scope();
    }

    /// Closes the innermost lexical scope
    pub fn end_scope(&mut self) {
        self.symbols.end_scope();
    }

    /// Registers a module-level function signature
    pub fn register_function(&mut self, signature: FunctionSignature) {
        self.functions.insert(signature.name.clone(), signature);
    }

    /// The signature of a module-level function
    pub fn function_signature(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    /// All registered function signatures in name order
    pub fn function_signatures(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.values()
    }

    /// Registers a user-defined class
    pub fn register_class(&mut self, name: String, info: ClassInfo) {
        self.classes.insert(name, info);
    }

    /// Everything known about a user-defined class
    pub fn class_info(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    /// Check if `name` names a registered class
    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Records the mutability class of one function parameter
    pub fn set_mutability(&mut self, function: &str, param: &str, class: Mutability) {
        self.mutability
            .entry(function.to_string())
            .or_default()
            .insert(param.to_string(), class);
    }

    /// The mutability class of a function parameter
    ///
    /// `Unknown` when the analyzer produced no result for the pair.
    pub fn mutability(&self, function: &str, param: &str) -> Mutability {
        self.mutability
            .get(function)
            .and_then(|params| params.get(param))
            .copied()
            .unwrap_or(Mutability::Unknown)
    }

    /// The mutability classes of every parameter of a function
    pub fn function_mutability(&self, function: &str) -> Option<&BTreeMap<String, Mutability>> {
        self.mutability.get(function)
    }

    /// Flags a runtime container instantiation as required by the output
    ///
    /// Registered by the container-operation strategies; the Build phase
    /// reads the set to decide which runtime files to copy alongside the
    /// generated source.
    pub fn require_runtime(&mut self, instantiation: &str) {
        self.runtime_requirements.insert(instantiation.to_string());
    }

    /// The runtime instantiations required so far, in name order
    pub fn runtime_requirements(&self) -> &BTreeSet<String> {
        &self.runtime_requirements
    }
}
