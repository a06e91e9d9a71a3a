//! Lexical scope tracking and the symbol index.
//!
//! Scopes are opened by `{` after a namespace/class/function/`@media` header
//! and closed by the `}` that brings the brace depth back to where the scope
//! started. Each opened class or function saves the set of known variables
//! and starts a new one; closing it restores the parent set.
//!
//! Symbols are recorded per line ([`LineSymbols`]) so re-lexing a line only
//! replaces that line's records. [`SymbolTable`] aggregates them on demand.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

/// Name given to classes declared without one (`new class {}`).
pub const ANONYMOUS_CLASS: &str = "anonymous class";
/// Name given to closures and anonymous JS functions.
pub const ANONYMOUS_FUNCTION: &str = "anonymous function";

/// Whether `name` is one of the anonymous placeholders.
#[must_use]
pub fn is_anonymous(name: &str) -> bool {
    name == ANONYMOUS_CLASS || name == ANONYMOUS_FUNCTION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Namespace,
    Class,
    Function,
    Media,
    FuncJs,
}

impl ScopeKind {
    /// Class and function scopes get their own variable set.
    #[must_use]
    pub const fn owns_variables(self) -> bool {
        matches!(self, Self::Class | Self::Function | Self::FuncJs)
    }
}

/// Language whose scope stack an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeLang {
    Php,
    Js,
    Css,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeEntry {
    pub name: String,
    /// Brace depth outside the scope's `{`.
    pub start_depth: u16,
    pub kind: ScopeKind,
    /// `namespace Foo;` without braces.
    pub braceless: bool,
}

impl ScopeEntry {
    #[must_use]
    pub fn new(kind: ScopeKind, name: impl Into<String>, start_depth: u16) -> Self {
        Self {
            name: name.into(),
            start_depth,
            kind,
            braceless: false,
        }
    }
}

/// Pop the entries ended by a `}` that leaves the brace depth at `depth_after`.
///
/// Brace-less namespaces opened deeper than the closing brace end with it;
/// then the braced entry starting at `depth_after` is popped.
pub fn close_entries(entries: &mut Vec<ScopeEntry>, depth_after: u16) -> Vec<ScopeEntry> {
    let mut popped = Vec::new();
    while let Some(top) = entries.last() {
        if top.braceless && top.start_depth > depth_after {
            popped.extend(entries.pop());
            continue;
        }
        if !top.braceless && top.start_depth == depth_after {
            popped.extend(entries.pop());
        }
        break;
    }
    popped
}

/// Innermost entry name of `kind`, if any.
fn innermost(entries: &[ScopeEntry], pred: impl Fn(ScopeKind) -> bool) -> Option<&str> {
    entries
        .iter()
        .rev()
        .find(|e| pred(e.kind))
        .map(|e| e.name.as_str())
}

/// Symbol key for a class/function pair: `Class::function`.
#[must_use]
pub fn scope_key(class: Option<&str>, function: Option<&str>) -> String {
    format!("{}::{}", class.unwrap_or(""), function.unwrap_or(""))
}

/// Scope key of the innermost class and function in `entries`.
#[must_use]
pub fn key_of(entries: &[ScopeEntry]) -> String {
    scope_key(class_of(entries), function_of(entries))
}

#[must_use]
pub fn namespace_of(entries: &[ScopeEntry]) -> Option<&str> {
    innermost(entries, |k| k == ScopeKind::Namespace)
}

#[must_use]
pub fn class_of(entries: &[ScopeEntry]) -> Option<&str> {
    innermost(entries, |k| k == ScopeKind::Class)
}

#[must_use]
pub fn function_of(entries: &[ScopeEntry]) -> Option<&str> {
    innermost(entries, |k| matches!(k, ScopeKind::Function | ScopeKind::FuncJs))
}

#[must_use]
pub fn media_of(entries: &[ScopeEntry]) -> Option<&str> {
    innermost(entries, |k| k == ScopeKind::Media)
}

/// `Namespace\Class::function`, or `None` when any part is anonymous or
/// there is nothing to name.
#[must_use]
pub fn qualified_name(entries: &[ScopeEntry]) -> Option<String> {
    let ns = namespace_of(entries).filter(|n| !n.is_empty());
    let class = class_of(entries);
    let function = function_of(entries);
    if class.is_some_and(is_anonymous) || function.is_some_and(is_anonymous) {
        return None;
    }
    let mut out = String::new();
    if let Some(ns) = ns {
        out.push_str(ns);
    }
    if let Some(class) = class {
        if !out.is_empty() {
            out.push('\\');
        }
        out.push_str(class);
    }
    if let Some(function) = function {
        if class.is_some() {
            out.push_str("::");
        } else if !out.is_empty() {
            out.push('\\');
        }
        out.push_str(function);
    }
    (!out.is_empty()).then_some(out)
}

// ---------------------------------------------------------------------------
// ScopeStack
// ---------------------------------------------------------------------------

/// Nested scopes plus the variables known in the innermost one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ScopeStack {
    entries: Vec<ScopeEntry>,
    vars: BTreeSet<String>,
    saved_vars: Vec<BTreeSet<String>>,
}

impl ScopeStack {
    #[must_use]
    pub fn entries(&self) -> &[ScopeEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn top(&self) -> Option<&ScopeEntry> {
        self.entries.last()
    }

    /// Push a scope. Variable-owning scopes save the current set; `inherit`
    /// starts the new set as a copy of it (JS closures), otherwise empty.
    pub fn push(&mut self, entry: ScopeEntry, inherit: bool) {
        if entry.kind.owns_variables() {
            let next = if inherit {
                self.vars.clone()
            } else {
                BTreeSet::new()
            };
            self.saved_vars.push(std::mem::replace(&mut self.vars, next));
        }
        self.entries.push(entry);
    }

    /// Close scopes for a `}` that leaves the depth at `depth_after`.
    pub fn close(&mut self, depth_after: u16) -> Vec<ScopeEntry> {
        let popped = close_entries(&mut self.entries, depth_after);
        for entry in &popped {
            if entry.kind.owns_variables() {
                self.vars = self.saved_vars.pop().unwrap_or_default();
            }
        }
        popped
    }

    /// Pop brace-less namespaces on top (a new `namespace X;` replaces them).
    pub fn end_braceless(&mut self) -> usize {
        let mut n = 0;
        while self.entries.last().is_some_and(|e| e.braceless) {
            self.entries.pop();
            n += 1;
        }
        n
    }

    /// Drop every scope and restore the outermost variable set.
    pub fn clear_scopes(&mut self) {
        self.entries.clear();
        if let Some(root) = self.saved_vars.drain(..).next() {
            self.vars = root;
        }
    }

    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.vars.contains(name)
    }

    /// Add a known variable; returns whether it was new.
    pub fn learn(&mut self, name: &str) -> bool {
        if self.vars.contains(name) {
            return false;
        }
        self.vars.insert(name.to_string())
    }

    #[must_use]
    pub fn known(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(String::as_str)
    }

    #[must_use]
    pub fn key(&self) -> String {
        key_of(&self.entries)
    }

    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        namespace_of(&self.entries)
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        class_of(&self.entries)
    }

    #[must_use]
    pub fn function(&self) -> Option<&str> {
        function_of(&self.entries)
    }
}

// ---------------------------------------------------------------------------
// Line records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    Open(ScopeEntry),
    /// A `}` leaving the brace depth at the given value.
    Close(u16),
    /// A `namespace X;` statement ending any brace-less namespace.
    EndBraceless,
    /// The language region ended (`</script>`, `</style>`).
    Clear,
}

/// A scope change taking effect at `col` on its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMark {
    pub col: usize,
    pub lang: ScopeLang,
    pub event: ScopeEvent,
}

impl ScopeMark {
    /// Replay this event on a bare entry list.
    pub fn apply(&self, entries: &mut Vec<ScopeEntry>) {
        match &self.event {
            ScopeEvent::Open(entry) => entries.push(entry.clone()),
            ScopeEvent::Close(depth_after) => {
                close_entries(entries, *depth_after);
            }
            ScopeEvent::EndBraceless => {
                while entries.last().is_some_and(|e| e.braceless) {
                    entries.pop();
                }
            }
            ScopeEvent::Clear => entries.clear(),
        }
    }
}

/// A declaration found on a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSite {
    pub name: String,
    pub scope_key: String,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolUse {
    pub name: String,
    pub scope_key: String,
}

/// Symbols declared and used on one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSymbols {
    pub variables: Vec<SymbolSite>,
    pub uses: Vec<SymbolUse>,
    pub functions: Vec<SymbolSite>,
    pub classes: Vec<SymbolSite>,
}

impl LineSymbols {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.uses.is_empty()
            && self.functions.is_empty()
            && self.classes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ScopeTracker
// ---------------------------------------------------------------------------

/// Scope and symbol sink handed to a tokenizer for one language.
///
/// When disabled (big files) every operation is a no-op and nothing is known.
pub struct ScopeTracker<'a> {
    stack: &'a mut ScopeStack,
    marks: &'a mut Vec<ScopeMark>,
    symbols: &'a mut LineSymbols,
    lang: ScopeLang,
    enabled: bool,
}

impl<'a> ScopeTracker<'a> {
    pub fn new(
        stack: &'a mut ScopeStack,
        marks: &'a mut Vec<ScopeMark>,
        symbols: &'a mut LineSymbols,
        lang: ScopeLang,
        enabled: bool,
    ) -> Self {
        Self {
            stack,
            marks,
            symbols,
            lang,
            enabled,
        }
    }

    /// Open a scope at brace depth `depth` (outside the `{`). `params` become
    /// known variables of the new scope.
    pub fn on_scope_open(
        &mut self,
        kind: ScopeKind,
        name: &str,
        depth: u16,
        col: usize,
        params: &[String],
    ) {
        if !self.enabled {
            return;
        }
        let entry = ScopeEntry::new(kind, name, depth);
        self.stack.push(entry.clone(), self.lang == ScopeLang::Js);
        for param in params {
            self.stack.learn(param);
        }
        self.marks.push(ScopeMark {
            col,
            lang: self.lang,
            event: ScopeEvent::Open(entry),
        });
    }

    /// `namespace Foo;` at brace depth `depth`.
    pub fn on_braceless_namespace(&mut self, name: &str, depth: u16, col: usize) {
        if !self.enabled {
            return;
        }
        if self.stack.end_braceless() > 0 {
            self.marks.push(ScopeMark {
                col,
                lang: self.lang,
                event: ScopeEvent::EndBraceless,
            });
        }
        let mut entry = ScopeEntry::new(ScopeKind::Namespace, name, depth);
        entry.braceless = true;
        self.stack.push(entry.clone(), false);
        self.marks.push(ScopeMark {
            col,
            lang: self.lang,
            event: ScopeEvent::Open(entry),
        });
    }

    /// A `}` seen at brace depth `depth_before` (inside the brace).
    pub fn on_scope_close(&mut self, depth_before: u16, col: usize) {
        if !self.enabled {
            return;
        }
        let depth_after = depth_before.saturating_sub(1);
        if !self.stack.close(depth_after).is_empty() {
            self.marks.push(ScopeMark {
                col,
                lang: self.lang,
                event: ScopeEvent::Close(depth_after),
            });
        }
    }

    /// Drop every open scope at the end of an embedded region.
    pub fn on_region_end(&mut self, col: usize) {
        if !self.enabled || self.stack.is_empty() {
            return;
        }
        self.stack.clear_scopes();
        self.marks.push(ScopeMark {
            col,
            lang: self.lang,
            event: ScopeEvent::Clear,
        });
    }

    /// Key of the innermost class/function scope.
    #[must_use]
    pub fn scope_key(&self) -> String {
        self.stack.key()
    }

    /// Key a pending function named `function` will have once opened.
    #[must_use]
    pub fn pending_key(&self, function: &str) -> String {
        scope_key(self.stack.class(), Some(function))
    }

    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.enabled && self.stack.knows(name)
    }

    pub fn declare_variable(&mut self, name: &str, col: usize) {
        if !self.enabled {
            return;
        }
        let key = self.stack.key();
        self.stack.learn(name);
        self.symbols.variables.push(SymbolSite {
            name: name.to_string(),
            scope_key: key,
            col,
        });
    }

    /// Record a declaration under an explicit key without learning it in the
    /// current scope (function parameters before the body opens).
    pub fn declare_variable_in(&mut self, scope_key: String, name: &str, col: usize) {
        if !self.enabled {
            return;
        }
        self.symbols.variables.push(SymbolSite {
            name: name.to_string(),
            scope_key,
            col,
        });
    }

    pub fn use_variable(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        self.symbols.uses.push(SymbolUse {
            name: name.to_string(),
            scope_key: self.stack.key(),
        });
    }

    pub fn declare_function(&mut self, name: &str, col: usize) {
        if !self.enabled {
            return;
        }
        self.symbols.functions.push(SymbolSite {
            name: name.to_string(),
            scope_key: self.stack.key(),
            col,
        });
    }

    pub fn declare_class(&mut self, name: &str, col: usize) {
        if !self.enabled {
            return;
        }
        self.symbols.classes.push(SymbolSite {
            name: name.to_string(),
            scope_key: self.stack.key(),
            col,
        });
    }
}

// ---------------------------------------------------------------------------
// SymbolTable
// ---------------------------------------------------------------------------

/// A declaration with its document position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub scope_key: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Default)]
struct ScopeSymbols {
    /// Declaration order, first site wins.
    declared: Vec<Declaration>,
    declared_names: FxHashSet<String>,
    used: BTreeSet<String>,
}

/// Known and used variables of one scope key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScopeQuery<'a> {
    pub known: Vec<&'a str>,
    pub used: Vec<&'a str>,
}

/// Document-wide symbol index, aggregated from line records.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scopes: FxHashMap<String, ScopeSymbols>,
    functions: Vec<Declaration>,
    classes: Vec<Declaration>,
}

impl SymbolTable {
    /// Aggregate `(line, symbols)` records in document order.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = (usize, &'a LineSymbols)>) -> Self {
        let mut table = Self::default();
        for (line, symbols) in lines {
            table.add_line(line, symbols);
        }
        table
    }

    fn add_line(&mut self, line: usize, symbols: &LineSymbols) {
        for site in &symbols.variables {
            let scope = self.scopes.entry(site.scope_key.clone()).or_default();
            if scope.declared_names.insert(site.name.clone()) {
                scope.declared.push(Declaration {
                    name: site.name.clone(),
                    scope_key: site.scope_key.clone(),
                    line,
                    col: site.col,
                });
            }
        }
        for usage in &symbols.uses {
            self.scopes
                .entry(usage.scope_key.clone())
                .or_default()
                .used
                .insert(usage.name.clone());
        }
        let to_decl = |site: &SymbolSite| Declaration {
            name: site.name.clone(),
            scope_key: site.scope_key.clone(),
            line,
            col: site.col,
        };
        self.functions.extend(symbols.functions.iter().map(to_decl));
        self.classes.extend(symbols.classes.iter().map(to_decl));
    }

    #[must_use]
    pub fn query(&self, scope_key: &str) -> ScopeQuery<'_> {
        ScopeQuery {
            known: self.known_variables(scope_key),
            used: self.used_variables(scope_key),
        }
    }

    /// Variables declared in `scope_key`, in declaration order.
    #[must_use]
    pub fn known_variables(&self, scope_key: &str) -> Vec<&str> {
        self.scopes
            .get(scope_key)
            .map(|s| s.declared.iter().map(|d| d.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Variables used in `scope_key`, sorted.
    #[must_use]
    pub fn used_variables(&self, scope_key: &str) -> Vec<&str> {
        self.scopes
            .get(scope_key)
            .map(|s| s.used.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Declared variables of `scope_key` that are never used there.
    #[must_use]
    pub fn unused_variables(&self, scope_key: &str) -> Vec<&Declaration> {
        self.scopes
            .get(scope_key)
            .map(|s| {
                s.declared
                    .iter()
                    .filter(|d| !s.used.contains(&d.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Functions declared in `scope_key`, or everywhere when `None`.
    #[must_use]
    pub fn known_functions(&self, scope_key: Option<&str>) -> Vec<&Declaration> {
        self.functions
            .iter()
            .filter(|d| scope_key.is_none_or(|k| d.scope_key == k))
            .collect()
    }

    #[must_use]
    pub fn known_classes(&self) -> &[Declaration] {
        &self.classes
    }

    /// First declaration site `(line, col)` of `name` in `scope_key`.
    #[must_use]
    pub fn variable_declaration_site(&self, scope_key: &str, name: &str) -> Option<(usize, usize)> {
        self.scopes
            .get(scope_key)?
            .declared
            .iter()
            .find(|d| d.name == name)
            .map(|d| (d.line, d.col))
    }

    /// Every scope key with at least one record.
    #[must_use]
    pub fn scope_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty() && self.functions.is_empty() && self.classes.is_empty()
    }
}
