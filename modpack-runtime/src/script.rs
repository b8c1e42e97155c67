//! ScriptHost: a small line-oriented reference host
//!
//! Understands one statement per line:
//!
//! ```text
//! # comment
//! import app.greet [as g]
//! from app import greet [as g], other
//! from . import sibling
//! from ..util import helper
//! NAME = EXPR
//! def NAME(): return EXPR
//! raise EXPR
//! ```
//!
//! Expressions are string and integer literals, names, attribute chains
//! and zero-argument calls (`greet.hi()`).

use crate::error::ResolveError;
use crate::host::{ExternalSource, Host};
use crate::module::{Module, ModuleRef, ModuleSpec};
use crate::resolver::Resolver;
use modpack_config::Layout;
use modpack_core::key::is_segment;
use modpack_core::{LogicalKey, ModuleKind};
use modpack_vfs::{VfsError, VirtualFileSystem};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use thiserror::Error;
use tracing::debug;

const MAX_CALL_DEPTH: usize = 64;

pub type ScriptModule = ModuleRef<Namespace>;

/// Errors raised while executing script modules
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{module}:{line}: {message}")]
    Syntax {
        module: LogicalKey,
        line: usize,
        message: String,
    },

    #[error("name '{name}' is not defined in '{module}'")]
    UndefinedName { module: LogicalKey, name: String },

    #[error("'{kind}' object has no attribute '{name}'")]
    NoAttribute { kind: &'static str, name: String },

    #[error("'{0}' object is not callable")]
    NotCallable(&'static str),

    #[error("cannot import '{name}': {source}")]
    Import {
        name: String,
        #[source]
        source: Box<ResolveError<ScriptError>>,
    },

    #[error("{0}")]
    Raised(String),

    #[error("maximum call depth exceeded in '{0}'")]
    Recursion(String),

    #[error("cannot read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },
}

/// A script value
#[derive(Clone)]
pub enum Value {
    None,
    Int(i64),
    Str(String),
    Module(ScriptModule),
    Function(Arc<Function>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Module(_) => "module",
            Value::Function(_) => "function",
        }
    }

    pub fn as_module(&self) -> Option<&ScriptModule> {
        match self {
            Value::Module(module) => Some(module),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Module(m) => write!(f, "<module '{}'>", m.name()),
            Value::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            other => write!(f, "{:?}", other),
        }
    }
}

/// `def NAME(): return EXPR`
pub struct Function {
    name: String,
    body: Expr,
    globals: Weak<Module<Namespace>>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Module variables
#[derive(Default)]
pub struct Namespace {
    vars: RwLock<HashMap<String, Value>>,
}

impl Namespace {
    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace").field("names", &self.names()).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Str(String),
    Int(i64),
    Name(String),
    Attr(Box<Expr>, String),
    Call(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Stmt {
    Import {
        target: String,
        alias: Option<String>,
    },
    FromImport {
        level: usize,
        module: Option<String>,
        names: Vec<(String, Option<String>)>,
    },
    Assign {
        name: String,
        value: Expr,
    },
    Def {
        name: String,
        body: Expr,
    },
    Raise(Expr),
}

fn is_identifier(s: &str) -> bool {
    is_segment(s) && !s.starts_with(|c: char| c.is_ascii_digit())
}

fn identifier(s: &str) -> Result<String, String> {
    let s = s.trim();
    if is_identifier(s) {
        Ok(s.to_string())
    } else {
        Err(format!("invalid identifier '{}'", s))
    }
}

/// Split `target [as alias]`
fn split_alias(s: &str) -> Result<(String, Option<String>), String> {
    match s.split_once(" as ") {
        Some((target, alias)) => Ok((target.trim().to_string(), Some(identifier(alias)?))),
        None => Ok((s.trim().to_string(), None)),
    }
}

fn parse_stmt(line: &str) -> Result<Option<Stmt>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix("import ") {
        let (target, alias) = split_alias(rest)?;
        LogicalKey::parse(&target).map_err(|e| e.to_string())?;
        return Ok(Some(Stmt::Import { target, alias }));
    }

    if let Some(rest) = line.strip_prefix("from ") {
        let (module, names) = rest
            .split_once(" import ")
            .ok_or_else(|| "expected 'import' after 'from'".to_string())?;
        let module = module.trim();
        let level = module.chars().take_while(|&c| c == '.').count();
        let module = &module[level..];
        if !module.is_empty() {
            LogicalKey::parse(module).map_err(|e| e.to_string())?;
        }
        let names = names
            .split(',')
            .map(|part| {
                let (name, alias) = split_alias(part)?;
                Ok((identifier(&name)?, alias))
            })
            .collect::<Result<Vec<_>, String>>()?;
        return Ok(Some(Stmt::FromImport {
            level,
            module: (!module.is_empty()).then(|| module.to_string()),
            names,
        }));
    }

    if let Some(rest) = line.strip_prefix("def ") {
        let (name, body) = rest
            .split_once("():")
            .ok_or_else(|| "expected 'def NAME(): return EXPR'".to_string())?;
        let body = body
            .trim()
            .strip_prefix("return ")
            .ok_or_else(|| "function body must be 'return EXPR'".to_string())?;
        return Ok(Some(Stmt::Def {
            name: identifier(name)?,
            body: parse_expr(body)?,
        }));
    }

    if let Some(rest) = line.strip_prefix("raise ") {
        return Ok(Some(Stmt::Raise(parse_expr(rest)?)));
    }

    if let Some((name, value)) = line.split_once('=') {
        return Ok(Some(Stmt::Assign {
            name: identifier(name)?,
            value: parse_expr(value)?,
        }));
    }

    Err(format!("unsupported statement '{}'", line))
}

fn parse_expr(text: &str) -> Result<Expr, String> {
    let text = text.trim();

    if let Some(quote) = text.chars().next().filter(|&c| c == '"' || c == '\'') {
        let inner = text[1..]
            .strip_suffix(quote)
            .ok_or_else(|| format!("unterminated string {}", text))?;
        if inner.contains(quote) {
            return Err(format!("unsupported string literal {}", text));
        }
        return Ok(Expr::Str(inner.to_string()));
    }

    if let Ok(n) = text.parse::<i64>() {
        return Ok(Expr::Int(n));
    }

    let (name, mut rest) = split_identifier(text)?;
    let mut expr = Expr::Name(name.to_string());
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("()") {
            expr = Expr::Call(Box::new(expr));
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('.') {
            let (attr, tail) = split_identifier(tail)?;
            expr = Expr::Attr(Box::new(expr), attr.to_string());
            rest = tail;
        } else {
            return Err(format!("unexpected '{}'", rest));
        }
    }
    Ok(expr)
}

fn split_identifier(s: &str) -> Result<(&str, &str), String> {
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    let (ident, rest) = s.split_at(end);
    if is_identifier(ident) {
        Ok((ident, rest))
    } else {
        Err(format!("expected expression, found '{}'", s))
    }
}

struct SearchRoot {
    vfs: Arc<dyn VirtualFileSystem>,
    root: PathBuf,
}

/// Reference [`Host`] executing the line-oriented script language
#[derive(Default)]
pub struct ScriptHost {
    layout: Layout,
    search: Option<SearchRoot>,
    error_hook: bool,
    executions: Mutex<HashMap<LogicalKey, usize>>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve modules outside the bundle from `root` on `vfs`
    pub fn with_search_root(mut self, vfs: Arc<dyn VirtualFileSystem>, root: impl Into<PathBuf>) -> Self {
        self.search = Some(SearchRoot {
            vfs,
            root: root.into(),
        });
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Claim the host reports uncaught errors itself
    pub fn with_error_hook(mut self, error_hook: bool) -> Self {
        self.error_hook = error_hook;
        self
    }

    /// How often a module's source has run
    pub fn execution_count(&self, name: &str) -> usize {
        let Ok(key) = LogicalKey::parse(name) else {
            return 0;
        };
        self.executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    /// Call a zero-argument function defined in `module`
    pub fn call(&self, module: &ScriptModule, name: &str) -> Result<Value, ScriptError> {
        match module.namespace().get(name) {
            Some(Value::Function(func)) => self.call_function(&func, 1),
            Some(other) => Err(ScriptError::NotCallable(other.type_name())),
            None => Err(ScriptError::UndefinedName {
                module: module.name().clone(),
                name: name.to_string(),
            }),
        }
    }

    fn call_function(&self, func: &Function, depth: usize) -> Result<Value, ScriptError> {
        if depth > MAX_CALL_DEPTH {
            return Err(ScriptError::Recursion(func.name.clone()));
        }
        let globals = func
            .globals
            .upgrade()
            .ok_or(ScriptError::NotCallable("function"))?;
        self.eval(&globals, &func.body, depth)
    }

    fn eval(&self, module: &ScriptModule, expr: &Expr, depth: usize) -> Result<Value, ScriptError> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Name(name) => module
                .namespace()
                .get(name)
                .ok_or_else(|| ScriptError::UndefinedName {
                    module: module.name().clone(),
                    name: name.clone(),
                }),
            Expr::Attr(base, attr) => match self.eval(module, base, depth)? {
                Value::Module(target) => {
                    target
                        .namespace()
                        .get(attr)
                        .ok_or_else(|| ScriptError::NoAttribute {
                            kind: "module",
                            name: attr.clone(),
                        })
                }
                other => Err(ScriptError::NoAttribute {
                    kind: other.type_name(),
                    name: attr.clone(),
                }),
            },
            Expr::Call(callee) => match self.eval(module, callee, depth)? {
                Value::Function(func) => self.call_function(&func, depth + 1),
                other => Err(ScriptError::NotCallable(other.type_name())),
            },
        }
    }

    fn run(
        &self,
        resolver: &Resolver<Self>,
        module: &ScriptModule,
        stmt: Stmt,
    ) -> Result<(), ScriptError> {
        let namespace = module.namespace();
        match stmt {
            Stmt::Import { target, alias } => {
                let imported = import(resolver, &target)?;
                match alias {
                    Some(alias) => namespace.set(alias, Value::Module(imported)),
                    None => {
                        let head = target.split('.').next().unwrap_or(&target);
                        let head_module = import(resolver, head)?;
                        namespace.set(head, Value::Module(head_module));
                    }
                }
            }
            Stmt::FromImport {
                level,
                module: source,
                names,
            } => {
                let base = if level > 0 {
                    resolver
                        .import_relative(module, level, source.as_deref())
                        .map_err(|e| import_error(&".".repeat(level), e))?
                } else {
                    import(resolver, source.as_deref().unwrap_or_default())?
                };
                for (name, alias) in names {
                    let value = match base.namespace().get(&name) {
                        Some(value) => value,
                        None => {
                            let key = base
                                .name()
                                .child(&name)
                                .map_err(|e| import_error(&name, e.into()))?;
                            let submodule = resolver
                                .import_key(&key)
                                .map_err(|e| import_error(&key.to_string(), e))?;
                            Value::Module(submodule)
                        }
                    };
                    namespace.set(alias.unwrap_or(name), value);
                }
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(module, &value, 0)?;
                namespace.set(name, value);
            }
            Stmt::Def { name, body } => {
                let func = Function {
                    name: name.clone(),
                    body,
                    globals: Arc::downgrade(module),
                };
                namespace.set(name, Value::Function(Arc::new(func)));
            }
            Stmt::Raise(expr) => {
                let value = self.eval(module, &expr, 0)?;
                return Err(ScriptError::Raised(value.to_string()));
            }
        }
        Ok(())
    }
}

fn import(resolver: &Resolver<ScriptHost>, name: &str) -> Result<ScriptModule, ScriptError> {
    resolver.import(name).map_err(|e| import_error(name, e))
}

fn import_error(name: &str, source: ResolveError<ScriptError>) -> ScriptError {
    ScriptError::Import {
        name: name.to_string(),
        source: Box::new(source),
    }
}

impl Host for ScriptHost {
    type Namespace = Namespace;
    type Error = ScriptError;

    fn create_namespace(&self, spec: &ModuleSpec) -> Namespace {
        let namespace = Namespace::default();
        namespace.set("__name__", Value::Str(spec.name.to_string()));
        namespace
    }

    fn execute(&self, resolver: &Resolver<Self>, module: &ScriptModule, source: &str) -> Result<(), ScriptError> {
        *self
            .executions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(module.name().clone())
            .or_default() += 1;

        for (index, line) in source.lines().enumerate() {
            let stmt = parse_stmt(line).map_err(|message| ScriptError::Syntax {
                module: module.name().clone(),
                line: index + 1,
                message,
            })?;
            if let Some(stmt) = stmt {
                self.run(resolver, module, stmt)?;
            }
        }
        Ok(())
    }

    fn bind_submodule(&self, parent: &ScriptModule, name: &str, child: &ScriptModule) {
        parent.namespace().set(name, Value::Module(child.clone()));
    }

    fn find_external(&self, name: &LogicalKey) -> Result<Option<ExternalSource>, ScriptError> {
        let Some(search) = &self.search else {
            return Ok(None);
        };

        let mut base = search.root.clone();
        base.extend(name.segments());
        let package = base.join(self.layout.marker_file_name());
        let module = base.with_extension(&self.layout.source_extension);

        let (path, kind) = if search.vfs.is_file(&package) {
            (package, ModuleKind::Package)
        } else if search.vfs.is_file(&module) {
            (module, ModuleKind::Module)
        } else {
            return Ok(None);
        };

        let source = search
            .vfs
            .read_to_string(&path)
            .map_err(|source| ScriptError::Read {
                path: path.clone(),
                source,
            })?;

        debug!(target: "modpack::resolve", module = %name, path = %path.display(), "Found in search root");
        Ok(Some(ExternalSource { kind, source }))
    }

    fn has_error_hook(&self) -> bool {
        self.error_hook
    }
}
