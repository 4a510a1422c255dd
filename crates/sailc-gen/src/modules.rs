//! Module loading: resolution, caching, cycle detection, and recursive
//! compilation of imported `.sfn` files.
//!
//! Each resolved path compiles exactly once per session; the compiled
//! body is embedded into the importing output so the generated program
//! is self-contained. A `loading` set tracks the import chain currently
//! being compiled and turns re-entry into an `ImportError`.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use sailc_util::{CompileError, CompileResult, Span};
use tracing::debug;

use crate::python::PythonEmitter;

/// A dependency compiled for embedding.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Namespace object name, derived from the file stem.
    pub namespace: String,
    /// Emitted body lines (no header, no entry point).
    pub body: Vec<String>,
    /// Python imports the body needs, merged into the parent header.
    pub imports: IndexSet<String>,
    /// TypeVar names the body needs, merged into the parent header.
    pub type_vars: Vec<String>,
}

/// Loads and caches Sailfin modules for one compilation session.
pub struct ModuleLoader {
    /// Base path absolute specifiers resolve against.
    base_dir: PathBuf,

    /// Paths currently being compiled, in import order.
    loading: IndexSet<PathBuf>,

    /// Finished compilations, keyed by canonical path.
    loaded: IndexMap<PathBuf, CompiledModule>,
}

impl ModuleLoader {
    /// Create a loader rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            loading: IndexSet::new(),
            loaded: IndexMap::new(),
        }
    }

    /// Resolve a source specifier against the importing file (relative
    /// specifiers) or the session base path (everything else).
    pub fn resolve(&self, source: &str, current_file: Option<&Path>) -> PathBuf {
        let current_dir = current_file
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir.clone());

        let raw = if source.starts_with("./") || source.starts_with("../") {
            current_dir.join(source)
        } else if current_file.is_some() && !source.starts_with('/') {
            current_dir.join(source)
        } else {
            self.base_dir.join(source)
        };
        raw.canonicalize().unwrap_or(raw)
    }

    /// Load a module, compiling it on first use.
    ///
    /// `span` locates the import statement for diagnostics.
    pub fn load(
        &mut self,
        source: &str,
        current_file: Option<&Path>,
        span: Span,
    ) -> CompileResult<CompiledModule> {
        let path = self.resolve(source, current_file);

        if let Some(module) = self.loaded.get(&path) {
            return Ok(module.clone());
        }

        if self.loading.contains(&path) {
            // Deliberate: the span points at the import that re-enters
            // the loading chain (the link that detects the cycle), not
            // the chain's first import; the message lists every link.
            let chain: Vec<String> = self
                .loading
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            return Err(CompileError::import(
                format!(
                    "circular import detected: {} <-> {}",
                    chain.join(" -> "),
                    path.display()
                ),
                span,
            ));
        }

        if !path.exists() {
            return Err(CompileError::import(
                format!("module not found: {} (resolved to {})", source, path.display()),
                span,
            ));
        }

        debug!(module = %path.display(), "compiling imported module");
        self.loading.insert(path.clone());
        let result = self.compile_module(&path, span);
        self.loading.shift_remove(&path);

        let module = result?;
        self.loaded.insert(path, module.clone());
        Ok(module)
    }

    /// Recursively compile one dependency: lex, parse, validate, emit in
    /// embedded mode.
    fn compile_module(&mut self, path: &Path, span: Span) -> CompileResult<CompiledModule> {
        let source = std::fs::read_to_string(path).map_err(|err| {
            CompileError::import(
                format!("cannot read module {}: {}", path.display(), err),
                span,
            )
        })?;

        let tokens = sailc_lex::Lexer::tokenize(&source)?;
        let program = sailc_par::parse(tokens)?;
        sailc_sem::validate(&program)?;

        let emitted = PythonEmitter::emit_module(&program, path, self)?;
        Ok(CompiledModule {
            namespace: namespace_for(path),
            body: emitted.body,
            imports: emitted.imports,
            type_vars: emitted.type_vars,
        })
    }

    /// Number of modules compiled so far.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

/// Namespace object name for a module path: the file stem with
/// non-identifier characters replaced.
fn namespace_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string());
    let mut namespace = String::with_capacity(stem.len());
    for (i, c) in stem.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                namespace.push('_');
            }
            namespace.push(c);
        } else {
            namespace.push('_');
        }
    }
    if namespace.is_empty() {
        namespace.push_str("module");
    }
    namespace
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_sanitization() {
        assert_eq!(namespace_for(Path::new("/tmp/math.sfn")), "math");
        assert_eq!(namespace_for(Path::new("/tmp/my-utils.sfn")), "my_utils");
        assert_eq!(namespace_for(Path::new("/tmp/9lives.sfn")), "_9lives");
    }

    #[test]
    fn test_resolve_relative_to_current_file() {
        let loader = ModuleLoader::new("/base");
        let resolved = loader.resolve("./util.sfn", Some(Path::new("/proj/src/main.sfn")));
        assert!(resolved.ends_with("src/util.sfn") || resolved.ends_with("src/./util.sfn"));
    }

    #[test]
    fn test_resolve_against_base_without_context() {
        let loader = ModuleLoader::new("/base");
        let resolved = loader.resolve("lib/util.sfn", None);
        assert!(resolved.starts_with("/base"));
    }

    #[test]
    fn test_missing_module_errors() {
        let mut loader = ModuleLoader::new("/nonexistent-base");
        let err = loader
            .load("./missing.sfn", None, Span::DUMMY)
            .unwrap_err();
        assert!(err.to_string().contains("module not found"));
    }
}
