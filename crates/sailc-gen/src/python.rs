//! Pass 2: the Python emitter.
//!
//! Walks the AST and produces target source, maintaining an indentation
//! level, a line buffer, a deduplicated import set, and a deterministic
//! unique-name counter. The lowering rules:
//!
//! | Sailfin | Python |
//! |---|---|
//! | `print.info(x)` | `print(x)` |
//! | `obj.length` | `len(obj)` |
//! | `arr.map(f)` / `arr.filter(f)` | `list(map(f, arr))` / `list(filter(f, arr))` |
//! | `arr.reduce(init, f)` | `functools.reduce(f, arr, init)` |
//! | `arr.concat(other)` | `(arr + other)` |
//! | `Channel<T>(n)` | `asyncio.Queue(n)` |
//! | `ch.send(v)` / `ch.receive()` | `ch.put_nowait(v)` / `ch.get()` for channel-shaped receivers |
//! | `sleep(ms)` | `await asyncio.sleep(ms / 1000)` in async context, `time.sleep(ms / 1000)` otherwise |
//! | `routine { ... }` | top level: gathered at entry; async context: awaited; sync context: background task |
//! | `async { ... }` | async def + coroutine call |
//! | `parallel [...]` | `asyncio.gather` over async thunks |
//! | `match` | if/elif ladder with binding extraction, raise on no match |
//! | `E.V { a: 1 }` | `{"type": "V", "a": 1}` |
//! | `"hi {{x}}"` | f-string with dict-safe member access |
//! | `struct` / `interface` | dataclass / ABC |
//!
//! Output is deterministic byte-for-byte: imports and TypeVar
//! declarations are sorted, and generated names come from a counter.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use sailc_par::ast::*;
use sailc_util::{sym, CompileError, CompileResult, Symbol};
use tracing::debug;

use crate::interp;
use crate::modules::ModuleLoader;
use crate::scan::ProgramScan;

/// Result of emitting a module in embedded mode.
pub struct EmittedModule {
    pub body: Vec<String>,
    pub imports: IndexSet<String>,
    pub type_vars: Vec<String>,
}

/// How a match construct delivers its arm values.
#[derive(Clone, Copy, PartialEq)]
enum MatchMode {
    /// Statement position: expression arms emit `return <expr>` so
    /// expression-bodied match functions produce values.
    Statement,
    /// Inside a lifted match function: every arm returns.
    Expression,
}

/// The Python code generator.
pub struct PythonEmitter<'l> {
    loader: &'l mut ModuleLoader,
    scan: ProgramScan,
    source_path: Option<PathBuf>,
    embedded: bool,

    lines: Vec<String>,
    imports: IndexSet<String>,
    type_vars: BTreeSet<String>,
    indent: usize,
    unique: u32,

    in_function: bool,
    async_stack: Vec<bool>,
    /// Test functions with their descriptions, in declaration order.
    test_functions: Vec<(String, String)>,
    top_level_routines: Vec<String>,
    /// Variables known to hold channels (created via `Channel(...)`).
    channel_vars: FxHashSet<Symbol>,
}

impl<'l> PythonEmitter<'l> {
    fn new(
        program: &Program,
        source_path: Option<&Path>,
        loader: &'l mut ModuleLoader,
        embedded: bool,
    ) -> Self {
        let scan = ProgramScan::analyze(program);
        let type_vars = scan.type_vars.clone();
        Self {
            loader,
            scan,
            source_path: source_path.map(Path::to_path_buf),
            embedded,
            lines: Vec::new(),
            imports: IndexSet::new(),
            type_vars,
            indent: 0,
            unique: 0,
            in_function: false,
            async_stack: Vec::new(),
            test_functions: Vec::new(),
            top_level_routines: Vec::new(),
            channel_vars: FxHashSet::default(),
        }
    }

    /// Emit a whole program as a self-contained Python source.
    pub fn emit_program(
        program: &Program,
        source_path: Option<&Path>,
        loader: &mut ModuleLoader,
    ) -> CompileResult<String> {
        debug!(statements = program.statements.len(), "generating python");
        let mut emitter = PythonEmitter::new(program, source_path, loader, false);
        for stmt in &program.statements {
            emitter.emit_stmt(stmt)?;
        }
        emitter.emit_entry(program);
        Ok(emitter.assemble())
    }

    /// Emit a dependency in embedded mode: body only, no header or entry
    /// point.
    pub(crate) fn emit_module(
        program: &Program,
        path: &Path,
        loader: &mut ModuleLoader,
    ) -> CompileResult<EmittedModule> {
        let mut emitter = PythonEmitter::new(program, Some(path), loader, true);
        for stmt in &program.statements {
            emitter.emit_stmt(stmt)?;
        }
        Ok(EmittedModule {
            body: emitter.lines,
            imports: emitter.imports,
            type_vars: emitter.type_vars.into_iter().collect(),
        })
    }

    // ========================================================================
    // Output helpers
    // ========================================================================

    fn push(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if line.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", "    ".repeat(self.indent), line));
        }
    }

    /// Next deterministic generated name with the given prefix.
    fn unique_name(&mut self, prefix: &str) -> String {
        let name = format!("_{}_{}", prefix, self.unique);
        self.unique += 1;
        name
    }

    fn add_import(&mut self, import: &str) {
        self.imports.insert(import.to_string());
    }

    fn in_async(&self) -> bool {
        self.async_stack.last().copied().unwrap_or(false)
    }

    /// Final header + body assembly for a top-level program.
    fn assemble(&mut self) -> String {
        let mut header = vec!["from __future__ import annotations".to_string()];
        if !self.type_vars.is_empty() {
            self.add_import("from typing import TypeVar");
        }
        let mut imports: Vec<String> = self.imports.iter().cloned().collect();
        imports.sort();
        header.extend(imports);
        if !self.type_vars.is_empty() {
            header.push(String::new());
            for type_var in &self.type_vars {
                header.push(format!("{} = TypeVar('{}')", type_var, type_var));
            }
        }
        header.push(String::new());

        let mut out = header.join("\n");
        out.push('\n');
        out.push_str(&self.lines.join("\n"));
        out.push('\n');
        out
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn emit_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Import(import) => self.emit_import(import),
            Stmt::TypeAlias(decl) => self.emit_type_alias(decl),
            Stmt::Interface(decl) => self.emit_interface(decl),
            Stmt::Struct(decl) => self.emit_struct(decl),
            Stmt::Enum(decl) => self.emit_enum(decl),
            Stmt::Function(decl) => self.emit_function(decl),
            Stmt::Let(decl) => self.emit_let(decl),
            Stmt::Const(decl) => self.emit_const(decl),
            Stmt::Return(ret) => {
                match &ret.value {
                    Some(value) => {
                        let rendered = self.emit_expr(value)?;
                        self.push(format!("return {}", rendered));
                    }
                    None => self.push("return"),
                }
                Ok(())
            }
            Stmt::If(if_stmt) => self.emit_if(if_stmt),
            Stmt::Match(node) => self.emit_match(node, MatchMode::Statement),
            Stmt::For(for_stmt) => self.emit_for(for_stmt),
            Stmt::While(while_stmt) => {
                let condition = self.emit_expr(&while_stmt.condition)?;
                self.push(format!("while {}:", condition));
                self.emit_suite(&while_stmt.body)?;
                Ok(())
            }
            Stmt::Loop(loop_stmt) => {
                self.push("while True:");
                self.emit_suite(&loop_stmt.body)?;
                Ok(())
            }
            Stmt::Break(_) => {
                self.push("break");
                Ok(())
            }
            Stmt::Continue(_) => {
                self.push("continue");
                Ok(())
            }
            Stmt::Throw(throw) => {
                let value = self.emit_expr(&throw.value)?;
                self.push(format!("raise Exception({})", value));
                Ok(())
            }
            Stmt::Assert(assert) => {
                let condition = self.emit_expr(&assert.condition)?;
                match &assert.message {
                    Some(message) => {
                        let message = self.emit_expr(message)?;
                        self.push(format!("assert {}, {}", condition, message));
                    }
                    None => self.push(format!("assert {}", condition)),
                }
                Ok(())
            }
            Stmt::Try(try_stmt) => self.emit_try(try_stmt),
            Stmt::Routine(routine) => {
                let rendered = self.emit_routine(routine)?;
                if !rendered.is_empty() {
                    self.push(rendered);
                }
                Ok(())
            }
            Stmt::Expr(stmt) => match &stmt.expr {
                Expr::Assign(assign) => self.emit_assign(assign),
                expr => {
                    let rendered = self.emit_expr(expr)?;
                    if !rendered.is_empty() {
                        self.push(rendered);
                    }
                    Ok(())
                }
            },
            Stmt::Test(test) => self.emit_test(test),
        }
    }

    /// Emit an indented suite, padding empty bodies with `pass`.
    fn emit_suite(&mut self, body: &[Stmt]) -> CompileResult<()> {
        self.indent += 1;
        if body.is_empty() {
            self.push("pass");
        } else {
            let before = self.lines.len();
            for stmt in body {
                self.emit_stmt(stmt)?;
            }
            if self.lines.len() == before {
                self.push("pass");
            }
        }
        self.indent -= 1;
        Ok(())
    }

    fn emit_import(&mut self, import: &ImportStmt) -> CompileResult<()> {
        let source = import.source.as_str();
        let items: Vec<String> = import.items.iter().map(|s| s.to_string()).collect();

        // Built-in modules come from the runtime package
        if let Some(builtin) = source.strip_prefix("sailfin/") {
            self.add_import(&format!(
                "from sailfin.{} import {}",
                builtin.replace('/', "."),
                items.join(", ")
            ));
            return Ok(());
        }

        let module = self
            .loader
            .load(source, self.source_path.as_deref(), import.span)?;
        for import_line in &module.imports {
            self.imports.insert(import_line.clone());
        }
        for type_var in &module.type_vars {
            self.type_vars.insert(type_var.clone());
        }

        // Embed the compiled body and bind its new globals onto a
        // namespace object named after the module.
        let ns = module.namespace.clone();
        self.push(format!("_module_names_before_{} = set(globals().keys())", ns));
        let prefix = "    ".repeat(self.indent);
        for line in &module.body {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines.push(format!("{}{}", prefix, line));
            }
        }
        self.push(format!("_module_names_after_{} = set(globals().keys())", ns));
        self.push(format!("class {}:", ns));
        self.indent += 1;
        self.push("pass");
        self.indent -= 1;
        self.push(format!(
            "for _name in sorted(_module_names_after_{} - _module_names_before_{}):",
            ns, ns
        ));
        self.indent += 1;
        self.push("if not _name.startswith(\"_\"):");
        self.indent += 1;
        self.push(format!("setattr({}, _name, globals()[_name])", ns));
        self.indent -= 2;
        Ok(())
    }

    fn emit_type_alias(&mut self, decl: &TypeAliasDecl) -> CompileResult<()> {
        match &decl.ty {
            TypeExpr::Intersection(intersection) => {
                let left = self.map_type(&intersection.left);
                let right = self.map_type(&intersection.right);
                self.add_import("from typing import Any");
                self.push(format!(
                    "{} = Any  # Intersection of {} & {}",
                    decl.name, left, right
                ));
            }
            ty => {
                let mapped = self.map_type(ty);
                self.push(format!("{} = {}", decl.name, mapped));
            }
        }
        Ok(())
    }

    fn emit_interface(&mut self, decl: &InterfaceDecl) -> CompileResult<()> {
        self.add_import("from abc import ABC, abstractmethod");
        self.push(format!("class {}(ABC):", decl.name));
        self.indent += 1;
        if decl.members.is_empty() {
            self.push("pass");
        }
        for member in &decl.members {
            match member {
                InterfaceMember::Method(method) => {
                    let mut params = vec!["self".to_string()];
                    for param in &method.params {
                        if param.name == sym::SELF_ {
                            continue;
                        }
                        let mut rendered = param.name.to_string();
                        if let Some(ty) = &param.ty {
                            rendered.push_str(&format!(": {}", self.map_type(ty)));
                        }
                        params.push(rendered);
                    }
                    let ret = match &method.return_type {
                        Some(ty) => {
                            let mapped = self.map_type(ty);
                            if mapped == "None" {
                                String::new()
                            } else {
                                format!(" -> {}", mapped)
                            }
                        }
                        None => String::new(),
                    };
                    self.push("@abstractmethod");
                    self.push(format!("def {}({}){}:", method.name, params.join(", "), ret));
                    self.indent += 1;
                    self.push("pass");
                    self.indent -= 1;
                }
                InterfaceMember::Property(property) => {
                    let mapped = self.map_type(&property.ty);
                    self.push("@property");
                    self.push("@abstractmethod");
                    self.push(format!("def {}(self) -> {}:", property.name, mapped));
                    self.indent += 1;
                    self.push("pass");
                    self.indent -= 1;
                }
            }
        }
        self.indent -= 1;
        self.push("");
        Ok(())
    }

    fn emit_struct(&mut self, decl: &StructDecl) -> CompileResult<()> {
        self.add_import("from dataclasses import dataclass");

        let mut bases = Vec::new();
        if !decl.type_params.is_empty() {
            self.add_import("from typing import Generic");
            let params: Vec<String> = decl.type_params.iter().map(|p| p.to_string()).collect();
            bases.push(format!("Generic[{}]", params.join(", ")));
        }
        for interface in &decl.implements {
            bases.push(interface.to_string());
        }
        let inheritance = if bases.is_empty() {
            String::new()
        } else {
            format!("({})", bases.join(", "))
        };

        self.push("@dataclass");
        self.push(format!("class {}{}:", decl.name, inheritance));
        self.indent += 1;
        if decl.members.is_empty() {
            self.push("pass");
        }
        for member in &decl.members {
            match member {
                StructMember::Field(field) => {
                    let mapped = self.map_type(&field.ty);
                    let comment = if field.mutable { "  # Mutable" } else { "" };
                    self.push(format!("{}: {}{}", field.name, mapped, comment));
                }
                StructMember::Method(method) => self.emit_method(method)?,
            }
        }
        self.indent -= 1;
        self.push("");
        Ok(())
    }

    fn emit_method(&mut self, method: &FunctionDecl) -> CompileResult<()> {
        let is_constructor = method.name == sym::NEW;
        let has_self = method
            .params
            .first()
            .map(|p| p.name == sym::SELF_)
            .unwrap_or(false);
        let is_static = !has_self && !is_constructor;

        if is_constructor || is_static {
            self.push("@classmethod");
        }
        for decorator in &method.decorators {
            self.push(format!("@{}", decorator));
        }

        let first_param = if is_constructor || is_static { "cls" } else { "self" };
        let rest = if has_self {
            &method.params[1..]
        } else {
            &method.params[..]
        };
        let mut params = vec![first_param.to_string()];
        for param in rest {
            params.push(self.render_param(param)?);
        }

        let ret = match &method.return_type {
            Some(ty) => {
                let mapped = self.map_type(ty);
                if is_constructor {
                    format!(" -> '{}'", mapped)
                } else {
                    format!(" -> {}", mapped)
                }
            }
            None => String::new(),
        };

        let should_be_async =
            method.is_async || self.scan.functions_with_routines.contains(&method.name);
        let async_str = if should_be_async { "async " } else { "" };
        self.push(format!(
            "{}def {}({}){}:",
            async_str,
            method.name,
            params.join(", "),
            ret
        ));
        self.emit_function_body(&method.body, should_be_async, method.name, false)?;
        self.push("");
        Ok(())
    }

    fn emit_enum(&mut self, decl: &EnumDecl) -> CompileResult<()> {
        self.push(format!("class {}:", decl.name));
        self.indent += 1;
        if decl.variants.is_empty() {
            self.push("pass");
        }
        for variant in &decl.variants {
            // Each variant doubles as its tag constant
            self.push(format!("{} = \"{}\"", variant.name, variant.name));
        }
        self.indent -= 1;
        self.push("");
        Ok(())
    }

    fn emit_function(&mut self, decl: &FunctionDecl) -> CompileResult<()> {
        let should_be_async =
            decl.is_async || self.scan.functions_with_routines.contains(&decl.name);

        for decorator in &decl.decorators {
            self.push(format!("@{}", decorator));
        }

        let mut params = Vec::new();
        for param in &decl.params {
            params.push(self.render_param(param)?);
        }
        let ret = match &decl.return_type {
            Some(ty) => format!(" -> {}", self.map_type(ty)),
            None => String::new(),
        };
        let async_str = if should_be_async { "async " } else { "" };
        self.push(format!(
            "{}def {}({}){}:",
            async_str,
            decl.name,
            params.join(", "),
            ret
        ));
        self.emit_function_body(&decl.body, should_be_async, decl.name, true)?;
        self.push("");
        Ok(())
    }

    /// Shared body emission for functions and methods: `global` lines,
    /// context tracking, `pass` padding.
    fn emit_function_body(
        &mut self,
        body: &[Stmt],
        is_async: bool,
        _name: Symbol,
        track_globals: bool,
    ) -> CompileResult<()> {
        self.indent += 1;
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(is_async);

        if track_globals {
            let globals = self.find_global_assignments(body);
            if !globals.is_empty() {
                let joined: Vec<String> = globals.into_iter().collect();
                self.push(format!("global {}", joined.join(", ")));
            }
        }

        let result = (|| {
            if body.is_empty() {
                self.push("pass");
            } else {
                let before = self.lines.len();
                for stmt in body {
                    self.emit_stmt(stmt)?;
                }
                if self.lines.len() == before {
                    self.push("pass");
                }
            }
            Ok(())
        })();

        self.async_stack.pop();
        self.in_function = was_in_function;
        self.indent -= 1;
        result
    }

    fn render_param(&mut self, param: &Param) -> CompileResult<String> {
        let mut rendered = param.name.to_string();
        if let Some(ty) = &param.ty {
            let mapped = self.map_type(ty);
            if mapped != "None" {
                rendered.push_str(&format!(": {}", mapped));
            }
        }
        if let Some(default) = &param.default {
            let default = self.emit_expr(default)?;
            rendered.push_str(&format!("={}", default));
        }
        Ok(rendered)
    }

    /// Module-scope names assigned inside this body (not crossing nested
    /// function boundaries), sorted for deterministic `global` lines.
    fn find_global_assignments(&self, body: &[Stmt]) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        self.collect_global_assignments(body, &mut found);
        found
    }

    fn collect_global_assignments(&self, body: &[Stmt], found: &mut BTreeSet<String>) {
        for stmt in body {
            match stmt {
                Stmt::Expr(stmt) => {
                    if let Expr::Assign(assign) = &stmt.expr {
                        if let Expr::Ident(ident) = assign.target.as_ref() {
                            if self.scan.global_variables.contains(&ident.name) {
                                found.insert(ident.name.to_string());
                            }
                        }
                    }
                }
                Stmt::If(if_stmt) => {
                    self.collect_global_assignments(&if_stmt.then_branch, found);
                    if let Some(else_branch) = &if_stmt.else_branch {
                        self.collect_global_assignments(else_branch, found);
                    }
                }
                Stmt::While(w) => self.collect_global_assignments(&w.body, found),
                Stmt::For(f) => self.collect_global_assignments(&f.body, found),
                Stmt::Loop(l) => self.collect_global_assignments(&l.body, found),
                Stmt::Try(t) => {
                    self.collect_global_assignments(&t.body, found);
                    for catch in &t.catches {
                        self.collect_global_assignments(&catch.body, found);
                    }
                    if let Some(finally) = &t.finally {
                        self.collect_global_assignments(finally, found);
                    }
                }
                Stmt::Match(node) => {
                    for arm in &node.arms {
                        if let MatchArmBody::Block(block) = &arm.body {
                            self.collect_global_assignments(block, found);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn emit_let(&mut self, decl: &LetDecl) -> CompileResult<()> {
        if let Some(init) = &decl.init {
            if creates_channel(init) {
                self.channel_vars.insert(decl.name);
            }
        }
        let comment = if decl.mutable { "  # Mutable" } else { "" };
        match (&decl.ty, &decl.init) {
            (Some(ty), Some(init)) => {
                let mapped = self.map_type(ty);
                let value = self.emit_non_empty(init)?;
                self.push(format!("{}: {} = {}{}", decl.name, mapped, value, comment));
            }
            (None, Some(init)) => {
                let value = self.emit_non_empty(init)?;
                self.push(format!("{} = {}{}", decl.name, value, comment));
            }
            (Some(ty), None) => {
                let mapped = self.map_type(ty);
                self.push(format!("{}: {}{}", decl.name, mapped, comment));
            }
            (None, None) => {
                self.push(format!("{} = None{}", decl.name, comment));
            }
        }
        Ok(())
    }

    /// Emit an initializer expression, substituting `None` when the
    /// expression produced no value (a top-level routine registers
    /// itself and renders as nothing).
    fn emit_non_empty(&mut self, expr: &Expr) -> CompileResult<String> {
        let rendered = self.emit_expr(expr)?;
        Ok(if rendered.is_empty() {
            "None".to_string()
        } else {
            rendered
        })
    }

    fn emit_const(&mut self, decl: &ConstDecl) -> CompileResult<()> {
        if creates_channel(&decl.value) {
            self.channel_vars.insert(decl.name);
        }
        let value = self.emit_non_empty(&decl.value)?;
        match &decl.ty {
            Some(ty) => {
                let mapped = self.map_type(ty);
                self.push(format!("{}: {} = {}  # Constant", decl.name, mapped, value));
            }
            None => self.push(format!("{} = {}  # Constant", decl.name, value)),
        }
        Ok(())
    }

    fn emit_if(&mut self, if_stmt: &IfStmt) -> CompileResult<()> {
        let condition = self.emit_expr(&if_stmt.condition)?;
        self.push(format!("if {}:", condition));
        self.emit_suite(&if_stmt.then_branch)?;
        if let Some(else_branch) = &if_stmt.else_branch {
            self.push("else:");
            self.emit_suite(else_branch)?;
        }
        Ok(())
    }

    fn emit_for(&mut self, for_stmt: &ForStmt) -> CompileResult<()> {
        let target = match &for_stmt.pattern {
            Pattern::Binding(ident) => ident.name.to_string(),
            Pattern::Wildcard(_) => "_".to_string(),
            other => {
                return Err(CompileError::validation(
                    "only identifier and wildcard patterns are supported in for loops",
                    other.span(),
                ))
            }
        };
        let iterable = self.emit_expr(&for_stmt.iterable)?;
        self.push(format!("for {} in {}:", target, iterable));
        self.emit_suite(&for_stmt.body)?;
        Ok(())
    }

    fn emit_try(&mut self, try_stmt: &TryStmt) -> CompileResult<()> {
        self.push("try:");
        self.emit_suite(&try_stmt.body)?;
        for catch in &try_stmt.catches {
            self.push(format!("except Exception as {}:", catch.name));
            self.emit_suite(&catch.body)?;
        }
        if let Some(finally) = &try_stmt.finally {
            self.push("finally:");
            self.emit_suite(finally)?;
        }
        Ok(())
    }

    fn emit_assign(&mut self, assign: &AssignExpr) -> CompileResult<()> {
        let target = self.emit_expr(&assign.target)?;
        let value = self.emit_expr(&assign.value)?;
        match assign.op.bin_op() {
            Some(op) => self.push(format!("{} {}= {}", target, op.as_str(), value)),
            None => self.push(format!("{} = {}", target, value)),
        }
        Ok(())
    }

    fn emit_test(&mut self, test: &TestDecl) -> CompileResult<()> {
        let fn_name = self.unique_name("test");
        self.test_functions
            .push((fn_name.clone(), test.description.to_string()));
        self.push(format!("def {}():", fn_name));
        self.indent += 1;
        self.push(format!("\"\"\"{}\"\"\"", test.description.as_str().replace('"', "'")));
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(false);
        let result = (|| {
            for stmt in &test.body {
                self.emit_stmt(stmt)?;
            }
            Ok(())
        })();
        self.async_stack.pop();
        self.in_function = was_in_function;
        self.indent -= 1;
        self.push("");
        result
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expr(&mut self, expr: &Expr) -> CompileResult<String> {
        match expr {
            Expr::Number(n) => Ok(n.value.to_string()),
            Expr::Str(s) => Ok(interp::interpolate(s.value.as_str())),
            Expr::Bool(b) => Ok(if b.value { "True" } else { "False" }.to_string()),
            Expr::Null(_) => Ok("None".to_string()),
            Expr::Ident(ident) => Ok(ident.name.to_string()),
            Expr::Array(array) => {
                let elements = self.emit_expr_list(&array.elements)?;
                Ok(format!("[{}]", elements))
            }
            Expr::Dict(dict) => self.emit_dict(dict),
            Expr::StructLit(lit) => {
                let fields: Vec<String> = lit
                    .fields
                    .iter()
                    .map(|field| {
                        let value = self.emit_expr(&field.value)?;
                        Ok(format!("{}={}", field.name, value))
                    })
                    .collect::<CompileResult<_>>()?;
                Ok(format!("{}({})", lit.name.name, fields.join(", ")))
            }
            Expr::EnumVariant(lit) => {
                let mut parts = vec![format!("\"type\": \"{}\"", lit.variant)];
                for field in &lit.fields {
                    let value = self.emit_expr(&field.value)?;
                    parts.push(format!("\"{}\": {}", field.name, value));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            Expr::Member(member) => self.emit_member(member),
            Expr::Index(index) => {
                let object = self.emit_expr(&index.object)?;
                let idx = self.emit_expr(&index.index)?;
                Ok(format!("{}[{}]", object, idx))
            }
            Expr::Call(call) => self.emit_call(call),
            Expr::TypeApply(apply) => self.emit_type_apply(apply),
            Expr::Unary(unary) => {
                let operand = self.emit_expr(&unary.operand)?;
                Ok(match unary.op {
                    UnaryOp::Neg => format!("(-{})", operand),
                    UnaryOp::Not => format!("(not {})", operand),
                })
            }
            Expr::Binary(binary) => {
                let left = self.emit_expr(&binary.left)?;
                let right = self.emit_expr(&binary.right)?;
                let op = match binary.op {
                    BinOp::And => "and",
                    BinOp::Or => "or",
                    other => other.as_str(),
                };
                Ok(format!("({} {} {})", left, op, right))
            }
            Expr::Range(range) => {
                let start = self.emit_expr(&range.start)?;
                let end = self.emit_expr(&range.end)?;
                Ok(format!("range({}, {})", start, end))
            }
            Expr::Lambda(lambda) => self.emit_lambda(lambda),
            Expr::Await(await_expr) => self.emit_await(await_expr),
            Expr::AsyncBlock(block) => self.emit_async_block(block),
            Expr::Routine(routine) => self.emit_routine(routine),
            Expr::Parallel(parallel) => self.emit_parallel(parallel),
            Expr::Match(node) => self.emit_match_expression(node),
            Expr::Is(is_expr) => self.emit_is(is_expr),
            Expr::Assign(assign) => Err(CompileError::validation(
                "assignment cannot be used as an expression",
                assign.span,
            )),
        }
    }

    fn emit_expr_list(&mut self, exprs: &[Expr]) -> CompileResult<String> {
        let rendered: Vec<String> = exprs
            .iter()
            .map(|e| self.emit_expr(e))
            .collect::<CompileResult<_>>()?;
        Ok(rendered.join(", "))
    }

    fn emit_dict(&mut self, dict: &DictLit) -> CompileResult<String> {
        let mut pairs = Vec::new();
        for (key, value) in &dict.entries {
            // Identifier keys are string keys
            let key = match key {
                Expr::Ident(ident) => interp::py_str(ident.name.as_str()),
                other => self.emit_expr(other)?,
            };
            let value = self.emit_expr(value)?;
            pairs.push(format!("{}: {}", key, value));
        }
        Ok(format!("{{{}}}", pairs.join(", ")))
    }

    fn emit_member(&mut self, member: &MemberExpr) -> CompileResult<String> {
        // print.info / print.debug / print.warn / print.error -> print
        if let Expr::Ident(object) = member.object.as_ref() {
            if object.name == sym::PRINT
                && matches!(
                    member.member,
                    m if m == sym::INFO || m == sym::DEBUG || m == sym::WARN || m == sym::ERROR
                )
            {
                return Ok("print".to_string());
            }
        }
        let object = self.emit_expr(&member.object)?;
        if member.member == sym::LENGTH {
            return Ok(format!("len({})", object));
        }
        Ok(format!("{}.{}", object, member.member))
    }

    fn emit_call(&mut self, call: &CallExpr) -> CompileResult<String> {
        if let Expr::Member(member) = call.callee.as_ref() {
            let m = member.member;
            if m == sym::MAP {
                let object = self.emit_expr(&member.object)?;
                let args = self.emit_expr_list(&call.args)?;
                return Ok(format!("list(map({}, {}))", args, object));
            }
            if m == sym::FILTER {
                let object = self.emit_expr(&member.object)?;
                let args = self.emit_expr_list(&call.args)?;
                return Ok(format!("list(filter({}, {}))", args, object));
            }
            if m == sym::REDUCE {
                self.add_import("import functools");
                let object = self.emit_expr(&member.object)?;
                let args: Vec<String> = call
                    .args
                    .iter()
                    .map(|a| self.emit_expr(a))
                    .collect::<CompileResult<_>>()?;
                return Ok(if args.len() == 2 {
                    format!("functools.reduce({}, {}, {})", args[1], object, args[0])
                } else {
                    format!("functools.reduce({}, {})", args.join(", "), object)
                });
            }
            if m == sym::CONCAT {
                let object = self.emit_expr(&member.object)?;
                let args = self.emit_expr_list(&call.args)?;
                return Ok(format!("({} + {})", object, args));
            }
            if m == sym::SEND && self.is_channel_shaped(&member.object) {
                let object = self.emit_expr(&member.object)?;
                let args = self.emit_expr_list(&call.args)?;
                return Ok(format!("{}.put_nowait({})", object, args));
            }
            if m == sym::RECEIVE && self.is_channel_shaped(&member.object) {
                let object = self.emit_expr(&member.object)?;
                return Ok(format!("{}.get()", object));
            }
        }

        if let Expr::Ident(callee) = call.callee.as_ref() {
            if callee.name == sym::SLEEP {
                let args = self.emit_expr_list(&call.args)?;
                return Ok(if self.in_async() {
                    self.add_import("import asyncio");
                    if args.is_empty() {
                        "await asyncio.sleep(0)".to_string()
                    } else {
                        format!("await asyncio.sleep({} / 1000)", args)
                    }
                } else {
                    self.add_import("import time");
                    if args.is_empty() {
                        "time.sleep(0)".to_string()
                    } else {
                        format!("time.sleep({} / 1000)", args)
                    }
                });
            }
            if callee.name == sym::CHANNEL {
                self.add_import("import asyncio");
                let args = self.emit_expr_list(&call.args)?;
                return Ok(format!("asyncio.Queue({})", args));
            }
        }

        let callee = self.emit_expr(&call.callee)?;
        let args = self.emit_expr_list(&call.args)?;
        Ok(format!("{}({})", callee, args))
    }

    fn emit_type_apply(&mut self, apply: &TypeApplyExpr) -> CompileResult<String> {
        if apply.base.name == sym::CHANNEL {
            self.add_import("import asyncio");
            return Ok(match &apply.args {
                Some(args) => {
                    let args = self.emit_expr_list(args)?;
                    format!("asyncio.Queue({})", args)
                }
                None => "asyncio.Queue".to_string(),
            });
        }

        let type_args: Vec<String> = apply.type_args.iter().map(|t| self.map_type(t)).collect();
        let base = apply.base.name.to_string();
        Ok(match &apply.args {
            Some(args) => {
                let args = self.emit_expr_list(args)?;
                format!("{}[{}]({})", base, type_args.join(", "), args)
            }
            None => format!("{}[{}]", base, type_args.join(", ")),
        })
    }

    /// Channel send/receive heuristic: the variable was created by
    /// `Channel(...)`, or its name looks channel-like.
    fn is_channel_shaped(&self, object: &Expr) -> bool {
        let Expr::Ident(ident) = object else {
            return false;
        };
        if self.channel_vars.contains(&ident.name) {
            return true;
        }
        let name = ident.name.as_str().to_ascii_lowercase();
        name.contains("channel")
            || name.contains("buffer")
            || name.contains("queue")
            || matches!(name.as_str(), "ch" | "c" | "chan" | "tasks" | "q")
    }

    fn emit_lambda(&mut self, lambda: &LambdaExpr) -> CompileResult<String> {
        let mut params = Vec::new();
        for param in &lambda.params {
            let mut rendered = param.name.to_string();
            if let Some(default) = &param.default {
                rendered.push_str(&format!("={}", self.emit_expr(default)?));
            }
            params.push(rendered);
        }
        let params = params.join(", ");

        // Single-expression bodies become inline lambdas
        if lambda.body.len() == 1 {
            match &lambda.body[0] {
                Stmt::Return(ret) => {
                    if let Some(value) = &ret.value {
                        let value = self.emit_expr(value)?;
                        return Ok(format!("(lambda {}: {})", params, value));
                    }
                }
                Stmt::Expr(stmt) if !matches!(stmt.expr, Expr::Assign(_)) => {
                    let value = self.emit_expr(&stmt.expr)?;
                    return Ok(format!("(lambda {}: {})", params, value));
                }
                _ => {}
            }
        }

        // Anything larger gets a named nested function
        let name = self.unique_name("lambda");
        self.push(format!("def {}({}):", name, params));
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(false);
        let result = self.emit_suite(&lambda.body);
        self.async_stack.pop();
        self.in_function = was_in_function;
        result?;
        Ok(name)
    }

    fn emit_await(&mut self, await_expr: &AwaitExpr) -> CompileResult<String> {
        if !self.in_async() {
            return Err(CompileError::validation(
                "'await' may only appear inside an async function or async block",
                await_expr.span,
            ));
        }
        // `await [a, b]` joins the futures
        if let Expr::Array(array) = await_expr.expr.as_ref() {
            self.add_import("import asyncio");
            let elements = self.emit_expr_list(&array.elements)?;
            return Ok(format!("await asyncio.gather({})", elements));
        }
        let inner = self.emit_expr(&await_expr.expr)?;
        Ok(format!("await {}", inner))
    }

    fn emit_async_block(&mut self, block: &AsyncBlockExpr) -> CompileResult<String> {
        self.add_import("import asyncio");
        let name = self.unique_name("async_block");
        self.push(format!("async def {}():", name));
        self.indent += 1;
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(true);

        let result = (|| {
            match block.body.split_last() {
                None => self.push("pass"),
                Some((last, rest)) => {
                    for stmt in rest {
                        self.emit_stmt(stmt)?;
                    }
                    // The trailing expression is the block's value
                    match last {
                        Stmt::Expr(stmt) if !matches!(stmt.expr, Expr::Assign(_)) => {
                            let value = self.emit_expr(&stmt.expr)?;
                            self.push(format!("return {}", value));
                        }
                        other => self.emit_stmt(other)?,
                    }
                }
            }
            Ok(())
        })();

        self.async_stack.pop();
        self.in_function = was_in_function;
        self.indent -= 1;
        result?;
        Ok(format!("{}()", name))
    }

    fn emit_routine(&mut self, routine: &RoutineExpr) -> CompileResult<String> {
        self.add_import("import asyncio");
        let prefix = match routine.name {
            Some(name) => format!("routine_{}", name),
            None => "routine".to_string(),
        };
        let fn_name = self.unique_name(&prefix);

        let enclosing_in_function = self.in_function;
        let enclosing_async = self.in_async();

        self.push(format!("async def {}():", fn_name));
        self.indent += 1;
        self.in_function = true;
        self.async_stack.push(true);
        let result = (|| {
            if routine.body.is_empty() {
                self.push("pass");
            } else {
                for stmt in &routine.body {
                    self.emit_stmt(stmt)?;
                }
            }
            Ok(())
        })();
        self.async_stack.pop();
        self.in_function = enclosing_in_function;
        self.indent -= 1;
        result?;

        if !enclosing_in_function {
            // Collected and gathered at program entry
            self.top_level_routines.push(fn_name);
            Ok(String::new())
        } else if enclosing_async {
            Ok(format!("await {}()", fn_name))
        } else {
            Ok(format!("asyncio.create_task({}())", fn_name))
        }
    }

    fn emit_parallel(&mut self, parallel: &ParallelExpr) -> CompileResult<String> {
        self.add_import("import asyncio");
        let mut calls = Vec::new();
        for task in &parallel.tasks {
            match task {
                Expr::Lambda(lambda) => {
                    let name = self.emit_async_task(lambda)?;
                    calls.push(format!("{}()", name));
                }
                other => calls.push(self.emit_expr(other)?),
            }
        }

        let wrapper = self.unique_name("parallel");
        self.push(format!("async def {}():", wrapper));
        self.indent += 1;
        self.push(format!("return await asyncio.gather({})", calls.join(", ")));
        self.indent -= 1;

        Ok(if self.in_async() {
            format!("await {}()", wrapper)
        } else {
            format!("asyncio.run({}())", wrapper)
        })
    }

    /// A parallel thunk: an async function wrapping the lambda body.
    fn emit_async_task(&mut self, lambda: &LambdaExpr) -> CompileResult<String> {
        let name = self.unique_name("task");
        let params: Vec<String> = lambda.params.iter().map(|p| p.name.to_string()).collect();
        self.push(format!("async def {}({}):", name, params.join(", ")));
        self.indent += 1;
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(true);

        let result = (|| {
            match lambda.body.split_last() {
                None => self.push("pass"),
                Some((last, rest)) => {
                    for stmt in rest {
                        self.emit_stmt(stmt)?;
                    }
                    match last {
                        Stmt::Expr(stmt) if !matches!(stmt.expr, Expr::Assign(_)) => {
                            let value = self.emit_expr(&stmt.expr)?;
                            self.push(format!("return {}", value));
                        }
                        other => self.emit_stmt(other)?,
                    }
                }
            }
            Ok(())
        })();

        self.async_stack.pop();
        self.in_function = was_in_function;
        self.indent -= 1;
        result?;
        Ok(name)
    }

    /// A match in expression position is lifted into an immediately
    /// called nested function so the arm values flow out.
    fn emit_match_expression(&mut self, node: &MatchNode) -> CompileResult<String> {
        let name = self.unique_name("match_fn");
        let is_async = self.in_async();
        let async_str = if is_async { "async " } else { "" };
        self.push(format!("{}def {}():", async_str, name));
        self.indent += 1;
        let was_in_function = self.in_function;
        self.in_function = true;
        self.async_stack.push(is_async);
        let result = self.emit_match(node, MatchMode::Expression);
        self.async_stack.pop();
        self.in_function = was_in_function;
        self.indent -= 1;
        result?;
        Ok(if is_async {
            format!("await {}()", name)
        } else {
            format!("{}()", name)
        })
    }

    fn emit_is(&mut self, is_expr: &IsExpr) -> CompileResult<String> {
        let value = self.emit_expr(&is_expr.expr)?;
        let TypeExpr::Name(name) = &is_expr.ty else {
            return Err(CompileError::validation(
                "'is' requires a simple type name",
                is_expr.span,
            ));
        };
        let target = match name.name().as_str() {
            "number" => "(int, float)".to_string(),
            "string" => "str".to_string(),
            "boolean" => "bool".to_string(),
            "void" => "type(None)".to_string(),
            other => other.to_string(),
        };
        Ok(format!("isinstance({}, {})", value, target))
    }

    // ========================================================================
    // Match lowering
    // ========================================================================

    fn emit_match(&mut self, node: &MatchNode, mode: MatchMode) -> CompileResult<()> {
        let scrutinee = self.emit_expr(&node.scrutinee)?;
        let tmp = self.unique_name("match");
        self.push(format!("{} = {}", tmp, scrutinee));

        if node.arms.is_empty() {
            self.push(format!(
                "raise RuntimeError(f\"non-exhaustive match: {{{}!r}}\")",
                tmp
            ));
            return Ok(());
        }

        let has_guards = node.arms.iter().any(|arm| arm.guard.is_some());
        if has_guards {
            self.emit_match_flag_ladder(node, &tmp, mode)
        } else {
            self.emit_match_if_ladder(node, &tmp, mode)
        }
    }

    /// Guard-free lowering: a plain if/elif ladder, textual order, with
    /// a non-exhaustive raise in the trailing else.
    fn emit_match_if_ladder(
        &mut self,
        node: &MatchNode,
        tmp: &str,
        mode: MatchMode,
    ) -> CompileResult<()> {
        for (index, arm) in node.arms.iter().enumerate() {
            let keyword = if index == 0 { "if" } else { "elif" };
            let condition = self.pattern_condition(tmp, &arm.pattern)?;
            self.push(format!("{} {}:", keyword, condition));
            self.indent += 1;
            let before = self.lines.len();
            self.emit_pattern_bindings(tmp, &arm.pattern);
            self.emit_arm_body(arm, mode)?;
            if self.lines.len() == before {
                self.push("pass");
            }
            self.indent -= 1;
        }
        self.push("else:");
        self.indent += 1;
        self.push(format!(
            "raise RuntimeError(f\"non-exhaustive match: {{{}!r}}\")",
            tmp
        ));
        self.indent -= 1;
        Ok(())
    }

    /// Guarded lowering: a matched flag lets a failed guard fall through
    /// to later arms in textual order.
    fn emit_match_flag_ladder(
        &mut self,
        node: &MatchNode,
        tmp: &str,
        mode: MatchMode,
    ) -> CompileResult<()> {
        let matched = self.unique_name("matched");
        self.push(format!("{} = False", matched));
        for arm in &node.arms {
            let condition = self.pattern_condition(tmp, &arm.pattern)?;
            self.push(format!("if not {} and {}:", matched, condition));
            self.indent += 1;
            self.emit_pattern_bindings(tmp, &arm.pattern);
            match &arm.guard {
                Some(guard) => {
                    let guard = self.emit_expr(guard)?;
                    self.push(format!("if {}:", guard));
                    self.indent += 1;
                    self.push(format!("{} = True", matched));
                    let before = self.lines.len();
                    self.emit_arm_body(arm, mode)?;
                    if self.lines.len() == before {
                        self.push("pass");
                    }
                    self.indent -= 1;
                }
                None => {
                    self.push(format!("{} = True", matched));
                    self.emit_arm_body(arm, mode)?;
                }
            }
            self.indent -= 1;
        }
        self.push(format!("if not {}:", matched));
        self.indent += 1;
        self.push(format!(
            "raise RuntimeError(f\"non-exhaustive match: {{{}!r}}\")",
            tmp
        ));
        self.indent -= 1;
        Ok(())
    }

    fn emit_arm_body(&mut self, arm: &MatchArm, mode: MatchMode) -> CompileResult<()> {
        match &arm.body {
            MatchArmBody::Expr(expr) => {
                let value = self.emit_expr(expr)?;
                self.push(format!("return {}", value));
                Ok(())
            }
            MatchArmBody::Block(block) => match mode {
                MatchMode::Statement => {
                    for stmt in block {
                        self.emit_stmt(stmt)?;
                    }
                    Ok(())
                }
                MatchMode::Expression => {
                    match block.split_last() {
                        None => {}
                        Some((last, rest)) => {
                            for stmt in rest {
                                self.emit_stmt(stmt)?;
                            }
                            match last {
                                Stmt::Expr(stmt) if !matches!(stmt.expr, Expr::Assign(_)) => {
                                    let value = self.emit_expr(&stmt.expr)?;
                                    self.push(format!("return {}", value));
                                }
                                other => self.emit_stmt(other)?,
                            }
                        }
                    }
                    Ok(())
                }
            },
        }
    }

    /// The boolean condition a pattern contributes for the value at
    /// `path`.
    fn pattern_condition(&mut self, path: &str, pattern: &Pattern) -> CompileResult<String> {
        match pattern {
            Pattern::Wildcard(_) | Pattern::Binding(_) => Ok("True".to_string()),
            Pattern::Number(n) => Ok(format!("{} == {}", path, n.value)),
            Pattern::Str(s) => Ok(format!("{} == {}", path, interp::py_str(s.value.as_str()))),
            Pattern::Tagged(tagged) if !tagged.payload => Ok(match tagged.enum_name {
                // Payload-less variants are tag constants
                Some(enum_name) => format!("{} == {}.{}", path, enum_name, tagged.variant),
                None => format!("{} == \"{}\"", path, tagged.variant),
            }),
            Pattern::Tagged(tagged) => {
                let mut condition = format!(
                    "isinstance({p}, dict) and {p}.get(\"type\") == \"{v}\"",
                    p = path,
                    v = tagged.variant
                );
                for field in &tagged.fields {
                    if let Some(sub) = &field.pattern {
                        if matches!(sub, Pattern::Wildcard(_) | Pattern::Binding(_)) {
                            continue;
                        }
                        let sub_path = format!("{}[\"{}\"]", path, field.name);
                        let sub_condition = self.pattern_condition(&sub_path, sub)?;
                        condition.push_str(&format!(" and {}", sub_condition));
                    }
                }
                Ok(condition)
            }
        }
    }

    /// Variable bindings a matched pattern introduces.
    fn emit_pattern_bindings(&mut self, path: &str, pattern: &Pattern) {
        match pattern {
            Pattern::Binding(ident) => {
                self.push(format!("{} = {}", ident.name, path));
            }
            Pattern::Tagged(tagged) if tagged.payload => {
                for field in &tagged.fields {
                    let sub_path = format!("{}[\"{}\"]", path, field.name);
                    match &field.pattern {
                        None => self.push(format!("{} = {}", field.name, sub_path)),
                        Some(sub) => self.emit_pattern_bindings(&sub_path, sub),
                    }
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Type mapping
    // ========================================================================

    /// Lower a type annotation to its Python spelling, registering any
    /// typing imports it needs.
    fn map_type(&mut self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Name(name) => {
                let base = name
                    .segments
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                if name.segments.len() == 1 && name.name() == sym::CHANNEL {
                    self.add_import("import asyncio");
                    return "asyncio.Queue".to_string();
                }
                let mapped = if name.segments.len() == 1 {
                    match base.as_str() {
                        "number" => "float".to_string(),
                        "string" => "str".to_string(),
                        "boolean" => "bool".to_string(),
                        "void" => "None".to_string(),
                        _ => base,
                    }
                } else {
                    base
                };
                if name.args.is_empty() {
                    return mapped;
                }
                if matches!(mapped.as_str(), "List" | "Optional" | "Dict") {
                    self.add_import(&format!("from typing import {}", mapped));
                }
                let args: Vec<String> = name.args.iter().map(|a| self.map_type(a)).collect();
                format!("{}[{}]", mapped, args.join(", "))
            }
            TypeExpr::Array(array) => {
                self.add_import("from typing import List");
                format!("List[{}]", self.map_type(&array.element))
            }
            TypeExpr::Optional(optional) => {
                self.add_import("from typing import Optional");
                format!("Optional[{}]", self.map_type(&optional.base))
            }
            TypeExpr::Union(union) => {
                self.add_import("from typing import Union");
                format!(
                    "Union[{}, {}]",
                    self.map_type(&union.left),
                    self.map_type(&union.right)
                )
            }
            TypeExpr::Intersection(_) => {
                self.add_import("from typing import Any");
                "Any".to_string()
            }
            TypeExpr::Tuple(tuple) => {
                self.add_import("from typing import Tuple");
                let elements: Vec<String> =
                    tuple.elements.iter().map(|e| self.map_type(e)).collect();
                format!("Tuple[{}]", elements.join(", "))
            }
            TypeExpr::Function(function) => {
                self.add_import("from typing import Callable");
                let params: Vec<String> =
                    function.params.iter().map(|p| self.map_type(p)).collect();
                format!(
                    "Callable[[{}], {}]",
                    params.join(", "),
                    self.map_type(&function.ret)
                )
            }
        }
    }

    // ========================================================================
    // Entry point
    // ========================================================================

    /// Emit the `if __name__ == "__main__":` block for tests, main, and
    /// top-level routines.
    fn emit_entry(&mut self, program: &Program) {
        if self.embedded {
            return;
        }

        let main_fn = program.statements.iter().find_map(|stmt| match stmt {
            Stmt::Function(f) if f.name == sym::MAIN => Some(f),
            _ => None,
        });
        let has_tests = !self.test_functions.is_empty();
        let has_routines = !self.top_level_routines.is_empty();
        if main_fn.is_none() && !has_tests && !has_routines {
            return;
        }

        self.push("");
        self.push("if __name__ == \"__main__\":");
        self.indent += 1;

        if has_tests {
            self.add_import("import sys");
            self.push("# Run tests");
            self.push("_failures = 0");
            let tests = self.test_functions.clone();
            for (fn_name, description) in &tests {
                self.push("try:");
                self.indent += 1;
                self.push(format!("{}()", fn_name));
                self.push(format!(
                    "print({})",
                    interp::py_str(&format!("✓ Test passed: {}", description))
                ));
                self.indent -= 1;
                self.push("except AssertionError as e:");
                self.indent += 1;
                self.push(format!(
                    "print({})",
                    interp::py_str(&format!("✗ Test failed: {}", description))
                ));
                self.push("print(f\"  Assertion error: {e}\")");
                self.push("_failures += 1");
                self.indent -= 1;
                self.push("except Exception as e:");
                self.indent += 1;
                self.push(format!(
                    "print({})",
                    interp::py_str(&format!("✗ Test error: {}", description))
                ));
                self.push("print(f\"  Error: {e}\")");
                self.push("_failures += 1");
                self.indent -= 1;
            }
            self.push("if _failures:");
            self.indent += 1;
            self.push("sys.exit(1)");
            self.indent -= 1;
        }

        let routine_calls: Vec<String> = self
            .top_level_routines
            .iter()
            .map(|name| format!("{}()", name))
            .collect();

        match main_fn {
            Some(main) => {
                let main_async = main.is_async
                    || self.scan.functions_with_routines.contains(&sym::MAIN);
                if has_tests {
                    self.push("# Run main");
                }
                if has_routines {
                    self.add_import("import asyncio");
                    self.push("# Run main and top-level routines concurrently");
                    self.push("async def _run_all():");
                    self.indent += 1;
                    if main_async {
                        let mut calls = routine_calls.clone();
                        calls.push("main()".to_string());
                        self.push(format!("await asyncio.gather({})", calls.join(", ")));
                    } else {
                        // Sync main runs after the routines finish
                        self.push(format!(
                            "await asyncio.gather({})",
                            routine_calls.join(", ")
                        ));
                        self.push("main()");
                    }
                    self.indent -= 1;
                    self.push("asyncio.run(_run_all())");
                } else if main_async {
                    self.add_import("import asyncio");
                    self.push("asyncio.run(main())");
                } else {
                    self.push("main()");
                }
            }
            None if has_routines => {
                self.add_import("import asyncio");
                self.push("# Run top-level routines");
                self.push("async def _run_routines():");
                self.indent += 1;
                self.push(format!("await asyncio.gather({})", routine_calls.join(", ")));
                self.indent -= 1;
                self.push("asyncio.run(_run_routines())");
            }
            None => {}
        }

        self.indent -= 1;
    }
}

/// True when the initializer creates a channel.
fn creates_channel(expr: &Expr) -> bool {
    match expr {
        Expr::TypeApply(apply) => apply.base.name == sym::CHANNEL,
        Expr::Call(call) => {
            matches!(call.callee.as_ref(), Expr::Ident(i) if i.name == sym::CHANNEL)
        }
        _ => false,
    }
}
