//! Pass 1: a read-only scan computing the side tables the emitter needs.
//!
//! The AST itself is never annotated or mutated; everything pass 2 wants
//! to know up front lives here:
//!
//! - which named functions contain a routine (transitively through
//!   nested blocks, stopping at nested function/lambda boundaries) and
//!   therefore get promoted to async;
//! - the names declared at module scope, for `global` tracking;
//! - every generic type parameter in the program, for the runtime
//!   TypeVar declarations.

use rustc_hash::FxHashSet;
use sailc_par::ast::*;
use sailc_util::Symbol;
use std::collections::BTreeSet;

/// Side tables computed before emission.
#[derive(Debug, Default)]
pub struct ProgramScan {
    /// Named functions whose body contains a routine node.
    pub functions_with_routines: FxHashSet<Symbol>,

    /// Names declared at module scope (`let`/`const`).
    pub global_variables: FxHashSet<Symbol>,

    /// Type parameters seen anywhere, sorted for deterministic output.
    pub type_vars: BTreeSet<String>,

    /// True when a routine appears outside any function.
    pub has_top_level_routines: bool,
}

impl ProgramScan {
    /// Analyze a program.
    pub fn analyze(program: &Program) -> Self {
        let mut scan = ProgramScan::default();
        for stmt in &program.statements {
            scan.scan_top_level(stmt);
        }
        scan
    }

    fn scan_top_level(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let(decl) => {
                self.global_variables.insert(decl.name);
                if let Some(init) = &decl.init {
                    self.scan_expr_outside(init);
                }
            }
            Stmt::Const(decl) => {
                self.global_variables.insert(decl.name);
                self.scan_expr_outside(&decl.value);
            }
            Stmt::Routine(_) => self.has_top_level_routines = true,
            Stmt::Function(decl) => self.scan_function(decl),
            Stmt::Struct(decl) => {
                for param in &decl.type_params {
                    self.type_vars.insert(param.to_string());
                }
                for member in &decl.members {
                    if let StructMember::Method(method) = member {
                        self.scan_function(method);
                    }
                }
            }
            Stmt::Interface(decl) => {
                for param in &decl.type_params {
                    self.type_vars.insert(param.to_string());
                }
            }
            _ => {}
        }
    }

    /// Scan a named function: record its type parameters, and mark it
    /// when its body holds a routine.
    fn scan_function(&mut self, decl: &FunctionDecl) {
        for param in &decl.type_params {
            self.type_vars.insert(param.to_string());
        }
        if block_contains_routine(&decl.body) {
            self.functions_with_routines.insert(decl.name);
        }
        // Nested function declarations are attributed independently
        for stmt in &decl.body {
            self.scan_nested(stmt);
        }
    }

    fn scan_nested(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(decl) => self.scan_function(decl),
            Stmt::If(if_stmt) => {
                for s in &if_stmt.then_branch {
                    self.scan_nested(s);
                }
                if let Some(else_branch) = &if_stmt.else_branch {
                    for s in else_branch {
                        self.scan_nested(s);
                    }
                }
            }
            Stmt::While(w) => {
                for s in &w.body {
                    self.scan_nested(s);
                }
            }
            Stmt::For(f) => {
                for s in &f.body {
                    self.scan_nested(s);
                }
            }
            Stmt::Loop(l) => {
                for s in &l.body {
                    self.scan_nested(s);
                }
            }
            Stmt::Try(t) => {
                for s in &t.body {
                    self.scan_nested(s);
                }
                for catch in &t.catches {
                    for s in &catch.body {
                        self.scan_nested(s);
                    }
                }
                if let Some(finally) = &t.finally {
                    for s in finally {
                        self.scan_nested(s);
                    }
                }
            }
            _ => {}
        }
    }

    /// Routines in module-scope initializer expressions count as top
    /// level.
    fn scan_expr_outside(&mut self, expr: &Expr) {
        if matches!(expr, Expr::Routine(_)) {
            self.has_top_level_routines = true;
        }
    }
}

/// True when the statements contain a routine, looking through control
/// flow but not into nested functions or lambdas.
fn block_contains_routine(statements: &[Stmt]) -> bool {
    statements.iter().any(stmt_contains_routine)
}

fn stmt_contains_routine(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Routine(_) => true,
        Stmt::If(if_stmt) => {
            block_contains_routine(&if_stmt.then_branch)
                || if_stmt
                    .else_branch
                    .as_deref()
                    .is_some_and(block_contains_routine)
        }
        Stmt::While(w) => block_contains_routine(&w.body),
        Stmt::For(f) => block_contains_routine(&f.body),
        Stmt::Loop(l) => block_contains_routine(&l.body),
        Stmt::Match(node) => node.arms.iter().any(|arm| match &arm.body {
            MatchArmBody::Block(block) => block_contains_routine(block),
            MatchArmBody::Expr(expr) => expr_contains_routine(expr),
        }),
        Stmt::Try(t) => {
            block_contains_routine(&t.body)
                || t.catches.iter().any(|c| block_contains_routine(&c.body))
                || t.finally.as_deref().is_some_and(block_contains_routine)
        }
        Stmt::Expr(stmt) => expr_contains_routine(&stmt.expr),
        Stmt::Let(decl) => decl.init.as_ref().is_some_and(expr_contains_routine),
        Stmt::Const(decl) => expr_contains_routine(&decl.value),
        Stmt::Return(ret) => ret.value.as_ref().is_some_and(expr_contains_routine),
        Stmt::Throw(t) => expr_contains_routine(&t.value),
        // Nested functions own their routines
        Stmt::Function(_) => false,
        _ => false,
    }
}

fn expr_contains_routine(expr: &Expr) -> bool {
    match expr {
        Expr::Routine(_) => true,
        Expr::Await(a) => expr_contains_routine(&a.expr),
        Expr::Assign(a) => expr_contains_routine(&a.value),
        Expr::Call(c) => c.args.iter().any(expr_contains_routine),
        // Lambda and async-block bodies are their own boundary
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> ProgramScan {
        let tokens = sailc_lex::Lexer::tokenize(source).expect("lexes");
        let program = sailc_par::parse(tokens).expect("parses");
        ProgramScan::analyze(&program)
    }

    #[test]
    fn test_function_with_routine_detected() {
        let scan = scan(
            "fn worker() -> void { routine { sleep(1); } }\n\
             fn quiet() -> void { }",
        );
        assert!(scan
            .functions_with_routines
            .contains(&Symbol::intern("worker")));
        assert!(!scan
            .functions_with_routines
            .contains(&Symbol::intern("quiet")));
    }

    #[test]
    fn test_routine_through_control_flow() {
        let scan = scan("fn f(x: number) -> void { if x > 0 { while x < 9 { routine { go(); } } } }");
        assert!(scan.functions_with_routines.contains(&Symbol::intern("f")));
    }

    #[test]
    fn test_lambda_is_a_boundary() {
        let scan = scan("fn f() -> void { let t = (x: number) -> void { routine { go(); } }; }");
        assert!(!scan.functions_with_routines.contains(&Symbol::intern("f")));
    }

    #[test]
    fn test_nested_function_attribution() {
        let scan = scan("fn outer() -> void { fn inner() -> void { routine { go(); } } }");
        assert!(scan
            .functions_with_routines
            .contains(&Symbol::intern("inner")));
        assert!(!scan
            .functions_with_routines
            .contains(&Symbol::intern("outer")));
    }

    #[test]
    fn test_top_level_routines() {
        let scan = scan("routine pump { ch.send(1); }");
        assert!(scan.has_top_level_routines);
    }

    #[test]
    fn test_globals_collected() {
        let scan = scan("let counter = 0; const LIMIT = 10; fn f() -> void { let local = 1; }");
        assert!(scan.global_variables.contains(&Symbol::intern("counter")));
        assert!(scan.global_variables.contains(&Symbol::intern("LIMIT")));
        assert!(!scan.global_variables.contains(&Symbol::intern("local")));
    }

    #[test]
    fn test_type_vars_sorted() {
        let scan = scan("struct Pair<B, A> { a: A; b: B; } fn id<T>(x -> T) -> T { return x; }");
        let vars: Vec<_> = scan.type_vars.iter().cloned().collect();
        assert_eq!(vars, vec!["A", "B", "T"]);
    }

    #[test]
    fn test_method_routines_mark_method_name() {
        let scan = scan("struct S { fn run(self) -> void { routine { go(); } } }");
        assert!(scan.functions_with_routines.contains(&Symbol::intern("run")));
    }
}
