//! Edge case tests for sailc-par

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::test_helpers::*;

    // ==================== EDGE CASES ====================

    #[test]
    fn test_edge_deeply_nested_expression() {
        let expr = parse_expr("((((((1))))))");
        assert!(matches!(expr, Expr::Number(_)));
    }

    #[test]
    fn test_edge_deeply_nested_calls() {
        let expr = parse_expr("f(g(h(i(j(1)))))");
        assert!(matches!(expr, Expr::Call(_)));
    }

    #[test]
    fn test_edge_long_member_chain() {
        let expr = parse_expr("a.b.c.d.e.f");
        let mut depth = 0;
        let mut current = &expr;
        while let Expr::Member(member) = current {
            depth += 1;
            current = &member.object;
        }
        assert_eq!(depth, 5);
    }

    #[test]
    fn test_edge_trailing_commas_everywhere() {
        parse_ok("fn f() -> void { let a = [1, 2, 3,]; let b = f(1, 2,); }");
        parse_ok("enum E { A, B, }");
        parse_ok("fn g(x: number) -> void { match x { 1 => one(), _ => other(), } }");
    }

    #[test]
    fn test_edge_empty_collections() {
        let expr = parse_expr("[]");
        assert!(matches!(expr, Expr::Array(ref a) if a.elements.is_empty()));

        let expr = parse_expr("{}");
        assert!(matches!(expr, Expr::Dict(ref d) if d.entries.is_empty()));
    }

    #[test]
    fn test_edge_empty_struct_literal() {
        let expr = parse_expr("Unit {}");
        assert!(matches!(expr, Expr::StructLit(ref s) if s.fields.is_empty()));
    }

    #[test]
    fn test_edge_empty_function_body() {
        let program = parse_ok("fn nothing() -> void { }");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        assert!(func.body.is_empty());
    }

    #[test]
    fn test_edge_return_without_type_annotation() {
        parse_ok("fn f() { return; }");
    }

    #[test]
    fn test_edge_unary_stacking() {
        let expr = parse_expr("--1");
        let Expr::Unary(outer) = expr else {
            panic!("expected unary");
        };
        assert!(matches!(*outer.operand, Expr::Unary(_)));

        let expr = parse_expr("!!flag");
        assert!(matches!(expr, Expr::Unary(_)));
    }

    #[test]
    fn test_edge_await_binds_tighter_than_binary() {
        let expr = parse_expr("await a() + 1");
        let Expr::Binary(binary) = expr else {
            panic!("expected binary");
        };
        assert!(matches!(*binary.left, Expr::Await(_)));
    }

    #[test]
    fn test_edge_generic_tryparse_does_not_leak_state() {
        // The failed generic try-parse must rewind completely
        let expr = parse_expr("a < b + 1 && c > d");
        assert!(matches!(expr, Expr::Binary(ref e) if e.op == BinOp::And));
    }

    #[test]
    fn test_edge_generic_with_array_type_argument() {
        let expr = parse_expr("first<number[]>(items)");
        let Expr::TypeApply(apply) = expr else {
            panic!("expected type application");
        };
        assert!(matches!(apply.type_args[0], TypeExpr::Array(_)));
    }

    #[test]
    fn test_edge_comparison_against_call() {
        // `a < b(c)` must stay a comparison: `b` parses as a type but the
        // closing `>` never arrives
        let expr = parse_expr("a < b(c)");
        assert!(matches!(expr, Expr::Binary(ref e) if e.op == BinOp::Lt));
    }

    #[test]
    fn test_edge_call_args_with_comparisons() {
        let expr = parse_expr("f(a < b, c > d)");
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.args[0], Expr::Binary(ref e) if e.op == BinOp::Lt));
        assert!(matches!(call.args[1], Expr::Binary(ref e) if e.op == BinOp::Gt));
    }

    #[test]
    fn test_edge_struct_literal_in_argument() {
        let expr = parse_expr("area(Shape.Circle { radius: 5 })");
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        assert!(matches!(call.args[0], Expr::EnumVariant(_)));
    }

    #[test]
    fn test_edge_nested_struct_literals() {
        let expr = parse_expr("Line { from: Point { x: 0, y: 0 }, to: Point { x: 1, y: 1 } }");
        let Expr::StructLit(lit) = expr else {
            panic!("expected struct literal");
        };
        assert!(matches!(lit.fields[0].value, Expr::StructLit(_)));
    }

    #[test]
    fn test_edge_match_scrutinee_with_member_call() {
        parse_ok("fn f(s: Shape) -> void { match s.kind() { _ => done(), } }");
    }

    #[test]
    fn test_edge_match_arm_dict_body() {
        let program = parse_ok("fn f(x: number) -> void { match x { _ => { key: 1 }, } }");
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        let Stmt::Match(node) = &func.body[0] else {
            panic!("expected match");
        };
        assert!(matches!(
            node.arms[0].body,
            MatchArmBody::Expr(Expr::Dict(_))
        ));
    }

    #[test]
    fn test_edge_else_if_chain_depth() {
        let program = parse_ok(
            "fn f(x: number) -> void {\n\
             if x == 1 { a(); } else if x == 2 { b(); } else if x == 3 { c(); } else { d(); }\n\
             }",
        );
        let Stmt::Function(func) = &program.statements[0] else {
            panic!("expected function");
        };
        let mut depth = 0;
        let mut current = &func.body[0];
        loop {
            let Stmt::If(if_stmt) = current else { break };
            depth += 1;
            match if_stmt.else_branch.as_deref() {
                Some([next @ Stmt::If(_)]) => current = next,
                _ => break,
            }
        }
        assert_eq!(depth, 3);
    }

    #[test]
    fn test_edge_range_of_calls() {
        let expr = parse_expr("start()..stop()");
        let Expr::Range(range) = expr else {
            panic!("expected range");
        };
        assert!(matches!(*range.start, Expr::Call(_)));
        assert!(matches!(*range.end, Expr::Call(_)));
    }

    #[test]
    fn test_edge_unterminated_constructs_error() {
        assert!(parse_source("fn f() -> void {").is_err());
        assert!(parse_source("let x = [1, 2;").is_err());
        assert!(parse_source("struct S { x: number;").is_err());
        assert!(parse_source("match x {").is_err());
    }

    #[test]
    fn test_edge_keyword_as_identifier_rejected() {
        assert!(parse_source("let fn = 1;").is_err());
        assert!(parse_source("fn match() -> void { }").is_err());
    }

    #[test]
    fn test_edge_double_semicolon_rejected() {
        // An empty expression statement is not in the grammar
        assert!(parse_source("f();;").is_err());
    }
}
