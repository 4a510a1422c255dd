//! Type annotation parsing.
//!
//! Grammar:
//!
//! ```text
//! type        = postfix { ("|" | "&") postfix } ;
//! postfix     = primary { "[" "]" | "?" } ;
//! primary     = name [ "<" type { "," type } ">" ]
//!             | "(" [ type { "," type } ] ")" [ "->" type ] ;
//! name        = ident { "." ident } ;
//! ```
//!
//! Unions and intersections associate left. A parenthesized list becomes
//! a function type when `->` follows, a tuple when it holds several
//! elements, and plain grouping otherwise.

use sailc_lex::TokenKind;
use sailc_util::CompileResult;

use crate::ast::*;
use crate::Parser;

impl Parser {
    /// Parse a full type expression.
    pub(crate) fn parse_type(&mut self) -> CompileResult<TypeExpr> {
        let mut left = self.parse_type_postfix()?;
        loop {
            if self.eat(TokenKind::Pipe) {
                let right = self.parse_type_postfix()?;
                let span = left.span().merge(right.span());
                left = TypeExpr::Union(UnionType {
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                });
            } else if self.eat(TokenKind::Amp) {
                let right = self.parse_type_postfix()?;
                let span = left.span().merge(right.span());
                left = TypeExpr::Intersection(IntersectionType {
                    left: Box::new(left),
                    right: Box::new(right),
                    span,
                });
            } else {
                return Ok(left);
            }
        }
    }

    /// Array (`T[]`) and optional (`T?`) suffixes.
    fn parse_type_postfix(&mut self) -> CompileResult<TypeExpr> {
        let mut ty = self.parse_type_primary()?;
        loop {
            if self.at(TokenKind::LBracket) && self.peek_ahead(1).kind == TokenKind::RBracket {
                self.advance();
                self.advance();
                let span = ty.span().merge(self.prev_span());
                ty = TypeExpr::Array(ArrayType {
                    element: Box::new(ty),
                    span,
                });
            } else if self.at(TokenKind::Question) {
                self.advance();
                let span = ty.span().merge(self.prev_span());
                ty = TypeExpr::Optional(OptionalType {
                    base: Box::new(ty),
                    span,
                });
            } else {
                return Ok(ty);
            }
        }
    }

    /// Named types and parenthesized forms.
    fn parse_type_primary(&mut self) -> CompileResult<TypeExpr> {
        match self.peek_kind() {
            TokenKind::Identifier => {
                let (first, first_span) = self.expect_identifier()?;
                let mut segments = vec![first];
                let mut span = first_span;
                while self.at(TokenKind::Dot) && self.peek_ahead(1).kind == TokenKind::Identifier {
                    self.advance();
                    let (segment, segment_span) = self.expect_identifier()?;
                    segments.push(segment);
                    span = span.merge(segment_span);
                }

                let mut args = Vec::new();
                if self.eat(TokenKind::Lt) {
                    loop {
                        args.push(self.parse_type()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::Gt)?;
                    span = span.merge(self.prev_span());
                }

                Ok(TypeExpr::Name(TypeName {
                    segments,
                    args,
                    span,
                }))
            }
            TokenKind::LParen => {
                let start = self.advance().span;
                let mut elements = Vec::new();
                while !self.at(TokenKind::RParen) {
                    elements.push(self.parse_type()?);
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;

                if self.eat(TokenKind::Arrow) {
                    let ret = self.parse_type()?;
                    let span = start.merge(ret.span());
                    return Ok(TypeExpr::Function(FunctionType {
                        params: elements,
                        ret: Box::new(ret),
                        span,
                    }));
                }

                if elements.len() == 1 {
                    // Plain grouping
                    return Ok(elements.remove(0));
                }

                let span = start.merge(self.prev_span());
                Ok(TypeExpr::Tuple(TupleType { elements, span }))
            }
            _ => Err(self.error_expected(&[TokenKind::Identifier, TokenKind::LParen])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    /// Parse the type annotation of `let x: <source> = 0;`.
    fn parse_type_source(source: &str) -> TypeExpr {
        let program = parse_ok(&format!("let x: {source} = 0;"));
        let Stmt::Let(decl) = program.statements.into_iter().next().unwrap() else {
            panic!("expected let");
        };
        decl.ty.expect("type annotation")
    }

    #[test]
    fn test_simple_type() {
        let ty = parse_type_source("number");
        let TypeExpr::Name(name) = ty else {
            panic!("expected name");
        };
        assert_eq!(name.name().as_str(), "number");
        assert!(name.args.is_empty());
    }

    #[test]
    fn test_qualified_name() {
        let ty = parse_type_source("sailfin.io.File");
        let TypeExpr::Name(name) = ty else {
            panic!("expected name");
        };
        assert_eq!(name.segments.len(), 3);
    }

    #[test]
    fn test_generic_arguments() {
        let ty = parse_type_source("Dict<string, List<number>>");
        let TypeExpr::Name(name) = ty else {
            panic!("expected name");
        };
        assert_eq!(name.args.len(), 2);
        assert!(matches!(
            &name.args[1],
            TypeExpr::Name(inner) if inner.args.len() == 1
        ));
    }

    #[test]
    fn test_array_and_optional_suffixes() {
        let ty = parse_type_source("number[]");
        assert!(matches!(ty, TypeExpr::Array(_)));

        let ty = parse_type_source("string?");
        assert!(matches!(ty, TypeExpr::Optional(_)));

        // Suffix order: `T[]?` is an optional array
        let ty = parse_type_source("number[]?");
        let TypeExpr::Optional(optional) = ty else {
            panic!("expected optional");
        };
        assert!(matches!(*optional.base, TypeExpr::Array(_)));
    }

    #[test]
    fn test_union_and_intersection() {
        let ty = parse_type_source("number | string");
        assert!(matches!(ty, TypeExpr::Union(_)));

        let ty = parse_type_source("Reader & Writer");
        assert!(matches!(ty, TypeExpr::Intersection(_)));

        // Left associative: (a | b) | c
        let ty = parse_type_source("a | b | c");
        let TypeExpr::Union(outer) = ty else {
            panic!("expected union");
        };
        assert!(matches!(*outer.left, TypeExpr::Union(_)));
    }

    #[test]
    fn test_tuple_type() {
        let ty = parse_type_source("(number, string)");
        let TypeExpr::Tuple(tuple) = ty else {
            panic!("expected tuple");
        };
        assert_eq!(tuple.elements.len(), 2);
    }

    #[test]
    fn test_function_type() {
        let ty = parse_type_source("(number, number) -> boolean");
        let TypeExpr::Function(func) = ty else {
            panic!("expected function type");
        };
        assert_eq!(func.params.len(), 2);
        assert!(matches!(*func.ret, TypeExpr::Name(_)));
    }

    #[test]
    fn test_grouping() {
        let ty = parse_type_source("(number | string)[]");
        let TypeExpr::Array(array) = ty else {
            panic!("expected array");
        };
        assert!(matches!(*array.element, TypeExpr::Union(_)));
    }
}
