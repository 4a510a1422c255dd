//! Declaration parsing: imports, type aliases, interfaces, structs,
//! enums, functions, variables, constants, and tests.
//!
//! Type annotations on parameters and fields accept both `name: T` and
//! the older `name -> T` spelling; both forms appear in existing Sailfin
//! sources.

use sailc_lex::TokenKind;
use sailc_util::{CompileResult, Symbol};

use crate::ast::*;
use crate::Parser;

impl Parser {
    /// Consume the `:` or `->` that introduces a type annotation.
    fn eat_annotation_intro(&mut self) -> bool {
        self.eat(TokenKind::Colon) || self.eat(TokenKind::Arrow)
    }

    /// `import { a, b } from "source";`
    pub(crate) fn parse_import(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Import)?.span;
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let (item, _) = self.expect_identifier()?;
            items.push(item);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        self.expect(TokenKind::From)?;
        let source = self.expect(TokenKind::Str)?.text;
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Import(ImportStmt {
            items,
            source,
            span,
        }))
    }

    /// `type Name = T;`
    pub(crate) fn parse_type_alias(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Type)?.span;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::TypeAlias(TypeAliasDecl { name, ty, span }))
    }

    /// `interface Name [<T, ...>] { methods and properties }`
    pub(crate) fn parse_interface(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Interface)?.span;
        let (name, _) = self.expect_identifier()?;
        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Fn) {
                members.push(InterfaceMember::Method(self.parse_interface_method()?));
            } else {
                let (prop_name, prop_span) = self.expect_identifier()?;
                if !self.eat_annotation_intro() {
                    return Err(self.error_expected(&[TokenKind::Colon, TokenKind::Arrow]));
                }
                let ty = self.parse_type()?;
                self.expect(TokenKind::Semicolon)?;
                let span = prop_span.merge(self.prev_span());
                members.push(InterfaceMember::Property(InterfaceProperty {
                    name: prop_name,
                    ty,
                    span,
                }));
            }
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Interface(InterfaceDecl {
            name,
            type_params,
            members,
            span,
        }))
    }

    /// `fn name(params) [-> T];` inside an interface body.
    fn parse_interface_method(&mut self) -> CompileResult<InterfaceMethod> {
        let start = self.expect(TokenKind::Fn)?.span;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let return_type = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(InterfaceMethod {
            name,
            params,
            return_type,
            span,
        })
    }

    /// `struct Name [<T, ...>] [implements A, B] { fields and methods }`
    pub(crate) fn parse_struct(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Struct)?.span;
        let (name, _) = self.expect_identifier()?;
        let type_params = self.parse_type_params()?;

        let mut implements = Vec::new();
        if self.eat(TokenKind::Implements) {
            loop {
                let (interface, _) = self.expect_identifier()?;
                implements.push(interface);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            match self.peek_kind() {
                TokenKind::Fn | TokenKind::At | TokenKind::Async => {
                    members.push(StructMember::Method(self.parse_function_decl(true)?));
                }
                _ => {
                    let field_start = self.peek().span;
                    let mutable = self.eat(TokenKind::Mut);
                    let (field_name, _) = self.expect_identifier()?;
                    if !self.eat_annotation_intro() {
                        return Err(self.error_expected(&[TokenKind::Colon, TokenKind::Arrow]));
                    }
                    let ty = self.parse_type()?;
                    self.expect(TokenKind::Semicolon)?;
                    let span = field_start.merge(self.prev_span());
                    members.push(StructMember::Field(FieldDecl {
                        name: field_name,
                        ty,
                        mutable,
                        span,
                    }));
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Struct(StructDecl {
            name,
            type_params,
            implements,
            members,
            span,
        }))
    }

    /// `enum Name { Variant, Variant { field: T; ... }, ... }`
    pub(crate) fn parse_enum(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Enum)?.span;
        let (name, _) = self.expect_identifier()?;
        self.expect(TokenKind::LBrace)?;

        let mut variants = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let (variant_name, variant_span) = self.expect_identifier()?;
            let mut fields = Vec::new();
            if self.eat(TokenKind::LBrace) {
                while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
                    let field_start = self.peek().span;
                    let (field_name, _) = self.expect_identifier()?;
                    if !self.eat_annotation_intro() {
                        return Err(self.error_expected(&[TokenKind::Colon, TokenKind::Arrow]));
                    }
                    let ty = self.parse_type()?;
                    // Payload fields may be `;`-terminated or `,`-separated
                    if !self.eat(TokenKind::Semicolon) && !self.eat(TokenKind::Comma) {
                        break;
                    }
                    let span = field_start.merge(self.prev_span());
                    fields.push(FieldDecl {
                        name: field_name,
                        ty,
                        mutable: false,
                        span,
                    });
                }
                self.expect(TokenKind::RBrace)?;
            }
            let span = variant_span.merge(self.prev_span());
            variants.push(EnumVariant {
                name: variant_name,
                fields,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Enum(EnumDecl {
            name,
            variants,
            span,
        }))
    }

    /// Top-level or nested function declaration.
    pub(crate) fn parse_function(&mut self) -> CompileResult<Stmt> {
        Ok(Stmt::Function(self.parse_function_decl(false)?))
    }

    /// `{@decorator} [async] fn name [<T, ...>] (params) [-> T] { body }`
    ///
    /// `allow_new_name` admits `new` as the function name for struct
    /// constructor methods.
    pub(crate) fn parse_function_decl(
        &mut self,
        allow_new_name: bool,
    ) -> CompileResult<FunctionDecl> {
        let start = self.peek().span;

        let mut decorators = Vec::new();
        while self.eat(TokenKind::At) {
            let (decorator, _) = self.expect_identifier()?;
            decorators.push(decorator);
        }

        let is_async = self.eat(TokenKind::Async);
        self.expect(TokenKind::Fn)?;

        let name = if allow_new_name && self.at(TokenKind::New) {
            self.advance().text
        } else {
            self.expect_identifier()?.0
        };

        let type_params = self.parse_type_params()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        let return_type = if self.eat(TokenKind::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());

        Ok(FunctionDecl {
            name,
            type_params,
            params,
            return_type,
            body,
            decorators,
            is_async,
            span,
        })
    }

    /// `<T, U, ...>` generic parameter list, empty when absent.
    pub(crate) fn parse_type_params(&mut self) -> CompileResult<Vec<Symbol>> {
        let mut type_params = Vec::new();
        if self.eat(TokenKind::Lt) {
            loop {
                let (param, _) = self.expect_identifier()?;
                type_params.push(param);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Gt)?;
        }
        Ok(type_params)
    }

    /// Parameter list up to (but not consuming) the closing `)`.
    ///
    /// `self` may appear without an annotation; every other parameter is
    /// `name (: | ->) Type [= default]`.
    pub(crate) fn parse_params(&mut self) -> CompileResult<Vec<Param>> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let (name, name_span) = self.expect_identifier()?;
            let ty = if self.eat_annotation_intro() {
                Some(self.parse_type()?)
            } else if name == sailc_util::sym::SELF_ {
                None
            } else {
                return Err(self.error_expected(&[TokenKind::Colon, TokenKind::Arrow]));
            };
            let default = if self.eat(TokenKind::Assign) {
                Some(self.with_struct_literals(|p| p.parse_expr())?)
            } else {
                None
            };
            let span = name_span.merge(self.prev_span());
            params.push(Param {
                name,
                ty,
                default,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    /// `let [mut] name [: T] [= expr];`
    pub(crate) fn parse_let(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Let)?.span;
        let mutable = self.eat(TokenKind::Mut);
        let (name, _) = self.expect_identifier()?;
        let ty = if self.eat_annotation_intro() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let init = if self.eat(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Let(LetDecl {
            name,
            mutable,
            ty,
            init,
            span,
        }))
    }

    /// `const name [: T] = expr;`
    pub(crate) fn parse_const(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Const)?.span;
        let (name, _) = self.expect_identifier()?;
        let ty = if self.eat_annotation_intro() {
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Const(ConstDecl {
            name,
            ty,
            value,
            span,
        }))
    }

    /// `test "description" { body }`
    pub(crate) fn parse_test(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(TokenKind::Test)?.span;
        let description = self.expect(TokenKind::Str)?.text;
        let body = self.parse_block()?;
        let span = start.merge(self.prev_span());
        Ok(Stmt::Test(TestDecl {
            description,
            body,
            span,
        }))
    }
}
