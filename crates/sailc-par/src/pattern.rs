//! Match pattern parsing.
//!
//! Patterns: wildcard `_`, identifier bindings, number and string
//! literals, and constructor patterns `Enum.Variant { field, field: sub }`.

use sailc_lex::TokenKind;
use sailc_util::CompileResult;

use crate::ast::*;
use crate::Parser;

impl Parser {
    /// Parse a single pattern.
    pub(crate) fn parse_pattern(&mut self) -> CompileResult<Pattern> {
        match self.peek_kind() {
            TokenKind::Underscore => {
                let token = self.advance();
                Ok(Pattern::Wildcard(token.span))
            }
            TokenKind::Number => {
                let token = self.advance();
                let value = self.pattern_number(token.text.as_str(), token.span, false)?;
                Ok(Pattern::Number(NumberLit {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::Minus if self.peek_ahead(1).kind == TokenKind::Number => {
                let minus = self.advance();
                let token = self.advance();
                let value = self.pattern_number(token.text.as_str(), token.span, true)?;
                Ok(Pattern::Number(NumberLit {
                    value,
                    span: minus.span.merge(token.span),
                }))
            }
            TokenKind::Str => {
                let token = self.advance();
                Ok(Pattern::Str(StrLit {
                    value: token.text,
                    span: token.span,
                }))
            }
            TokenKind::Identifier => {
                let (name, name_span) = self.expect_identifier()?;

                // `Enum.Variant [{ fields }]`
                if self.at(TokenKind::Dot) && self.peek_ahead(1).kind != TokenKind::Dot {
                    self.advance();
                    let (variant, variant_span) = self.expect_identifier()?;
                    let (fields, payload) = if self.at(TokenKind::LBrace) {
                        (self.parse_pattern_fields()?, true)
                    } else {
                        (Vec::new(), false)
                    };
                    let span = name_span.merge(self.prev_span()).merge(variant_span);
                    return Ok(Pattern::Tagged(TaggedPattern {
                        enum_name: Some(name),
                        variant,
                        fields,
                        payload,
                        span,
                    }));
                }

                // `Variant { fields }` without the enum qualifier
                if self.at(TokenKind::LBrace) {
                    let fields = self.parse_pattern_fields()?;
                    let span = name_span.merge(self.prev_span());
                    return Ok(Pattern::Tagged(TaggedPattern {
                        enum_name: None,
                        variant: name,
                        fields,
                        payload: true,
                        span,
                    }));
                }

                Ok(Pattern::Binding(Ident {
                    name,
                    span: name_span,
                }))
            }
            _ => Err(self.error_expected(&[
                TokenKind::Underscore,
                TokenKind::Number,
                TokenKind::Str,
                TokenKind::Identifier,
            ])),
        }
    }

    /// `{ field, field: subpattern, ... }`
    fn parse_pattern_fields(&mut self) -> CompileResult<Vec<PatternField>> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let (name, name_span) = self.expect_identifier()?;
            let pattern = if self.eat(TokenKind::Colon) {
                Some(self.parse_pattern()?)
            } else {
                None
            };
            let span = name_span.merge(self.prev_span());
            fields.push(PatternField {
                name,
                pattern,
                span,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(fields)
    }

    /// Number literal inside a pattern, optionally negated.
    fn pattern_number(
        &self,
        text: &str,
        span: sailc_util::Span,
        negate: bool,
    ) -> CompileResult<NumberValue> {
        let value = if text.contains('.') {
            NumberValue::Float(text.parse::<f64>().map_err(|_| {
                sailc_util::CompileError::Parser {
                    message: format!("malformed number literal '{}'", text),
                    found: "number literal".into(),
                    expected: Vec::new(),
                    span,
                }
            })?)
        } else {
            match text.parse::<i64>() {
                Ok(v) => NumberValue::Int(v),
                Err(_) => NumberValue::Float(text.parse::<f64>().map_err(|_| {
                    sailc_util::CompileError::Parser {
                        message: format!("malformed number literal '{}'", text),
                        found: "number literal".into(),
                        expected: Vec::new(),
                        span,
                    }
                })?),
            }
        };
        Ok(if negate {
            match value {
                NumberValue::Int(v) => NumberValue::Int(-v),
                NumberValue::Float(v) => NumberValue::Float(-v),
            }
        } else {
            value
        })
    }
}
