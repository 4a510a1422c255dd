//! Edge case tests for sailc-lex
