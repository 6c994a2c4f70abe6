//! Parser boundary (spec §4.1): wraps the external TS/JSX parser and hands
//! the walker a parsed module plus its source map, comments, and raw text.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use swc_common::comments::SingleThreadedComments;
use swc_common::{FileName, Globals, GLOBALS, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

/// One file's parsed AST, its source map (needed for line/column lookups
/// during extraction), and its raw source text (needed by the Comment
/// Scanner, which works over text rather than AST nodes).
pub struct ParsedFile {
    pub module: Module,
    pub source_map: Arc<SourceMap>,
    pub raw_source: String,
}

/// Parse one file's TS/JSX-family source into an AST (spec §4.1).
///
/// Every call gets its own `SourceMap` and its own `Globals` scope, so
/// parsing many files in parallel (spec §5) never shares mutable parser
/// state across threads.
pub fn parse_file(code: String, file_path: &str) -> Result<ParsedFile> {
    let raw_source = code.clone();
    GLOBALS.set(&Globals::new(), || {
        let source_map: Arc<SourceMap> = Arc::new(SourceMap::default());
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code);

        let syntax = Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        });

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), Some(&comments));

        let module = parser
            .parse_module()
            .map_err(|e| anyhow!("failed to parse {}: {:?}", file_path, e))?;

        Ok(ParsedFile {
            module,
            source_map,
            raw_source,
        })
    })
}
