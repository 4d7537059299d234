//! Tree-sitter based multi-language parser.
//!
//! Analyzers never traverse trees themselves: extraction functions walk the
//! AST once and return small location records, and edge assembly happens in
//! the analyzers afterward.

pub mod queries;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tree_sitter::{Language as TsLanguage, Parser as TsParser, Tree};

use crate::core::{Error, Language, Result, SourceFile};

// Thread-local parser cache to avoid lock contention in parallel parsing.
// Each rayon worker thread gets its own set of parsers.
thread_local! {
    static THREAD_PARSERS: RefCell<HashMap<Language, TsParser>> = RefCell::new(HashMap::new());
}

/// Thread-safe parser for multi-language parsing.
/// Uses thread-local storage to enable lock-free parallel parsing.
pub struct Parser;

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse source content.
    pub fn parse_source(&self, file: &SourceFile) -> Result<ParseResult> {
        self.parse(&file.content, file.language, &file.path)
    }

    /// Parse content with explicit language.
    pub fn parse(&self, content: &[u8], lang: Language, path: &Path) -> Result<ParseResult> {
        let ts_lang = get_tree_sitter_language(lang);

        let tree = THREAD_PARSERS.with(|parsers| {
            let mut parsers = parsers.borrow_mut();
            let parser = parsers.entry(lang).or_insert_with(|| {
                let mut p = TsParser::new();
                p.set_language(&ts_lang).expect("Language should be valid");
                p
            });

            parser.parse(content, None).ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                message: "Failed to parse file".to_string(),
            })
        })?;

        Ok(ParseResult {
            tree: Arc::new(tree),
            source: content.to_vec(),
            language: lang,
            path: path.to_path_buf(),
        })
    }
}

/// Result of parsing a source file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed syntax tree.
    pub tree: Arc<Tree>,
    /// Original source content.
    pub source: Vec<u8>,
    /// Detected language.
    pub language: Language,
    /// File path.
    pub path: std::path::PathBuf,
}

impl ParseResult {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &tree_sitter::Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }
}

/// Get tree-sitter language for a Language enum value.
pub fn get_tree_sitter_language(lang: Language) -> TsLanguage {
    let ts_lang = match lang {
        Language::Python => tree_sitter_python::LANGUAGE,
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE,
        Language::TypeScript | Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
        Language::Java => tree_sitter_java::LANGUAGE,
        Language::C => tree_sitter_c::LANGUAGE,
        Language::Cpp => tree_sitter_cpp::LANGUAGE,
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE,
        Language::Go => tree_sitter_go::LANGUAGE,
        Language::Ruby => tree_sitter_ruby::LANGUAGE,
        Language::Php => tree_sitter_php::LANGUAGE_PHP,
    };
    ts_lang.into()
}

/// A function or method definition.
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    /// Function name.
    pub name: String,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
}

/// A call site.
#[derive(Debug, Clone)]
pub struct CallRecord {
    /// Name of the called function (rightmost identifier of the callee).
    pub callee: String,
    /// Line of the call site (1-indexed).
    pub line: u32,
    /// Number of enclosing control structures.
    pub depth: u32,
}

/// A control structure with its reach.
#[derive(Debug, Clone)]
pub struct ControlRecord {
    /// Node kind, e.g. `if_statement`.
    pub kind: String,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// Number of enclosing control structures.
    pub depth: u32,
}

/// An identifier occurrence, classified as definition or use.
#[derive(Debug, Clone)]
pub struct IdentRecord {
    pub name: String,
    /// Line of the occurrence (1-indexed).
    pub line: u32,
    /// Declarator targets and assignment LHS count as definitions.
    pub is_definition: bool,
}

/// An import/include/require statement.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    /// Imported module path, unquoted.
    pub path: String,
    /// Line of the statement (1-indexed).
    pub line: u32,
}

/// Extract function definitions from a parse result.
pub fn collect_functions(result: &ParseResult) -> Vec<FunctionRecord> {
    let function_types = queries::function_node_types(result.language);
    let mut functions = Vec::new();

    visit(result.root_node(), &mut |node| {
        if function_types.contains(&node.kind()) {
            if let Some(name) = node_name(&node, &result.source) {
                functions.push(FunctionRecord {
                    name,
                    start_line: node.start_position().row as u32 + 1,
                    end_line: node.end_position().row as u32 + 1,
                });
            }
        }
    });

    functions
}

/// Extract call sites with their nesting depth.
pub fn collect_calls(result: &ParseResult) -> Vec<CallRecord> {
    let call_types = queries::call_node_types(result.language);
    let control_types = queries::control_node_types(result.language);
    let mut calls = Vec::new();

    visit_with_depth(result.root_node(), control_types, 0, &mut |node, depth| {
        if call_types.contains(&node.kind()) {
            if let Some(callee) = callee_name(&node, &result.source) {
                calls.push(CallRecord {
                    callee,
                    line: node.start_position().row as u32 + 1,
                    depth,
                });
            }
        }
    });

    calls
}

/// Extract control structures with their reach and nesting depth.
pub fn collect_controls(result: &ParseResult) -> Vec<ControlRecord> {
    let control_types = queries::control_node_types(result.language);
    let mut controls = Vec::new();

    visit_with_depth(result.root_node(), control_types, 0, &mut |node, depth| {
        if control_types.contains(&node.kind()) {
            controls.push(ControlRecord {
                kind: node.kind().to_string(),
                start_line: node.start_position().row as u32 + 1,
                end_line: node.end_position().row as u32 + 1,
                depth,
            });
        }
    });

    controls
}

/// Extract identifier occurrences, classified as definition or use.
pub fn collect_identifiers(result: &ParseResult) -> Vec<IdentRecord> {
    let ident_types = queries::identifier_node_types(result.language);
    let contexts = queries::definition_contexts(result.language);
    let mut idents = Vec::new();

    visit(result.root_node(), &mut |node| {
        if ident_types.contains(&node.kind()) {
            let name = node.utf8_text(&result.source).unwrap_or("").to_string();
            if name.is_empty() {
                return;
            }
            idents.push(IdentRecord {
                name,
                line: node.start_position().row as u32 + 1,
                is_definition: is_definition_position(&node, contexts),
            });
        }
    });

    idents
}

/// Extract imports from a parse result.
pub fn collect_imports(result: &ParseResult) -> Vec<ImportRecord> {
    let mut imports = Vec::new();
    let source = &result.source;
    let lang = result.language;

    visit(result.root_node(), &mut |node| {
        let record = match lang {
            Language::Python => extract_python_import(&node, source),
            Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => {
                extract_js_import(&node, source)
            }
            Language::Java => extract_java_import(&node, source),
            Language::CSharp => extract_csharp_import(&node, source),
            Language::C | Language::Cpp => extract_c_include(&node, source),
            Language::Go => extract_go_import(&node, source),
            Language::Ruby => extract_ruby_import(&node, source),
            Language::Php => extract_php_import(&node, source),
        };
        if let Some(record) = record {
            imports.push(record);
        }
    });

    imports
}

fn visit<'a>(node: tree_sitter::Node<'a>, f: &mut impl FnMut(tree_sitter::Node<'a>)) {
    f(node);
    for child in node.children(&mut node.walk()) {
        visit(child, f);
    }
}

fn visit_with_depth<'a>(
    node: tree_sitter::Node<'a>,
    control_types: &[&str],
    depth: u32,
    f: &mut impl FnMut(tree_sitter::Node<'a>, u32),
) {
    f(node, depth);
    let child_depth = if control_types.contains(&node.kind()) {
        depth + 1
    } else {
        depth
    };
    for child in node.children(&mut node.walk()) {
        visit_with_depth(child, control_types, child_depth, f);
    }
}

fn node_name(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<String> {
    if let Some(name) = node.child_by_field_name("name") {
        return name.utf8_text(source).ok().map(|s| s.to_string());
    }
    // C-family grammars bury the name inside nested declarators.
    if let Some(declarator) = node.child_by_field_name("declarator") {
        let mut found = None;
        visit(declarator, &mut |n| {
            if found.is_none() && n.kind() == "identifier" {
                found = Some(n);
            }
        });
        if let Some(n) = found {
            return n.utf8_text(source).ok().map(|s| s.to_string());
        }
    }
    // Some grammars expose the name as a bare child instead of a field.
    node.children(&mut node.walk())
        .find(|c| queries::callee_name_kinds().contains(&c.kind()))
        .and_then(|c| c.utf8_text(source).ok())
        .map(|s| s.to_string())
}

/// Resolve the name of a called function: locate the callee child and take
/// its rightmost identifier (`a.b.c()` names `c`).
fn callee_name(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<String> {
    let callee = ["function", "name", "method", "constructor", "type"]
        .iter()
        .find_map(|field| node.child_by_field_name(field))?;

    if queries::callee_name_kinds().contains(&callee.kind()) {
        return callee.utf8_text(source).ok().map(|s| s.to_string());
    }

    let mut rightmost = None;
    visit(callee, &mut |n| {
        if queries::callee_name_kinds().contains(&n.kind()) {
            rightmost = Some(n);
        }
    });
    rightmost
        .and_then(|n| n.utf8_text(source).ok())
        .map(|s| s.to_string())
}

/// Whether an identifier node sits in a definition position: inside the
/// defining field of one of the language's definition contexts.
fn is_definition_position(
    node: &tree_sitter::Node<'_>,
    contexts: &[(&str, &str)],
) -> bool {
    let mut current = *node;
    // Patterns (tuple targets, destructuring) put the context a few levels up.
    for _ in 0..3 {
        let Some(parent) = current.parent() else {
            return false;
        };
        for (kind, field) in contexts {
            if parent.kind() == *kind {
                if let Some(slot) = parent.child_by_field_name(field) {
                    let range = node.byte_range();
                    if slot.byte_range().start <= range.start && range.end <= slot.byte_range().end
                    {
                        return true;
                    }
                }
            }
        }
        current = parent;
    }
    false
}

fn line_of(node: &tree_sitter::Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '<' || c == '>')
        .to_string()
}

fn extract_python_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    match node.kind() {
        "import_from_statement" => {
            let module = node.child_by_field_name("module_name")?;
            Some(ImportRecord {
                path: module.utf8_text(source).ok()?.to_string(),
                line: line_of(node),
            })
        }
        "import_statement" => {
            let module = node
                .children(&mut node.walk())
                .find(|c| c.kind() == "dotted_name" || c.kind() == "aliased_import")?;
            let text = module.utf8_text(source).ok()?;
            Some(ImportRecord {
                path: text.split(" as ").next().unwrap_or(text).to_string(),
                line: line_of(node),
            })
        }
        _ => None,
    }
}

fn extract_js_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    match node.kind() {
        "import_statement" => {
            let src = node.child_by_field_name("source")?;
            Some(ImportRecord {
                path: unquote(src.utf8_text(source).ok()?),
                line: line_of(node),
            })
        }
        // CommonJS require("x")
        "call_expression" => {
            let function = node.child_by_field_name("function")?;
            if function.utf8_text(source).ok()? != "require" {
                return None;
            }
            let args = node.child_by_field_name("arguments")?;
            let arg = args
                .children(&mut args.walk())
                .find(|c| c.kind() == "string")?;
            Some(ImportRecord {
                path: unquote(arg.utf8_text(source).ok()?),
                line: line_of(node),
            })
        }
        _ => None,
    }
}

fn extract_java_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if node.kind() != "import_declaration" {
        return None;
    }
    let text = node.utf8_text(source).ok()?;
    let path = text
        .trim_start_matches("import")
        .trim_start_matches(" static")
        .trim()
        .trim_end_matches(';')
        .trim()
        .to_string();
    Some(ImportRecord {
        path,
        line: line_of(node),
    })
}

fn extract_csharp_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if node.kind() != "using_directive" {
        return None;
    }
    let text = node.utf8_text(source).ok()?;
    let path = text
        .trim_start_matches("using")
        .trim()
        .trim_end_matches(';')
        .trim()
        .to_string();
    Some(ImportRecord {
        path,
        line: line_of(node),
    })
}

fn extract_c_include(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if node.kind() != "preproc_include" {
        return None;
    }
    let path = node.child_by_field_name("path")?;
    Some(ImportRecord {
        path: unquote(path.utf8_text(source).ok()?),
        line: line_of(node),
    })
}

fn extract_go_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if node.kind() != "import_spec" {
        return None;
    }
    let path = node.child_by_field_name("path").or_else(|| {
        node.children(&mut node.walk())
            .find(|c| c.kind() == "interpreted_string_literal")
    })?;
    Some(ImportRecord {
        path: unquote(path.utf8_text(source).ok()?),
        line: line_of(node),
    })
}

fn extract_ruby_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if node.kind() != "call" {
        return None;
    }
    let method = node
        .child_by_field_name("method")
        .and_then(|m| m.utf8_text(source).ok())?;
    if method != "require" && method != "require_relative" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let arg = args
        .children(&mut args.walk())
        .find(|c| c.kind() == "string")?;
    Some(ImportRecord {
        path: unquote(arg.utf8_text(source).ok()?.trim_matches(|c| c == '"' || c == '\'')),
        line: line_of(node),
    })
}

fn extract_php_import(node: &tree_sitter::Node<'_>, source: &[u8]) -> Option<ImportRecord> {
    if !matches!(
        node.kind(),
        "include_expression"
            | "include_once_expression"
            | "require_expression"
            | "require_once_expression"
    ) {
        return None;
    }
    let mut found = None;
    visit(*node, &mut |n| {
        if n.kind() == "string" && found.is_none() {
            found = n.utf8_text(source).ok().map(unquote);
        }
    });
    Some(ImportRecord {
        path: found?,
        line: line_of(node),
    })
}
