//! Per-language node-kind tables for AST extraction.

use crate::core::Language;

/// Get function/method definition node types.
pub fn function_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Python => &["function_definition"],
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => &[
            "function_declaration",
            "method_definition",
            "generator_function_declaration",
        ],
        Language::Java => &["method_declaration", "constructor_declaration"],
        Language::CSharp => &[
            "method_declaration",
            "constructor_declaration",
            "local_function_statement",
        ],
        Language::C | Language::Cpp => &["function_definition"],
        Language::Go => &["function_declaration", "method_declaration"],
        Language::Ruby => &["method", "singleton_method"],
        Language::Php => &["function_definition", "method_declaration"],
    }
}

/// Get call-site node types.
pub fn call_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Python => &["call"],
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => {
            &["call_expression", "new_expression"]
        }
        Language::Java => &["method_invocation", "object_creation_expression"],
        Language::CSharp => &["invocation_expression", "object_creation_expression"],
        Language::C | Language::Cpp => &["call_expression"],
        Language::Go => &["call_expression"],
        Language::Ruby => &["call"],
        Language::Php => &[
            "function_call_expression",
            "member_call_expression",
            "object_creation_expression",
        ],
    }
}

/// Get control-structure node types (if, switch, for, while, do-while,
/// for-in/of, try and their per-grammar spellings).
pub fn control_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Python => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "try_statement",
            "with_statement",
        ],
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Java | Language::CSharp => &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "for_each_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "switch_expression",
            "try_statement",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "for_statement",
            "for_range_loop",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Go => &[
            "if_statement",
            "for_statement",
            "expression_switch_statement",
            "type_switch_statement",
            "select_statement",
        ],
        Language::Ruby => &["if", "unless", "while", "until", "for", "case", "begin"],
        Language::Php => &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
    }
}

/// Get identifier node types (variable references).
pub fn identifier_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Php => &["variable_name"],
        _ => &["identifier"],
    }
}

/// Definition contexts: `(parent node kind, field holding the defined name)`.
///
/// An identifier inside the named field of such a parent counts as a
/// *definition*; every other identifier occurrence is a *use*.
pub fn definition_contexts(lang: Language) -> &'static [(&'static str, &'static str)] {
    match lang {
        Language::Python => &[
            ("assignment", "left"),
            ("augmented_assignment", "left"),
            ("for_statement", "left"),
        ],
        Language::JavaScript | Language::Jsx | Language::TypeScript | Language::Tsx => &[
            ("variable_declarator", "name"),
            ("assignment_expression", "left"),
            ("augmented_assignment_expression", "left"),
        ],
        Language::Java => &[
            ("variable_declarator", "name"),
            ("assignment_expression", "left"),
        ],
        Language::CSharp => &[
            ("variable_declarator", "name"),
            ("assignment_expression", "left"),
        ],
        Language::C | Language::Cpp => &[
            ("init_declarator", "declarator"),
            ("assignment_expression", "left"),
            ("declaration", "declarator"),
        ],
        Language::Go => &[
            ("short_var_declaration", "left"),
            ("assignment_statement", "left"),
            ("var_spec", "name"),
        ],
        Language::Ruby => &[("assignment", "left"), ("operator_assignment", "left")],
        Language::Php => &[
            ("assignment_expression", "left"),
            ("augmented_assignment_expression", "left"),
        ],
    }
}

/// Node kinds that name the called function inside a call-site node, used
/// when the grammar exposes no `function`/`name` field match.
pub fn callee_name_kinds() -> &'static [&'static str] {
    &[
        "identifier",
        "property_identifier",
        "field_identifier",
        "name",
        "constant",
    ]
}
