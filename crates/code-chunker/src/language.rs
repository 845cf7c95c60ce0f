use std::path::Path;

/// A language known to the registry.
///
/// Every variant has node-type tables; only some have a compiled-in grammar
/// (see [`Language::grammar`]). The rest are always extracted heuristically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
    Cpp,
    C,
    CSharp,
    FSharp,
    Scala,
    Clojure,
    Ruby,
    Php,
    Swift,
    Kotlin,
}

/// Structural node types for one language, one ordered set per hierarchy level
#[derive(Debug, Clone, Copy)]
pub struct NodeTypes {
    /// Level 3: classes, modules, namespaces, traits
    pub class_types: &'static [&'static str],
    /// Level 4: functions, methods, constructors
    pub function_types: &'static [&'static str],
    /// Level 5: statements and statement-like expressions
    pub statement_types: &'static [&'static str],
}

impl NodeTypes {
    pub fn is_class(&self, kind: &str) -> bool {
        self.class_types.contains(&kind)
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_types.contains(&kind)
    }

    pub fn is_statement(&self, kind: &str) -> bool {
        self.statement_types.contains(&kind)
    }
}

const JS_STATEMENTS: &[&str] = &[
    "if_statement",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "switch_statement",
    "return_statement",
    "throw_statement",
    "expression_statement",
    "lexical_declaration",
    "variable_declaration",
];

const C_STATEMENTS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "return_statement",
    "expression_statement",
];

const RUST: NodeTypes = NodeTypes {
    class_types: &["impl_item", "trait_item", "mod_item", "struct_item", "enum_item"],
    function_types: &["function_item", "function_signature_item"],
    statement_types: &[
        "let_declaration",
        "expression_statement",
        "if_expression",
        "for_expression",
        "while_expression",
        "loop_expression",
        "match_expression",
        "return_expression",
    ],
};

const PYTHON: NodeTypes = NodeTypes {
    class_types: &["class_definition"],
    function_types: &["function_definition"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "try_statement",
        "with_statement",
        "match_statement",
        "return_statement",
        "raise_statement",
        "assert_statement",
        "expression_statement",
    ],
};

const JAVASCRIPT: NodeTypes = NodeTypes {
    class_types: &["class_declaration"],
    function_types: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
        "arrow_function",
    ],
    statement_types: JS_STATEMENTS,
};

const TYPESCRIPT: NodeTypes = NodeTypes {
    class_types: &[
        "class_declaration",
        "abstract_class_declaration",
        "interface_declaration",
        "enum_declaration",
        "internal_module",
        "module",
    ],
    function_types: &[
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
        "arrow_function",
    ],
    statement_types: JS_STATEMENTS,
};

const GO: NodeTypes = NodeTypes {
    class_types: &["type_declaration"],
    function_types: &["function_declaration", "method_declaration"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "expression_switch_statement",
        "type_switch_statement",
        "select_statement",
        "return_statement",
        "expression_statement",
        "assignment_statement",
        "short_var_declaration",
        "go_statement",
        "defer_statement",
    ],
};

const JAVA: NodeTypes = NodeTypes {
    class_types: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "record_declaration",
    ],
    function_types: &["method_declaration", "constructor_declaration"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "enhanced_for_statement",
        "while_statement",
        "do_statement",
        "try_statement",
        "switch_expression",
        "return_statement",
        "throw_statement",
        "expression_statement",
        "local_variable_declaration",
    ],
};

const CPP: NodeTypes = NodeTypes {
    class_types: &[
        "class_specifier",
        "struct_specifier",
        "namespace_definition",
        "enum_specifier",
    ],
    function_types: &["function_definition"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "for_range_loop",
        "while_statement",
        "do_statement",
        "switch_statement",
        "try_statement",
        "return_statement",
        "expression_statement",
        "declaration",
    ],
};

const C: NodeTypes = NodeTypes {
    class_types: &["struct_specifier", "enum_specifier", "union_specifier"],
    function_types: &["function_definition"],
    statement_types: C_STATEMENTS,
};

const CSHARP: NodeTypes = NodeTypes {
    class_types: &[
        "class_declaration",
        "interface_declaration",
        "struct_declaration",
        "namespace_declaration",
    ],
    function_types: &["method_declaration", "constructor_declaration"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "foreach_statement",
        "while_statement",
        "try_statement",
        "switch_statement",
        "return_statement",
        "expression_statement",
    ],
};

const FSHARP: NodeTypes = NodeTypes {
    class_types: &["module_declaration", "namespace_declaration", "type_definition"],
    function_types: &["member_definition", "function_definition"],
    statement_types: &[
        "match_expression",
        "if_expression",
        "for_expression",
        "while_expression",
        "try_expression",
    ],
};

const SCALA: NodeTypes = NodeTypes {
    class_types: &["class_definition", "object_definition", "trait_definition"],
    function_types: &["function_definition", "function_declaration"],
    statement_types: &[
        "if_expression",
        "for_expression",
        "while_expression",
        "match_expression",
        "try_expression",
        "return_expression",
    ],
};

const CLOJURE: NodeTypes = NodeTypes {
    class_types: &["ns_form"],
    function_types: &["defn_form"],
    statement_types: &["list_lit"],
};

const RUBY: NodeTypes = NodeTypes {
    class_types: &["class", "module"],
    function_types: &["method", "singleton_method"],
    statement_types: &["if", "unless", "while", "until", "for", "case", "return", "call"],
};

const PHP: NodeTypes = NodeTypes {
    class_types: &[
        "class_declaration",
        "interface_declaration",
        "trait_declaration",
        "namespace_definition",
    ],
    function_types: &["function_definition", "method_declaration"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "foreach_statement",
        "while_statement",
        "try_statement",
        "switch_statement",
        "return_statement",
        "expression_statement",
    ],
};

const SWIFT: NodeTypes = NodeTypes {
    class_types: &["class_declaration", "protocol_declaration"],
    function_types: &["function_declaration", "init_declaration"],
    statement_types: &[
        "if_statement",
        "for_statement",
        "while_statement",
        "guard_statement",
        "switch_statement",
        "control_transfer_statement",
    ],
};

const KOTLIN: NodeTypes = NodeTypes {
    class_types: &["class_declaration", "object_declaration"],
    function_types: &["function_declaration", "secondary_constructor"],
    statement_types: &[
        "if_expression",
        "for_statement",
        "while_statement",
        "when_expression",
        "try_expression",
        "jump_expression",
        "assignment",
    ],
};

impl Language {
    /// All registered languages
    pub const ALL: [Language; 17] = [
        Language::Rust,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
        Language::Go,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::CSharp,
        Language::FSharp,
        Language::Scala,
        Language::Clojure,
        Language::Ruby,
        Language::Php,
        Language::Swift,
        Language::Kotlin,
    ];

    /// Look up a file extension (without the dot). `None` means no registry entry.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" | "pyx" | "pyw" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "go" => Language::Go,
            "java" => Language::Java,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "c" | "h" => Language::C,
            "cs" => Language::CSharp,
            "fs" | "fsx" | "fsi" => Language::FSharp,
            "scala" | "sc" => Language::Scala,
            "clj" | "cljc" | "cljs" => Language::Clojure,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            _ => return None,
        };
        Some(lang)
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get language id as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::CSharp => "c_sharp",
            Language::FSharp => "f_sharp",
            Language::Scala => "scala",
            Language::Clojure => "clojure",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
        }
    }

    /// Node-type tables for the three structural levels
    pub fn node_types(self) -> &'static NodeTypes {
        match self {
            Language::Rust => &RUST,
            Language::Python => &PYTHON,
            Language::JavaScript => &JAVASCRIPT,
            Language::TypeScript | Language::Tsx => &TYPESCRIPT,
            Language::Go => &GO,
            Language::Java => &JAVA,
            Language::Cpp => &CPP,
            Language::C => &C,
            Language::CSharp => &CSHARP,
            Language::FSharp => &FSHARP,
            Language::Scala => &SCALA,
            Language::Clojure => &CLOJURE,
            Language::Ruby => &RUBY,
            Language::Php => &PHP,
            Language::Swift => &SWIFT,
            Language::Kotlin => &KOTLIN,
        }
    }

    /// Compiled-in tree-sitter grammar, if any
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            _ => None,
        }
    }

    /// Check if this language is parsed with a grammar
    pub fn supports_ast(self) -> bool {
        self.grammar().is_some()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("rs"), Some(Language::Rust));
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("pyi"), Some(Language::Python));
        assert_eq!(Language::from_extension("jsx"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_extension("cljs"), Some(Language::Clojure));
        assert_eq!(Language::from_extension("md"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("src/main.py"), Some(Language::Python));
        assert_eq!(Language::from_path("index.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("Makefile"), None);
        assert_eq!(Language::from_path("notes.txt"), None);
    }

    #[test]
    fn test_grammar_availability() {
        for lang in [
            Language::Rust,
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::Tsx,
            Language::Go,
            Language::Java,
            Language::Cpp,
        ] {
            assert!(lang.supports_ast(), "{lang} should have a grammar");
        }
        assert!(!Language::Kotlin.supports_ast());
        assert!(!Language::C.supports_ast());
    }

    #[test]
    fn every_language_has_all_three_levels() {
        for lang in Language::ALL {
            let types = lang.node_types();
            assert!(!types.class_types.is_empty(), "{lang}");
            assert!(!types.function_types.is_empty(), "{lang}");
            assert!(!types.statement_types.is_empty(), "{lang}");
        }
    }

    #[test]
    fn node_type_membership() {
        let py = Language::Python.node_types();
        assert!(py.is_class("class_definition"));
        assert!(py.is_function("function_definition"));
        assert!(py.is_statement("return_statement"));
        assert!(!py.is_function("class_definition"));
    }
}
