//! Declarations handed over by the parser
//!
//! A [`ProgramDecl`] is the fully parsed program: packages in load order,
//! each with its classes, protocols, enums and extensions in source order.
//! Member bodies arrive already checked and are only carried through.

use glyph_types::{AccessLevel, PackageVersion, Span};
use serde::{Deserialize, Serialize};

/// Whole program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramDecl {
    /// Source files spans refer to, by position
    #[serde(default)]
    pub sources: Vec<SourceFile>,
    /// Packages in load order
    pub packages: Vec<PackageDecl>,
}

impl ProgramDecl {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Source file referenced by spans
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path as given to the parser
    pub path: String,
}

/// One package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDecl {
    /// Package name; `_` is the main package
    pub name: String,
    /// Version
    #[serde(default)]
    pub version: PackageVersion,
    /// Whether a native binary must be loaded with the package
    #[serde(default)]
    pub requires_binary: bool,
    /// Declarations in source order
    #[serde(default)]
    pub items: Vec<ItemDecl>,
}

/// Top-level declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemDecl {
    /// 🐇
    Class(ClassDecl),
    /// 🐊
    Protocol(ProtocolDecl),
    /// 🦃
    Enum(EnumDecl),
    /// 🐋
    Extension(ExtensionDecl),
}

/// Type as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    /// Generic variable of the enclosing method or type
    Variable {
        /// Variable name
        variable: String,
        /// 🍬
        #[serde(default)]
        optional: bool,
    },
    /// Closure type
    Callable {
        /// Parameter types
        params: Vec<TypeExpr>,
        /// Return type
        returns: Box<TypeExpr>,
        /// 🍬
        #[serde(default)]
        optional: bool,
    },
    /// Builtin or declared type
    Named {
        /// Type name
        name: String,
        /// Package to look the name up in
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        /// 🍬
        #[serde(default)]
        optional: bool,
        /// Own generic arguments
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeExpr>,
    },
}

impl TypeExpr {
    /// Plain, non-optional named type without arguments
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named {
            name: name.into(),
            namespace: None,
            optional: false,
            args: Vec::new(),
        }
    }

    /// Whether 🍬 was written
    pub fn is_optional(&self) -> bool {
        match self {
            TypeExpr::Variable { optional, .. }
            | TypeExpr::Callable { optional, .. }
            | TypeExpr::Named { optional, .. } => *optional,
        }
    }

    /// Name used in diagnostics
    pub fn describe(&self) -> String {
        let prefix = if self.is_optional() { "🍬" } else { "" };
        match self {
            TypeExpr::Variable { variable, .. } => format!("{prefix}{variable}"),
            TypeExpr::Callable { .. } => format!("{prefix}🍇"),
            TypeExpr::Named { name, .. } => format!("{prefix}{name}"),
        }
    }
}

/// Generic variable declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericDecl {
    /// Variable name
    pub name: String,
    /// Constraint; ⚪ when absent
    #[serde(default)]
    pub constraint: Option<TypeExpr>,
}

/// Named, typed slot: argument or instance variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    /// Name
    pub name: String,
    /// Type
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Checked body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyDecl {
    /// Implemented in the package's native binary
    Native,
    /// Compiled code
    Code {
        /// Local variable slots
        #[serde(default)]
        locals: u16,
        /// Instruction bytes
        #[serde(default)]
        code: Vec<u8>,
        /// String literals in reference order
        #[serde(default)]
        literals: Vec<String>,
    },
}

impl Default for BodyDecl {
    fn default() -> Self {
        BodyDecl::Code {
            locals: 0,
            code: Vec::new(),
            literals: Vec::new(),
        }
    }
}

/// Method or type-level method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Visibility
    #[serde(default)]
    pub access: AccessLevel,
    /// 🔏
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// ✒️
    #[serde(default, rename = "override")]
    pub is_override: bool,
    /// ⚠️
    #[serde(default)]
    pub deprecated: bool,
    /// Documentation comment
    #[serde(default)]
    pub documentation: Option<String>,
    /// Method-level generic variables
    #[serde(default)]
    pub generics: Vec<GenericDecl>,
    /// Arguments
    #[serde(default)]
    pub arguments: Vec<VariableDecl>,
    /// Return type; ✨ when absent
    #[serde(default)]
    pub returns: Option<TypeExpr>,
    /// Body (ignored for protocol methods)
    #[serde(default)]
    pub body: BodyDecl,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Initializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerDecl {
    /// Initializer name
    pub name: String,
    /// Visibility
    #[serde(default)]
    pub access: AccessLevel,
    /// 🔏: subclasses may not redeclare it
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// 🔑: every subclass must implement it
    #[serde(default)]
    pub required: bool,
    /// 🍬: may produce ✨ instead of an instance
    #[serde(default)]
    pub can_return_nothing: bool,
    /// ⚠️
    #[serde(default)]
    pub deprecated: bool,
    /// Documentation comment
    #[serde(default)]
    pub documentation: Option<String>,
    /// Arguments
    #[serde(default)]
    pub arguments: Vec<VariableDecl>,
    /// Body
    #[serde(default)]
    pub body: BodyDecl,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Members shared by classes and extensions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembersDecl {
    /// Protocol conformances
    #[serde(default)]
    pub conformances: Vec<TypeExpr>,
    /// Instance methods
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Type-level methods
    #[serde(default)]
    pub type_methods: Vec<MethodDecl>,
    /// Initializers
    #[serde(default)]
    pub initializers: Vec<InitializerDecl>,
}

/// Class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Class name
    pub name: String,
    /// Documentation comment
    #[serde(default)]
    pub documentation: Option<String>,
    /// 🌍
    #[serde(default)]
    pub exported: bool,
    /// Own generic variables
    #[serde(default)]
    pub generics: Vec<GenericDecl>,
    /// Superclass with its generic arguments
    #[serde(default)]
    pub superclass: Option<TypeExpr>,
    /// Instance variables in declaration order
    #[serde(default)]
    pub instance_variables: Vec<VariableDecl>,
    /// Members
    #[serde(flatten)]
    pub members: MembersDecl,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDecl {
    /// Protocol name
    pub name: String,
    /// Documentation comment
    #[serde(default)]
    pub documentation: Option<String>,
    /// 🌍
    #[serde(default)]
    pub exported: bool,
    /// Generic variables
    #[serde(default)]
    pub generics: Vec<GenericDecl>,
    /// Required methods
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Enum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    /// Enum name
    pub name: String,
    /// Documentation comment
    #[serde(default)]
    pub documentation: Option<String>,
    /// 🌍
    #[serde(default)]
    pub exported: bool,
    /// Value names in declaration order
    #[serde(default)]
    pub values: Vec<String>,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

/// Extension adding members to an existing class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDecl {
    /// Extended class
    pub class: TypeExpr,
    /// Added members
    #[serde(flatten)]
    pub members: MembersDecl,
    /// Declaration site
    #[serde(default)]
    pub span: Option<Span>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_program() {
        let json = r#"{
            "packages": [{
                "name": "_",
                "items": [
                    { "kind": "enum", "name": "🚦", "values": ["🔴", "🟢"] },
                    {
                        "kind": "class",
                        "name": "🐇",
                        "superclass": { "name": "🐾", "namespace": "s" },
                        "instance_variables": [
                            { "name": "count", "type": { "name": "🚂" } }
                        ],
                        "methods": [{
                            "name": "🔢",
                            "override": true,
                            "arguments": [{ "name": "x", "type": { "variable": "T", "optional": true } }],
                            "returns": { "params": [], "returns": { "name": "👌" } },
                            "body": { "kind": "native" }
                        }]
                    }
                ]
            }]
        }"#;
        let program = ProgramDecl::from_json(json).unwrap();
        let package = &program.packages[0];
        assert_eq!(package.version, PackageVersion::default());
        assert_eq!(package.items.len(), 2);

        let ItemDecl::Class(class) = &package.items[1] else {
            panic!("expected a class");
        };
        assert_eq!(
            class.superclass,
            Some(TypeExpr::Named {
                name: "🐾".into(),
                namespace: Some("s".into()),
                optional: false,
                args: vec![],
            })
        );
        let method = &class.members.methods[0];
        assert!(method.is_override);
        assert_eq!(method.body, BodyDecl::Native);
        assert_eq!(
            method.arguments[0].ty,
            TypeExpr::Variable {
                variable: "T".into(),
                optional: true
            }
        );
        assert!(matches!(method.returns, Some(TypeExpr::Callable { .. })));
    }

    #[test]
    fn test_missing_body_defaults_to_empty_code() {
        let method: MethodDecl = serde_json::from_str(r#"{ "name": "🔢" }"#).unwrap();
        assert_eq!(method.body, BodyDecl::default());
        assert_eq!(method.access, AccessLevel::Public);
        assert!(method.returns.is_none());
    }
}
