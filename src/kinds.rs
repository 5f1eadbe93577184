//! Cursor kinds, type kinds and the packed node flags word.
//!
//! The kind numbers are the ones the C++ front-end hands us (libclang's
//! `CXCursorKind` / `CXTypeKind`), stored verbatim in OSY files.  We model them
//! as transparent newtypes rather than closed enums because newer front-ends
//! routinely emit kinds we have never heard of, and those must round-trip.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

macro_rules! kind_table {
    ($ty:ident, $table:ident, { $($name:ident = $val:expr => $label:expr,)* }) => {
        impl $ty {
            $(pub const $name: $ty = $ty($val);)*
        }

        lazy_static! {
            static ref $table: HashMap<i32, &'static str> = {
                let mut m = HashMap::new();
                $(m.insert($val, $label);)*
                m
            };
        }

        impl $ty {
            /// The front-end's name for this kind, if we know it.
            pub fn name(self) -> Option<&'static str> {
                $table.get(&self.0).copied()
            }

            /// Every known kind with its name, in ascending numeric order.
            pub fn all_known() -> Vec<($ty, &'static str)> {
                let mut known: Vec<($ty, &'static str)> =
                    $table.iter().map(|(k, v)| ($ty(*k), *v)).collect();
                known.sort_by_key(|(k, _)| k.0);
                known
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.name() {
                    Some(name) => f.write_str(name),
                    None => write!(f, "Kind({})", self.0),
                }
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorKind(pub i32);

kind_table!(CursorKind, CURSOR_KIND_NAMES, {
    UNEXPOSED_DECL = 1 => "UnexposedDecl",
    STRUCT_DECL = 2 => "StructDecl",
    UNION_DECL = 3 => "UnionDecl",
    CLASS_DECL = 4 => "ClassDecl",
    ENUM_DECL = 5 => "EnumDecl",
    FIELD_DECL = 6 => "FieldDecl",
    ENUM_CONSTANT_DECL = 7 => "EnumConstantDecl",
    FUNCTION_DECL = 8 => "FunctionDecl",
    VAR_DECL = 9 => "VarDecl",
    PARM_DECL = 10 => "ParmDecl",
    TYPEDEF_DECL = 20 => "TypedefDecl",
    CXX_METHOD = 21 => "CXXMethod",
    NAMESPACE = 22 => "Namespace",
    LINKAGE_SPEC = 23 => "LinkageSpec",
    CONSTRUCTOR = 24 => "Constructor",
    DESTRUCTOR = 25 => "Destructor",
    CONVERSION_FUNCTION = 26 => "ConversionFunction",
    TEMPLATE_TYPE_PARAMETER = 27 => "TemplateTypeParameter",
    NON_TYPE_TEMPLATE_PARAMETER = 28 => "NonTypeTemplateParameter",
    TEMPLATE_TEMPLATE_PARAMETER = 29 => "TemplateTemplateParameter",
    FUNCTION_TEMPLATE = 30 => "FunctionTemplate",
    CLASS_TEMPLATE = 31 => "ClassTemplate",
    CLASS_TEMPLATE_PARTIAL_SPECIALIZATION = 32 => "ClassTemplatePartialSpecialization",
    NAMESPACE_ALIAS = 33 => "NamespaceAlias",
    USING_DIRECTIVE = 34 => "UsingDirective",
    USING_DECLARATION = 35 => "UsingDeclaration",
    TYPE_ALIAS_DECL = 36 => "TypeAliasDecl",
    CXX_ACCESS_SPECIFIER = 39 => "CXXAccessSpecifier",
    TYPE_REF = 43 => "TypeRef",
    CXX_BASE_SPECIFIER = 44 => "CXXBaseSpecifier",
    TEMPLATE_REF = 45 => "TemplateRef",
    NAMESPACE_REF = 46 => "NamespaceRef",
    MEMBER_REF = 47 => "MemberRef",
    LABEL_REF = 48 => "LabelRef",
    OVERLOADED_DECL_REF = 49 => "OverloadedDeclRef",
    VARIABLE_REF = 50 => "VariableRef",
    INVALID_FILE = 70 => "InvalidFile",
    NO_DECL_FOUND = 71 => "NoDeclFound",
    NOT_IMPLEMENTED = 72 => "NotImplemented",
    INVALID_CODE = 73 => "InvalidCode",
    UNEXPOSED_EXPR = 100 => "UnexposedExpr",
    DECL_REF_EXPR = 101 => "DeclRefExpr",
    MEMBER_REF_EXPR = 102 => "MemberRefExpr",
    CALL_EXPR = 103 => "CallExpr",
    BLOCK_EXPR = 105 => "BlockExpr",
    INTEGER_LITERAL = 106 => "IntegerLiteral",
    FLOATING_LITERAL = 107 => "FloatingLiteral",
    IMAGINARY_LITERAL = 108 => "ImaginaryLiteral",
    STRING_LITERAL = 109 => "StringLiteral",
    CHARACTER_LITERAL = 110 => "CharacterLiteral",
    PAREN_EXPR = 111 => "ParenExpr",
    UNARY_OPERATOR = 112 => "UnaryOperator",
    ARRAY_SUBSCRIPT_EXPR = 113 => "ArraySubscriptExpr",
    BINARY_OPERATOR = 114 => "BinaryOperator",
    COMPOUND_ASSIGN_OPERATOR = 115 => "CompoundAssignOperator",
    CONDITIONAL_OPERATOR = 116 => "ConditionalOperator",
    C_STYLE_CAST_EXPR = 117 => "CStyleCastExpr",
    COMPOUND_LITERAL_EXPR = 118 => "CompoundLiteralExpr",
    INIT_LIST_EXPR = 119 => "InitListExpr",
    STMT_EXPR = 121 => "StmtExpr",
    CXX_STATIC_CAST_EXPR = 124 => "CXXStaticCastExpr",
    CXX_DYNAMIC_CAST_EXPR = 125 => "CXXDynamicCastExpr",
    CXX_REINTERPRET_CAST_EXPR = 126 => "CXXReinterpretCastExpr",
    CXX_CONST_CAST_EXPR = 127 => "CXXConstCastExpr",
    CXX_FUNCTIONAL_CAST_EXPR = 128 => "CXXFunctionalCastExpr",
    CXX_TYPEID_EXPR = 129 => "CXXTypeidExpr",
    CXX_BOOL_LITERAL_EXPR = 130 => "CXXBoolLiteralExpr",
    CXX_NULL_PTR_LITERAL_EXPR = 131 => "CXXNullPtrLiteralExpr",
    CXX_THIS_EXPR = 132 => "CXXThisExpr",
    CXX_THROW_EXPR = 133 => "CXXThrowExpr",
    CXX_NEW_EXPR = 134 => "CXXNewExpr",
    CXX_DELETE_EXPR = 135 => "CXXDeleteExpr",
    UNARY_EXPR = 136 => "UnaryExpr",
    PACK_EXPANSION_EXPR = 142 => "PackExpansionExpr",
    SIZE_OF_PACK_EXPR = 143 => "SizeOfPackExpr",
    LAMBDA_EXPR = 144 => "LambdaExpr",
    UNEXPOSED_STMT = 200 => "UnexposedStmt",
    LABEL_STMT = 201 => "LabelStmt",
    COMPOUND_STMT = 202 => "CompoundStmt",
    CASE_STMT = 203 => "CaseStmt",
    DEFAULT_STMT = 204 => "DefaultStmt",
    IF_STMT = 205 => "IfStmt",
    SWITCH_STMT = 206 => "SwitchStmt",
    WHILE_STMT = 207 => "WhileStmt",
    DO_STMT = 208 => "DoStmt",
    FOR_STMT = 209 => "ForStmt",
    GOTO_STMT = 210 => "GotoStmt",
    CONTINUE_STMT = 212 => "ContinueStmt",
    BREAK_STMT = 213 => "BreakStmt",
    RETURN_STMT = 214 => "ReturnStmt",
    CXX_CATCH_STMT = 223 => "CXXCatchStmt",
    CXX_TRY_STMT = 224 => "CXXTryStmt",
    CXX_FOR_RANGE_STMT = 225 => "CXXForRangeStmt",
    NULL_STMT = 230 => "NullStmt",
    DECL_STMT = 231 => "DeclStmt",
    BUILTIN_BIT_CAST_EXPR = 280 => "BuiltinBitCastExpr",
    TRANSLATION_UNIT = 350 => "TranslationUnit",
    UNEXPOSED_ATTR = 400 => "UnexposedAttr",
    CXX_FINAL_ATTR = 404 => "CXXFinalAttr",
    CXX_OVERRIDE_ATTR = 405 => "CXXOverrideAttr",
    ANNOTATE_ATTR = 406 => "AnnotateAttr",
    ASM_LABEL_ATTR = 407 => "AsmLabelAttr",
    PACKED_ATTR = 408 => "PackedAttr",
    PURE_ATTR = 409 => "PureAttr",
    CONST_ATTR = 410 => "ConstAttr",
    NO_DUPLICATE_ATTR = 411 => "NoDuplicateAttr",
    VISIBILITY_ATTR = 417 => "VisibilityAttr",
    DLL_EXPORT = 418 => "DLLExport",
    DLL_IMPORT = 419 => "DLLImport",
    WARN_UNUSED_ATTR = 440 => "WarnUnusedAttr",
    WARN_UNUSED_RESULT_ATTR = 441 => "WarnUnusedResultAttr",
    PREPROCESSING_DIRECTIVE = 500 => "PreprocessingDirective",
    MACRO_DEFINITION = 501 => "MacroDefinition",
    MACRO_EXPANSION = 502 => "MacroExpansion",
    INCLUSION_DIRECTIVE = 503 => "InclusionDirective",
    MODULE_IMPORT_DECL = 600 => "ModuleImportDecl",
    TYPE_ALIAS_TEMPLATE_DECL = 601 => "TypeAliasTemplateDecl",
    STATIC_ASSERT = 602 => "StaticAssert",
    FRIEND_DECL = 603 => "FriendDecl",
    CONCEPT_DECL = 604 => "ConceptDecl",
});

impl CursorKind {
    /// True for kinds that name a use of a declaration rather than the
    /// declaration itself.
    pub fn is_reference(self) -> bool {
        (Self::TYPE_REF.0..=Self::VARIABLE_REF.0).contains(&self.0)
            || self == Self::DECL_REF_EXPR
            || self == Self::MEMBER_REF_EXPR
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKind(pub i32);

kind_table!(TypeKind, TYPE_KIND_NAMES, {
    INVALID = 0 => "Invalid",
    UNEXPOSED = 1 => "Unexposed",
    VOID = 2 => "Void",
    BOOL = 3 => "Bool",
    CHAR_U = 4 => "Char_U",
    UCHAR = 5 => "UChar",
    CHAR16 = 6 => "Char16",
    CHAR32 = 7 => "Char32",
    USHORT = 8 => "UShort",
    UINT = 9 => "UInt",
    ULONG = 10 => "ULong",
    ULONG_LONG = 11 => "ULongLong",
    UINT128 = 12 => "UInt128",
    CHAR_S = 13 => "Char_S",
    SCHAR = 14 => "SChar",
    WCHAR = 15 => "WChar",
    SHORT = 16 => "Short",
    INT = 17 => "Int",
    LONG = 18 => "Long",
    LONG_LONG = 19 => "LongLong",
    INT128 = 20 => "Int128",
    FLOAT = 21 => "Float",
    DOUBLE = 22 => "Double",
    LONG_DOUBLE = 23 => "LongDouble",
    NULL_PTR = 24 => "NullPtr",
    OVERLOAD = 25 => "Overload",
    DEPENDENT = 26 => "Dependent",
    FLOAT128 = 30 => "Float128",
    HALF = 31 => "Half",
    CHAR8 = 42 => "Char8",
    COMPLEX = 100 => "Complex",
    POINTER = 101 => "Pointer",
    BLOCK_POINTER = 102 => "BlockPointer",
    LVALUE_REFERENCE = 103 => "LValueReference",
    RVALUE_REFERENCE = 104 => "RValueReference",
    RECORD = 105 => "Record",
    ENUM = 106 => "Enum",
    TYPEDEF = 107 => "Typedef",
    FUNCTION_NO_PROTO = 110 => "FunctionNoProto",
    FUNCTION_PROTO = 111 => "FunctionProto",
    CONSTANT_ARRAY = 112 => "ConstantArray",
    VECTOR = 113 => "Vector",
    INCOMPLETE_ARRAY = 114 => "IncompleteArray",
    VARIABLE_ARRAY = 115 => "VariableArray",
    DEPENDENT_SIZED_ARRAY = 116 => "DependentSizedArray",
    MEMBER_POINTER = 117 => "MemberPointer",
    AUTO = 118 => "Auto",
    ELABORATED = 119 => "Elaborated",
    TEMPLATE_TYPE_NAME = 1000 => "TemplateTypeName",
    TEMPLATE_PARAMETER = 1001 => "TemplateParameter",
});

impl TypeKind {
    /// Placeholder kinds stand in for a type we only know by spelling.
    pub fn is_placeholder(self) -> bool {
        self == Self::TEMPLATE_TYPE_NAME || self == Self::TEMPLATE_PARAMETER
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AccessSpecifier {
    #[default]
    Invalid = 0,
    Public = 1,
    Protected = 2,
    Private = 3,
}

impl AccessSpecifier {
    fn from_bits(bits: u32) -> AccessSpecifier {
        match bits {
            1 => AccessSpecifier::Public,
            2 => AccessSpecifier::Protected,
            3 => AccessSpecifier::Private,
            _ => AccessSpecifier::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum StorageClass {
    #[default]
    Invalid = 0,
    None = 1,
    Extern = 2,
    Static = 3,
    PrivateExtern = 4,
    OpenCLWorkGroupLocal = 5,
    Auto = 6,
    Register = 7,
}

impl StorageClass {
    fn from_bits(bits: u32) -> StorageClass {
        match bits {
            1 => StorageClass::None,
            2 => StorageClass::Extern,
            3 => StorageClass::Static,
            4 => StorageClass::PrivateExtern,
            5 => StorageClass::OpenCLWorkGroupLocal,
            6 => StorageClass::Auto,
            7 => StorageClass::Register,
            _ => StorageClass::Invalid,
        }
    }
}

bitflags! {
    /// `{access:2, abstract:1, storage:4, deleted:1}` packed low-bit first.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeFlags: u32 {
        const ACCESS = 0b11;
        const ABSTRACT = 1 << 2;
        const STORAGE = 0b1111 << 3;
        const DELETED = 1 << 7;
    }
}

const STORAGE_SHIFT: u32 = 3;

impl NodeFlags {
    pub fn pack(
        access: AccessSpecifier,
        is_abstract: bool,
        storage: StorageClass,
        is_deleted: bool,
    ) -> NodeFlags {
        let mut bits = (access as u32) & Self::ACCESS.bits();
        bits |= ((storage as u32) << STORAGE_SHIFT) & Self::STORAGE.bits();
        let mut flags = NodeFlags::from_bits_retain(bits);
        flags.set(NodeFlags::ABSTRACT, is_abstract);
        flags.set(NodeFlags::DELETED, is_deleted);
        flags
    }

    pub fn access_specifier(self) -> AccessSpecifier {
        AccessSpecifier::from_bits(self.bits() & Self::ACCESS.bits())
    }

    pub fn storage_class(self) -> StorageClass {
        StorageClass::from_bits((self.bits() & Self::STORAGE.bits()) >> STORAGE_SHIFT)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(NodeFlags::ABSTRACT)
    }

    pub fn is_deleted(self) -> bool {
        self.contains(NodeFlags::DELETED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_pack_into_documented_bits() {
        let flags = NodeFlags::pack(AccessSpecifier::Private, true, StorageClass::Static, true);
        assert_eq!(flags.bits(), 0b1_0011_1_11);
        assert_eq!(flags.access_specifier(), AccessSpecifier::Private);
        assert_eq!(flags.storage_class(), StorageClass::Static);
        assert!(flags.is_abstract());
        assert!(flags.is_deleted());
    }

    #[test]
    fn default_flags_are_all_invalid() {
        let flags = NodeFlags::default();
        assert_eq!(flags.access_specifier(), AccessSpecifier::Invalid);
        assert_eq!(flags.storage_class(), StorageClass::Invalid);
        assert!(!flags.is_abstract());
    }

    #[test]
    fn unknown_storage_bits_read_back_invalid() {
        let flags = NodeFlags::from_bits_retain(0b1111 << 3);
        assert_eq!(flags.storage_class(), StorageClass::Invalid);
    }

    #[test]
    fn kinds_display_by_name_or_number() {
        assert_eq!(CursorKind::CLASS_DECL.to_string(), "ClassDecl");
        assert_eq!(CursorKind(9999).to_string(), "Kind(9999)");
        assert_eq!(TypeKind::TEMPLATE_PARAMETER.to_string(), "TemplateParameter");
    }

    #[test]
    fn reference_kinds() {
        assert!(CursorKind::TYPE_REF.is_reference());
        assert!(CursorKind::DECL_REF_EXPR.is_reference());
        assert!(!CursorKind::CLASS_DECL.is_reference());
    }
}
