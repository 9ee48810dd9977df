//! Declarative node-kind catalogue.
//!
//! Each entry names a kind, its parent kind, whether it can be allocated,
//! and the attributes and edges it declares itself. Inherited attributes
//! and edges are not repeated; [`NodeKind::layout`](crate::NodeKind::layout)
//! flattens them. The engine reads these tables and nothing else, so adding
//! a kind means adding a variant and a row.

use crate::model::kind::{EdgeKind, NodeKind};

/// Storage type of a node attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrType {
    /// One byte, `0` or `1`.
    Bool,
    /// One byte; used for enumeration tags.
    UByte,
    /// Four bytes, unsigned.
    UInt,
    /// A [`Key`](crate::Key) into the string table.
    Str,
}

/// A declared attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDecl {
    pub name: &'static str,
    pub ty: AttrType,
}

/// Whether an edge holds one target or an ordered run of targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    Single,
    Multi,
}

/// A declared owned edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDecl {
    pub edge: EdgeKind,
    pub name: &'static str,
    pub multiplicity: Multiplicity,
    /// Every target must be this kind or one of its descendants.
    pub target: NodeKind,
}

/// One row of the catalogue.
#[derive(Debug, Clone, Copy)]
pub struct KindDecl {
    pub kind: NodeKind,
    pub name: &'static str,
    pub parent: Option<NodeKind>,
    pub is_abstract: bool,
    pub attributes: &'static [AttrDecl],
    pub edges: &'static [EdgeDecl],
}

macro_rules! attr {
    ($name:expr, $ty:expr $(,)?) => {
        AttrDecl { name: $name, ty: $ty }
    };
}

macro_rules! single {
    ($edge:expr, $name:expr, $target:expr $(,)?) => {
        EdgeDecl {
            edge: $edge,
            name: $name,
            multiplicity: Multiplicity::Single,
            target: $target,
        }
    };
}

macro_rules! multi {
    ($edge:expr, $name:expr, $target:expr $(,)?) => {
        EdgeDecl {
            edge: $edge,
            name: $name,
            multiplicity: Multiplicity::Multi,
            target: $target,
        }
    };
}

const fn kind(
    kind: NodeKind,
    name: &'static str,
    parent: Option<NodeKind>,
    is_abstract: bool,
    attributes: &'static [AttrDecl],
    edges: &'static [EdgeDecl],
) -> KindDecl {
    KindDecl {
        kind,
        name,
        parent,
        is_abstract,
        attributes,
        edges,
    }
}

use AttrType::{Bool, Str, UByte, UInt};
use EdgeKind as E;
use NodeKind as N;

/// Attributes shared by every kind that represents a source construct.
const POSITION: &[AttrDecl] = &[
    attr!("path", Str),
    attr!("line", UInt),
    attr!("column", UInt),
    attr!("end_line", UInt),
    attr!("end_column", UInt),
];

/// The catalogue, indexed by `NodeKind as usize`.
pub static CATALOGUE: [KindDecl; NodeKind::COUNT] = [
    kind(N::Base, "Base", None, true, &[], &[]),
    kind(N::Positioned, "Positioned", Some(N::Base), true, POSITION, &[]),
    // expression
    kind(N::ExpressionSyntax, "ExpressionSyntax", Some(N::Positioned), true, &[], &[]),
    kind(N::TypeSyntax, "TypeSyntax", Some(N::ExpressionSyntax), true, &[], &[]),
    kind(N::NameSyntax, "NameSyntax", Some(N::TypeSyntax), true, &[], &[]),
    kind(
        N::SimpleNameSyntax,
        "SimpleNameSyntax",
        Some(N::NameSyntax),
        true,
        &[attr!("identifier", Str)],
        &[],
    ),
    kind(N::IdentifierNameSyntax, "IdentifierNameSyntax", Some(N::SimpleNameSyntax), false, &[], &[]),
    kind(
        N::AliasQualifiedNameSyntax,
        "AliasQualifiedNameSyntax",
        Some(N::NameSyntax),
        false,
        &[],
        &[
            single!(E::AliasQualifiedNameSyntaxAlias, "Alias", N::IdentifierNameSyntax),
            single!(E::AliasQualifiedNameSyntaxName, "Name", N::SimpleNameSyntax),
        ],
    ),
    kind(
        N::QualifiedNameSyntax,
        "QualifiedNameSyntax",
        Some(N::NameSyntax),
        false,
        &[],
        &[
            single!(E::QualifiedNameSyntaxLeft, "Left", N::NameSyntax),
            single!(E::QualifiedNameSyntaxRight, "Right", N::SimpleNameSyntax),
        ],
    ),
    kind(
        N::PredefinedTypeSyntax,
        "PredefinedTypeSyntax",
        Some(N::TypeSyntax),
        false,
        &[attr!("keyword", Str)],
        &[],
    ),
    kind(
        N::ArrayTypeSyntax,
        "ArrayTypeSyntax",
        Some(N::TypeSyntax),
        false,
        &[],
        &[
            single!(E::ArrayTypeSyntaxElementType, "ElementType", N::TypeSyntax),
            multi!(E::ArrayTypeSyntaxRankSpecifiers, "RankSpecifiers", N::ArrayRankSpecifierSyntax),
        ],
    ),
    kind(
        N::LiteralExpressionSyntax,
        "LiteralExpressionSyntax",
        Some(N::ExpressionSyntax),
        false,
        &[attr!("kind", UByte), attr!("token", Str)],
        &[],
    ),
    kind(
        N::BinaryExpressionSyntax,
        "BinaryExpressionSyntax",
        Some(N::ExpressionSyntax),
        false,
        &[attr!("operator", UByte)],
        &[
            single!(E::BinaryExpressionSyntaxLeft, "Left", N::ExpressionSyntax),
            single!(E::BinaryExpressionSyntaxRight, "Right", N::ExpressionSyntax),
        ],
    ),
    kind(
        N::SizeOfExpressionSyntax,
        "SizeOfExpressionSyntax",
        Some(N::ExpressionSyntax),
        false,
        &[],
        &[single!(E::SizeOfExpressionSyntaxType, "Type", N::TypeSyntax)],
    ),
    kind(
        N::InterpolatedStringExpressionSyntax,
        "InterpolatedStringExpressionSyntax",
        Some(N::ExpressionSyntax),
        false,
        &[],
        &[multi!(
            E::InterpolatedStringExpressionSyntaxContents,
            "Contents",
            N::InterpolatedStringContentSyntax,
        )],
    ),
    kind(
        N::AnonymousFunctionExpressionSyntax,
        "AnonymousFunctionExpressionSyntax",
        Some(N::ExpressionSyntax),
        true,
        &[attr!("identifier", Str)],
        &[single!(E::AnonymousFunctionExpressionSyntaxBody, "Body", N::Positioned)],
    ),
    kind(
        N::ParenthesizedLambdaExpressionSyntax,
        "ParenthesizedLambdaExpressionSyntax",
        Some(N::AnonymousFunctionExpressionSyntax),
        false,
        &[attr!("is_async", Bool)],
        &[single!(
            E::ParenthesizedLambdaExpressionSyntaxParameterList,
            "ParameterList",
            N::ParameterListSyntax,
        )],
    ),
    // statement
    kind(N::StatementSyntax, "StatementSyntax", Some(N::Positioned), true, &[], &[]),
    kind(
        N::BlockSyntax,
        "BlockSyntax",
        Some(N::StatementSyntax),
        false,
        &[],
        &[multi!(E::BlockSyntaxStatements, "Statements", N::StatementSyntax)],
    ),
    kind(
        N::ExpressionStatementSyntax,
        "ExpressionStatementSyntax",
        Some(N::StatementSyntax),
        false,
        &[],
        &[single!(E::ExpressionStatementSyntaxExpression, "Expression", N::ExpressionSyntax)],
    ),
    kind(
        N::ReturnStatementSyntax,
        "ReturnStatementSyntax",
        Some(N::StatementSyntax),
        false,
        &[],
        &[single!(E::ReturnStatementSyntaxExpression, "Expression", N::ExpressionSyntax)],
    ),
    kind(
        N::WhileStatementSyntax,
        "WhileStatementSyntax",
        Some(N::StatementSyntax),
        false,
        &[],
        &[
            single!(E::WhileStatementSyntaxCondition, "Condition", N::ExpressionSyntax),
            single!(E::WhileStatementSyntaxStatement, "Statement", N::StatementSyntax),
        ],
    ),
    // structure
    kind(
        N::CompilationUnitSyntax,
        "CompilationUnitSyntax",
        Some(N::Positioned),
        false,
        &[],
        &[multi!(E::CompilationUnitSyntaxMembers, "Members", N::MemberDeclarationSyntax)],
    ),
    kind(N::MemberDeclarationSyntax, "MemberDeclarationSyntax", Some(N::Positioned), true, &[], &[]),
    kind(
        N::ClassDeclarationSyntax,
        "ClassDeclarationSyntax",
        Some(N::MemberDeclarationSyntax),
        false,
        &[attr!("identifier", Str), attr!("is_partial", Bool)],
        &[multi!(E::ClassDeclarationSyntaxMembers, "Members", N::MemberDeclarationSyntax)],
    ),
    kind(
        N::BaseMethodDeclarationSyntax,
        "BaseMethodDeclarationSyntax",
        Some(N::MemberDeclarationSyntax),
        true,
        &[],
        &[
            single!(E::BaseMethodDeclarationSyntaxBody, "Body", N::BlockSyntax),
            single!(E::BaseMethodDeclarationSyntaxParameterList, "ParameterList", N::ParameterListSyntax),
        ],
    ),
    kind(
        N::MethodDeclarationSyntax,
        "MethodDeclarationSyntax",
        Some(N::BaseMethodDeclarationSyntax),
        false,
        &[attr!("identifier", Str)],
        &[
            single!(
                E::MethodDeclarationSyntaxExpressionBody,
                "ExpressionBody",
                N::ArrowExpressionClauseSyntax,
            ),
            single!(E::MethodDeclarationSyntaxReturnType, "ReturnType", N::TypeSyntax),
        ],
    ),
    kind(
        N::OperatorDeclarationSyntax,
        "OperatorDeclarationSyntax",
        Some(N::BaseMethodDeclarationSyntax),
        false,
        &[],
        &[
            single!(
                E::OperatorDeclarationSyntaxExpressionBody,
                "ExpressionBody",
                N::ArrowExpressionClauseSyntax,
            ),
            single!(E::OperatorDeclarationSyntaxReturnType, "ReturnType", N::TypeSyntax),
        ],
    ),
    kind(
        N::ArrowExpressionClauseSyntax,
        "ArrowExpressionClauseSyntax",
        Some(N::Positioned),
        false,
        &[],
        &[single!(E::ArrowExpressionClauseSyntaxExpression, "Expression", N::ExpressionSyntax)],
    ),
    kind(
        N::ParameterListSyntax,
        "ParameterListSyntax",
        Some(N::Positioned),
        false,
        &[],
        &[multi!(E::ParameterListSyntaxParameters, "Parameters", N::ParameterSyntax)],
    ),
    kind(
        N::ParameterSyntax,
        "ParameterSyntax",
        Some(N::Positioned),
        false,
        &[attr!("identifier", Str)],
        &[single!(E::ParameterSyntaxType, "Type", N::TypeSyntax)],
    ),
    kind(
        N::ArrayRankSpecifierSyntax,
        "ArrayRankSpecifierSyntax",
        Some(N::Positioned),
        false,
        &[],
        &[multi!(E::ArrayRankSpecifierSyntaxSizes, "Sizes", N::ExpressionSyntax)],
    ),
    kind(
        N::InterpolatedStringContentSyntax,
        "InterpolatedStringContentSyntax",
        Some(N::Positioned),
        true,
        &[],
        &[],
    ),
    kind(
        N::InterpolatedStringTextSyntax,
        "InterpolatedStringTextSyntax",
        Some(N::InterpolatedStringContentSyntax),
        false,
        &[attr!("text", Str)],
        &[],
    ),
    kind(
        N::InterpolationSyntax,
        "InterpolationSyntax",
        Some(N::InterpolatedStringContentSyntax),
        false,
        &[],
        &[
            single!(
                E::InterpolationSyntaxAlignmentClause,
                "AlignmentClause",
                N::InterpolationAlignmentClauseSyntax,
            ),
            single!(E::InterpolationSyntaxExpression, "Expression", N::ExpressionSyntax),
            single!(
                E::InterpolationSyntaxFormatClause,
                "FormatClause",
                N::InterpolationFormatClauseSyntax,
            ),
        ],
    ),
    kind(
        N::InterpolationAlignmentClauseSyntax,
        "InterpolationAlignmentClauseSyntax",
        Some(N::Positioned),
        false,
        &[],
        &[single!(E::InterpolationAlignmentClauseSyntaxValue, "Value", N::ExpressionSyntax)],
    ),
    kind(
        N::InterpolationFormatClauseSyntax,
        "InterpolationFormatClauseSyntax",
        Some(N::Positioned),
        false,
        &[attr!("format", Str)],
        &[],
    ),
    kind(
        N::QueryBodySyntax,
        "QueryBodySyntax",
        Some(N::Positioned),
        false,
        &[],
        &[single!(E::QueryBodySyntaxContinuation, "Continuation", N::QueryContinuationSyntax)],
    ),
    kind(
        N::QueryContinuationSyntax,
        "QueryContinuationSyntax",
        Some(N::Positioned),
        false,
        &[attr!("identifier", Str)],
        &[single!(E::QueryContinuationSyntaxBody, "Body", N::QueryBodySyntax)],
    ),
    kind(N::CrefSyntax, "CrefSyntax", Some(N::Positioned), true, &[], &[]),
    kind(
        N::TypeCrefSyntax,
        "TypeCrefSyntax",
        Some(N::CrefSyntax),
        false,
        &[],
        &[single!(E::TypeCrefSyntaxType, "Type", N::TypeSyntax)],
    ),
    kind(N::XmlAttributeSyntax, "XmlAttributeSyntax", Some(N::Positioned), true, &[], &[]),
    kind(
        N::XmlCrefAttributeSyntax,
        "XmlCrefAttributeSyntax",
        Some(N::XmlAttributeSyntax),
        false,
        &[],
        &[single!(E::XmlCrefAttributeSyntaxCref, "Cref", N::CrefSyntax)],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_indexed_by_kind() {
        for (i, decl) in CATALOGUE.iter().enumerate() {
            assert_eq!(decl.kind as usize, i, "row {} is {}", i, decl.name);
            assert_eq!(NodeKind::ALL[i], decl.kind);
        }
    }

    #[test]
    fn test_every_edge_declared_once() {
        let mut seen = vec![0usize; EdgeKind::COUNT];
        for decl in &CATALOGUE {
            for edge in decl.edges {
                seen[edge.edge as usize] += 1;
            }
        }
        for (i, count) in seen.iter().enumerate() {
            assert_eq!(*count, 1, "edge {:?} declared {} times", EdgeKind::ALL[i], count);
        }
    }

    #[test]
    fn test_only_base_is_parentless() {
        for decl in &CATALOGUE {
            if decl.kind == NodeKind::Base {
                assert!(decl.parent.is_none());
            } else {
                assert!(decl.parent.is_some(), "{} has no parent", decl.name);
            }
        }
    }

    #[test]
    fn test_attribute_names_unique_per_kind() {
        for k in NodeKind::ALL {
            let layout = k.layout();
            for (i, a) in layout.attributes.iter().enumerate() {
                for b in &layout.attributes[i + 1..] {
                    assert_ne!(a.name, b.name, "{} repeats attribute {}", k, a.name);
                }
            }
        }
    }
}
