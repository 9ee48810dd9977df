//! Node and edge kind tags.
//!
//! The tag space is closed per build. Everything a tag means (name, parent,
//! declared attributes and edges) lives in the [`CATALOGUE`]; this module
//! derives the ancestor closures and flattened layouts from it once.

use std::fmt;

use lazy_static::lazy_static;

use crate::model::schema::{AttrDecl, CATALOGUE, EdgeDecl, KindDecl, Multiplicity};

/// Concrete or abstract node kind.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Base = 0,
    Positioned = 1,
    ExpressionSyntax = 2,
    TypeSyntax = 3,
    NameSyntax = 4,
    SimpleNameSyntax = 5,
    IdentifierNameSyntax = 6,
    AliasQualifiedNameSyntax = 7,
    QualifiedNameSyntax = 8,
    PredefinedTypeSyntax = 9,
    ArrayTypeSyntax = 10,
    LiteralExpressionSyntax = 11,
    BinaryExpressionSyntax = 12,
    SizeOfExpressionSyntax = 13,
    InterpolatedStringExpressionSyntax = 14,
    AnonymousFunctionExpressionSyntax = 15,
    ParenthesizedLambdaExpressionSyntax = 16,
    StatementSyntax = 17,
    BlockSyntax = 18,
    ExpressionStatementSyntax = 19,
    ReturnStatementSyntax = 20,
    WhileStatementSyntax = 21,
    CompilationUnitSyntax = 22,
    MemberDeclarationSyntax = 23,
    ClassDeclarationSyntax = 24,
    BaseMethodDeclarationSyntax = 25,
    MethodDeclarationSyntax = 26,
    OperatorDeclarationSyntax = 27,
    ArrowExpressionClauseSyntax = 28,
    ParameterListSyntax = 29,
    ParameterSyntax = 30,
    ArrayRankSpecifierSyntax = 31,
    InterpolatedStringContentSyntax = 32,
    InterpolatedStringTextSyntax = 33,
    InterpolationSyntax = 34,
    InterpolationAlignmentClauseSyntax = 35,
    InterpolationFormatClauseSyntax = 36,
    QueryBodySyntax = 37,
    QueryContinuationSyntax = 38,
    CrefSyntax = 39,
    TypeCrefSyntax = 40,
    XmlAttributeSyntax = 41,
    XmlCrefAttributeSyntax = 42,
}

impl NodeKind {
    /// Number of kinds.
    pub const COUNT: usize = 43;

    /// Every kind, in tag order.
    pub const ALL: [NodeKind; NodeKind::COUNT] = [
        NodeKind::Base,
        NodeKind::Positioned,
        NodeKind::ExpressionSyntax,
        NodeKind::TypeSyntax,
        NodeKind::NameSyntax,
        NodeKind::SimpleNameSyntax,
        NodeKind::IdentifierNameSyntax,
        NodeKind::AliasQualifiedNameSyntax,
        NodeKind::QualifiedNameSyntax,
        NodeKind::PredefinedTypeSyntax,
        NodeKind::ArrayTypeSyntax,
        NodeKind::LiteralExpressionSyntax,
        NodeKind::BinaryExpressionSyntax,
        NodeKind::SizeOfExpressionSyntax,
        NodeKind::InterpolatedStringExpressionSyntax,
        NodeKind::AnonymousFunctionExpressionSyntax,
        NodeKind::ParenthesizedLambdaExpressionSyntax,
        NodeKind::StatementSyntax,
        NodeKind::BlockSyntax,
        NodeKind::ExpressionStatementSyntax,
        NodeKind::ReturnStatementSyntax,
        NodeKind::WhileStatementSyntax,
        NodeKind::CompilationUnitSyntax,
        NodeKind::MemberDeclarationSyntax,
        NodeKind::ClassDeclarationSyntax,
        NodeKind::BaseMethodDeclarationSyntax,
        NodeKind::MethodDeclarationSyntax,
        NodeKind::OperatorDeclarationSyntax,
        NodeKind::ArrowExpressionClauseSyntax,
        NodeKind::ParameterListSyntax,
        NodeKind::ParameterSyntax,
        NodeKind::ArrayRankSpecifierSyntax,
        NodeKind::InterpolatedStringContentSyntax,
        NodeKind::InterpolatedStringTextSyntax,
        NodeKind::InterpolationSyntax,
        NodeKind::InterpolationAlignmentClauseSyntax,
        NodeKind::InterpolationFormatClauseSyntax,
        NodeKind::QueryBodySyntax,
        NodeKind::QueryContinuationSyntax,
        NodeKind::CrefSyntax,
        NodeKind::TypeCrefSyntax,
        NodeKind::XmlAttributeSyntax,
        NodeKind::XmlCrefAttributeSyntax,
    ];

    /// Decodes a wire tag.
    pub fn from_u16(tag: u16) -> Option<NodeKind> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Returns the catalogue row of this kind.
    pub fn decl(self) -> &'static KindDecl {
        &CATALOGUE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.decl().name
    }

    pub fn parent(self) -> Option<NodeKind> {
        self.decl().parent
    }

    /// Abstract kinds exist only to be inherited from and cannot be allocated.
    pub fn is_abstract(self) -> bool {
        self.decl().is_abstract
    }

    /// Returns true if `self` is `base` or descends from it.
    pub fn is_kind_of(self, base: NodeKind) -> bool {
        ANCESTORS[self as usize].contains(base)
    }

    /// Returns the kind's ancestor closure, itself included.
    pub fn ancestors(self) -> &'static KindSet {
        &ANCESTORS[self as usize]
    }

    /// Returns the flattened attribute and edge layout of this kind.
    pub fn layout(self) -> &'static Layout {
        &LAYOUTS[self as usize]
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owned edge, qualified by the kind that declares it.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    AliasQualifiedNameSyntaxAlias = 0,
    AliasQualifiedNameSyntaxName = 1,
    QualifiedNameSyntaxLeft = 2,
    QualifiedNameSyntaxRight = 3,
    ArrayTypeSyntaxElementType = 4,
    ArrayTypeSyntaxRankSpecifiers = 5,
    BinaryExpressionSyntaxLeft = 6,
    BinaryExpressionSyntaxRight = 7,
    SizeOfExpressionSyntaxType = 8,
    InterpolatedStringExpressionSyntaxContents = 9,
    AnonymousFunctionExpressionSyntaxBody = 10,
    ParenthesizedLambdaExpressionSyntaxParameterList = 11,
    BlockSyntaxStatements = 12,
    ExpressionStatementSyntaxExpression = 13,
    ReturnStatementSyntaxExpression = 14,
    WhileStatementSyntaxCondition = 15,
    WhileStatementSyntaxStatement = 16,
    CompilationUnitSyntaxMembers = 17,
    ClassDeclarationSyntaxMembers = 18,
    BaseMethodDeclarationSyntaxBody = 19,
    BaseMethodDeclarationSyntaxParameterList = 20,
    MethodDeclarationSyntaxExpressionBody = 21,
    MethodDeclarationSyntaxReturnType = 22,
    OperatorDeclarationSyntaxExpressionBody = 23,
    OperatorDeclarationSyntaxReturnType = 24,
    ArrowExpressionClauseSyntaxExpression = 25,
    ParameterListSyntaxParameters = 26,
    ParameterSyntaxType = 27,
    ArrayRankSpecifierSyntaxSizes = 28,
    InterpolationSyntaxAlignmentClause = 29,
    InterpolationSyntaxExpression = 30,
    InterpolationSyntaxFormatClause = 31,
    InterpolationAlignmentClauseSyntaxValue = 32,
    QueryBodySyntaxContinuation = 33,
    QueryContinuationSyntaxBody = 34,
    TypeCrefSyntaxType = 35,
    XmlCrefAttributeSyntaxCref = 36,
}

impl EdgeKind {
    /// Number of edge kinds.
    pub const COUNT: usize = 37;

    /// Every edge kind, in tag order.
    pub const ALL: [EdgeKind; EdgeKind::COUNT] = [
        EdgeKind::AliasQualifiedNameSyntaxAlias,
        EdgeKind::AliasQualifiedNameSyntaxName,
        EdgeKind::QualifiedNameSyntaxLeft,
        EdgeKind::QualifiedNameSyntaxRight,
        EdgeKind::ArrayTypeSyntaxElementType,
        EdgeKind::ArrayTypeSyntaxRankSpecifiers,
        EdgeKind::BinaryExpressionSyntaxLeft,
        EdgeKind::BinaryExpressionSyntaxRight,
        EdgeKind::SizeOfExpressionSyntaxType,
        EdgeKind::InterpolatedStringExpressionSyntaxContents,
        EdgeKind::AnonymousFunctionExpressionSyntaxBody,
        EdgeKind::ParenthesizedLambdaExpressionSyntaxParameterList,
        EdgeKind::BlockSyntaxStatements,
        EdgeKind::ExpressionStatementSyntaxExpression,
        EdgeKind::ReturnStatementSyntaxExpression,
        EdgeKind::WhileStatementSyntaxCondition,
        EdgeKind::WhileStatementSyntaxStatement,
        EdgeKind::CompilationUnitSyntaxMembers,
        EdgeKind::ClassDeclarationSyntaxMembers,
        EdgeKind::BaseMethodDeclarationSyntaxBody,
        EdgeKind::BaseMethodDeclarationSyntaxParameterList,
        EdgeKind::MethodDeclarationSyntaxExpressionBody,
        EdgeKind::MethodDeclarationSyntaxReturnType,
        EdgeKind::OperatorDeclarationSyntaxExpressionBody,
        EdgeKind::OperatorDeclarationSyntaxReturnType,
        EdgeKind::ArrowExpressionClauseSyntaxExpression,
        EdgeKind::ParameterListSyntaxParameters,
        EdgeKind::ParameterSyntaxType,
        EdgeKind::ArrayRankSpecifierSyntaxSizes,
        EdgeKind::InterpolationSyntaxAlignmentClause,
        EdgeKind::InterpolationSyntaxExpression,
        EdgeKind::InterpolationSyntaxFormatClause,
        EdgeKind::InterpolationAlignmentClauseSyntaxValue,
        EdgeKind::QueryBodySyntaxContinuation,
        EdgeKind::QueryContinuationSyntaxBody,
        EdgeKind::TypeCrefSyntaxType,
        EdgeKind::XmlCrefAttributeSyntaxCref,
    ];

    /// Decodes a tag.
    pub fn from_u16(tag: u16) -> Option<EdgeKind> {
        Self::ALL.get(tag as usize).copied()
    }

    fn entry(self) -> &'static EdgeEntry {
        match &EDGES[self as usize] {
            Some(entry) => entry,
            None => unreachable!("edge {:?} has no catalogue row", self),
        }
    }

    /// Returns the declaration of this edge.
    pub fn decl(self) -> &'static EdgeDecl {
        self.entry().decl
    }

    /// Returns the kind that declares this edge.
    pub fn owner(self) -> NodeKind {
        self.entry().owner
    }

    pub fn name(self) -> &'static str {
        self.decl().name
    }

    pub fn multiplicity(self) -> Multiplicity {
        self.decl().multiplicity
    }

    /// Base kind every target must satisfy.
    pub fn target(self) -> NodeKind {
        self.decl().target
    }

    pub fn is_multi(self) -> bool {
        self.multiplicity() == Multiplicity::Multi
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner(), self.name())
    }
}

const KIND_WORDS: usize = NodeKind::COUNT.div_ceil(64);

/// Fixed-size set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindSet {
    words: [u64; KIND_WORDS],
}

impl KindSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: NodeKind) {
        let i = kind as usize;
        self.words[i / 64] |= 1 << (i % 64);
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        let i = kind as usize;
        self.words[i / 64] & (1 << (i % 64)) != 0
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Iterates members in tag order.
    pub fn iter(&self) -> impl Iterator<Item = NodeKind> + '_ {
        NodeKind::ALL.into_iter().filter(|k| self.contains(*k))
    }
}

/// Attributes and edges of a kind, inherited ones first (root-most
/// ancestor first). This order is the wire order.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub attributes: Vec<&'static AttrDecl>,
    pub edges: Vec<&'static EdgeDecl>,
}

impl Layout {
    /// Returns the slot of the named attribute.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Returns the slot of the edge, or `None` if the kind does not own it.
    pub fn edge_index(&self, edge: EdgeKind) -> Option<usize> {
        self.edges.iter().position(|e| e.edge == edge)
    }
}

struct EdgeEntry {
    owner: NodeKind,
    decl: &'static EdgeDecl,
}

/// Walks `kind` and its ancestors, root-most last. The walk is bounded so a
/// cyclic parent chain cannot loop forever.
fn chain(kind: NodeKind) -> Vec<NodeKind> {
    let mut out = Vec::new();
    let mut cur = Some(kind);
    while let Some(k) = cur {
        if out.len() == NodeKind::COUNT {
            break;
        }
        out.push(k);
        cur = k.parent();
    }
    out
}

lazy_static! {
    static ref ANCESTORS: Vec<KindSet> = NodeKind::ALL
        .iter()
        .map(|k| {
            let mut set = KindSet::new();
            for a in chain(*k) {
                set.insert(a);
            }
            set
        })
        .collect();

    static ref LAYOUTS: Vec<Layout> = NodeKind::ALL
        .iter()
        .map(|k| {
            let mut layout = Layout::default();
            for a in chain(*k).into_iter().rev() {
                let decl = a.decl();
                layout.attributes.extend(decl.attributes.iter());
                layout.edges.extend(decl.edges.iter());
            }
            layout
        })
        .collect();

    static ref EDGES: Vec<Option<EdgeEntry>> = {
        let mut table: Vec<Option<EdgeEntry>> = (0..EdgeKind::COUNT).map(|_| None).collect();
        for row in CATALOGUE.iter() {
            for decl in row.edges {
                table[decl.edge as usize] = Some(EdgeEntry {
                    owner: row.kind,
                    decl,
                });
            }
        }
        table
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u16() {
        assert_eq!(NodeKind::from_u16(0), Some(NodeKind::Base));
        assert_eq!(NodeKind::from_u16(27), Some(NodeKind::OperatorDeclarationSyntax));
        assert_eq!(NodeKind::from_u16(NodeKind::COUNT as u16), None);
        assert_eq!(EdgeKind::from_u16(9), Some(EdgeKind::InterpolatedStringExpressionSyntaxContents));
        assert_eq!(EdgeKind::from_u16(EdgeKind::COUNT as u16), None);
        for (i, k) in NodeKind::ALL.iter().enumerate() {
            assert_eq!(*k as usize, i);
        }
        for (i, e) in EdgeKind::ALL.iter().enumerate() {
            assert_eq!(*e as usize, i);
        }
    }

    #[test]
    fn test_is_kind_of() {
        let k = NodeKind::IdentifierNameSyntax;
        assert!(k.is_kind_of(k));
        assert!(k.is_kind_of(NodeKind::SimpleNameSyntax));
        assert!(k.is_kind_of(NodeKind::TypeSyntax));
        assert!(k.is_kind_of(NodeKind::ExpressionSyntax));
        assert!(k.is_kind_of(NodeKind::Positioned));
        assert!(k.is_kind_of(NodeKind::Base));
        assert!(!k.is_kind_of(NodeKind::StatementSyntax));
        assert!(!NodeKind::TypeSyntax.is_kind_of(NodeKind::NameSyntax));
        assert!(!NodeKind::BlockSyntax.is_kind_of(NodeKind::ArrowExpressionClauseSyntax));
    }

    #[test]
    fn test_every_kind_reaches_base() {
        for k in NodeKind::ALL {
            assert!(k.is_kind_of(NodeKind::Base), "{} does not reach Base", k);
            assert_eq!(k.ancestors().len(), chain(k).len());
        }
    }

    #[test]
    fn test_layout_inherits_root_first() {
        let layout = NodeKind::IdentifierNameSyntax.layout();
        let names: Vec<_> = layout.attributes.iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            ["path", "line", "column", "end_line", "end_column", "identifier"]
        );
        assert!(layout.edges.is_empty());

        let layout = NodeKind::MethodDeclarationSyntax.layout();
        let edges: Vec<_> = layout.edges.iter().map(|e| e.edge).collect();
        assert_eq!(
            edges,
            [
                EdgeKind::BaseMethodDeclarationSyntaxBody,
                EdgeKind::BaseMethodDeclarationSyntaxParameterList,
                EdgeKind::MethodDeclarationSyntaxExpressionBody,
                EdgeKind::MethodDeclarationSyntaxReturnType,
            ]
        );
        assert_eq!(layout.edge_index(EdgeKind::MethodDeclarationSyntaxReturnType), Some(3));
        assert_eq!(layout.edge_index(EdgeKind::BlockSyntaxStatements), None);
        assert_eq!(layout.attribute_index("identifier"), Some(5));
    }

    #[test]
    fn test_edge_metadata() {
        let e = EdgeKind::OperatorDeclarationSyntaxExpressionBody;
        assert_eq!(e.owner(), NodeKind::OperatorDeclarationSyntax);
        assert_eq!(e.name(), "ExpressionBody");
        assert_eq!(e.target(), NodeKind::ArrowExpressionClauseSyntax);
        assert!(!e.is_multi());
        assert!(EdgeKind::BlockSyntaxStatements.is_multi());
        assert_eq!(e.to_string(), "OperatorDeclarationSyntax.ExpressionBody");
    }

    #[test]
    fn test_every_edge_resolves() {
        for e in EdgeKind::ALL {
            let entry = e.entry();
            assert_eq!(entry.decl.edge, e);
            assert!(entry.owner.decl().edges.iter().any(|d| d.edge == e), "{:?}", e);
            assert!(entry.owner.layout().edge_index(e).is_some());
        }
    }

    #[test]
    fn test_kind_set() {
        let mut set = KindSet::new();
        assert!(set.is_empty());
        set.insert(NodeKind::XmlCrefAttributeSyntax);
        set.insert(NodeKind::Base);
        set.insert(NodeKind::Base);
        assert_eq!(set.len(), 2);
        let members: Vec<_> = set.iter().collect();
        assert_eq!(members, [NodeKind::Base, NodeKind::XmlCrefAttributeSyntax]);
    }
}
