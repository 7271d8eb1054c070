//! Positioned program trees
//!
//! Trees are shared as `Arc<Node>`. A transformation that leaves a sub-tree
//! alone hands back the very same `Arc`, so [`same`] (pointer identity) tells
//! "untouched, reuse verbatim" apart from [`Node::same_shape`] (same kind,
//! position and content, but rebuilt).

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::children::structural_children;
use crate::position::Pos;

/// Shared handle to a node
pub type Tree = Arc<Node>;

/// A bare identifier token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub pos: Option<Pos>,
}

impl Name {
    pub fn new(text: impl Into<String>, pos: Option<Pos>) -> Self {
        Self {
            text: text.into(),
            pos,
        }
    }

    /// A name with no source presence
    pub fn synthetic(text: impl Into<String>) -> Self {
        Self::new(text, None)
    }
}

/// Modifier flags a definition can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Private,
    Protected,
    Override,
    Abstract,
    Final,
    Sealed,
    Implicit,
    Lazy,
    Case,
    /// Constructor parameter of a class
    ParamAccessor,
    /// Early initializer, evaluated before the super constructor
    PreSuper,
}

impl Modifier {
    /// Source keyword, `None` for flags without surface syntax
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Modifier::Private => Some("private"),
            Modifier::Protected => Some("protected"),
            Modifier::Override => Some("override"),
            Modifier::Abstract => Some("abstract"),
            Modifier::Final => Some("final"),
            Modifier::Sealed => Some("sealed"),
            Modifier::Implicit => Some("implicit"),
            Modifier::Lazy => Some("lazy"),
            Modifier::Case => Some("case"),
            Modifier::ParamAccessor | Modifier::PreSuper => None,
        }
    }
}

/// A modifier flag and the token it was written as, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierToken {
    pub flag: Modifier,
    pub pos: Option<Pos>,
}

impl ModifierToken {
    pub fn new(flag: Modifier, pos: Option<Pos>) -> Self {
        Self { flag, pos }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Unit,
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Char(char),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Unit => write!(f, "()"),
            Constant::Null => write!(f, "null"),
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Double(d) => write!(f, "{:?}", d),
            Constant::Char(c) => write!(f, "{:?}", c),
            Constant::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// The closed set of node kinds
#[derive(Debug)]
pub enum NodeKind {
    Package {
        pid: Tree,
        stats: Vec<Tree>,
    },
    Class {
        mods: Vec<ModifierToken>,
        name: Name,
        tparams: Vec<Tree>,
        template: Tree,
    },
    Module {
        mods: Vec<ModifierToken>,
        name: Name,
        template: Tree,
    },
    /// Class or object body. `body` holds constructor parameters and early
    /// initializers (flagged by modifiers) next to ordinary members.
    Template {
        parents: Vec<Tree>,
        super_args: Vec<Tree>,
        self_type: Option<Tree>,
        body: Vec<Tree>,
    },
    Val {
        mods: Vec<ModifierToken>,
        name: Name,
        tpt: Option<Tree>,
        rhs: Option<Tree>,
    },
    Def {
        mods: Vec<ModifierToken>,
        name: Name,
        tparams: Vec<Tree>,
        vparamss: Vec<Vec<Tree>>,
        tpt: Option<Tree>,
        rhs: Option<Tree>,
    },
    TypeDef {
        mods: Vec<ModifierToken>,
        name: Name,
        tparams: Vec<Tree>,
        rhs: Option<Tree>,
    },
    Ident {
        name: String,
    },
    Literal {
        value: Constant,
    },
    This {
        qual: Option<Name>,
    },
    Select {
        qualifier: Tree,
        name: Name,
    },
    Apply {
        fun: Tree,
        args: Vec<Tree>,
    },
    New {
        tpt: Tree,
    },
    Typed {
        expr: Tree,
        tpt: Tree,
    },
    Match {
        selector: Tree,
        cases: Vec<Tree>,
    },
    Case {
        pat: Tree,
        guard: Option<Tree>,
        body: Tree,
    },
    Bind {
        name: Name,
        body: Tree,
    },
    If {
        cond: Tree,
        then_branch: Tree,
        else_branch: Option<Tree>,
    },
    Function {
        params: Vec<Tree>,
        body: Tree,
    },
    Import {
        expr: Tree,
        selectors: Vec<Tree>,
    },
    ImportSelector {
        name: Name,
        rename: Option<Name>,
    },
    Block {
        stats: Vec<Tree>,
    },
    /// Pseudo-node for a bare identifier token
    NameTree {
        name: String,
    },
    /// Pseudo-node for a modifier keyword
    ModifierTree {
        flag: Modifier,
    },
    SelfType {
        name: Name,
        tpt: Option<Tree>,
    },
    /// The first parent of a template applied to the super constructor arguments
    SuperCall {
        fun: Tree,
        args: Vec<Tree>,
    },
}

/// Discriminant of [`NodeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Package,
    Class,
    Module,
    Template,
    Val,
    Def,
    TypeDef,
    Ident,
    Literal,
    This,
    Select,
    Apply,
    New,
    Typed,
    Match,
    Case,
    Bind,
    If,
    Function,
    Import,
    ImportSelector,
    Block,
    NameTree,
    ModifierTree,
    SelfType,
    SuperCall,
}

impl Tag {
    pub const ALL: [Tag; 26] = [
        Tag::Package,
        Tag::Class,
        Tag::Module,
        Tag::Template,
        Tag::Val,
        Tag::Def,
        Tag::TypeDef,
        Tag::Ident,
        Tag::Literal,
        Tag::This,
        Tag::Select,
        Tag::Apply,
        Tag::New,
        Tag::Typed,
        Tag::Match,
        Tag::Case,
        Tag::Bind,
        Tag::If,
        Tag::Function,
        Tag::Import,
        Tag::ImportSelector,
        Tag::Block,
        Tag::NameTree,
        Tag::ModifierTree,
        Tag::SelfType,
        Tag::SuperCall,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Package => "package",
            Tag::Class => "class",
            Tag::Module => "module",
            Tag::Template => "template",
            Tag::Val => "val",
            Tag::Def => "def",
            Tag::TypeDef => "type",
            Tag::Ident => "ident",
            Tag::Literal => "literal",
            Tag::This => "this",
            Tag::Select => "select",
            Tag::Apply => "apply",
            Tag::New => "new",
            Tag::Typed => "typed",
            Tag::Match => "match",
            Tag::Case => "case",
            Tag::Bind => "bind",
            Tag::If => "if",
            Tag::Function => "function",
            Tag::Import => "import",
            Tag::ImportSelector => "import_selector",
            Tag::Block => "block",
            Tag::NameTree => "name",
            Tag::ModifierTree => "modifier",
            Tag::SelfType => "self_type",
            Tag::SuperCall => "super_call",
        }
    }

    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL.iter().copied().find(|tag| tag.name() == name)
    }

    /// Kinds derived by the child extractor rather than produced by a parser
    pub fn is_pseudo(&self) -> bool {
        matches!(self, Tag::NameTree | Tag::ModifierTree | Tag::SuperCall)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl NodeKind {
    pub fn tag(&self) -> Tag {
        match self {
            NodeKind::Package { .. } => Tag::Package,
            NodeKind::Class { .. } => Tag::Class,
            NodeKind::Module { .. } => Tag::Module,
            NodeKind::Template { .. } => Tag::Template,
            NodeKind::Val { .. } => Tag::Val,
            NodeKind::Def { .. } => Tag::Def,
            NodeKind::TypeDef { .. } => Tag::TypeDef,
            NodeKind::Ident { .. } => Tag::Ident,
            NodeKind::Literal { .. } => Tag::Literal,
            NodeKind::This { .. } => Tag::This,
            NodeKind::Select { .. } => Tag::Select,
            NodeKind::Apply { .. } => Tag::Apply,
            NodeKind::New { .. } => Tag::New,
            NodeKind::Typed { .. } => Tag::Typed,
            NodeKind::Match { .. } => Tag::Match,
            NodeKind::Case { .. } => Tag::Case,
            NodeKind::Bind { .. } => Tag::Bind,
            NodeKind::If { .. } => Tag::If,
            NodeKind::Function { .. } => Tag::Function,
            NodeKind::Import { .. } => Tag::Import,
            NodeKind::ImportSelector { .. } => Tag::ImportSelector,
            NodeKind::Block { .. } => Tag::Block,
            NodeKind::NameTree { .. } => Tag::NameTree,
            NodeKind::ModifierTree { .. } => Tag::ModifierTree,
            NodeKind::SelfType { .. } => Tag::SelfType,
            NodeKind::SuperCall { .. } => Tag::SuperCall,
        }
    }
}

/// A program tree node
pub struct Node {
    kind: NodeKind,
    pos: Option<Pos>,
    children: OnceLock<Vec<Tree>>,
}

impl Node {
    pub fn new(kind: NodeKind, pos: Option<Pos>) -> Tree {
        Arc::new(Self {
            kind,
            pos,
            children: OnceLock::new(),
        })
    }

    /// A node with a source position
    pub fn at(kind: NodeKind, pos: Pos) -> Tree {
        Self::new(kind, Some(pos))
    }

    /// A node created by a transformation, without source presence
    pub fn synthetic(kind: NodeKind) -> Tree {
        Self::new(kind, None)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn tag(&self) -> Tag {
        self.kind.tag()
    }

    pub fn pos(&self) -> Option<Pos> {
        self.pos
    }

    /// Position usable as a layout anchor (present and not transparent)
    pub fn layout_pos(&self) -> Option<Pos> {
        self.pos.filter(|pos| !pos.is_transparent())
    }

    /// Structural children, derived on first access and cached
    pub fn children(&self) -> &[Tree] {
        self.children.get_or_init(|| structural_children(self))
    }

    /// Name of a named node
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Class { name, .. }
            | NodeKind::Module { name, .. }
            | NodeKind::Val { name, .. }
            | NodeKind::Def { name, .. }
            | NodeKind::TypeDef { name, .. }
            | NodeKind::Select { name, .. }
            | NodeKind::Bind { name, .. }
            | NodeKind::ImportSelector { name, .. }
            | NodeKind::SelfType { name, .. } => Some(&name.text),
            NodeKind::Ident { name } | NodeKind::NameTree { name } => Some(name),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> &[ModifierToken] {
        match &self.kind {
            NodeKind::Class { mods, .. }
            | NodeKind::Module { mods, .. }
            | NodeKind::Val { mods, .. }
            | NodeKind::Def { mods, .. }
            | NodeKind::TypeDef { mods, .. } => mods,
            _ => &[],
        }
    }

    pub fn has_modifier(&self, flag: Modifier) -> bool {
        self.modifiers().iter().any(|m| m.flag == flag)
    }

    pub fn is_definition(&self) -> bool {
        matches!(
            self.tag(),
            Tag::Class | Tag::Module | Tag::Val | Tag::Def | Tag::TypeDef
        )
    }

    /// Containers whose children are a plain statement sequence
    pub fn is_sequence(&self) -> bool {
        matches!(self.tag(), Tag::Block | Tag::Template | Tag::Package)
    }

    /// Same tag and same position (both absent counts as same)
    pub fn same_slot(&self, other: &Node) -> bool {
        self.tag() == other.tag()
            && match (self.pos, other.pos) {
                (Some(a), Some(b)) => a.same_range(&b),
                (None, None) => true,
                _ => false,
            }
    }

    /// Structural equality of this node alone: tag, position and own content
    pub fn same_shape(&self, other: &Node) -> bool {
        self.same_slot(other) && !self.content_differs(other)
    }

    /// Whether the node's own content (not its children) differs from `other`
    pub fn content_differs(&self, other: &Node) -> bool {
        use NodeKind::*;

        match (&self.kind, &other.kind) {
            (NameTree { name: a }, NameTree { name: b }) => a != b,
            (Ident { name: a }, Ident { name: b }) => a != b,
            (ModifierTree { flag: a }, ModifierTree { flag: b }) => a != b,
            (Literal { value: a }, Literal { value: b }) => a != b,
            (This { qual: a }, This { qual: b }) => {
                a.as_ref().map(|n| &n.text) != b.as_ref().map(|n| &n.text)
            }
            (Select { name: a, .. }, Select { name: b, .. })
            | (Bind { name: a, .. }, Bind { name: b, .. })
            | (SelfType { name: a, .. }, SelfType { name: b, .. }) => a.text != b.text,
            (
                ImportSelector { name: a, rename: ra },
                ImportSelector { name: b, rename: rb },
            ) => a.text != b.text || ra.as_ref().map(|n| &n.text) != rb.as_ref().map(|n| &n.text),
            (Import { selectors: a, .. }, Import { selectors: b, .. }) => {
                selector_texts(a) != selector_texts(b)
            }
            _ if self.tag() != other.tag() => true,
            _ if self.is_definition() => {
                self.name() != other.name() || modifier_flags(self) != modifier_flags(other)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())?;
        if let Some(name) = self.name() {
            write!(f, "({})", name)?;
        }
        match self.pos {
            Some(pos) => write!(f, "{:?}", pos),
            None => write!(f, "[synthetic]"),
        }
    }
}

/// Pointer identity: the very same node instance
pub fn same(a: &Tree, b: &Tree) -> bool {
    Arc::ptr_eq(a, b)
}

/// Identity key of a node, stable while the node is alive
pub fn node_key(node: &Tree) -> usize {
    Arc::as_ptr(node) as usize
}

fn modifier_flags(node: &Node) -> Vec<Modifier> {
    let mut flags: Vec<Modifier> = node.modifiers().iter().map(|m| m.flag).collect();
    flags.sort();
    flags.dedup();
    flags
}

fn selector_texts(selectors: &[Tree]) -> Vec<(String, Option<String>)> {
    selectors
        .iter()
        .map(|sel| match sel.kind() {
            NodeKind::ImportSelector { name, rename } => {
                (name.text.clone(), rename.as_ref().map(|r| r.text.clone()))
            }
            _ => (sel.name().unwrap_or_default().to_string(), None),
        })
        .collect()
}
