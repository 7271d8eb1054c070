//! JSON interchange for original and edited trees
//!
//! A host that parses in another process hands trees over as documents of
//! the form `{"file": ..., "root": ...}`. Ids written in the original
//! document let the edited document share subtrees with it: `{"ref": id}`
//! resolves to the very same node, so untouched code keeps its identity.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::RegenError;
use crate::position::{Pos, SourceFile};
use crate::tree::{Constant, Modifier, ModifierToken, Name, Node, NodeKind, Tag, Tree};

/// Top-level document
#[derive(Debug, Deserialize)]
pub struct TreeDocument {
    pub file: String,
    pub root: NodeDoc,
}

/// A node, or a reference to an original node by id
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeDoc {
    Ref {
        #[serde(rename = "ref")]
        target: String,
    },
    Node(Box<NodeFields>),
}

/// Name given as plain text or with its token position
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NameDoc {
    Text(String),
    Full {
        text: String,
        #[serde(default)]
        pos: Option<Vec<u32>>,
    },
}

/// Modifier given as a bare flag or with its keyword position
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModifierDoc {
    Flag(Modifier),
    Full {
        flag: Modifier,
        #[serde(default)]
        pos: Option<Vec<u32>>,
    },
}

/// Fields of a node object. Which slots are read depends on `kind`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NodeFields {
    pub kind: String,
    pub id: Option<String>,
    pub pos: Option<Vec<u32>>,
    pub transparent: bool,
    pub name: Option<NameDoc>,
    pub mods: Vec<ModifierDoc>,

    pub pid: Option<NodeDoc>,
    pub stats: Vec<NodeDoc>,
    pub tparams: Vec<NodeDoc>,
    pub template: Option<NodeDoc>,
    pub parents: Vec<NodeDoc>,
    pub super_args: Vec<NodeDoc>,
    pub self_type: Option<NodeDoc>,
    pub tpt: Option<NodeDoc>,
    pub rhs: Option<NodeDoc>,
    pub vparamss: Vec<Vec<NodeDoc>>,
    /// Literal value. Absent means unit, `null` means the null literal.
    #[serde(deserialize_with = "present")]
    pub value: Option<Value>,
    pub qual: Option<NameDoc>,
    pub qualifier: Option<NodeDoc>,
    pub fun: Option<NodeDoc>,
    pub args: Vec<NodeDoc>,
    pub expr: Option<NodeDoc>,
    pub selector: Option<NodeDoc>,
    pub cases: Vec<NodeDoc>,
    pub pat: Option<NodeDoc>,
    pub guard: Option<NodeDoc>,
    pub body: Option<NodeDoc>,
    pub cond: Option<NodeDoc>,
    pub then: Option<NodeDoc>,
    #[serde(rename = "else")]
    pub otherwise: Option<NodeDoc>,
    pub params: Vec<NodeDoc>,
    pub selectors: Vec<NodeDoc>,
    pub rename: Option<NameDoc>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// A loaded tree and the nodes its document gave ids to
#[derive(Debug)]
pub struct LoadedTree {
    root: Tree,
    ids: HashMap<String, Tree>,
}

impl LoadedTree {
    pub fn root(&self) -> &Tree {
        &self.root
    }

    pub fn by_id(&self, id: &str) -> Option<&Tree> {
        self.ids.get(id)
    }

    pub fn into_root(self) -> Tree {
        self.root
    }
}

/// Parse a document without building nodes
pub fn parse_document(json: &str) -> Result<TreeDocument, RegenError> {
    Ok(serde_json::from_str(json)?)
}

/// Load the tree a parser produced for `source`
pub fn load_original(source: &SourceFile, json: &str) -> Result<LoadedTree, RegenError> {
    let document = parse_document(json)?;
    Builder::new(source, None).finish(document)
}

/// Load a transformed tree whose `ref` nodes point into `original`
pub fn load_edited(
    source: &SourceFile,
    json: &str,
    original: &LoadedTree,
) -> Result<LoadedTree, RegenError> {
    let document = parse_document(json)?;
    Builder::new(source, Some(&original.ids)).finish(document)
}

struct Builder<'a> {
    source: &'a SourceFile,
    shared: Option<&'a HashMap<String, Tree>>,
    ids: HashMap<String, Tree>,
}

impl<'a> Builder<'a> {
    fn new(source: &'a SourceFile, shared: Option<&'a HashMap<String, Tree>>) -> Self {
        Self {
            source,
            shared,
            ids: HashMap::new(),
        }
    }

    fn finish(mut self, document: TreeDocument) -> Result<LoadedTree, RegenError> {
        if document.file != self.source.name() {
            debug!(
                document = %document.file,
                source = %self.source.name(),
                "Tree document names a different file"
            );
        }
        let root = self.node(document.root)?;
        Ok(LoadedTree {
            root,
            ids: self.ids,
        })
    }

    fn node(&mut self, doc: NodeDoc) -> Result<Tree, RegenError> {
        match doc {
            NodeDoc::Ref { target } => self
                .shared
                .and_then(|ids| ids.get(&target))
                .cloned()
                .ok_or_else(|| {
                    RegenError::Interchange(format!("Unknown node reference '{}'", target))
                }),
            NodeDoc::Node(fields) => self.build(*fields),
        }
    }

    fn build(&mut self, mut f: NodeFields) -> Result<Tree, RegenError> {
        let tag = Tag::from_name(&f.kind)
            .filter(|tag| !tag.is_pseudo())
            .ok_or_else(|| RegenError::UnknownKind(f.kind.clone()))?;
        let id = f.id.take();
        let pos = self.pos(f.pos.as_deref())?.map(|pos| {
            if f.transparent {
                pos.into_transparent()
            } else {
                pos
            }
        });

        let kind = match tag {
            Tag::Package => NodeKind::Package {
                pid: self.required(f.pid, tag, "pid")?,
                stats: self.list(f.stats)?,
            },
            Tag::Class => NodeKind::Class {
                mods: self.modifiers(f.mods)?,
                name: self.name(f.name, tag)?,
                tparams: self.list(f.tparams)?,
                template: self.required(f.template, tag, "template")?,
            },
            Tag::Module => NodeKind::Module {
                mods: self.modifiers(f.mods)?,
                name: self.name(f.name, tag)?,
                template: self.required(f.template, tag, "template")?,
            },
            Tag::Template => NodeKind::Template {
                parents: self.list(f.parents)?,
                super_args: self.list(f.super_args)?,
                self_type: self.optional(f.self_type)?,
                body: self.list(f.stats)?,
            },
            Tag::Val => NodeKind::Val {
                mods: self.modifiers(f.mods)?,
                name: self.name(f.name, tag)?,
                tpt: self.optional(f.tpt)?,
                rhs: self.optional(f.rhs)?,
            },
            Tag::Def => NodeKind::Def {
                mods: self.modifiers(f.mods)?,
                name: self.name(f.name, tag)?,
                tparams: self.list(f.tparams)?,
                vparamss: f
                    .vparamss
                    .into_iter()
                    .map(|list| self.list(list))
                    .collect::<Result<_, _>>()?,
                tpt: self.optional(f.tpt)?,
                rhs: self.optional(f.rhs)?,
            },
            Tag::TypeDef => NodeKind::TypeDef {
                mods: self.modifiers(f.mods)?,
                name: self.name(f.name, tag)?,
                tparams: self.list(f.tparams)?,
                rhs: self.optional(f.rhs)?,
            },
            Tag::Ident => NodeKind::Ident {
                name: self.name(f.name, tag)?.text,
            },
            Tag::Literal => NodeKind::Literal {
                value: constant(f.value)?,
            },
            Tag::This => NodeKind::This {
                qual: f.qual.map(|q| self.to_name(q)).transpose()?,
            },
            Tag::Select => NodeKind::Select {
                qualifier: self.required(f.qualifier, tag, "qualifier")?,
                name: self.name(f.name, tag)?,
            },
            Tag::Apply => NodeKind::Apply {
                fun: self.required(f.fun, tag, "fun")?,
                args: self.list(f.args)?,
            },
            Tag::New => NodeKind::New {
                tpt: self.required(f.tpt, tag, "tpt")?,
            },
            Tag::Typed => NodeKind::Typed {
                expr: self.required(f.expr, tag, "expr")?,
                tpt: self.required(f.tpt, tag, "tpt")?,
            },
            Tag::Match => NodeKind::Match {
                selector: self.required(f.selector, tag, "selector")?,
                cases: self.list(f.cases)?,
            },
            Tag::Case => NodeKind::Case {
                pat: self.required(f.pat, tag, "pat")?,
                guard: self.optional(f.guard)?,
                body: self.required(f.body, tag, "body")?,
            },
            Tag::Bind => NodeKind::Bind {
                name: self.name(f.name, tag)?,
                body: self.required(f.body, tag, "body")?,
            },
            Tag::If => NodeKind::If {
                cond: self.required(f.cond, tag, "cond")?,
                then_branch: self.required(f.then, tag, "then")?,
                else_branch: self.optional(f.otherwise)?,
            },
            Tag::Function => NodeKind::Function {
                params: self.list(f.params)?,
                body: self.required(f.body, tag, "body")?,
            },
            Tag::Import => NodeKind::Import {
                expr: self.required(f.expr, tag, "expr")?,
                selectors: self.list(f.selectors)?,
            },
            Tag::ImportSelector => NodeKind::ImportSelector {
                name: self.name(f.name, tag)?,
                rename: f.rename.map(|r| self.to_name(r)).transpose()?,
            },
            Tag::Block => NodeKind::Block {
                stats: self.list(f.stats)?,
            },
            Tag::SelfType => NodeKind::SelfType {
                name: self.name(f.name, tag)?,
                tpt: self.optional(f.tpt)?,
            },
            Tag::NameTree | Tag::ModifierTree | Tag::SuperCall => {
                return Err(RegenError::UnknownKind(f.kind));
            }
        };

        let node = Node::new(kind, pos);
        if let Some(id) = id {
            if self.ids.insert(id.clone(), node.clone()).is_some() {
                return Err(RegenError::Interchange(format!("Duplicate node id '{}'", id)));
            }
        }
        Ok(node)
    }

    fn pos(&self, raw: Option<&[u32]>) -> Result<Option<Pos>, RegenError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        let (start, point, end) = match *raw {
            [start, end] => (start, start, end),
            [start, point, end] => (start, point, end),
            _ => {
                return Err(RegenError::Interchange(format!(
                    "Position needs 2 or 3 offsets, got {}",
                    raw.len()
                )))
            }
        };
        let len = self.source.len();
        if start > end || end as usize > len {
            return Err(RegenError::PositionOutOfBounds {
                start: start as usize,
                end: end as usize,
                len,
            });
        }
        if point < start || point > end {
            return Err(RegenError::Interchange(format!(
                "Point {} outside {}..{}",
                point, start, end
            )));
        }
        let text = self.source.text();
        if let Some(offset) = [start, point, end]
            .into_iter()
            .find(|&offset| !text.is_char_boundary(offset as usize))
        {
            return Err(RegenError::Interchange(format!(
                "Offset {} is inside a character",
                offset
            )));
        }
        Ok(Some(Pos::new(self.source.id(), start, point, end)))
    }

    fn required(&mut self, doc: Option<NodeDoc>, tag: Tag, slot: &str) -> Result<Tree, RegenError> {
        match doc {
            Some(doc) => self.node(doc),
            None => Err(RegenError::Interchange(format!(
                "Kind '{}' requires '{}'",
                tag, slot
            ))),
        }
    }

    fn optional(&mut self, doc: Option<NodeDoc>) -> Result<Option<Tree>, RegenError> {
        doc.map(|doc| self.node(doc)).transpose()
    }

    fn list(&mut self, docs: Vec<NodeDoc>) -> Result<Vec<Tree>, RegenError> {
        docs.into_iter().map(|doc| self.node(doc)).collect()
    }

    fn name(&self, doc: Option<NameDoc>, tag: Tag) -> Result<Name, RegenError> {
        match doc {
            Some(doc) => self.to_name(doc),
            None => Err(RegenError::Interchange(format!("Kind '{}' requires 'name'", tag))),
        }
    }

    fn to_name(&self, doc: NameDoc) -> Result<Name, RegenError> {
        match doc {
            NameDoc::Text(text) => Ok(Name::synthetic(text)),
            NameDoc::Full { text, pos } => Ok(Name::new(text, self.pos(pos.as_deref())?)),
        }
    }

    fn modifiers(&self, docs: Vec<ModifierDoc>) -> Result<Vec<ModifierToken>, RegenError> {
        docs.into_iter()
            .map(|doc| match doc {
                ModifierDoc::Flag(flag) => Ok(ModifierToken::new(flag, None)),
                ModifierDoc::Full { flag, pos } => {
                    Ok(ModifierToken::new(flag, self.pos(pos.as_deref())?))
                }
            })
            .collect()
    }
}

fn constant(value: Option<Value>) -> Result<Constant, RegenError> {
    let malformed = |value: &Value| RegenError::Interchange(format!("Unsupported literal {}", value));
    let Some(value) = value else {
        return Ok(Constant::Unit);
    };
    match value {
        Value::Null => Ok(Constant::Null),
        Value::Bool(b) => Ok(Constant::Bool(b)),
        Value::Number(ref n) => n
            .as_i64()
            .map(Constant::Int)
            .or_else(|| n.as_f64().map(Constant::Double))
            .ok_or_else(|| malformed(&value)),
        Value::String(s) => Ok(Constant::Str(s)),
        Value::Object(ref map) => {
            let mut chars = map
                .get("char")
                .and_then(Value::as_str)
                .map(|s| s.chars())
                .ok_or_else(|| malformed(&value))?;
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Constant::Char(c)),
                _ => Err(malformed(&value)),
            }
        }
        Value::Array(_) => Err(malformed(&value)),
    }
}
