use crate::util::Position;
use crate::{FuserFn, TransformerFn, ValueImpl};
use ptree::TreeItem;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

#[derive(Clone, PartialEq)]
/// A ready-made semantic value building the concrete syntax tree of a parse.
///
/// Terminals become leaves carrying their lexeme, productions become
/// branches. Use [leaf_transformer](SyntaxTree::leaf_transformer) and
/// [branch_fuser](SyntaxTree::branch_fuser) as the callbacks of any grammar
/// whose output should simply be its own shape.
pub enum SyntaxTree {
    Empty,
    Leaf {
        name: &'static str,
        text: String,
        start: Position,
        end: Position,
    },
    Branch {
        name: &'static str,
        children: Vec<SyntaxTree>,
    },
}

impl ValueImpl for SyntaxTree {
    fn empty() -> Self {
        SyntaxTree::Empty
    }
}

impl SyntaxTree {
    /// A transformer turning every lexeme of a terminal into a leaf.
    pub fn leaf_transformer(name: &'static str) -> TransformerFn<SyntaxTree> {
        Rc::new(move |ctx, lexeme| {
            Ok(SyntaxTree::Leaf {
                name,
                text: lexeme.to_string(),
                start: ctx.start,
                end: ctx.end,
            })
        })
    }

    /// A fuser folding the member values into a named branch. Empty members
    /// (from hidden literals) are dropped.
    pub fn branch_fuser(name: &'static str) -> FuserFn<SyntaxTree> {
        Rc::new(move |_, members| {
            Ok(SyntaxTree::Branch {
                name,
                children: members
                    .into_iter()
                    .filter(|member| !matches!(member, SyntaxTree::Empty))
                    .collect(),
            })
        })
    }

    /// A fuser passing the single meaningful member through unchanged.
    pub fn passthrough_fuser() -> FuserFn<SyntaxTree> {
        Rc::new(|_, members| {
            Ok(members
                .into_iter()
                .find(|member| !matches!(member, SyntaxTree::Empty))
                .unwrap_or(SyntaxTree::Empty))
        })
    }

    pub fn name(&self) -> Option<&'static str> {
        match self {
            SyntaxTree::Empty => None,
            SyntaxTree::Leaf { name, .. } | SyntaxTree::Branch { name, .. } => Some(name),
        }
    }

    pub fn children(&self) -> &[SyntaxTree] {
        match self {
            SyntaxTree::Branch { children, .. } => children,
            _ => &[],
        }
    }

    /// Whether this tree or any nested child carries the name.
    pub fn contains(&self, name: &str) -> bool {
        self.name() == Some(name) || self.children().iter().any(|child| child.contains(name))
    }

    /// Find the first nested tree with the name, depth first.
    pub fn find(&self, name: &str) -> Option<&SyntaxTree> {
        if self.name() == Some(name) {
            Some(self)
        } else {
            self.children().iter().find_map(|child| child.find(name))
        }
    }

    pub fn print(&self) -> Result<(), std::io::Error> {
        ptree::print_tree(self)
    }
}

impl Debug for SyntaxTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxTree::Empty => write!(f, "()"),
            SyntaxTree::Leaf { name, text, .. } => write!(f, "{}({:?})", name, text),
            SyntaxTree::Branch { name, children } => {
                let mut tuple = f.debug_tuple(name);
                for child in children {
                    tuple.field(child);
                }
                tuple.finish()
            }
        }
    }
}

impl TreeItem for SyntaxTree {
    type Child = Self;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        match self {
            SyntaxTree::Empty => write!(f, "()"),
            SyntaxTree::Leaf {
                name,
                text,
                start,
                end,
            } => write!(f, "{} {:?} # {}-{}", name, text, start.index, end.index),
            SyntaxTree::Branch { name, .. } => write!(f, "{}", name),
        }
    }

    fn children(&self) -> std::borrow::Cow<[Self::Child]> {
        std::borrow::Cow::from(SyntaxTree::children(self))
    }
}
