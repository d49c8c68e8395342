//! Keyed reconciliation of the canvas tree against the model

use std::collections::HashMap;
use std::hash::Hash;

use super::{render, ColumnNode, FieldNode, RenderTree, RowNode};
use crate::domain::aggregates::Form;
use crate::domain::value_objects::{ColumnId, FieldId, RowId};

/// Identity of a canvas node
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Row(RowId),
    Column(ColumnId),
    Field(FieldId),
}

/// One change applied to the canvas
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// Title, description or settings changed
    Header,
    Insert { parent: Option<NodeKey>, index: usize, node: NodeKey },
    Remove { node: NodeKey },
    Move { node: NodeKey, index: usize },
    Update { node: NodeKey },
}

trait Keyed: Sized {
    type Key: Clone + Eq + Hash;

    fn key(&self) -> &Self::Key;
    fn node_key(key: &Self::Key) -> NodeKey;
    /// Take over `next`'s content, recording changes below this node
    fn absorb(&mut self, next: Self, patches: &mut Vec<Patch>);
}

impl Keyed for RowNode {
    type Key = RowId;

    fn key(&self) -> &RowId { &self.key }
    fn node_key(key: &RowId) -> NodeKey { NodeKey::Row(key.clone()) }

    fn absorb(&mut self, next: Self, patches: &mut Vec<Patch>) {
        self.top = next.top;
        self.height = next.height;
        if self.controls != next.controls {
            self.controls = next.controls;
            patches.push(Patch::Update { node: NodeKey::Row(self.key.clone()) });
        }
        diff_children(Some(NodeKey::Row(self.key.clone())), &mut self.columns, next.columns, patches);
    }
}

impl Keyed for ColumnNode {
    type Key = ColumnId;

    fn key(&self) -> &ColumnId { &self.key }
    fn node_key(key: &ColumnId) -> NodeKey { NodeKey::Column(key.clone()) }

    fn absorb(&mut self, next: Self, patches: &mut Vec<Patch>) {
        if self.width_factor != next.width_factor {
            self.width_factor = next.width_factor;
            patches.push(Patch::Update { node: NodeKey::Column(self.key.clone()) });
        }
        diff_children(Some(NodeKey::Column(self.key.clone())), &mut self.fields, next.fields, patches);
    }
}

impl Keyed for FieldNode {
    type Key = FieldId;

    fn key(&self) -> &FieldId { &self.key }
    fn node_key(key: &FieldId) -> NodeKey { NodeKey::Field(key.clone()) }

    fn absorb(&mut self, next: Self, patches: &mut Vec<Patch>) {
        if self.field != next.field || self.controls != next.controls {
            patches.push(Patch::Update { node: NodeKey::Field(self.key.clone()) });
            *self = next;
        }
    }
}

fn diff_children<N: Keyed>(
    parent: Option<NodeKey>,
    current: &mut Vec<N>,
    next: Vec<N>,
    patches: &mut Vec<Patch>,
) {
    let wanted: HashMap<N::Key, usize> =
        next.iter().enumerate().map(|(i, n)| (n.key().clone(), i)).collect();

    let mut survivors: HashMap<N::Key, (usize, N)> = HashMap::new();
    for node in current.drain(..) {
        if wanted.contains_key(node.key()) {
            let order = survivors.len();
            survivors.insert(node.key().clone(), (order, node));
        } else {
            patches.push(Patch::Remove { node: N::node_key(node.key()) });
        }
    }

    // Survivor order relative to each other, to detect reorders
    let mut kept_order = 0;
    for (index, incoming) in next.into_iter().enumerate() {
        match survivors.remove(incoming.key()) {
            Some((order, mut existing)) => {
                if order != kept_order {
                    patches.push(Patch::Move { node: N::node_key(existing.key()), index });
                }
                kept_order += 1;
                existing.absorb(incoming, patches);
                current.push(existing);
            }
            None => {
                patches.push(Patch::Insert {
                    parent: parent.clone(),
                    index,
                    node: N::node_key(incoming.key()),
                });
                current.push(incoming);
            }
        }
    }
}

/// Bring `tree` in line with `form`, touching only changed nodes.
pub fn reconcile(form: &Form, tree: &mut RenderTree) -> Vec<Patch> {
    let next = render(form);
    let mut patches = Vec::new();

    if tree.form_id != next.form_id
        || tree.title != next.title
        || tree.description != next.description
        || tree.settings != next.settings
    {
        tree.form_id = next.form_id;
        tree.title = next.title;
        tree.description = next.description;
        tree.settings = next.settings;
        patches.push(Patch::Header);
    }

    diff_children(None, &mut tree.rows, next.rows, &mut patches);
    patches
}
