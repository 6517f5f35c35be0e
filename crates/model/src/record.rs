use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ModelError, NodeBody, NodeId, NodeKind};

/// Serializable form of a subtree. Parent links are implied by nesting and are
/// rebuilt on import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(flatten)]
    pub body: NodeBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    /// Number of records in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeRecord::node_count).sum::<usize>()
    }

    /// Checks the subtree on its own, without a model: every child must be
    /// accepted by its parent's kind and ids must be unique and usable.
    /// Returns the ids of the subtree in pre-order.
    pub fn validate(&self) -> Result<Vec<NodeId>, ModelError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        self.collect_ids(&mut seen, &mut ids)?;
        Ok(ids)
    }

    fn collect_ids(
        &self,
        seen: &mut HashSet<NodeId>,
        ids: &mut Vec<NodeId>,
    ) -> Result<(), ModelError> {
        if self.id.is_exhausted() {
            return Err(ModelError::InvalidId(self.id));
        }
        if !seen.insert(self.id) {
            return Err(ModelError::DuplicateId(self.id));
        }
        ids.push(self.id);
        let kind = self.kind();
        for child in &self.children {
            if !kind.can_accept(child.kind()) {
                return Err(ModelError::InvalidSubclass {
                    parent: kind,
                    child: child.kind(),
                });
            }
            child.collect_ids(seen, ids)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DefaultProps;

    fn record(body: NodeBody, children: Vec<NodeRecord>) -> NodeRecord {
        NodeRecord {
            id: NodeId::new(),
            name: "n".to_string(),
            body,
            children,
        }
    }

    #[test]
    fn validate_lists_ids_in_pre_order() {
        let slide = record(
            NodeBody::Slide,
            vec![record(NodeBody::Default(DefaultProps::default()), vec![])],
        );
        let collection = record(NodeBody::SlideCollection, vec![slide.clone()]);
        let ids = collection.validate().unwrap();
        assert_eq!(ids, vec![collection.id, slide.id, slide.children[0].id]);
    }

    #[test]
    fn validate_rejects_a_child_the_parent_cannot_hold() {
        let collection = record(
            NodeBody::SlideCollection,
            vec![record(NodeBody::Default(DefaultProps::default()), vec![])],
        );
        assert_eq!(
            collection.validate(),
            Err(ModelError::InvalidSubclass {
                parent: NodeKind::SlideCollection,
                child: NodeKind::Default,
            })
        );
    }

    #[test]
    fn validate_rejects_repeated_ids() {
        let first = record(NodeBody::Slide, vec![]);
        let mut second = record(NodeBody::Slide, vec![]);
        second.id = first.id;
        let collection = record(NodeBody::SlideCollection, vec![first.clone(), second]);
        assert_eq!(collection.validate(), Err(ModelError::DuplicateId(first.id)));
    }

    #[test]
    fn validate_rejects_the_last_id() {
        let mut slide = record(NodeBody::Slide, vec![]);
        slide.id = NodeId::from_raw(u64::MAX);
        assert_eq!(slide.validate(), Err(ModelError::InvalidId(slide.id)));
    }
}
