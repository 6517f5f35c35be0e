use std::collections::BTreeMap;

use codeflow_model::{is_ignored, Model, ModelError, NodeId, PropertyValue};

use crate::HistoryError;

/// Immutable snapshot of named property values on a single node.
#[derive(Clone, Debug, PartialEq)]
pub struct Memento {
    node: NodeId,
    values: BTreeMap<&'static str, PropertyValue>,
}

impl Memento {
    /// Captures the current values of `names` on `node`.
    pub fn capture(model: &Model, node: NodeId, names: &[&str]) -> Result<Self, HistoryError> {
        let kind = model.kind(node)?;
        let known = model.property_names(node)?;
        let mut values = BTreeMap::new();
        for name in names {
            if is_ignored(name) {
                return Err(HistoryError::IgnoredProperty {
                    name: name.to_string(),
                });
            }
            let key = known
                .iter()
                .copied()
                .find(|candidate| candidate == name)
                .ok_or_else(|| ModelError::PropertyNotFound {
                    kind,
                    name: name.to_string(),
                })?;
            values.insert(key, model.property(node, key)?);
        }
        Ok(Self { node, values })
    }

    pub fn capture_one(model: &Model, node: NodeId, name: &str) -> Result<Self, HistoryError> {
        Self::capture(model, node, &[name])
    }

    /// Captures every property of `node` that may take part in history.
    pub fn capture_all(model: &Model, node: NodeId) -> Result<Self, HistoryError> {
        let names: Vec<&str> = model
            .property_names(node)?
            .iter()
            .copied()
            .filter(|name| !is_ignored(name))
            .collect();
        Self::capture(model, node, &names)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes the captured values back and returns a memento holding the values
    /// they replaced.
    ///
    /// Values are written in name order. Node setters have no cross-property
    /// effects, so the order does not change the outcome.
    pub fn restore(&self, model: &mut Model) -> Result<Memento, HistoryError> {
        let names: Vec<&str> = self.names().collect();
        let inverse = Memento::capture(model, self.node, &names)?;
        for (name, value) in &self.values {
            model.set_property(self.node, name, value.clone())?;
        }
        Ok(inverse)
    }
}

#[cfg(test)]
mod tests {
    use codeflow_model::{names, DefaultProps, NodeBody, NodeKind, Point};

    use super::*;

    fn model_with_box() -> (Model, NodeId) {
        let mut model = Model::new();
        let node = model.create("box", NodeBody::Default(DefaultProps::default()));
        (model, node)
    }

    #[test]
    fn restore_returns_the_overwritten_values() {
        let (mut model, node) = model_with_box();
        let memento = Memento::capture(&model, node, &[names::NAME, names::LOCATION]).unwrap();

        model.set_property(node, names::NAME, "moved").unwrap();
        model
            .set_property(node, names::LOCATION, Point::new(5.0, 6.0))
            .unwrap();

        let inverse = memento.restore(&mut model).unwrap();
        assert_eq!(
            model.property(node, names::NAME).unwrap(),
            PropertyValue::Text("box".into())
        );
        assert_eq!(
            model.property(node, names::LOCATION).unwrap(),
            PropertyValue::Point(Point::default())
        );
        assert_eq!(
            inverse.value(names::LOCATION),
            Some(&PropertyValue::Point(Point::new(5.0, 6.0)))
        );
        assert_eq!(inverse.value(names::NAME), Some(&PropertyValue::Text("moved".into())));
    }

    #[test]
    fn identity_cannot_be_captured() {
        let (model, node) = model_with_box();
        let err = Memento::capture_one(&model, node, names::ID).unwrap_err();
        assert_eq!(
            err,
            HistoryError::IgnoredProperty {
                name: names::ID.to_string()
            }
        );
    }

    #[test]
    fn unknown_property_is_reported() {
        let mut model = Model::new();
        let slide = model.create("slide", NodeBody::Slide);
        let err = Memento::capture_one(&model, slide, names::SIZE).unwrap_err();
        assert_eq!(
            err,
            HistoryError::Model(ModelError::PropertyNotFound {
                kind: NodeKind::Slide,
                name: names::SIZE.to_string(),
            })
        );
    }

    #[test]
    fn capture_all_skips_identity() {
        let (model, node) = model_with_box();
        let memento = Memento::capture_all(&model, node).unwrap();
        assert!(memento.value(names::ID).is_none());
        assert!(memento.value(names::SHAPE_STYLE).is_some());
        assert_eq!(memento.len(), 9);
    }
}
