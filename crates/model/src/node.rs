use std::cell::Cell;
use std::fmt;
use std::rc::Weak;

use serde::{Deserialize, Serialize};

use crate::property::names;
use crate::{
    BorderStyle, ModelError, NodeId, NodeObserver, Point, PropertyValue, Rgba, ShapeStyle, Size,
};

/// The concrete kind of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    SlideCollection,
    Slide,
    Visual,
    Default,
    Link,
    SingleChildLink,
    MultiChildLink,
}

impl NodeKind {
    pub fn is_visual_family(self) -> bool {
        matches!(self, NodeKind::Visual | NodeKind::Default)
    }

    pub fn is_link_family(self) -> bool {
        matches!(
            self,
            NodeKind::Link | NodeKind::SingleChildLink | NodeKind::MultiChildLink
        )
    }

    /// Whether a node of this kind may hold a child of kind `child`.
    pub fn can_accept(self, child: NodeKind) -> bool {
        match self {
            NodeKind::SlideCollection => child == NodeKind::Slide,
            NodeKind::Slide => child.is_visual_family() || child.is_link_family(),
            NodeKind::Visual | NodeKind::Default => child.is_visual_family(),
            NodeKind::Link | NodeKind::SingleChildLink | NodeKind::MultiChildLink => {
                child.is_link_family()
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::SlideCollection => "SlideCollection",
            NodeKind::Slide => "Slide",
            NodeKind::Visual => "VisualNode",
            NodeKind::Default => "DefaultNode",
            NodeKind::Link => "Link",
            NodeKind::SingleChildLink => "SingleChildLink",
            NodeKind::MultiChildLink => "MultiChildLink",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Annotation text carried by every visual node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualProps {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub description: String,
}

/// Geometry and appearance of a default node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultProps {
    #[serde(default)]
    pub visual: VisualProps,
    #[serde(default)]
    pub location: Point,
    #[serde(default = "default_node_size")]
    pub size: Size,
    #[serde(default)]
    pub background: Rgba,
    #[serde(default = "default_foreground")]
    pub foreground: Rgba,
    #[serde(default)]
    pub border_style: BorderStyle,
    #[serde(default)]
    pub shape_style: ShapeStyle,
}

fn default_node_size() -> Size {
    Size::new(200.0, 200.0)
}

fn default_foreground() -> Rgba {
    Rgba::BLACK
}

impl Default for DefaultProps {
    fn default() -> Self {
        Self {
            visual: VisualProps::default(),
            location: Point::default(),
            size: default_node_size(),
            background: Rgba::default(),
            foreground: default_foreground(),
            border_style: BorderStyle::default(),
            shape_style: ShapeStyle::default(),
        }
    }
}

impl DefaultProps {
    pub fn at(location: Point, size: Size) -> Self {
        Self {
            location,
            size,
            ..Self::default()
        }
    }
}

/// Kind-specific payload of a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeBody {
    SlideCollection,
    Slide,
    Visual(VisualProps),
    Default(DefaultProps),
    Link,
    SingleChildLink,
    MultiChildLink,
}

const COMMON_PROPERTIES: &[&str] = &[names::ID, names::NAME];
const VISUAL_PROPERTIES: &[&str] = &[names::ID, names::NAME, names::COMMENT, names::DESCRIPTION];
const DEFAULT_PROPERTIES: &[&str] = &[
    names::ID,
    names::NAME,
    names::COMMENT,
    names::DESCRIPTION,
    names::LOCATION,
    names::SIZE,
    names::BACKGROUND,
    names::FOREGROUND,
    names::BORDER_STYLE,
    names::SHAPE_STYLE,
];

impl NodeBody {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeBody::SlideCollection => NodeKind::SlideCollection,
            NodeBody::Slide => NodeKind::Slide,
            NodeBody::Visual(_) => NodeKind::Visual,
            NodeBody::Default(_) => NodeKind::Default,
            NodeBody::Link => NodeKind::Link,
            NodeBody::SingleChildLink => NodeKind::SingleChildLink,
            NodeBody::MultiChildLink => NodeKind::MultiChildLink,
        }
    }

    /// Every property name readable on a node with this body, `id` and `name` included.
    pub fn property_names(&self) -> &'static [&'static str] {
        match self {
            NodeBody::Visual(_) => VISUAL_PROPERTIES,
            NodeBody::Default(_) => DEFAULT_PROPERTIES,
            _ => COMMON_PROPERTIES,
        }
    }

    fn visual(&self) -> Option<&VisualProps> {
        match self {
            NodeBody::Visual(visual) => Some(visual),
            NodeBody::Default(props) => Some(&props.visual),
            _ => None,
        }
    }

    fn visual_mut(&mut self) -> Option<&mut VisualProps> {
        match self {
            NodeBody::Visual(visual) => Some(visual),
            NodeBody::Default(props) => Some(&mut props.visual),
            _ => None,
        }
    }

    fn get(&self, name: &str) -> Option<PropertyValue> {
        if let Some(visual) = self.visual() {
            match name {
                names::COMMENT => return Some(PropertyValue::Text(visual.comment.clone())),
                names::DESCRIPTION => {
                    return Some(PropertyValue::Text(visual.description.clone()))
                }
                _ => {}
            }
        }
        let NodeBody::Default(props) = self else {
            return None;
        };
        let value = match name {
            names::LOCATION => props.location.into(),
            names::SIZE => props.size.into(),
            names::BACKGROUND => props.background.into(),
            names::FOREGROUND => props.foreground.into(),
            names::BORDER_STYLE => props.border_style.into(),
            names::SHAPE_STYLE => props.shape_style.into(),
            _ => return None,
        };
        Some(value)
    }

    /// Writes `value`; the caller has already checked that `name` exists and the
    /// value type matches.
    fn set(&mut self, name: &str, value: PropertyValue) {
        match (name, value) {
            (names::COMMENT, PropertyValue::Text(text)) => {
                if let Some(visual) = self.visual_mut() {
                    visual.comment = text;
                }
            }
            (names::DESCRIPTION, PropertyValue::Text(text)) => {
                if let Some(visual) = self.visual_mut() {
                    visual.description = text;
                }
            }
            (name, value) => {
                let NodeBody::Default(props) = self else {
                    return;
                };
                match (name, value) {
                    (names::LOCATION, PropertyValue::Point(v)) => props.location = v,
                    (names::SIZE, PropertyValue::Size(v)) => props.size = v,
                    (names::BACKGROUND, PropertyValue::Color(v)) => props.background = v,
                    (names::FOREGROUND, PropertyValue::Color(v)) => props.foreground = v,
                    (names::BORDER_STYLE, PropertyValue::Border(v)) => props.border_style = v,
                    (names::SHAPE_STYLE, PropertyValue::Shape(v)) => props.shape_style = v,
                    _ => {}
                }
            }
        }
    }
}

/// A node stored in the [`crate::Model`] arena.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) body: NodeBody,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) root_cache: Cell<Option<NodeId>>,
    pub(crate) observers: Vec<Weak<dyn NodeObserver>>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, body: NodeBody) -> Self {
        Self {
            id,
            name,
            body,
            parent: None,
            children: Vec::new(),
            root_cache: Cell::new(None),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.body.kind()
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn can_accept(&self, child: NodeKind) -> bool {
        self.kind().can_accept(child)
    }

    pub fn property_names(&self) -> &'static [&'static str] {
        self.body.property_names()
    }

    /// Resolves `name` to the static property name, if the node has it.
    pub(crate) fn resolve(&self, name: &str) -> Result<&'static str, ModelError> {
        self.property_names()
            .iter()
            .copied()
            .find(|candidate| *candidate == name)
            .ok_or_else(|| ModelError::PropertyNotFound {
                kind: self.kind(),
                name: name.to_string(),
            })
    }

    pub fn property(&self, name: &str) -> Result<PropertyValue, ModelError> {
        let name = self.resolve(name)?;
        let value = match name {
            names::ID => PropertyValue::Id(self.id),
            names::NAME => PropertyValue::Text(self.name.clone()),
            other => self.body.get(other).ok_or_else(|| ModelError::PropertyNotFound {
                kind: self.kind(),
                name: other.to_string(),
            })?,
        };
        Ok(value)
    }

    /// Validates a write of `value` to `name`. Returns the resolved name, or
    /// `None` when the stored value already equals `value`.
    pub(crate) fn check_write(
        &self,
        name: &str,
        value: &PropertyValue,
    ) -> Result<Option<&'static str>, ModelError> {
        let name = self.resolve(name)?;
        if name == names::ID {
            return Err(ModelError::ReadOnlyProperty { name });
        }
        let current = self.property(name)?;
        if std::mem::discriminant(&current) != std::mem::discriminant(value) {
            return Err(ModelError::TypeMismatch {
                name,
                expected: current.type_name(),
                found: value.type_name(),
            });
        }
        Ok((current != *value).then_some(name))
    }

    /// Stores a value already accepted by [`Node::check_write`].
    pub(crate) fn write_property(&mut self, name: &'static str, value: PropertyValue) {
        match (name, value) {
            (names::NAME, PropertyValue::Text(text)) => self.name = text,
            (other, value) => self.body.set(other, value),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("body", &self.body)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}
