use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Property names understood by [`crate::Model::property`] and
/// [`crate::Model::set_property`].
pub mod names {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const COMMENT: &str = "comment";
    pub const DESCRIPTION: &str = "description";
    pub const LOCATION: &str = "location";
    pub const SIZE: &str = "size";
    pub const BACKGROUND: &str = "background";
    pub const FOREGROUND: &str = "foreground";
    pub const BORDER_STYLE: &str = "border_style";
    pub const SHAPE_STYLE: &str = "shape_style";
}

/// Properties that are readable by name but must never be captured in a memento.
const MEMENTO_IGNORED: &[&str] = &[names::ID];

/// Returns `true` when `name` is excluded from snapshot/restore.
pub fn is_ignored(name: &str) -> bool {
    MEMENTO_IGNORED.contains(&name)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeStyle {
    #[default]
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Diamond,
}

/// A property value read from or written to a node by name.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Id(NodeId),
    Text(String),
    Point(Point),
    Size(Size),
    Color(Rgba),
    Border(BorderStyle),
    Shape(ShapeStyle),
}

impl PropertyValue {
    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Id(_) => "id",
            PropertyValue::Text(_) => "text",
            PropertyValue::Point(_) => "point",
            PropertyValue::Size(_) => "size",
            PropertyValue::Color(_) => "color",
            PropertyValue::Border(_) => "border style",
            PropertyValue::Shape(_) => "shape style",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            PropertyValue::Point(point) => Some(*point),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<Size> {
        match self {
            PropertyValue::Size(size) => Some(*size),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            PropertyValue::Color(color) => Some(*color),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Id(id) => write!(f, "{id}"),
            PropertyValue::Text(text) => write!(f, "{text:?}"),
            PropertyValue::Point(p) => write!(f, "({}, {})", p.x, p.y),
            PropertyValue::Size(s) => write!(f, "{}x{}", s.width, s.height),
            PropertyValue::Color(c) => write!(f, "#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a),
            PropertyValue::Border(b) => write!(f, "{b:?}"),
            PropertyValue::Shape(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<NodeId> for PropertyValue {
    fn from(value: NodeId) -> Self {
        PropertyValue::Id(value)
    }
}

impl From<Point> for PropertyValue {
    fn from(value: Point) -> Self {
        PropertyValue::Point(value)
    }
}

impl From<Size> for PropertyValue {
    fn from(value: Size) -> Self {
        PropertyValue::Size(value)
    }
}

impl From<Rgba> for PropertyValue {
    fn from(value: Rgba) -> Self {
        PropertyValue::Color(value)
    }
}

impl From<BorderStyle> for PropertyValue {
    fn from(value: BorderStyle) -> Self {
        PropertyValue::Border(value)
    }
}

impl From<ShapeStyle> for PropertyValue {
    fn from(value: ShapeStyle) -> Self {
        PropertyValue::Shape(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_identity_is_ignored() {
        assert!(is_ignored(names::ID));
        assert!(!is_ignored(names::NAME));
        assert!(!is_ignored(names::LOCATION));
    }

    #[test]
    fn typed_accessors_reject_other_variants() {
        let value = PropertyValue::from(Point::new(1.0, 2.0));
        assert_eq!(value.as_point(), Some(Point::new(1.0, 2.0)));
        assert_eq!(value.as_size(), None);
        assert_eq!(value.type_name(), "point");
    }

    #[test]
    fn color_display_is_hex() {
        let value = PropertyValue::from(Rgba::opaque(0x12, 0xab, 0x00));
        assert_eq!(value.to_string(), "#12ab00ff");
    }
}
