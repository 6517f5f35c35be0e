use std::f32::consts::TAU;

use codeflow_model::{names, BorderStyle, NodeId, Point, PropertyValue, Rgba, ShapeStyle};
use codeflow_view::{ChildView, NodeView};
use egui::{vec2, Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

const GRID_SPACING: f32 = 20.0;
const ELLIPSE_SEGMENTS: usize = 48;
const CORNER_RADIUS: f32 = 8.0;
const SELECTION_COLOR: Color32 = Color32::from_rgb(0x2f, 0x80, 0xed);

/// A node view resolved to screen space for one frame.
#[derive(Debug, Clone)]
pub struct Placed {
    pub node: NodeId,
    pub rect: Rect,
    pub name: String,
    pub shape: ShapeStyle,
    pub border: BorderStyle,
    pub background: Color32,
    pub foreground: Color32,
}

/// A node being dragged; the model is only written when the drag ends.
#[derive(Debug, Clone, Copy)]
pub struct Drag {
    pub node: NodeId,
    pub from: Point,
    pub offset: Vec2,
}

impl Drag {
    pub fn target(&self) -> Point {
        Point::new(
            self.from.x + f64::from(self.offset.x),
            self.from.y + f64::from(self.offset.y),
        )
    }
}

/// Lays out the visual children of `slide`, parents before children. Child
/// locations are relative to their parent's top-left corner.
pub fn layout(slide: &NodeView, origin: Pos2, drag: Option<&Drag>) -> Vec<Placed> {
    let mut placed = Vec::new();
    place_children(&slide.children(), origin, drag, &mut placed);
    placed
}

fn place_children(children: &[ChildView], origin: Pos2, drag: Option<&Drag>, out: &mut Vec<Placed>) {
    for child in children {
        let view = &child.view;
        let mut min = origin + to_vec(child.location);
        if let Some(drag) = drag.filter(|drag| drag.node == view.model_id()) {
            min += drag.offset;
        }
        let size = view
            .visual(names::SIZE)
            .and_then(|value| value.as_size())
            .map(|size| vec2(size.width as f32, size.height as f32))
            .unwrap_or(Vec2::ZERO);

        out.push(Placed {
            node: view.model_id(),
            rect: Rect::from_min_size(min, size),
            name: view.name(),
            shape: match view.visual(names::SHAPE_STYLE) {
                Some(PropertyValue::Shape(shape)) => shape,
                _ => ShapeStyle::default(),
            },
            border: match view.visual(names::BORDER_STYLE) {
                Some(PropertyValue::Border(border)) => border,
                _ => BorderStyle::default(),
            },
            background: color(view, names::BACKGROUND, Rgba::WHITE),
            foreground: color(view, names::FOREGROUND, Rgba::BLACK),
        });
        place_children(&view.children(), min, drag, out);
    }
}

fn to_vec(point: Point) -> Vec2 {
    vec2(point.x as f32, point.y as f32)
}

fn color(view: &NodeView, name: &str, fallback: Rgba) -> Color32 {
    let rgba = view
        .visual(name)
        .and_then(|value| value.as_color())
        .unwrap_or(fallback);
    Color32::from_rgba_unmultiplied(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Topmost placed node under `pos`.
pub fn hit(placed: &[Placed], pos: Pos2) -> Option<NodeId> {
    placed
        .iter()
        .rev()
        .find(|item| item.rect.contains(pos))
        .map(|item| item.node)
}

pub fn paint_grid(painter: &Painter, rect: Rect) {
    let stroke = Stroke::new(1.0, Color32::from_gray(230));
    let mut x = rect.left();
    while x <= rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += GRID_SPACING;
    }
    let mut y = rect.top();
    while y <= rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += GRID_SPACING;
    }
}

pub fn paint(painter: &Painter, placed: &[Placed], selected: Option<NodeId>) {
    for item in placed {
        paint_node(painter, item);
        if selected == Some(item.node) {
            painter.rect_stroke(item.rect.expand(3.0), 2.0, Stroke::new(2.0, SELECTION_COLOR));
        }
    }
}

fn paint_node(painter: &Painter, item: &Placed) {
    let stroke = Stroke::new(1.5, item.foreground);
    match item.shape {
        ShapeStyle::Rectangle => {
            painter.rect_filled(item.rect, 0.0, item.background);
        }
        ShapeStyle::RoundedRectangle => {
            painter.rect_filled(item.rect, CORNER_RADIUS, item.background);
        }
        ShapeStyle::Ellipse | ShapeStyle::Diamond => {
            painter.add(Shape::convex_polygon(
                outline(item),
                item.background,
                Stroke::NONE,
            ));
        }
    }

    match item.border {
        BorderStyle::None => {}
        BorderStyle::Solid if item.shape == ShapeStyle::RoundedRectangle => {
            painter.rect_stroke(item.rect, CORNER_RADIUS, stroke);
        }
        BorderStyle::Solid => {
            painter.add(Shape::closed_line(outline(item), stroke));
        }
        BorderStyle::Dashed => {
            painter.extend(Shape::dashed_line(&closed(outline(item)), stroke, 6.0, 4.0));
        }
        BorderStyle::Dotted => {
            painter.extend(Shape::dashed_line(&closed(outline(item)), stroke, 1.5, 3.0));
        }
    }

    painter.text(
        item.rect.left_top() + vec2(6.0, 4.0),
        Align2::LEFT_TOP,
        &item.name,
        FontId::proportional(13.0),
        item.foreground,
    );
}

fn outline(item: &Placed) -> Vec<Pos2> {
    let rect = item.rect;
    match item.shape {
        ShapeStyle::Rectangle | ShapeStyle::RoundedRectangle => vec![
            rect.left_top(),
            rect.right_top(),
            rect.right_bottom(),
            rect.left_bottom(),
        ],
        ShapeStyle::Diamond => vec![
            rect.center_top(),
            rect.right_center(),
            rect.center_bottom(),
            rect.left_center(),
        ],
        ShapeStyle::Ellipse => {
            let center = rect.center();
            let radii = rect.size() / 2.0;
            (0..ELLIPSE_SEGMENTS)
                .map(|step| {
                    let angle = TAU * step as f32 / ELLIPSE_SEGMENTS as f32;
                    center + vec2(radii.x * angle.cos(), radii.y * angle.sin())
                })
                .collect()
        }
    }
}

fn closed(mut points: Vec<Pos2>) -> Vec<Pos2> {
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}
