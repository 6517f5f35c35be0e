use std::rc::Rc;

use codeflow_history::{HistoryController, Memento};
use codeflow_model::{
    names, BorderStyle, DefaultProps, Model, NodeBody, NodeId, Point, PropertyValue,
};

fn setup() -> (Model, Rc<HistoryController>, NodeId, NodeId) {
    let mut model = Model::new();
    let slide = model.create("slide", NodeBody::Slide);
    let node = model.create("box", NodeBody::Default(DefaultProps::default()));
    model.add_child(slide, node).expect("attach");
    let history = Rc::new(HistoryController::new());
    history
        .track_subtree(&mut model, slide)
        .expect("track slide");
    (model, history, slide, node)
}

fn location(model: &Model, node: NodeId) -> Point {
    model
        .property(node, names::LOCATION)
        .expect("location")
        .as_point()
        .expect("point value")
}

#[test]
fn three_writes_undo_to_original_and_redo_to_final() {
    let (mut model, history, _, node) = setup();
    let path = [
        Point::new(10.0, 0.0),
        Point::new(20.0, 5.0),
        Point::new(30.0, 10.0),
    ];
    for point in path {
        model
            .set_property(node, names::LOCATION, point)
            .expect("move");
    }

    for _ in 0..path.len() {
        assert!(history.undo(&mut model).expect("undo"));
    }
    assert_eq!(location(&model, node), Point::default());
    assert!(!history.can_undo());

    for _ in 0..path.len() {
        assert!(history.redo(&mut model).expect("redo"));
    }
    assert_eq!(location(&model, node), Point::new(30.0, 10.0));
    assert!(!history.can_redo());
}

#[test]
fn undo_steps_back_through_each_intermediate_value() {
    let (mut model, history, _, node) = setup();
    for x in [1.0, 2.0, 3.0] {
        model
            .set_property(node, names::LOCATION, Point::new(x, x))
            .expect("move");
    }
    history.undo(&mut model).expect("undo");
    assert_eq!(location(&model, node), Point::new(2.0, 2.0));
    history.undo(&mut model).expect("undo");
    assert_eq!(location(&model, node), Point::new(1.0, 1.0));
    history.redo(&mut model).expect("redo");
    assert_eq!(location(&model, node), Point::new(2.0, 2.0));
}

#[test]
fn a_new_edit_after_undo_clears_redo() {
    let (mut model, history, slide, node) = setup();
    model
        .set_property(node, names::BORDER_STYLE, BorderStyle::Dotted)
        .expect("border");
    model.set_property(slide, names::NAME, "intro").expect("rename");
    history.undo(&mut model).expect("undo");
    assert!(history.can_redo());

    model
        .set_property(node, names::COMMENT, "fresh edit")
        .expect("comment");
    assert!(!history.can_redo());
    assert!(!history.redo(&mut model).expect("redo on empty stack"));
    assert_eq!(
        model.property(slide, names::NAME).expect("name"),
        PropertyValue::Text("slide".into())
    );
}

#[test]
fn untracked_nodes_are_not_recorded() {
    let (mut model, history, slide, _) = setup();
    let loose = model.create("loose", NodeBody::Default(DefaultProps::default()));
    model.add_child(slide, loose).expect("attach");
    model.set_property(loose, names::NAME, "ignored").expect("rename");
    assert_eq!(history.undo_depth(), 0);

    history.track(&mut model, loose).expect("track");
    model.set_property(loose, names::NAME, "recorded").expect("rename");
    assert_eq!(history.undo_depth(), 1);
}

#[test]
fn memento_round_trip_restores_captured_value() {
    let (mut model, _, _, node) = setup();
    let memento = Memento::capture_all(&model, node).expect("capture");
    model
        .set_property(node, names::LOCATION, Point::new(99.0, 99.0))
        .expect("move");
    model
        .set_property(node, names::DESCRIPTION, "changed")
        .expect("describe");

    memento.restore(&mut model).expect("restore");
    for name in memento.names() {
        assert_eq!(
            Some(&model.property(node, name).expect("property")),
            memento.value(name),
            "{name}"
        );
    }
}

#[test]
fn dropping_the_controller_stops_recording() {
    let (mut model, history, slide, _) = setup();
    drop(history);
    assert_eq!(model.observer_count(slide), 0);
    model.set_property(slide, names::NAME, "no history").expect("rename");
}
