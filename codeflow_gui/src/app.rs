use std::cell::Cell;
use std::rc::Rc;

use codeflow_model::{names, NodeId, Point, PropertyValue};
use codeflow_session::{Editor, JsonFileStore, SessionError};
use codeflow_settings::PreferencesStore;
use eframe::{App, Frame};
use egui::{Key, Sense, Vec2};
use tracing::{info, warn};

use crate::canvas::{self, Drag};
use crate::dialogs;

pub const APP_TITLE: &str = "CodeFlow";

/// Editable text properties of the selected node.
struct PropertyForm {
    node: NodeId,
    fields: Vec<(&'static str, String)>,
}

pub struct CodeFlowApp {
    editor: Editor<JsonFileStore>,
    preferences: PreferencesStore,
    selected: Rc<Cell<Option<NodeId>>>,
    form: Option<PropertyForm>,
    drag: Option<Drag>,
    menu_anchor: Option<Vec2>,
    status: String,
    title: String,
}

impl CodeFlowApp {
    pub fn new(preferences: PreferencesStore) -> Self {
        let mut editor = Editor::new(JsonFileStore::new(), preferences.preferences().clone());
        let selected = Rc::new(Cell::new(None));
        dialogs::install(
            &mut editor.context.hub,
            &preferences.preferences().editor.file_extension,
            Rc::clone(&selected),
        );
        Self {
            editor,
            preferences,
            selected,
            form: None,
            drag: None,
            menu_anchor: None,
            status: "Ready".to_string(),
            title: String::new(),
        }
    }

    /// Runs an editor action, reporting a failure in the status line.
    fn run<T>(
        &mut self,
        label: &str,
        action: impl FnOnce(&mut Editor<JsonFileStore>) -> Result<T, SessionError>,
    ) -> Option<T> {
        match action(&mut self.editor) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(action = label, %err, "editor action failed");
                self.status = format!("{label} failed: {err}");
                None
            }
        }
    }

    fn file_command(
        &mut self,
        label: &str,
        done: &str,
        action: impl FnOnce(&mut Editor<JsonFileStore>) -> Result<bool, SessionError>,
    ) {
        if let Some(completed) = self.run(label, action) {
            self.status = if completed {
                info!(action = label, "file command completed");
                done.to_string()
            } else {
                format!("{label} cancelled")
            };
        }
    }

    fn document_name(&self) -> String {
        self.editor
            .files
            .location()
            .map(|location| location.display_name())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = match self.editor.files.document() {
            Some(_) => {
                let marker = if self.editor.is_dirty() { "*" } else { "" };
                format!("{}{marker} - {APP_TITLE}", self.document_name())
            }
            None => APP_TITLE.to_string(),
        };
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (undo, redo, save, delete) = ctx.input(|input| {
            let command = input.modifiers.command;
            (
                command && !input.modifiers.shift && input.key_pressed(Key::Z),
                command
                    && (input.key_pressed(Key::Y)
                        || (input.modifiers.shift && input.key_pressed(Key::Z))),
                command && input.key_pressed(Key::S),
                input.key_pressed(Key::Delete),
            )
        });
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if save && self.editor.files.can_save(&self.editor.context) {
            self.file_command("Save", "Saved", Editor::save);
        }
        if delete {
            self.delete_selected();
        }
    }

    // The property form is reloaded from the model on the next frame.
    fn undo(&mut self) {
        self.run("Undo", Editor::undo);
        self.form = None;
    }

    fn redo(&mut self) {
        self.run("Redo", Editor::redo);
        self.form = None;
    }

    fn delete_selected(&mut self) {
        if let Some(node) = self.selected.take() {
            if self.run("Delete", |editor| editor.delete_node(node)).is_some() {
                self.status = "Node deleted".to_string();
            }
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.file_command("New", "Created new document", Editor::new_file);
                        ui.close_menu();
                    }
                    if ui.button("Open...").clicked() {
                        self.file_command("Open", "Opened document", Editor::open);
                        ui.close_menu();
                    }
                    let can_save = self.editor.files.can_save(&self.editor.context);
                    if ui.add_enabled(can_save, egui::Button::new("Save")).clicked() {
                        self.file_command("Save", "Saved", Editor::save);
                        ui.close_menu();
                    }
                    let can_save_as = self.editor.files.can_save_as();
                    if ui.add_enabled(can_save_as, egui::Button::new("Save As...")).clicked() {
                        self.file_command("Save As", "Saved", Editor::save_as);
                        ui.close_menu();
                    }
                    let can_close = self.editor.files.can_close();
                    if ui.add_enabled(can_close, egui::Button::new("Close")).clicked() {
                        self.file_command("Close", "Closed document", Editor::close);
                        self.form = None;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Edit", |ui| {
                    let can_undo = self.editor.can_undo();
                    if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                        self.undo();
                        ui.close_menu();
                    }
                    let can_redo = self.editor.can_redo();
                    if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                        self.redo();
                        ui.close_menu();
                    }
                    ui.separator();
                    let has_selection = self.selected.get().is_some();
                    if ui.add_enabled(has_selection, egui::Button::new("Delete")).clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }
                });
                ui.menu_button("View", |ui| {
                    let mut show_grid = self.preferences.preferences().canvas.show_grid;
                    if ui.checkbox(&mut show_grid, "Show grid").changed() {
                        if let Err(err) = self
                            .preferences
                            .update(|prefs| prefs.canvas.show_grid = show_grid)
                        {
                            warn!(%err, "failed to save preferences");
                            self.status = format!("Preferences not saved: {err}");
                        }
                    }
                });
            });
        });
    }

    fn show_slide_list(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("slides")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| {
                ui.heading("Slides");
                ui.separator();
                let Some(document) = self.editor.files.document() else {
                    ui.label("No document");
                    return;
                };
                let model = &self.editor.context.model;
                let slides: Vec<(NodeId, String)> = model
                    .children(document)
                    .map(|children| {
                        children
                            .iter()
                            .filter_map(|id| model.node(*id))
                            .map(|node| (node.id(), node.name().to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                let current = self.editor.context.current_slide_id();

                for (slide, name) in slides {
                    if ui.selectable_label(current == Some(slide), name).clicked()
                        && current != Some(slide)
                    {
                        self.run("Select slide", |editor| editor.select_slide(slide));
                    }
                }
                ui.separator();
                if ui.button("Add slide").clicked() {
                    let name = self.editor.context.preferences().editor.new_slide_name.clone();
                    if let Some(slide) = self.run("Add slide", |editor| editor.add_slide(name)) {
                        self.run("Select slide", |editor| editor.select_slide(slide));
                    }
                }
            });
    }

    fn show_properties(&mut self, ctx: &egui::Context) {
        let selected = self.selected.get();
        if self.form.as_ref().map(|form| form.node) != selected {
            self.form = selected.and_then(|node| self.load_form(node));
        }

        egui::SidePanel::right("properties")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Properties");
                ui.separator();
                let Some(form) = self.form.as_mut() else {
                    ui.label("Nothing selected");
                    return;
                };
                let node = form.node;
                let mut commits = Vec::new();
                egui::Grid::new("property_grid").num_columns(2).show(ui, |ui| {
                    for (name, text) in form.fields.iter_mut() {
                        ui.label(*name);
                        if ui.text_edit_singleline(text).lost_focus() {
                            commits.push((*name, text.clone()));
                        }
                        ui.end_row();
                    }
                });
                let model = &self.editor.context.model;
                if let Ok(property_names) = model.property_names(node) {
                    for name in property_names.iter().filter(|name| !is_text(model, node, name)) {
                        if let Ok(value) = model.property(node, name) {
                            ui.label(format!("{name}: {value}"));
                        }
                    }
                }
                for (name, text) in commits {
                    self.run("Edit property", |editor| editor.set_property(node, name, text));
                }
            });
    }

    fn load_form(&self, node: NodeId) -> Option<PropertyForm> {
        let model = &self.editor.context.model;
        let fields = model
            .property_names(node)
            .ok()?
            .iter()
            .filter_map(|name| match model.property(node, name) {
                Ok(PropertyValue::Text(text)) => Some((*name, text)),
                _ => None,
            })
            .collect();
        Some(PropertyForm { node, fields })
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .resizable(false)
            .exact_height(24.0)
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(&self.status);
                    ui.separator();
                    if self.editor.files.document().is_some() {
                        ui.label(self.document_name());
                        if self.editor.is_dirty() {
                            ui.label("modified");
                        }
                    }
                });
            });
    }

    fn show_canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(248)))
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
                let origin = response.rect.min;
                let Some(slide) = self.editor.context.current_slide().cloned() else {
                    painter.text(
                        response.rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Use File > New or File > Open to start",
                        egui::FontId::proportional(16.0),
                        egui::Color32::GRAY,
                    );
                    return;
                };

                if self.preferences.preferences().canvas.show_grid {
                    canvas::paint_grid(&painter, response.rect);
                }
                let placed = canvas::layout(&slide, origin, self.drag.as_ref());
                canvas::paint(&painter, &placed, self.selected.get());

                let pointer = response.interact_pointer_pos();
                if response.drag_started() {
                    self.drag = pointer
                        .and_then(|pos| canvas::hit(&placed, pos))
                        .and_then(|node| {
                            let from = self
                                .editor
                                .context
                                .model
                                .property(node, names::LOCATION)
                                .ok()?
                                .as_point()?;
                            Some(Drag {
                                node,
                                from,
                                offset: Vec2::ZERO,
                            })
                        });
                }
                if response.dragged() {
                    if let Some(drag) = self.drag.as_mut() {
                        drag.offset += response.drag_delta();
                    }
                }
                if response.drag_released() {
                    if let Some(drag) = self.drag.take() {
                        if drag.offset != Vec2::ZERO {
                            let target = drag.target();
                            self.run("Move", |editor| editor.move_node(drag.node, target));
                        }
                    }
                }
                if response.clicked() {
                    match pointer.and_then(|pos| canvas::hit(&placed, pos)) {
                        Some(node) => {
                            self.run("Select", |editor| editor.select_node(node));
                        }
                        None => self.selected.set(None),
                    }
                }
                if response.secondary_clicked() {
                    self.menu_anchor = pointer.map(|pos| pos - origin);
                }

                let anchor = self.menu_anchor.unwrap_or(Vec2::ZERO);
                response.context_menu(|ui| {
                    if ui.button("Add node").clicked() {
                        let location = Point::new(f64::from(anchor.x), f64::from(anchor.y));
                        if let Some(node) = self.run("Add node", |editor| editor.add_node(location)) {
                            self.run("Select", |editor| editor.select_node(node));
                        }
                        ui.close_menu();
                    }
                    let has_selection = self.selected.get().is_some();
                    if ui.add_enabled(has_selection, egui::Button::new("Delete node")).clicked() {
                        self.delete_selected();
                        ui.close_menu();
                    }
                });
            });
    }
}

fn is_text(model: &codeflow_model::Model, node: NodeId, name: &str) -> bool {
    matches!(model.property(node, name), Ok(PropertyValue::Text(_)))
}

impl App for CodeFlowApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.handle_shortcuts(ctx);
        self.show_menu_bar(ctx);
        self.show_slide_list(ctx);
        self.show_properties(ctx);
        self.show_status_bar(ctx);
        self.show_canvas(ctx);
        self.update_title(ctx);
    }
}
