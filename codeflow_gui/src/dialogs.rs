use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use codeflow_model::NodeId;
use codeflow_session::{Confirmation, FileResponse, UiHub};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

/// Answers the session's requests with native dialogs and mirrors its
/// notifications into state the frame loop reads.
pub fn install(hub: &mut UiHub, extension: &str, selection: Rc<Cell<Option<NodeId>>>) {
    hub.on_confirm_discard(|| {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Unsaved changes")
            .set_description("The document has unsaved changes. Discard them?")
            .set_buttons(MessageButtons::YesNo)
            .show();
        if matches!(answer, MessageDialogResult::Yes) {
            Confirmation::proceed()
        } else {
            Confirmation::cancel()
        }
    });

    let ext = extension.to_string();
    hub.on_open_filename(move || respond(file_dialog(&ext).pick_file(), &ext));
    let ext = extension.to_string();
    hub.on_save_filename(move || respond(file_dialog(&ext).save_file(), &ext));
    let ext = extension.to_string();
    hub.on_save_as_filename(move || respond(file_dialog(&ext).save_file(), &ext));

    let selected = Rc::clone(&selection);
    hub.on_slide_selected(move |_| selected.set(None));
    let selected = Rc::clone(&selection);
    hub.on_detach_slide(move |_| selected.set(None));
    hub.on_node_selected(move |node| selection.set(Some(node)));
}

fn file_dialog(extension: &str) -> FileDialog {
    FileDialog::new()
        .add_filter("CodeFlow document", &[extension.trim_start_matches('.')])
        .add_filter("All Files", &["*"])
}

fn respond(path: Option<PathBuf>, extension: &str) -> FileResponse {
    match path {
        Some(path) => FileResponse::from_path(&path, extension),
        None => FileResponse::cancelled(),
    }
}
