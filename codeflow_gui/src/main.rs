mod app;
mod canvas;
mod dialogs;

use std::env;
use std::path::PathBuf;

use codeflow_settings::{Preferences, PreferencesStore};
use eframe::{egui, NativeOptions};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::app::{CodeFlowApp, APP_TITLE};

const CONFIG_DIR_ENV: &str = "CODEFLOW_CONFIG_DIR";

fn preferences_path() -> PathBuf {
    env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".codeflow"))
        .join("preferences.json")
}

fn load_preferences() -> PreferencesStore {
    let path = preferences_path();
    match PreferencesStore::load(&path) {
        Ok(store) => store,
        Err(err) => {
            warn!(%err, "using default preferences");
            PreferencesStore::new(path, Preferences::default())
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let preferences = load_preferences();
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title(APP_TITLE),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |_cc| Box::new(CodeFlowApp::new(preferences))),
    )
}
