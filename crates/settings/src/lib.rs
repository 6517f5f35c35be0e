//! Editor configuration for CodeFlow.

pub mod preferences;

pub use preferences::{
    CanvasPreferences, EditorPreferences, Preferences, PreferencesError, PreferencesStore,
};
