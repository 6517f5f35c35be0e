use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const PREFERENCES_VERSION: u32 = 1;
const MAX_HISTORY_LIMIT: usize = 10_000;
const MIN_NODE_EXTENT: f64 = 16.0;
const MAX_NODE_EXTENT: f64 = 4096.0;

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub editor: EditorPreferences,
    #[serde(default)]
    pub canvas: CanvasPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            editor: EditorPreferences::default(),
            canvas: CanvasPreferences::default(),
        }
    }
}

impl Preferences {
    /// Replaces out-of-range or empty values with usable ones.
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.editor.sanitize();
        self.canvas.sanitize();
    }
}

/// Document and history behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorPreferences {
    /// Maximum undo depth; `0` keeps every step.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_slide_name")]
    pub new_slide_name: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

fn default_history_limit() -> usize {
    500
}

fn default_slide_name() -> String {
    "New Slide".to_string()
}

fn default_file_extension() -> String {
    ".cfl".to_string()
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            new_slide_name: default_slide_name(),
            file_extension: default_file_extension(),
        }
    }
}

impl EditorPreferences {
    fn sanitize(&mut self) {
        self.history_limit = self.history_limit.min(MAX_HISTORY_LIMIT);
        if self.new_slide_name.trim().is_empty() {
            self.new_slide_name = default_slide_name();
        }
        let extension = self.file_extension.trim().trim_start_matches('.');
        self.file_extension = if extension.is_empty() {
            default_file_extension()
        } else {
            format!(".{extension}")
        };
    }

    /// The document extension without its leading dot, as file pickers expect it.
    pub fn bare_extension(&self) -> &str {
        self.file_extension.trim_start_matches('.')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasPreferences {
    #[serde(default = "default_node_extent")]
    pub default_node_width: f64,
    #[serde(default = "default_node_extent")]
    pub default_node_height: f64,
    #[serde(default)]
    pub show_grid: bool,
}

fn default_node_extent() -> f64 {
    200.0
}

impl Default for CanvasPreferences {
    fn default() -> Self {
        Self {
            default_node_width: default_node_extent(),
            default_node_height: default_node_extent(),
            show_grid: false,
        }
    }
}

impl CanvasPreferences {
    fn sanitize(&mut self) {
        self.default_node_width = clamp_extent(self.default_node_width);
        self.default_node_height = clamp_extent(self.default_node_height);
    }
}

fn clamp_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_NODE_EXTENT, MAX_NODE_EXTENT)
    } else {
        default_node_extent()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PreferencesError> {
    let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PreferencesError> {
    ensure_parent(path)?;
    let payload = serde_json::to_vec_pretty(value).map_err(|source| PreferencesError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    let staging = path.with_extension("tmp");
    fs::write(&staging, &payload)
        .and_then(|()| fs::rename(&staging, path))
        .map_err(|source| PreferencesError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn ensure_parent(path: &Path) -> Result<(), PreferencesError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Preferences bound to the JSON file they are loaded from and saved to.
#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        let mut data = preferences;
        data.sanitize();
        Self {
            path: path.into(),
            data,
        }
    }

    /// Loads `path`, falling back to defaults when the file does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        let mut data = if path.exists() {
            read_json::<Preferences>(&path)?
        } else {
            debug!(path = %path.display(), "no preferences file, using defaults");
            Preferences::default()
        };
        data.sanitize();
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.data
    }

    pub fn update<F>(&mut self, op: F) -> Result<(), PreferencesError>
    where
        F: FnOnce(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    /// Writes through a sibling temporary file so a failed write never truncates
    /// the existing preferences.
    pub fn save(&self) -> Result<(), PreferencesError> {
        write_json(&self.path, &self.data)?;
        debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
