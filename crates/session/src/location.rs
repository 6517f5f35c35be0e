use std::path::{Path, PathBuf};

/// Where the current document lives on disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileLocation {
    pub directory: PathBuf,
    /// File name without its extension.
    pub filename: String,
    /// Extension including the leading dot, or empty.
    pub extension: String,
}

impl FileLocation {
    pub fn new(
        directory: impl Into<PathBuf>,
        filename: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            filename: filename.into(),
            extension: extension.into(),
        }
    }

    /// Splits `path` into directory, stem and dotted extension.
    pub fn from_path(path: &Path) -> Self {
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let filename = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self {
            directory,
            filename,
            extension,
        }
    }

    pub fn full_path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.filename.trim(), self.extension))
    }

    /// File name with extension, for titles and status messages.
    pub fn display_name(&self) -> String {
        format!("{}{}", self.filename, self.extension)
    }
}

/// Answer of the UI to a filename request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileResponse {
    pub cancel: bool,
    pub filename: String,
    pub directory: PathBuf,
    pub extension: String,
}

impl FileResponse {
    pub fn cancelled() -> Self {
        Self {
            cancel: true,
            ..Self::default()
        }
    }

    /// A confirmed response for `path`. A path without an extension gets
    /// `default_extension`.
    pub fn from_path(path: &Path, default_extension: &str) -> Self {
        let mut location = FileLocation::from_path(path);
        if location.extension.is_empty() {
            location.extension = default_extension.to_string();
        }
        Self {
            cancel: false,
            filename: location.filename,
            directory: location.directory,
            extension: location.extension,
        }
    }

    pub fn location(&self) -> FileLocation {
        FileLocation {
            directory: self.directory.clone(),
            filename: self.filename.clone(),
            extension: self.extension.clone(),
        }
    }
}

/// Answer of the UI when asked whether unsaved changes may be discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Confirmation {
    pub cancel: bool,
}

impl Confirmation {
    pub fn proceed() -> Self {
        Self { cancel: false }
    }

    pub fn cancel() -> Self {
        Self { cancel: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_round_trips_through_a_path() {
        let location = FileLocation::from_path(Path::new("/work/flows/login.cfl"));
        assert_eq!(location.directory, PathBuf::from("/work/flows"));
        assert_eq!(location.filename, "login");
        assert_eq!(location.extension, ".cfl");
        assert_eq!(location.full_path(), PathBuf::from("/work/flows/login.cfl"));
        assert_eq!(location.display_name(), "login.cfl");
    }

    #[test]
    fn response_fills_in_the_default_extension() {
        let response = FileResponse::from_path(Path::new("/tmp/untitled"), ".cfl");
        assert!(!response.cancel);
        assert_eq!(response.location().full_path(), PathBuf::from("/tmp/untitled.cfl"));
    }
}
