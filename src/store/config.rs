//! Store configuration

/// Configuration for a file-backed [`Store`](super::Store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Number of spaces per indentation level in the written file.
    pub indent: usize,
    /// Whether missing parent directories are created on save.
    pub create_parent_dirs: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            indent: 4,
            create_parent_dirs: false,
        }
    }
}

impl StoreConfig {
    /// Create config that writes with the given indent width.
    pub fn with_indent(indent: usize) -> Self {
        Self {
            indent,
            ..Self::default()
        }
    }

    /// Create config that creates missing parent directories on save.
    pub fn creating_dirs() -> Self {
        Self {
            create_parent_dirs: true,
            ..Self::default()
        }
    }

    /// Indentation bytes handed to the JSON formatter.
    pub(crate) fn indent_bytes(&self) -> Vec<u8> {
        vec![b' '; self.indent]
    }
}
