//! Line-preserving `.env` store used to persist a freshly entered key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A `.env` file held as lines so rewriting keeps comments and ordering.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<String>,
}

impl EnvFile {
    /// Load `path`. A missing file is treated as empty.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lines = match fs::read_to_string(&path) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, lines })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lines
            .iter()
            .filter_map(|line| parse_line(line))
            .filter(|(key, _)| *key == name)
            .last()
            .map(|(_, value)| value)
    }

    /// Replace every `NAME=...` assignment, or append one if absent.
    pub fn upsert(&mut self, name: &str, value: &str) {
        let assignment = format!("{}={}", name, value);
        let mut found = false;
        for line in self.lines.iter_mut() {
            if matches!(parse_line(line), Some((key, _)) if key == name) {
                *line = assignment.clone();
                found = true;
            }
        }
        if !found {
            self.lines.push(assignment);
        }
    }

    pub fn save(&self) -> io::Result<()> {
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&self.path, content)
    }
}

fn parse_line(line: &str) -> Option<(&str, String)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    let (key, value) = trimmed.split_once('=')?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((key.trim(), value.to_string()))
}
