use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::color::ColorName;
use crate::types::Idea;

/// YAML front matter of a stored idea
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoteHeader {
    #[serde(skip_serializing_if = "is_default_color")]
    pub color: Option<ColorName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: String,
}

// White is what a note without a color looks like
fn is_default_color(color: &Option<ColorName>) -> bool {
    matches!(color, None | Some(ColorName::White))
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Render an idea as markdown with YAML front matter
pub fn render_note(idea: &Idea, header: &NoteHeader) -> Result<String> {
    let yaml_str = serde_yaml::to_string(header).context("Failed to serialize note header")?;

    let mut content = format!("---\n{}\n---\n\n", yaml_str.trim());
    if let Some(title) = &idea.title {
        content.push_str(&format!("# {}\n\n", title));
    }
    content.push_str(idea.body.trim_end());
    content.push('\n');

    Ok(content)
}

/// Lowercase ASCII words joined by dashes
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Directory of ideas saved as markdown files.
///
/// Files live under `<root>/<folder...>/<slug>.md`. Existing files are never
/// overwritten: a numeric suffix is added instead.
#[derive(Debug, Clone)]
pub struct NoteStore {
    root: PathBuf,
}

impl NoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path `save` would write to right now
    pub fn path_for(&self, idea: &Idea, folder: &[&str]) -> PathBuf {
        let dir = self.dir(folder);
        let stem = file_stem(idea);

        let free = candidates(&dir, &stem).find(|path| !path.exists());
        free.unwrap_or_else(|| dir.join(format!("{}.md", stem)))
    }

    pub fn save(&self, idea: &Idea, header: &NoteHeader, folder: &[&str]) -> Result<PathBuf> {
        let dir = self.dir(folder);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create note directory: {:?}", dir))?;

        let content = render_note(idea, header)?;
        let stem = file_stem(idea);

        for path in candidates(&dir, &stem) {
            let file = OpenOptions::new().write(true).create_new(true).open(&path);
            match file {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())
                        .with_context(|| format!("Failed to write note: {:?}", path))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create note: {:?}", path));
                }
            }
        }

        anyhow::bail!("No free file name for note '{}' in {:?}", stem, dir)
    }

    fn dir(&self, folder: &[&str]) -> PathBuf {
        folder.iter().fold(self.root.clone(), |dir, part| dir.join(part))
    }
}

fn file_stem(idea: &Idea) -> String {
    let slug = slugify(idea.headline());
    if slug.is_empty() {
        "idea".to_string()
    } else {
        slug
    }
}

fn candidates<'a>(dir: &'a Path, stem: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
    std::iter::once(dir.join(format!("{}.md", stem)))
        .chain((2..1000).map(move |n| dir.join(format!("{}-{}.md", stem, n))))
}
