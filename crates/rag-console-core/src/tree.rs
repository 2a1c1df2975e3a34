//! Folder-structure tree returned by folder ingestion.
//!
//! The backend describes the directory layout of an ingested archive as a
//! JSON object where every key is a subfolder name, except the reserved key
//! `"files"`, which lists the filenames directly inside that folder:
//!
//! ```json
//! { "src": { "files": ["a.py", "b.py"] }, "files": ["readme.md"] }
//! ```
//!
//! [`FolderNode`] models each object as an ordered list of [`FolderEntry`]
//! values so the reserved-key convention is part of the type. Decoding keeps
//! the key order of the response, allows at most one `"files"` entry per
//! node, and rejects a `"files"` value that is not a list of names.
//!
//! [`render`] flattens a tree into [`TreeLine`]s using an explicit stack, so
//! arbitrarily deep trees render without recursion. Counting and dropping a
//! tree are iterative as well.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

/// Reserved key holding the files of a folder.
pub const FILES_KEY: &str = "files";

/// One folder: its file list (if any) and its subfolders, in received order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderNode {
    entries: Vec<FolderEntry>,
}

/// A single entry of a [`FolderNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderEntry {
    /// The reserved `"files"` entry: leaf filenames.
    Files(Vec<String>),
    /// A named subfolder.
    Folder { name: String, node: FolderNode },
}

impl FolderNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[FolderEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filenames directly inside this folder.
    pub fn files(&self) -> &[String] {
        self.entries
            .iter()
            .find_map(|e| match e {
                FolderEntry::Files(files) => Some(files.as_slice()),
                FolderEntry::Folder { .. } => None,
            })
            .unwrap_or(&[])
    }

    /// Subfolder by name.
    pub fn folder(&self, name: &str) -> Option<&FolderNode> {
        self.entries.iter().find_map(|e| match e {
            FolderEntry::Folder { name: n, node } if n == name => Some(node),
            _ => None,
        })
    }

    /// Set the file list, replacing an existing one in place.
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files: Vec<String> = files.into_iter().map(Into::into).collect();
        match self
            .entries
            .iter_mut()
            .find(|e| matches!(e, FolderEntry::Files(_)))
        {
            Some(existing) => *existing = FolderEntry::Files(files),
            None => self.entries.push(FolderEntry::Files(files)),
        }
        self
    }

    /// Append a subfolder.
    pub fn with_folder(mut self, name: impl Into<String>, node: FolderNode) -> Self {
        self.entries.push(FolderEntry::Folder {
            name: name.into(),
            node,
        });
        self
    }

    /// Total number of files in this folder and all subfolders.
    pub fn file_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            for entry in &node.entries {
                match entry {
                    FolderEntry::Files(files) => count += files.len(),
                    FolderEntry::Folder { node, .. } => pending.push(node),
                }
            }
        }
        count
    }
}

// Dropping is iterative too, so a deep tree cannot overflow the stack on drop.
impl Drop for FolderNode {
    fn drop(&mut self) {
        fn detach(entries: &mut Vec<FolderEntry>, pending: &mut Vec<FolderNode>) {
            for entry in entries.drain(..) {
                if let FolderEntry::Folder { node, .. } = entry {
                    pending.push(node);
                }
            }
        }

        let mut pending = Vec::new();
        detach(&mut self.entries, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach(&mut node.entries, &mut pending);
        }
    }
}

// ============ Rendering ============

/// What a rendered line shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Subfolder label; its contents follow at `depth + 1`.
    Folder(String),
    /// Leaf filename.
    File(String),
}

/// One line of a rendered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Depth of the folder this line belongs to.
    pub depth: usize,
    pub kind: LineKind,
}

/// Flatten `node` into display lines, starting at `depth`.
///
/// Entries are visited in received order. A `"files"` entry yields one
/// [`LineKind::File`] per name at the node's depth; a subfolder yields a
/// [`LineKind::Folder`] label at the node's depth followed by its own
/// contents at `depth + 1`. An empty node renders nothing.
pub fn render(node: &FolderNode, depth: usize) -> Vec<TreeLine> {
    let mut lines = Vec::new();
    let mut stack = vec![(node.entries.iter(), depth)];

    while let Some((iter, d)) = stack.last_mut() {
        let d = *d;
        match iter.next() {
            None => {
                stack.pop();
            }
            Some(FolderEntry::Files(files)) => {
                lines.extend(files.iter().map(|f| TreeLine {
                    depth: d,
                    kind: LineKind::File(f.clone()),
                }));
            }
            Some(FolderEntry::Folder { name, node }) => {
                lines.push(TreeLine {
                    depth: d,
                    kind: LineKind::Folder(name.clone()),
                });
                stack.push((node.entries.iter(), d + 1));
            }
        }
    }

    lines
}

/// Render `node` as indented text: folders end in `/`, two spaces per level.
pub fn render_text(node: &FolderNode) -> String {
    let mut out = String::new();
    for line in render(node, 0) {
        for _ in 0..line.depth {
            out.push_str("  ");
        }
        match line.kind {
            LineKind::Folder(name) => {
                out.push_str(&name);
                out.push('/');
            }
            LineKind::File(name) => out.push_str(&name),
        }
        out.push('\n');
    }
    out
}

// ============ Serde ============

impl Serialize for FolderNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry {
                FolderEntry::Files(files) => map.serialize_entry(FILES_KEY, files)?,
                FolderEntry::Folder { name, node } => map.serialize_entry(name, node)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FolderNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FolderNodeVisitor)
    }
}

struct FolderNodeVisitor;

impl<'de> Visitor<'de> for FolderNodeVisitor {
    type Value = FolderNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a folder object mapping subfolder names to folders and \"files\" to a list of names")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FolderNode, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let mut seen_files = false;
        let mut seen_folders = HashSet::new();

        while let Some(key) = map.next_key::<String>()? {
            if key == FILES_KEY {
                if seen_files {
                    return Err(de::Error::duplicate_field(FILES_KEY));
                }
                seen_files = true;
                let files: Vec<String> = map.next_value()?;
                entries.push(FolderEntry::Files(files));
            } else {
                if !seen_folders.insert(key.clone()) {
                    return Err(de::Error::custom(format!("duplicate folder `{}`", key)));
                }
                let node: FolderNode = map.next_value()?;
                entries.push(FolderEntry::Folder { name: key, node });
            }
        }

        Ok(FolderNode { entries })
    }
}
