use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle to a paragraph inside a host document. Handles stay valid
/// across deletions of other paragraphs; a handle to a deleted paragraph
/// simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParaId(u32);

/// Non-fatal mutation refusal: the host declined to edit a range (protected
/// region, vanished paragraph). Distinct from [`crate::ClaimFormError`]; the
/// filler recovers from this per paragraph and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("paragraph cannot be edited: {reason}")]
pub struct EditBlocked {
    pub reason: String,
}

impl EditBlocked {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A contiguous span of identically formatted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub italic: Option<bool>,
    #[serde(default)]
    pub underline: Option<bool>,
    /// Explicit text color override (hex, e.g. "FF0000"). `None` renders in
    /// the document's default ink.
    #[serde(default)]
    pub color: Option<String>,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Bold + underline, no color override: the emphasized-field rendering.
    pub fn emphasized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: Some(true),
            underline: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    /// Left indent in inches, when explicitly set.
    #[serde(default)]
    pub left_indent: Option<f32>,
    /// Protected paragraphs refuse destructive edits, like a protected range
    /// in a form template.
    #[serde(default)]
    pub protected: bool,
}

impl Paragraph {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::plain(text)],
            ..Self::default()
        }
    }

    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Full paragraph text, runs concatenated.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Serializable document shape: what a template fixture on disk looks like.
/// Paragraph handles are a runtime concept and never serialized; they are
/// assigned when a [`TemplateDocument`] is built from this content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub body: Vec<Block>,
    #[serde(default)]
    pub headers: Vec<Paragraph>,
    #[serde(default)]
    pub footers: Vec<Paragraph>,
}

/// Capability surface the template filler needs from a host document.
///
/// The main story is the editable document body; in hosts like Word it
/// includes the content of tables. Auxiliary stories (headers, footers,
/// shapes) appear only in [`replaceable_paragraphs`](Self::replaceable_paragraphs)
/// and must never be targeted by destructive operations.
///
/// Precondition on well-formed templates: a placeholder token is never split
/// across run boundaries. Token search happens on the paragraph text, but
/// replacement is applied run by run so each run keeps its own formatting.
pub trait EditableDocument {
    /// Paragraph handles of the main editable story, in document order.
    fn main_story_paragraphs(&self) -> Vec<ParaId>;

    /// Every paragraph the host allows plain text replacement in: the main
    /// story plus whatever auxiliary stories it chooses to expose.
    fn replaceable_paragraphs(&self) -> Vec<ParaId>;

    /// Full text of a paragraph, or `None` when the handle no longer resolves.
    fn paragraph_text(&self, id: ParaId) -> Option<String>;

    /// Remove a paragraph in its entirety. Hosts refuse with [`EditBlocked`]
    /// rather than panicking; callers treat that as skip-and-continue.
    fn delete_paragraph(&mut self, id: ParaId) -> Result<(), EditBlocked>;

    /// Literal substring replacement across the paragraph's runs, preserving
    /// each run's formatting. Returns the number of occurrences replaced;
    /// zero is a no-op, not an error.
    fn replace_in_paragraph(&mut self, id: ParaId, needle: &str, replacement: &str) -> usize;

    /// Replace the paragraph's entire content with the given runs.
    fn set_paragraph_runs(&mut self, id: ParaId, runs: Vec<Run>);

    /// Apply a fixed left indent to the paragraph.
    fn set_left_indent(&mut self, id: ParaId, inches: f32);
}

#[derive(Debug)]
enum BodyBlock {
    Paragraph(ParaId),
    // rows -> cells -> cell paragraphs
    Table(Vec<Vec<Vec<ParaId>>>),
}

/// In-memory reference implementation of [`EditableDocument`]. Templates are
/// built programmatically or loaded from [`DocumentContent`] JSON; paragraphs
/// live in an arena so handles stay stable while the structure mutates.
#[derive(Debug)]
pub struct TemplateDocument {
    arena: Vec<Option<Paragraph>>,
    body: Vec<BodyBlock>,
    headers: Vec<ParaId>,
    footers: Vec<ParaId>,
}

impl Default for TemplateDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateDocument {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            body: Vec::new(),
            headers: Vec::new(),
            footers: Vec::new(),
        }
    }

    pub fn from_content(content: DocumentContent) -> Self {
        let mut doc = Self::new();
        for block in content.body {
            match block {
                Block::Paragraph(p) => {
                    doc.push_paragraph(p);
                }
                Block::Table(t) => {
                    doc.push_table(t);
                }
            }
        }
        for p in content.headers {
            doc.push_header(p);
        }
        for p in content.footers {
            doc.push_footer(p);
        }
        doc
    }

    /// Rebuild the serializable shape, reflecting all mutations.
    pub fn to_content(&self) -> DocumentContent {
        let mut content = DocumentContent::default();
        for block in &self.body {
            match block {
                BodyBlock::Paragraph(id) => {
                    if let Some(p) = self.paragraph(*id) {
                        content.body.push(Block::Paragraph(p.clone()));
                    }
                }
                BodyBlock::Table(rows) => {
                    let table = Table {
                        rows: rows
                            .iter()
                            .map(|row| TableRow {
                                cells: row
                                    .iter()
                                    .map(|cell| TableCell {
                                        paragraphs: cell
                                            .iter()
                                            .filter_map(|id| self.paragraph(*id).cloned())
                                            .collect(),
                                    })
                                    .collect(),
                            })
                            .collect(),
                    };
                    content.body.push(Block::Table(table));
                }
            }
        }
        content.headers = self
            .headers
            .iter()
            .filter_map(|id| self.paragraph(*id).cloned())
            .collect();
        content.footers = self
            .footers
            .iter()
            .filter_map(|id| self.paragraph(*id).cloned())
            .collect();
        content
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> ParaId {
        let id = self.alloc(paragraph);
        self.body.push(BodyBlock::Paragraph(id));
        id
    }

    pub fn push_text(&mut self, text: impl Into<String>) -> ParaId {
        self.push_paragraph(Paragraph::from_text(text))
    }

    pub fn push_table(&mut self, table: Table) -> Vec<ParaId> {
        let mut ids = Vec::new();
        let rows = table
            .rows
            .into_iter()
            .map(|row| {
                row.cells
                    .into_iter()
                    .map(|cell| {
                        cell.paragraphs
                            .into_iter()
                            .map(|p| {
                                let id = self.alloc(p);
                                ids.push(id);
                                id
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect();
        self.body.push(BodyBlock::Table(rows));
        ids
    }

    pub fn push_header(&mut self, paragraph: Paragraph) -> ParaId {
        let id = self.alloc(paragraph);
        self.headers.push(id);
        id
    }

    pub fn push_footer(&mut self, paragraph: Paragraph) -> ParaId {
        let id = self.alloc(paragraph);
        self.footers.push(id);
        id
    }

    pub fn paragraph(&self, id: ParaId) -> Option<&Paragraph> {
        self.arena.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Number of live paragraphs in the main story (body + table cells).
    pub fn main_story_len(&self) -> usize {
        self.main_story_paragraphs().len()
    }

    /// Plain-text rendering used by the fixed-format export of the reference
    /// host: headers, then body (table rows as `|`-joined cells), then footers.
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for id in &self.headers {
            if let Some(p) = self.paragraph(*id) {
                lines.push(p.text());
            }
        }
        for block in &self.body {
            match block {
                BodyBlock::Paragraph(id) => {
                    if let Some(p) = self.paragraph(*id) {
                        lines.push(p.text());
                    }
                }
                BodyBlock::Table(rows) => {
                    for row in rows {
                        let cells: Vec<String> = row
                            .iter()
                            .map(|cell| {
                                cell.iter()
                                    .filter_map(|id| self.paragraph(*id).map(|p| p.text()))
                                    .collect::<Vec<_>>()
                                    .join(" ")
                            })
                            .collect();
                        lines.push(cells.join(" | "));
                    }
                }
            }
        }
        for id in &self.footers {
            if let Some(p) = self.paragraph(*id) {
                lines.push(p.text());
            }
        }
        lines.join("\n")
    }

    fn alloc(&mut self, paragraph: Paragraph) -> ParaId {
        let id = ParaId(self.arena.len() as u32);
        self.arena.push(Some(paragraph));
        id
    }

    fn paragraph_mut(&mut self, id: ParaId) -> Option<&mut Paragraph> {
        self.arena.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn purge_from_structure(&mut self, id: ParaId) {
        self.body.retain(|block| match block {
            BodyBlock::Paragraph(p) => *p != id,
            BodyBlock::Table(_) => true,
        });
        for block in &mut self.body {
            if let BodyBlock::Table(rows) = block {
                for row in rows {
                    for cell in row {
                        cell.retain(|p| *p != id);
                    }
                }
            }
        }
        self.headers.retain(|p| *p != id);
        self.footers.retain(|p| *p != id);
    }
}

impl EditableDocument for TemplateDocument {
    fn main_story_paragraphs(&self) -> Vec<ParaId> {
        let mut ids = Vec::new();
        for block in &self.body {
            match block {
                BodyBlock::Paragraph(id) => ids.push(*id),
                BodyBlock::Table(rows) => {
                    for row in rows {
                        for cell in row {
                            ids.extend(cell.iter().copied());
                        }
                    }
                }
            }
        }
        ids
    }

    fn replaceable_paragraphs(&self) -> Vec<ParaId> {
        let mut ids = self.main_story_paragraphs();
        ids.extend(self.headers.iter().copied());
        ids.extend(self.footers.iter().copied());
        ids
    }

    fn paragraph_text(&self, id: ParaId) -> Option<String> {
        self.paragraph(id).map(|p| p.text())
    }

    fn delete_paragraph(&mut self, id: ParaId) -> Result<(), EditBlocked> {
        match self.paragraph(id) {
            None => Err(EditBlocked::new("paragraph no longer exists")),
            Some(p) if p.protected => Err(EditBlocked::new("paragraph range is protected")),
            Some(_) => {
                self.arena[id.0 as usize] = None;
                self.purge_from_structure(id);
                Ok(())
            }
        }
    }

    fn replace_in_paragraph(&mut self, id: ParaId, needle: &str, replacement: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let Some(paragraph) = self.paragraph_mut(id) else {
            return 0;
        };
        let mut replaced = 0;
        for run in &mut paragraph.runs {
            let occurrences = run.text.matches(needle).count();
            if occurrences > 0 {
                run.text = run.text.replace(needle, replacement);
                replaced += occurrences;
            }
        }
        replaced
    }

    fn set_paragraph_runs(&mut self, id: ParaId, runs: Vec<Run>) {
        if let Some(paragraph) = self.paragraph_mut(id) {
            paragraph.runs = runs;
        }
    }

    fn set_left_indent(&mut self, id: ParaId, inches: f32) {
        if let Some(paragraph) = self.paragraph_mut(id) {
            paragraph.left_indent = Some(inches);
        }
    }
}
