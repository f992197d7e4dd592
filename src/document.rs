//! PDF rendering of the original text and its generated summary.
//!
//! The document is assembled in memory with lopdf using the built-in
//! Helvetica font, so rendering needs neither font files nor temporary
//! files. Text is encoded as WinAnsi; characters outside that code page
//! are written as `?`.

use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, StringFormat, Stream, dictionary};

use crate::error::RenderError;

/// Number of characters of the original text that make it into the document.
pub const ORIGINAL_EXCERPT_CHARS: usize = 2000;

pub const DOCUMENT_TITLE: &str = "AI Content-to-PDF Report";
pub const ORIGINAL_HEADING: &str = "Original Content:";
pub const SUMMARY_HEADING: &str = "AI Enhanced Summary:";

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;

const FONT_NAME: &str = "F1";
const PRODUCER: &str = "content-to-pdf";

/// Page geometry in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
}

impl Default for PageLayout {
    /// US Letter with one-inch margins.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 72.0,
            line_spacing: 1.2,
        }
    }
}

impl PageLayout {
    fn text_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    layout: PageLayout,
}

impl DocumentRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    /// Renders the title, the original excerpt and the full summary into a
    /// finished PDF held in memory.
    pub fn render(&self, original: &str, summary: &str) -> Result<Vec<u8>, RenderError> {
        let mut writer = PageWriter::new(self.layout);

        writer.line(DOCUMENT_TITLE, TITLE_SIZE, Align::Center, false);
        writer.move_down(BODY_SIZE);

        writer.line(ORIGINAL_HEADING, HEADING_SIZE, Align::Left, true);
        writer.paragraphs(original_excerpt(original), BODY_SIZE);
        writer.move_down(BODY_SIZE);

        writer.line(SUMMARY_HEADING, HEADING_SIZE, Align::Left, true);
        writer.paragraphs(summary, BODY_SIZE);

        assemble(writer.finish(), &self.layout)
    }
}

/// The first [`ORIGINAL_EXCERPT_CHARS`] characters of `text`, unmodified.
pub fn original_excerpt(text: &str) -> &str {
    match text.char_indices().nth(ORIGINAL_EXCERPT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Lays out lines top to bottom, opening a new page when the current one
/// is full.
struct PageWriter {
    layout: PageLayout,
    pages: Vec<Vec<Operation>>,
    cursor: f32,
}

impl PageWriter {
    fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            cursor: layout.height - layout.margin,
        }
    }

    fn current(&mut self) -> &mut Vec<Operation> {
        // `pages` always holds at least one page
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Reserves one line of `size` and returns its baseline.
    fn advance(&mut self, size: f32) -> f32 {
        let line_height = size * self.layout.line_spacing;
        if self.cursor - line_height < self.layout.margin {
            self.pages.push(Vec::new());
            self.cursor = self.layout.height - self.layout.margin;
        }
        let baseline = self.cursor - size;
        self.cursor -= line_height;
        baseline
    }

    fn move_down(&mut self, size: f32) {
        self.cursor -= size * self.layout.line_spacing;
    }

    fn line(&mut self, text: &str, size: f32, align: Align, underline: bool) {
        let baseline = self.advance(size);
        let width = text_width(text, size);
        let x = match align {
            Align::Left => self.layout.margin,
            Align::Center => ((self.layout.width - width) / 2.0).max(self.layout.margin),
        };

        let ops = self.current();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![FONT_NAME.into(), Object::Real(size)]));
        ops.push(Operation::new("Td", vec![Object::Real(x), Object::Real(baseline)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));

        if underline {
            let y = baseline - size * 0.12;
            ops.push(Operation::new("w", vec![Object::Real(size / 18.0)]));
            ops.push(Operation::new("m", vec![Object::Real(x), Object::Real(y)]));
            ops.push(Operation::new("l", vec![Object::Real(x + width), Object::Real(y)]));
            ops.push(Operation::new("S", vec![]));
        }
    }

    fn paragraphs(&mut self, text: &str, size: f32) {
        let max_width = self.layout.text_width();
        for line in wrap(text, size, max_width) {
            if line.is_empty() {
                self.advance(size);
            } else {
                self.line(&line, size, Align::Left, false);
            }
        }
    }

    fn finish(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

fn assemble(pages: Vec<Vec<Operation>>, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_NAME => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let data = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        // Uncompressed so the text stays searchable in the raw bytes
        let content_id = doc.add_object(Stream::new(dictionary! {}, data).with_compression(false));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(layout.width),
                Object::Real(layout.height),
            ],
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(DOCUMENT_TITLE),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Write(e.to_string()))?;
    Ok(buffer)
}

/// Greedy wrap that keeps the spacing of the source. Source line breaks are
/// kept, blank source lines become empty entries, lines break only where a
/// run of spaces starts (the run is dropped at the break), and words wider
/// than a line are split by character. Tabs are set as spaces.
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for source in text.lines() {
        if source.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let source = source.replace(['\t', '\r'], " ");
        let mut current = String::new();
        for segment in segments(&source) {
            if text_width(&current, size) + text_width(segment, size) <= max_width {
                current.push_str(segment);
                continue;
            }

            let word = if current.is_empty() {
                segment
            } else {
                lines.push(std::mem::take(&mut current));
                segment.trim_start_matches(' ')
            };

            if text_width(word, size) <= max_width {
                current.push_str(word);
                continue;
            }

            for ch in word.chars() {
                let mut buf = [0u8; 4];
                let next = text_width(ch.encode_utf8(&mut buf), size);
                if !current.is_empty() && text_width(&current, size) + next > max_width {
                    lines.push(std::mem::take(&mut current));
                }
                current.push(ch);
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Splits a line before every run of spaces, so each segment is its leading
/// spaces followed by a word: `"a  b c"` -> `["a", "  b", " c"]`.
fn segments(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut previous_was_space = true;

    for (i, ch) in line.char_indices() {
        let is_space = ch == ' ';
        if is_space && !previous_was_space {
            segments.push(&line[start..i]);
            start = i;
        }
        previous_was_space = is_space;
    }
    if start < line.len() {
        segments.push(&line[start..]);
    }

    segments
}

/// Width of `text` in points when set in Helvetica at `size`.
fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(glyph_width).sum();
    units as f32 * size / 1000.0
}

/// Helvetica advance widths (1/1000 em) for printable ASCII.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' .. '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0' .. '?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@' .. 'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P' .. '_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`' .. 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p' .. '~'
];

fn glyph_width(ch: char) -> u32 {
    match ch {
        ' '..='~' => u32::from(HELVETICA_WIDTHS[ch as usize - 0x20]),
        '\t' => 278,
        _ => 556,
    }
}

/// Encodes text for a WinAnsiEncoding font.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\t' => b' ',
            ' '..='~' => ch as u8,
            '\u{a0}'..='\u{ff}' => ch as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        })
        .collect()
}
