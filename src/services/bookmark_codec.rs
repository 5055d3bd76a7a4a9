//! Netscape bookmark file codec.
//!
//! Decoding runs html5ever's tokenizer and keeps an explicit stack of open
//! `<DL>` lists; each stack frame carries the enclosing folder's id and path,
//! so every `<A>` leaf is attached to whatever folder is on top. Encoding
//! walks the folder tree from the root, emitting sub-folders before the
//! bookmarks of each level.

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use uuid::Uuid;

use crate::services::site_style;
use crate::services::validation::{now_millis, now_secs};
use crate::types::bookmark::{Bookmark, Folder};
use crate::types::storage::StorageData;

const FILE_HEADER: &str = "<!DOCTYPE NETSCAPE-Bookmark-file-1>
<!-- This is an automatically generated file.
     It will be read and overwritten.
     DO NOT EDIT! -->
<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
";

const FILE_FOOTER: &str = "</DL><p>\n";

/// Tile colour used for glyph icons when the bookmark has none.
const DEFAULT_ICON_COLOR: &str = "#666666";

// ─── Decode ───

/// One open `<DL>`: the folder it belongs to, or a subtree being dropped.
#[derive(Debug, Clone)]
struct Frame {
    folder_id: Option<String>,
    path: Vec<String>,
    skipped: bool,
}

#[derive(Debug)]
enum Capture {
    Heading(String),
    Anchor {
        href: String,
        icon: Option<String>,
        pinned: bool,
        add_date: Option<i64>,
        text: String,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    seen_root: bool,
    /// Title of the last `<H3>`, waiting for the `<DL>` that opens its contents.
    pending_heading: Option<String>,
    capture: Option<Capture>,
    folders: Vec<Folder>,
    bookmarks: Vec<Bookmark>,
}

fn attr(tag: &Tag, name: &str) -> Option<String> {
    tag.attrs
        .iter()
        .find(|a| (&*a.name.local).eq_ignore_ascii_case(name))
        .map(|a| a.value.to_string())
}

impl TreeBuilder {
    fn open_list(&mut self) {
        let heading = self.pending_heading.take();

        let frame = match self.stack.last() {
            None if !self.seen_root => {
                self.seen_root = true;
                Frame { folder_id: None, path: Vec::new(), skipped: false }
            }
            // Only the first top-level list holds bookmarks.
            None => Frame { folder_id: None, path: Vec::new(), skipped: true },
            Some(parent) => match heading {
                Some(name) if !parent.skipped && !name.is_empty() => {
                    let id = Uuid::new_v4().to_string();
                    let mut path = parent.path.clone();
                    self.folders.push(Folder {
                        id: id.clone(),
                        title: name.clone(),
                        parent_id: parent.folder_id.clone(),
                        path: path.clone(),
                    });
                    path.push(name);
                    Frame { folder_id: Some(id), path, skipped: false }
                }
                Some(_) => Frame { skipped: true, ..parent.clone() },
                // A list with no heading belongs to the enclosing folder.
                None => parent.clone(),
            },
        };
        self.stack.push(frame);
    }

    fn close_list(&mut self) {
        self.finish_anchor();
        self.pending_heading = None;
        self.stack.pop();
    }

    fn start_anchor(&mut self, tag: &Tag) {
        self.finish_anchor();
        self.capture = Some(Capture::Anchor {
            href: attr(tag, "href").map(|h| h.trim().to_string()).unwrap_or_default(),
            icon: attr(tag, "icon").filter(|i| !i.trim().is_empty()),
            pinned: attr(tag, "custom_pinned")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            add_date: attr(tag, "add_date").and_then(|d| d.trim().parse::<i64>().ok()),
            text: String::new(),
        });
    }

    fn finish_anchor(&mut self) {
        let Some(Capture::Anchor { href, icon, pinned, add_date, text }) = self.capture.take() else {
            return;
        };
        if href.is_empty() {
            return;
        }
        let Some(frame) = self.stack.last() else {
            return;
        };
        if frame.skipped {
            return;
        }

        self.bookmarks.push(Bookmark {
            id: Uuid::new_v4().to_string(),
            title: text.trim().to_string(),
            icon: icon.unwrap_or_else(|| site_style::icon_for_url(&href)),
            color: site_style::color_for_url(&href),
            url: href,
            parent_id: frame.folder_id.clone(),
            path: frame.path.clone(),
            is_pinned: pinned,
            created_at: add_date
                .filter(|secs| *secs > 0)
                .map(|secs| secs.saturating_mul(1000))
                .unwrap_or_else(now_millis),
        });
    }

    fn handle_tag(&mut self, tag: Tag) {
        match (tag.kind, &*tag.name) {
            (TagKind::StartTag, "dl") => self.open_list(),
            (TagKind::EndTag, "dl") => self.close_list(),
            (TagKind::StartTag, "dt") => {
                self.finish_anchor();
                self.pending_heading = None;
            }
            (TagKind::StartTag, "h3") => {
                self.finish_anchor();
                self.pending_heading = None;
                self.capture = Some(Capture::Heading(String::new()));
            }
            (TagKind::EndTag, "h3") => {
                if let Some(Capture::Heading(text)) = self.capture.take() {
                    self.pending_heading = Some(text.trim().to_string());
                }
            }
            (TagKind::StartTag, "a") => self.start_anchor(&tag),
            (TagKind::EndTag, "a") => self.finish_anchor(),
            _ => {}
        }
    }

    fn push_text(&mut self, chars: &str) {
        match &mut self.capture {
            Some(Capture::Heading(text)) | Some(Capture::Anchor { text, .. }) => text.push_str(chars),
            None => {}
        }
    }

    fn finish(mut self) -> StorageData {
        self.finish_anchor();
        StorageData::new(self.bookmarks, self.folders)
    }
}

impl TokenSink for TreeBuilder {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.handle_tag(tag),
            Token::CharacterTokens(chars) => self.push_text(&chars),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Decodes a Netscape bookmark file.
///
/// Folders and bookmarks come back in document order, each folder ahead of
/// its contents. Every record gets a fresh id. Anchors without an `HREF` and
/// headings that are empty or not followed by a `<DL>` are dropped, along with
/// anything nested under a dropped heading.
pub fn parse(html: &str) -> StorageData {
    let mut tokenizer = Tokenizer::new(TreeBuilder::default(), TokenizerOpts::default());
    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    let builder = std::mem::take(&mut tokenizer.sink);
    let data = builder.finish();
    tracing::debug!(
        folders = data.folders.len(),
        bookmarks = data.bookmarks.len(),
        "decoded bookmark file"
    );
    data
}

// ─── Encode ───

/// Escapes `& < > " '` for use in element text and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Image URI for a bookmark icon.
///
/// `data:` and http(s) icons pass through. Glyph icons (emoji or a letter)
/// become a 16×16 SVG tile, base64-encoded. Empty icons yield `None`.
pub fn icon_data_uri(icon: &str, color: &str) -> Option<String> {
    let icon = icon.trim();
    if icon.is_empty() {
        return None;
    }
    if icon.starts_with("data:") || icon.starts_with("http://") || icon.starts_with("https://") {
        return Some(icon.to_string());
    }

    let fill = if color.trim().is_empty() { DEFAULT_ICON_COLOR } else { color.trim() };
    let svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"16\" height=\"16\" viewBox=\"0 0 16 16\">\
         <rect width=\"16\" height=\"16\" rx=\"3\" fill=\"{}\"/>\
         <text x=\"8\" y=\"12\" font-size=\"11\" text-anchor=\"middle\" fill=\"#FFFFFF\">{}</text>\
         </svg>",
        escape_html(fill),
        escape_html(icon)
    );
    Some(format!("data:image/svg+xml;base64,{}", BASE64.encode(svg.as_bytes())))
}

struct TreeWriter<'a> {
    folders_by_parent: HashMap<Option<&'a str>, Vec<&'a Folder>>,
    bookmarks_by_parent: HashMap<Option<&'a str>, Vec<&'a Bookmark>>,
    visited: HashSet<&'a str>,
    now: i64,
    out: String,
}

impl<'a> TreeWriter<'a> {
    fn new(folders: &'a [Folder], bookmarks: &'a [Bookmark]) -> Self {
        let known: HashSet<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        // Records pointing at a folder that does not exist are written at the root.
        let parent_key = |parent: &'a Option<String>| -> Option<&'a str> {
            parent.as_deref().filter(|id| known.contains(id))
        };

        let mut folders_by_parent: HashMap<Option<&str>, Vec<&Folder>> = HashMap::new();
        for folder in folders {
            folders_by_parent.entry(parent_key(&folder.parent_id)).or_default().push(folder);
        }
        let mut bookmarks_by_parent: HashMap<Option<&str>, Vec<&Bookmark>> = HashMap::new();
        for bookmark in bookmarks {
            bookmarks_by_parent.entry(parent_key(&bookmark.parent_id)).or_default().push(bookmark);
        }

        Self {
            folders_by_parent,
            bookmarks_by_parent,
            visited: HashSet::new(),
            now: now_secs(),
            out: String::from(FILE_HEADER),
        }
    }

    fn write_level(&mut self, parent: Option<&'a str>, level: usize) {
        let indent = "    ".repeat(level + 1);

        let folders = self.folders_by_parent.get(&parent).cloned().unwrap_or_default();
        for folder in folders {
            if !self.visited.insert(folder.id.as_str()) {
                continue;
            }
            self.out.push_str(&format!("{}<DT><H3>{}</H3>\n", indent, escape_html(&folder.title)));
            self.out.push_str(&format!("{}<DL><p>\n", indent));
            self.write_level(Some(folder.id.as_str()), level + 1);
            self.out.push_str(&format!("{}</DL><p>\n", indent));
        }

        let bookmarks = self.bookmarks_by_parent.get(&parent).cloned().unwrap_or_default();
        for bookmark in bookmarks {
            let add_date = if bookmark.created_at > 0 { bookmark.created_at / 1000 } else { self.now };
            let mut line = format!(
                "{}<DT><A HREF=\"{}\" ADD_DATE=\"{}\"",
                indent,
                escape_html(&bookmark.url),
                add_date
            );
            if let Some(icon) = icon_data_uri(&bookmark.icon, &bookmark.color) {
                line.push_str(&format!(" ICON=\"{}\"", escape_html(&icon)));
            }
            if bookmark.is_pinned {
                line.push_str(" CUSTOM_PINNED=\"true\"");
            }
            line.push_str(&format!(">{}</A>\n", escape_html(&bookmark.title)));
            self.out.push_str(&line);
        }
    }
}

/// Encodes folders and bookmarks as a Netscape bookmark file.
pub fn serialize(folders: &[Folder], bookmarks: &[Bookmark]) -> String {
    let mut writer = TreeWriter::new(folders, bookmarks);
    writer.write_level(None, 0);
    writer.out.push_str(FILE_FOOTER);
    writer.out
}
