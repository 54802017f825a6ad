//! [`Converter`] driving calibre's `ebook-convert`.
//!
//! The staged pages are tied together by a generated `summary.html` whose
//! nested link list mirrors the TOC. `ebook-convert` follows those links from
//! the summary page, so the book is assembled in TOC order. The program is
//! run once per requested format.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fmt::Write;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{ConvertError, Converter, ConverterConfig, Format};
use crate::document::DocumentId;
use crate::toc::TocEntry;

/// Entry page generated in the staging directory.
const SUMMARY_FILE: &str = "summary.html";

/// Lines of converter output kept in error messages.
const DIAGNOSTIC_LINES: usize = 20;

/// Runs `ebook-convert` (or a compatible program) for each format.
pub struct CalibreConverter {
    program: String,
}

impl CalibreConverter {
    /// Converter invoking `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one format.
    fn arguments(
        config: &ConverterConfig,
        input: &Path,
        target: &Path,
        format: Format,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![input.into(), target.into()];
        let mut push = |flag: &str, value: &str| {
            args.push(flag.into());
            args.push(value.into());
        };

        push("--title", &config.title);
        let optional = [
            ("--authors", &config.creator),
            ("--publisher", &config.publisher),
            ("--book-producer", &config.contributor),
            ("--comments", &config.description),
            ("--timestamp", &config.timestamp),
            ("--cover", &config.cover),
        ];
        for (flag, value) in optional {
            if !value.is_empty() {
                push(flag, value);
            }
        }
        push("--language", &config.language);
        push("--base-font-size", &config.typography.font_size.to_string());
        push("--chapter-mark", "pagebreak");
        push("--level1-toc", "//h:h1");

        let t = &config.typography;
        match format {
            Format::Pdf => {
                push("--paper-size", &t.paper_size);
                push("--pdf-page-margin-left", &t.margin_left.to_string());
                push("--pdf-page-margin-right", &t.margin_right.to_string());
                push("--pdf-page-margin-top", &t.margin_top.to_string());
                push("--pdf-page-margin-bottom", &t.margin_bottom.to_string());
                push("--pdf-header-template", &config.header);
                push("--pdf-footer-template", &config.footer);
            }
            Format::Docx => {
                push("--docx-page-size", &t.paper_size);
                push("--docx-page-margin-left", &t.margin_left.to_string());
                push("--docx-page-margin-right", &t.margin_right.to_string());
                push("--docx-page-margin-top", &t.margin_top.to_string());
                push("--docx-page-margin-bottom", &t.margin_bottom.to_string());
            }
            Format::Epub | Format::Mobi => {}
        }

        args.extend(config.more.iter().map(OsString::from));
        args
    }
}

impl Converter for CalibreConverter {
    fn convert(&self, config: &ConverterConfig, source_dir: &Path) -> Result<(), ConvertError> {
        let output_dir = source_dir.join("output");
        fs::create_dir_all(&output_dir)?;

        let summary = source_dir.join(SUMMARY_FILE);
        fs::write(&summary, summary_page(config))?;

        for &format in &config.format {
            let target = output_dir.join(format.file_name());
            let args = Self::arguments(config, &summary, &target, format);
            tracing::debug!(program = %self.program, ?args, "Running converter");

            let output = Command::new(&self.program)
                .args(&args)
                .current_dir(source_dir)
                .output()
                .map_err(|source| ConvertError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;

            if !output.status.success() {
                return Err(ConvertError::Failed {
                    format,
                    status: output.status.to_string(),
                    stderr: diagnostic(&output),
                });
            }
            tracing::info!(%format, title = %config.title, "Converted");
        }

        Ok(())
    }
}

/// Tail of the converter's stderr, or stdout when stderr is empty.
fn diagnostic(output: &Output) -> String {
    let stream = if output.stderr.iter().all(u8::is_ascii_whitespace) {
        &output.stdout
    } else {
        &output.stderr
    };
    let text = String::from_utf8_lossy(stream);
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}

/// Render the entry page linking every staged document in TOC order.
fn summary_page(config: &ConverterConfig) -> String {
    let title = encode_text(&config.title);
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n");
    let _ = writeln!(html, "<html lang=\"{}\">", encode_double_quoted_attribute(&config.language));
    let _ = writeln!(html, "<head>\n<meta charset=\"{}\">", config.charset);
    let _ = writeln!(html, "<title>{title}</title>\n</head>\n<body>");
    let _ = writeln!(html, "<h1>{title}</h1>");
    if !config.description.is_empty() {
        let _ = writeln!(html, "<div class=\"description\">{}</div>", config.description);
    }
    html.push_str("<nav>\n");
    render_toc(&mut html, &config.toc);
    html.push_str("</nav>\n</body>\n</html>\n");
    html
}

/// Render the TOC as nested lists, rebuilding the hierarchy from `parent_id`.
///
/// Entries whose parent is not in the TOC are treated as top-level. Entries
/// only reachable through a parent cycle are appended at the top level.
fn render_toc(html: &mut String, toc: &[TocEntry]) {
    let ids: HashSet<DocumentId> = toc.iter().map(|e| e.id).collect();
    let mut children: HashMap<DocumentId, Vec<&TocEntry>> = HashMap::new();
    let mut roots = Vec::new();
    for entry in toc {
        if entry.parent_id == 0 || entry.parent_id == entry.id || !ids.contains(&entry.parent_id) {
            roots.push(entry);
        } else {
            children.entry(entry.parent_id).or_default().push(entry);
        }
    }

    let mut visited = HashSet::new();
    html.push_str("<ul>\n");
    for entry in roots {
        render_entry(html, entry, &children, &mut visited);
    }
    for entry in toc {
        if !visited.contains(&entry.id) {
            render_entry(html, entry, &children, &mut visited);
        }
    }
    html.push_str("</ul>\n");
}

/// Pending work while walking the TOC tree.
enum Step<'a> {
    Enter(&'a TocEntry),
    /// Close a nested list and the item that owns it.
    Leave,
}

/// Render one entry and its descendants without recursing, so arbitrarily
/// deep parent chains cannot exhaust the stack.
fn render_entry<'a>(
    html: &mut String,
    entry: &'a TocEntry,
    children: &HashMap<DocumentId, Vec<&'a TocEntry>>,
    visited: &mut HashSet<DocumentId>,
) {
    let mut stack = vec![Step::Enter(entry)];
    while let Some(step) = stack.pop() {
        let entry = match step {
            Step::Leave => {
                html.push_str("</ul>\n</li>\n");
                continue;
            }
            Step::Enter(entry) => entry,
        };
        if !visited.insert(entry.id) {
            continue;
        }
        let _ = write!(
            html,
            "<li><a href=\"{}\">{}</a>",
            encode_double_quoted_attribute(&entry.link),
            encode_text(&entry.title)
        );

        let pending: Vec<&TocEntry> = children
            .get(&entry.id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|kid| !visited.contains(&kid.id))
            .collect();
        if pending.is_empty() {
            html.push_str("</li>\n");
        } else {
            html.push_str("\n<ul>\n");
            stack.push(Step::Leave);
            stack.extend(pending.into_iter().rev().map(Step::Enter));
        }
    }
}
