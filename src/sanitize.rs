//! LaTeX-to-plain-text cleanup for imported documents.
//!
//! Narration wants prose, not markup: math, citations, labels, and
//! preamble commands are noise when read aloud. [`clean`] runs a fixed
//! pipeline of scanning passes over the raw source; downstream
//! segmentation treats its output as already-normalized text and performs
//! no further cleanup.
//!
//! Tables survive as readable rows (`cell | cell`) under a `TABLE:`
//! marker rather than being dropped, since their content is often worth
//! hearing.

use std::fs;
use std::path::Path;

use crate::NarrateError;

/// Upper bound on imported file size.
pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

/// Convert LaTeX (or plain-text-with-markup) source into narration-ready
/// plain text.
pub fn clean(raw: &str) -> String {
    let text = strip_comments(raw);
    let text = convert_tabulars(&text);
    let text = remove_environments(&text);
    let text = strip_math(&text);
    let text = rewrite_commands(&text);
    let text = strip_citations(&text);
    let text = unwrap_groups(&text);
    collapse_whitespace(&text)
}

/// Read a document from disk and clean it.
///
/// `.tex` and `.latex` files go through [`clean`]; `.txt` is taken
/// verbatim apart from whitespace normalization. Anything else is
/// rejected before the file is read, as are files over
/// [`MAX_IMPORT_BYTES`].
pub fn import_file(path: &Path) -> Result<String, NarrateError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let is_latex = matches!(extension.as_str(), "tex" | "latex");
    if !is_latex && extension != "txt" {
        return Err(NarrateError::UnsupportedFile(extension));
    }

    let size = fs::metadata(path)?.len();
    if size > MAX_IMPORT_BYTES {
        return Err(NarrateError::FileTooLarge {
            size,
            limit: MAX_IMPORT_BYTES,
        });
    }

    let raw = fs::read_to_string(path)?;
    let text = if is_latex {
        clean(&raw)
    } else {
        collapse_whitespace(&raw)
    };
    if text.is_empty() {
        return Err(NarrateError::NothingToRead);
    }
    log::info!("imported {} ({} bytes of markup)", path.display(), size);
    Ok(text)
}

/// Drop inline citation markers left over after command rewriting:
/// numeric brackets (`[12]`, `[3, 4-6]`), bare numeric parens (`(7)`),
/// author-year parens (`(Smith et al., 2020)`), and superscript markers
/// (`^1`, `^[2]`).
pub fn strip_citations(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' => match find_close(&chars, i + 1, ']') {
                Some(end) => {
                    let content: String = chars[i + 1..end].iter().collect();
                    if is_numeric_citation(&content) {
                        i = end + 1;
                    } else {
                        out.push('[');
                        i += 1;
                    }
                }
                None => {
                    out.push('[');
                    i += 1;
                }
            },
            '(' => match find_close(&chars, i + 1, ')') {
                Some(end) => {
                    let content: String = chars[i + 1..end].iter().collect();
                    if content.chars().all(|c| c.is_ascii_digit()) && !content.is_empty()
                        || is_author_year(&content)
                    {
                        i = end + 1;
                    } else {
                        out.push('(');
                        i += 1;
                    }
                }
                None => {
                    out.push('(');
                    i += 1;
                }
            },
            '^' => {
                let mut j = i + 1;
                let bracketed = chars.get(j) == Some(&'[');
                if bracketed {
                    j += 1;
                }
                let digits_start = j;
                while chars.get(j).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    j += 1;
                }
                if j > digits_start {
                    if bracketed && chars.get(j) == Some(&']') {
                        j += 1;
                    }
                    i = j;
                } else {
                    out.push('^');
                    i += 1;
                }
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn find_close(chars: &[char], from: usize, close: char) -> Option<usize> {
    chars[from..].iter().position(|&c| c == close).map(|rel| from + rel)
}

fn is_numeric_citation(content: &str) -> bool {
    !content.is_empty()
        && content.chars().any(|c| c.is_ascii_digit())
        && content
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c == ' ')
}

fn is_author_year(content: &str) -> bool {
    let content = content.trim();
    let starts_upper = content
        .chars()
        .next()
        .map(|c| c.is_ascii_uppercase())
        .unwrap_or(false);
    if !starts_upper {
        return false;
    }
    let last = content
        .rsplit([',', ' '])
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| c.is_ascii_lowercase());
    last.len() == 4 && last.chars().all(|c| c.is_ascii_digit())
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| {
            let mut prev = '\0';
            let mut cut = line.len();
            for (i, c) in line.char_indices() {
                if c == '%' && prev != '\\' {
                    cut = i;
                    break;
                }
                prev = c;
            }
            &line[..cut]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrite `tabular` environments as plain rows: `&` becomes a column
/// separator, `\\` a row break, rule commands disappear.
fn convert_tabulars(text: &str) -> String {
    const BEGIN: &str = "\\begin{tabular}";
    const END: &str = "\\end{tabular}";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(BEGIN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + BEGIN.len()..];
        match after.find(END) {
            Some(end_rel) => {
                out.push_str("\n\nTABLE:\n");
                out.push_str(&tabular_rows(&after[..end_rel]));
                out.push_str("\n\n");
                rest = &after[end_rel + END.len()..];
            }
            None => {
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn tabular_rows(body: &str) -> String {
    // The leading brace group is the column spec, not content.
    let mut body = body.trim_start();
    if body.starts_with('{') {
        if let Some(close) = body.find('}') {
            body = &body[close + 1..];
        }
    }

    let chars: Vec<char> = body.chars().collect();
    let mut rows = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if chars.get(i + 1) == Some(&'\\') => {
                rows.push('\n');
                i += 2;
            }
            '\\' => {
                // drop the command and one brace argument if present
                let mut j = i + 1;
                while chars.get(j).map(|c| c.is_ascii_alphabetic() || *c == '@').unwrap_or(false) {
                    j += 1;
                }
                if let Some((_, next)) = parse_group(&chars, j) {
                    j = next;
                }
                i = j.max(i + 1);
            }
            '&' => {
                rows.push_str(" | ");
                i += 1;
            }
            '{' | '}' => i += 1,
            c => {
                rows.push(c);
                i += 1;
            }
        }
    }

    rows.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Delete every remaining `\begin{env} .. \end{env}` block, innermost
/// first, until the text stabilizes.
fn remove_environments(text: &str) -> String {
    let mut text = text.to_string();
    loop {
        let Some(start) = text.find("\\begin{") else { break };
        let name_start = start + "\\begin{".len();
        let Some(name_len) = text[name_start..].find('}') else { break };
        let name = text[name_start..name_start + name_len].to_string();
        let end_marker = format!("\\end{{{name}}}");
        match text[name_start..].find(&end_marker) {
            Some(rel) => {
                let end = name_start + rel + end_marker.len();
                text.replace_range(start..end, "");
            }
            None => {
                text.replace_range(start..name_start + name_len + 1, "");
            }
        }
    }
    text
}

fn strip_math(text: &str) -> String {
    let text = strip_delimited(text, "$$", "$$", false);
    let text = strip_delimited(&text, "\\(", "\\)", false);
    let text = strip_delimited(&text, "\\[", "\\]", false);
    strip_delimited(&text, "$", "$", true)
}

fn strip_delimited(text: &str, open: &str, close: &str, single_line: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        let after = &rest[start + open.len()..];
        match after.find(close) {
            Some(rel) if !(single_line && after[..rel].contains('\n')) => {
                out.push_str(&rest[..start]);
                rest = &after[rel + close.len()..];
            }
            _ => {
                out.push_str(&rest[..start + open.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn drops_argument(name: &str) -> bool {
    name.starts_with("cite")
        || name.starts_with("footnote")
        || name.ends_with("ref")
        || matches!(
            name,
            "label"
                | "documentclass"
                | "usepackage"
                | "bibliography"
                | "bibliographystyle"
                | "includegraphics"
                | "input"
                | "include"
                | "vspace"
                | "hspace"
        )
}

fn is_heading(name: &str) -> bool {
    name.ends_with("section") || matches!(name, "chapter" | "title" | "paragraph" | "subparagraph")
}

/// Remove or rewrite `\command` tokens. Formatting wrappers keep their
/// argument text, headings keep it followed by a blank line, `\href`
/// keeps only its display text, reference-like commands disappear with
/// their arguments.
fn rewrite_commands(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some(&c) if "&%$#_{}".contains(c) => {
                // escaped specials vanish with their backslash
                i += 2;
                continue;
            }
            Some('\\') => {
                out.push('\n');
                i += 2;
                continue;
            }
            _ => {}
        }

        let mut j = i + 1;
        while chars.get(j).map(|c| c.is_ascii_alphabetic() || *c == '@').unwrap_or(false) {
            j += 1;
        }
        if j == i + 1 {
            i += 1;
            continue;
        }
        let name: String = chars[i + 1..j].iter().collect();
        if chars.get(j) == Some(&'*') {
            j += 1;
        }
        let k = skip_bracket_options(&chars, j);

        if drops_argument(&name) {
            let mut end = k;
            while let Some((_, next)) = parse_group(&chars, end) {
                end = next;
            }
            i = end;
        } else if is_heading(&name) {
            match parse_group(&chars, k) {
                Some((inner, next)) => {
                    out.push_str(&rewrite_commands(&inner));
                    out.push_str("\n\n");
                    i = next;
                }
                None => i = k,
            }
        } else if name == "href" {
            // first argument is the URL; only the display text survives
            i = match parse_group(&chars, k) {
                Some((_, next)) => next,
                None => k,
            };
        } else {
            // formatting wrapper or unknown command: drop the token and
            // let group unwrapping keep the argument text
            i = k;
        }
    }
    out
}

fn skip_bracket_options(chars: &[char], mut i: usize) -> usize {
    while chars.get(i) == Some(&'[') {
        match chars[i..].iter().position(|&c| c == ']') {
            Some(rel) => i += rel + 1,
            None => break,
        }
    }
    i
}

fn parse_group(chars: &[char], start: usize) -> Option<(String, usize)> {
    if chars.get(start) != Some(&'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut inner = String::new();
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '{' => {
                depth += 1;
                if depth > 1 {
                    inner.push('{');
                }
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((inner, i + 1));
                }
                inner.push('}');
            }
            c => inner.push(c),
        }
        i += 1;
    }
    None
}

fn unwrap_groups(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '{' | '}' | '[' | ']')).collect()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_blank = false;
    for line in text.lines() {
        let mut collapsed = String::new();
        let mut last_space = false;
        for c in line.trim().chars() {
            if c == ' ' || c == '\t' {
                if !last_space {
                    collapsed.push(' ');
                }
                last_space = true;
            } else {
                collapsed.push(c);
                last_space = false;
            }
        }
        if collapsed.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        pending_blank = false;
        out.push_str(&collapsed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_but_not_escaped_percent() {
        let cleaned = clean("score of 95\\% achieved % reviewer note");
        assert_eq!(cleaned, "score of 95 achieved");
    }

    #[test]
    fn headings_keep_their_title_on_its_own_paragraph() {
        let cleaned = clean("\\section{Introduction}\nSome prose here.");
        assert_eq!(cleaned, "Introduction\n\nSome prose here.");
    }

    #[test]
    fn formatting_wrappers_keep_their_text() {
        let cleaned = clean("A \\textbf{bold} and \\emph{subtle} point.");
        assert_eq!(cleaned, "A bold and subtle point.");
    }

    #[test]
    fn math_is_removed() {
        let cleaned = clean("Energy $E = mc^2$ and \\[ \\int f \\] and inline \\(x\\) done.");
        assert_eq!(cleaned, "Energy and and inline done.");
    }

    #[test]
    fn citations_and_references_disappear() {
        let cleaned = clean("Prior work \\cite{smith2020} shows [12] gains (Smith et al., 2020).");
        assert_eq!(cleaned, "Prior work shows gains .");
    }

    #[test]
    fn href_keeps_display_text_only() {
        let cleaned = clean("See \\href{https://example.com}{the project page} for more.");
        assert_eq!(cleaned, "See the project page for more.");
    }

    #[test]
    fn tabular_becomes_readable_rows() {
        let cleaned = clean("\\begin{tabular}{lc}\nname & score \\\\\nalpha & 3 \\\\\n\\end{tabular}");
        assert_eq!(cleaned, "TABLE:\nname | score\nalpha | 3");
    }

    #[test]
    fn unknown_environments_are_dropped_entirely() {
        let cleaned = clean("Before.\n\\begin{figure}\\includegraphics{plot.png}\\end{figure}\nAfter.");
        assert_eq!(cleaned, "Before.\n\nAfter.");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean("Just ordinary   text."), "Just ordinary text.");
    }

    #[test]
    fn strip_citations_keeps_non_citation_brackets() {
        assert_eq!(strip_citations("see [below] and [3, 4-6]"), "see [below] and ");
    }

    #[test]
    fn import_rejects_unknown_extensions() {
        let err = import_file(Path::new("paper.pdf")).unwrap_err();
        assert!(matches!(err, NarrateError::UnsupportedFile(ext) if ext == "pdf"));
    }

    #[test]
    fn import_reads_and_cleans_latex() {
        let path = std::env::temp_dir().join("narrate_import_test.tex");
        std::fs::write(&path, "\\section{Title}\nBody text. % draft").unwrap();
        let text = import_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text, "Title\n\nBody text.");
    }

    #[test]
    fn import_with_nothing_left_is_an_error() {
        let path = std::env::temp_dir().join("narrate_import_empty.tex");
        std::fs::write(&path, "% only comments\n$x + y$\n").unwrap();
        let err = import_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, NarrateError::NothingToRead));
    }
}
