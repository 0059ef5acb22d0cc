//! Turn navigation pages into indexable section documents.

use crate::document::{Document, ANCHOR, HEADING, TAG, TEXT, TITLE};
use crate::site::{LocaleConfig, PageRef};
use anyhow::Result;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Markdown file behind a site link: `/a/b` → `root/a/b.md`, `/a/` → `root/a/index.md`.
pub fn link_to_path(root: &Path, link: &str) -> PathBuf {
    let link = link.split(|c: char| c == '#' || c == '?').next().unwrap_or("");
    let rel = link.trim_start_matches('/');
    if rel.is_empty() || rel.ends_with('/') {
        return root.join(rel).join("index.md");
    }
    let stem = rel.strip_suffix(".html").or_else(|| rel.strip_suffix(".md")).unwrap_or(rel);
    root.join(format!("{stem}.md"))
}

/// Read and split every page of `locale`. Pages whose file is missing are
/// skipped with a warning.
pub fn collect_locale(locale: &LocaleConfig, docs_root: &Path) -> Result<Vec<Document>> {
    let mut docs = Vec::new();
    for page in locale.pages() {
        let path = link_to_path(docs_root, &page.link);
        match std::fs::read_to_string(&path) {
            Ok(markdown) => docs.extend(split_sections(&page, &markdown)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(link = %page.link, path = %path.display(), "page file missing, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(lang = %locale.lang, num_docs = docs.len(), "collected sections");
    Ok(docs)
}

#[derive(Debug, Default, PartialEq)]
struct FrontMatter {
    title: Option<String>,
    tags: Vec<String>,
}

/// Split a markdown page into one document per section.
///
/// The text before the first `##`-or-deeper heading becomes the lead section
/// with id `link`; every later heading starts a section `link#anchor`.
/// Headings inside code fences are ignored.
pub fn split_sections(page: &PageRef, markdown: &str) -> Vec<Document> {
    let (fm, body) = front_matter(markdown);
    let mut title = fm.title.clone();
    let mut sections: Vec<(Option<(String, String)>, Vec<&str>)> = vec![(None, Vec::new())];
    let mut slugs: HashMap<String, usize> = HashMap::new();
    let mut in_fence = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            if let Some((level, text)) = parse_heading(line) {
                let (text, custom_anchor) = split_custom_anchor(text);
                if level == 1 {
                    if title.is_none() {
                        title = Some(text.to_string());
                    }
                    continue;
                }
                let anchor = unique_slug(&mut slugs, custom_anchor.map_or_else(|| slugify(text), str::to_string));
                sections.push((Some((text.to_string(), anchor)), Vec::new()));
                continue;
            }
        }
        if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }

    let title = title.unwrap_or_else(|| page.title.clone());
    let tags = fm.tags.join(", ");
    sections
        .into_iter()
        .map(|(heading, lines)| {
            let text = lines.join("\n").trim().to_string();
            let mut doc = match &heading {
                Some((_, anchor)) => Document::new(format!("{}#{}", page.link, anchor)),
                None => Document::new(page.link.clone()),
            };
            doc = doc.with_field(TITLE, title.clone());
            if let Some((heading, anchor)) = heading {
                doc = doc.with_field(HEADING, heading).with_field(ANCHOR, anchor);
            }
            if !text.is_empty() {
                doc = doc.with_field(TEXT, text);
            }
            if !tags.is_empty() {
                doc = doc.with_field(TAG, tags.clone());
            }
            doc
        })
        .collect()
}

fn front_matter(markdown: &str) -> (FrontMatter, &str) {
    let Some(rest) = markdown.strip_prefix("---\n").or_else(|| markdown.strip_prefix("---\r\n")) else {
        return (FrontMatter::default(), markdown);
    };
    let mut fm = FrontMatter::default();
    let mut offset = 0;
    let mut in_tags = false;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end();
        if line == "---" {
            return (fm, &rest[offset..]);
        }
        if in_tags {
            if let Some(item) = line.trim_start().strip_prefix("- ") {
                fm.tags.push(unquote(item).to_string());
                continue;
            }
            in_tags = false;
        }
        if let Some(v) = line.strip_prefix("title:") {
            fm.title = Some(unquote(v).to_string()).filter(|t| !t.is_empty());
        } else if let Some(v) = line.strip_prefix("tags:") {
            let v = v.trim().trim_start_matches('[').trim_end_matches(']');
            fm.tags.extend(v.split(',').map(unquote).filter(|t| !t.is_empty()).map(str::to_string));
            in_tags = v.is_empty();
        }
    }
    // unterminated front matter: treat the whole file as body
    (FrontMatter::default(), markdown)
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c: char| c == '"' || c == '\'')
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end();
    Some((level, text))
}

/// `Title {#custom-id}` → (`Title`, `custom-id`).
fn split_custom_anchor(text: &str) -> (&str, Option<&str>) {
    if let Some(start) = text.rfind("{#") {
        if let Some(id) = text[start + 2..].strip_suffix('}') {
            return (text[..start].trim_end(), Some(id));
        }
    }
    (text, None)
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn unique_slug(seen: &mut HashMap<String, usize>, slug: String) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    *count += 1;
    if *count == 1 { slug } else { format!("{slug}-{}", *count - 1) }
}
