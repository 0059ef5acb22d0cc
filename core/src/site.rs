//! Site navigation model: locales, top nav and sidebars.
//!
//! The navigation tree is the document source for indexing. Each locale is
//! self-contained; nothing falls back to another locale's settings.

use crate::config::SearchConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavNode {
    Group {
        #[serde(rename = "text")]
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        link: Option<String>,
        #[serde(rename = "items")]
        children: Vec<NavNode>,
    },
    Leaf {
        #[serde(rename = "text")]
        title: String,
        link: String,
    },
}

impl NavNode {
    pub fn leaf(title: impl Into<String>, link: impl Into<String>) -> Self {
        NavNode::Leaf { title: title.into(), link: link.into() }
    }

    pub fn group(title: impl Into<String>, link: Option<&str>, children: Vec<NavNode>) -> Self {
        NavNode::Group { title: title.into(), link: link.map(str::to_string), children }
    }

    pub fn title(&self) -> &str {
        match self {
            NavNode::Group { title, .. } | NavNode::Leaf { title, .. } => title,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            NavNode::Group { link, .. } => link.as_deref(),
            NavNode::Leaf { link, .. } => Some(link),
        }
    }
}

/// A linked page found while walking the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub title: String,
    pub link: String,
    /// Titles of the enclosing groups, outermost first.
    pub trail: Vec<String>,
}

/// Per-locale theme settings. Only the navigation is read; other theme keys
/// (footer, labels, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub nav: Vec<NavNode>,
    /// Path prefix → sidebar tree shown under that prefix.
    pub sidebar: BTreeMap<String, Vec<NavNode>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocaleConfig {
    pub label: String,
    pub lang: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "themeConfig")]
    pub theme_config: ThemeConfig,
}

impl LocaleConfig {
    /// Every internal page linked from this locale's nav and sidebars, in
    /// document order. A link reached twice is reported once, at its first
    /// occurrence; external links are skipped.
    pub fn pages(&self) -> Vec<PageRef> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut trail = Vec::new();
        walk(&self.theme_config.nav, &mut trail, &mut seen, &mut out);
        for tree in self.theme_config.sidebar.values() {
            walk(tree, &mut trail, &mut seen, &mut out);
        }
        out
    }
}

fn walk(nodes: &[NavNode], trail: &mut Vec<String>, seen: &mut HashSet<String>, out: &mut Vec<PageRef>) {
    for node in nodes {
        if let Some(link) = node.link() {
            if is_internal(link) && seen.insert(link.to_string()) {
                out.push(PageRef { title: node.title().to_string(), link: link.to_string(), trail: trail.clone() });
            }
        }
        if let NavNode::Group { title, children, .. } = node {
            trail.push(title.clone());
            walk(children, trail, seen, out);
            trail.pop();
        }
    }
}

fn is_internal(link: &str) -> bool {
    link.starts_with('/') && !link.starts_with("//")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,
    /// Locale code (`root` for the default locale) → its settings.
    pub locales: BTreeMap<String, LocaleConfig>,
    pub search: SearchConfig,
}

impl SiteConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let site: SiteConfig = serde_json::from_str(&text)?;
        site.search.validate()?;
        Ok(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LocaleConfig {
        let json = r#"{
            "label": "English",
            "lang": "en",
            "themeConfig": {
                "siteTitle": "{ FE Interview }",
                "nav": [
                    { "text": "Home", "link": "/" },
                    { "text": "Framework", "link": "/frontend/framework" },
                    { "text": "GitHub", "link": "https://github.com/example" }
                ],
                "sidebar": {
                    "/frontend/": [
                        {
                            "text": "Frontend",
                            "items": [
                                { "text": "Overview", "link": "/frontend/" },
                                {
                                    "text": "JavaScript",
                                    "items": [
                                        { "text": "Basics", "link": "/frontend/javascript/basic" },
                                        { "text": "ES6+", "link": "/frontend/javascript/es6" }
                                    ]
                                },
                                { "text": "Framework", "link": "/frontend/framework" }
                            ]
                        }
                    ]
                },
                "outline": "deep",
                "docFooter": { "prev": "Previous", "next": "Next" }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_groups_and_leaves() {
        let locale = sample();
        let tree = &locale.theme_config.sidebar["/frontend/"];
        assert!(matches!(&tree[0], NavNode::Group { link: None, children, .. } if children.len() == 3));
        assert_eq!(locale.theme_config.nav[0], NavNode::leaf("Home", "/"));
    }

    #[test]
    fn pages_walk_in_order_without_duplicates() {
        let pages = sample().pages();
        let links: Vec<&str> = pages.iter().map(|p| p.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["/", "/frontend/framework", "/frontend/", "/frontend/javascript/basic", "/frontend/javascript/es6"]
        );
        let es6 = pages.iter().find(|p| p.link.ends_with("es6")).unwrap();
        assert_eq!(es6.trail, vec!["Frontend", "JavaScript"]);
    }

    #[test]
    fn group_links_are_pages_too() {
        let theme_config = ThemeConfig {
            nav: vec![NavNode::group("Guide", Some("/guide/"), vec![NavNode::leaf("Intro", "/guide/intro")])],
            ..ThemeConfig::default()
        };
        let locale = LocaleConfig { theme_config, ..LocaleConfig::default() };
        let links: Vec<String> = locale.pages().into_iter().map(|p| p.link).collect();
        assert_eq!(links, vec!["/guide/", "/guide/intro"]);
    }

    #[test]
    fn top_level_nav_is_rejected() {
        let json = r#"{ "lang": "en", "nav": [{ "text": "Home", "link": "/" }] }"#;
        let err = serde_json::from_str::<LocaleConfig>(json).unwrap_err();
        assert!(err.to_string().contains("unknown field `nav`"));
    }
}
