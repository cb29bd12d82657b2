//! Section labels for corpus files.

use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Components,
    Howtos,
    Examples,
    Source,
    Blog,
    Unknown,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Components => "components",
            Section::Howtos => "howtos",
            Section::Examples => "examples",
            Section::Source => "source",
            Section::Blog => "blog",
            Section::Unknown => "unknown",
        }
    }

    /// Multiplier applied to term coverage when scoring a file.
    pub fn weight(self) -> f64 {
        match self {
            Section::Components | Section::Howtos => 1.5,
            Section::Examples => 1.2,
            Section::Source => 1.0,
            Section::Blog => 0.8,
            Section::Unknown => 0.5,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier signature carried by a mediator config.
pub type Classifier = fn(&str, &Path) -> Section;

/// Default classifier keyed on the snapshot-relative path.
pub fn classify(rel: &str, _abs: &Path) -> Section {
    let rel = rel.replace('\\', "/");
    if rel.contains("docs/content/components/") {
        Section::Components
    } else if rel.starts_with("howto/") || rel.contains("/howto/") {
        Section::Howtos
    } else if rel.starts_with("blog/") || rel.contains("/blog/") {
        Section::Blog
    } else if rel.contains("docs/src/components/") || has_segment(&rel, "examples") {
        Section::Examples
    } else if rel.starts_with("xmlui/src/") || rel.starts_with("packages/") {
        Section::Source
    } else {
        Section::Unknown
    }
}

/// Classifier for user-supplied example roots: everything is an example.
pub fn classify_examples(_rel: &str, _abs: &Path) -> Section {
    Section::Examples
}

fn has_segment(rel: &str, name: &str) -> bool {
    rel.split('/').any(|s| s == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(rel: &str) -> Section {
        classify(rel, Path::new(rel))
    }

    #[test]
    fn test_classify_known_spaces() {
        assert_eq!(c("docs/content/components/Button.md"), Section::Components);
        assert_eq!(c("docs/content/components/xmlui-search/Search.md"), Section::Components);
        assert_eq!(c("docs/content/pages/howto/paginate-a-list.md"), Section::Howtos);
        assert_eq!(c("docs/public/pages/blog/release-1.md"), Section::Blog);
        assert_eq!(c("docs/src/components/Demo.xmlui.tsx"), Section::Examples);
        assert_eq!(c("xmlui/src/components/Button/Button.tsx"), Section::Source);
        assert_eq!(c("docs/content/pages/markup.md"), Section::Unknown);
    }

    #[test]
    fn test_weights_are_ordered() {
        assert!(Section::Components.weight() > Section::Examples.weight());
        assert!(Section::Examples.weight() > Section::Source.weight());
        assert!(Section::Blog.weight() > Section::Unknown.weight());
        assert_eq!(Section::Howtos.weight(), Section::Components.weight());
    }
}
