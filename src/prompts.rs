//! Static prompt catalogue offered to agents.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

pub const XMLUI_RULES: &str = "xmlui_rules";
pub const COMPONENT_AUTHOR: &str = "xmlui_component_author";

const RULES_TEXT: &str = "\
You are writing XMLUI applications. Follow these rules for the whole session.

1. Never invent components, properties, events, or URLs. If a name is not in
   list_components or component_docs output, it does not exist.
2. Before using a component, call component_docs for it and use only the
   properties and events listed there.
3. Cite documentation only with URLs the tools returned. Do not construct
   URLs by hand.
4. Prefer search_howto for task-shaped questions (\"how do I ...\") and
   examples for working markup; use search for everything else.
5. When a search reports low confidence or no matches, say so and ask for
   clarification instead of guessing.
6. Keep markup minimal: one component per concern, expressions in {braces},
   event handlers as inline expressions or <event> children.
7. Do not combine features that never appear together in one snippet
   without stating that the combination is unverified.
";

const COMPONENT_AUTHOR_TEXT: &str = "\
You are helping author or modify an XMLUI component.

1. Read the framework source with read_file under xmlui/src/components/ before
   proposing changes; match the existing renderer and metadata patterns.
2. Every property needs a metadata entry with a description and, where it
   applies, a default value.
3. Theme variables follow the component's existing naming scheme; check the
   .scss module next to the component.
4. Update the reference page under docs/content/components/ in the same
   change, keeping the Properties and Events sections in sync with metadata.
5. Link only to documentation URLs the tools returned.
";

pub const PROMPTS: &[Prompt] = &[
    Prompt {
        name: XMLUI_RULES,
        description: "Ground rules for writing XMLUI markup with these tools",
        content: RULES_TEXT,
    },
    Prompt {
        name: COMPONENT_AUTHOR,
        description: "Guidance for authoring or changing an XMLUI component",
        content: COMPONENT_AUTHOR_TEXT,
    },
];

pub fn find(name: &str) -> Option<&'static Prompt> {
    PROMPTS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_known_prompts() {
        assert!(find(XMLUI_RULES).unwrap().content.contains("Never invent"));
        assert!(find(COMPONENT_AUTHOR).is_some());
        assert!(find("missing").is_none());
    }
}
