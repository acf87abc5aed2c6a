//! Dream Text Block Parser
//!
//! Converts a backend-returned interpretation string into an ordered
//! sequence of paragraph/list display blocks. The backend mixes prose with
//! `- ` bullet lines in one free-form string; surfaces want structured
//! blocks they can render independently.
//!
//! Pure function: no side effects, deterministic, stateless across calls.

use serde::{Deserialize, Serialize};

/// One display block of an interpretation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InterpretationBlock {
    /// A paragraph of prose
    Text {
        /// Paragraph content
        content: String,
    },
    /// A bullet list
    List {
        /// List items, in source order
        items: Vec<String>,
    },
}

impl InterpretationBlock {
    /// Text block constructor
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// List block constructor
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse free-form interpretation text into display blocks
///
/// Lines are trimmed. Lines prefixed with `- ` accumulate into a pending
/// list; any other non-empty line flushes the pending list (if any) and
/// emits a text block; blank lines flush without emitting a block of their
/// own. A trailing list is flushed at end of input.
#[must_use]
pub fn parse_blocks(text: &str) -> Vec<InterpretationBlock> {
    let mut blocks = Vec::new();
    let mut list_buffer: Vec<String> = Vec::new();

    for line in text.split('\n') {
        let line = line.trim();

        if let Some(item) = line.strip_prefix("- ") {
            list_buffer.push(item.to_string());
        } else {
            if !list_buffer.is_empty() {
                blocks.push(InterpretationBlock::List {
                    items: std::mem::take(&mut list_buffer),
                });
            }
            if !line.is_empty() {
                blocks.push(InterpretationBlock::text(line));
            }
        }
    }

    if !list_buffer.is_empty() {
        blocks.push(InterpretationBlock::List { items: list_buffer });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_string_gives_no_blocks() {
        assert_eq!(parse_blocks(""), vec![]);
    }

    #[test]
    fn test_blank_lines_only_give_no_blocks() {
        assert_eq!(parse_blocks("\n\n   \n"), vec![]);
    }

    #[test]
    fn test_text_list_text_alternation() {
        let blocks = parse_blocks("a\n- b\n- c\nd");
        assert_eq!(
            blocks,
            vec![
                InterpretationBlock::text("a"),
                InterpretationBlock::list(["b", "c"]),
                InterpretationBlock::text("d"),
            ]
        );
    }

    #[test]
    fn test_only_list_lines_give_single_list() {
        let blocks = parse_blocks("- x\n- y");
        assert_eq!(blocks, vec![InterpretationBlock::list(["x", "y"])]);
    }

    #[test]
    fn test_blank_line_flushes_list_without_own_block() {
        let blocks = parse_blocks("- x\n\n- y");
        assert_eq!(
            blocks,
            vec![
                InterpretationBlock::list(["x"]),
                InterpretationBlock::list(["y"]),
            ]
        );
    }

    #[test]
    fn test_lines_are_trimmed() {
        let blocks = parse_blocks("  water appears twice  \n   - depth\t");
        assert_eq!(
            blocks,
            vec![
                InterpretationBlock::text("water appears twice"),
                InterpretationBlock::list(["depth"]),
            ]
        );
    }

    #[test]
    fn test_bare_dash_is_prose() {
        // "-x" and "-" lack the "- " prefix and stay prose
        let blocks = parse_blocks("-x\n-");
        assert_eq!(
            blocks,
            vec![InterpretationBlock::text("-x"), InterpretationBlock::text("-")]
        );
    }

    #[test]
    fn test_reparse_round_trips_list_items() {
        let original = parse_blocks("intro\n- one\n- two\nclose");

        // Re-join the blocks the way a surface would render them
        let mut rendered = String::new();
        for block in &original {
            match block {
                InterpretationBlock::Text { content } => {
                    rendered.push_str(content);
                    rendered.push('\n');
                }
                InterpretationBlock::List { items } => {
                    for item in items {
                        rendered.push_str("- ");
                        rendered.push_str(item);
                        rendered.push('\n');
                    }
                }
            }
        }

        assert_eq!(parse_blocks(&rendered), original);
    }
}
