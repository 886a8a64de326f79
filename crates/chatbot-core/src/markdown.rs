//! Markdown rendering for bot turns.
//!
//! Answers are parsed into a flat list of display blocks that a UI can style
//! without knowing about markdown. Fenced code keeps its language tag so it
//! can be highlighted or copied.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    /// `ordinal` is set for numbered lists.
    ListItem { depth: usize, ordinal: Option<u64>, text: String },
    Code(CodeBlock),
    Rule,
}

#[derive(Default)]
struct Renderer {
    blocks: Vec<Block>,
    buf: String,
    code_language: Option<Option<String>>,
    lists: Vec<Option<u64>>,
    item_depth: usize,
}

impl Renderer {
    fn flush_item(&mut self) {
        let text = self.buf.trim().to_string();
        self.buf.clear();
        if text.is_empty() {
            return;
        }
        let ordinal = self.lists.last().copied().flatten();
        self.blocks.push(Block::ListItem {
            depth: self.item_depth.saturating_sub(1),
            ordinal,
            text,
        });
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) | Event::Start(Tag::Heading { .. }) => {
                if self.item_depth == 0 {
                    self.buf.clear();
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.item_depth > 0 {
                    self.buf.push('\n');
                } else {
                    let text = self.buf.trim().to_string();
                    self.buf.clear();
                    if !text.is_empty() {
                        self.blocks.push(Block::Paragraph(text));
                    }
                }
            }
            Event::End(TagEnd::Heading(level)) => {
                let text = self.buf.trim().to_string();
                self.buf.clear();
                self.blocks.push(Block::Heading {
                    level: level as u8,
                    text,
                });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                if self.item_depth > 0 {
                    self.flush_item();
                }
                self.buf.clear();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) => {
                        let lang = lang.split_whitespace().next().unwrap_or("");
                        (!lang.is_empty()).then(|| lang.to_string())
                    }
                    CodeBlockKind::Indented => None,
                };
                self.code_language = Some(language);
            }
            Event::End(TagEnd::CodeBlock) => {
                let language = self.code_language.take().flatten();
                let code = self.buf.trim_end_matches('\n').to_string();
                self.buf.clear();
                self.blocks.push(Block::Code(CodeBlock { language, code }));
            }
            Event::Start(Tag::List(start)) => {
                if self.item_depth > 0 {
                    self.flush_item();
                }
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                self.buf.clear();
                self.item_depth += 1;
            }
            Event::End(TagEnd::Item) => {
                self.flush_item();
                self.item_depth = self.item_depth.saturating_sub(1);
                if let Some(Some(n)) = self.lists.last_mut() {
                    *n += 1;
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.buf.push_str(&text)
            }
            Event::Code(code) => {
                self.buf.push('`');
                self.buf.push_str(&code);
                self.buf.push('`');
            }
            Event::SoftBreak => self.buf.push(' '),
            Event::HardBreak => self.buf.push('\n'),
            Event::Rule => self.blocks.push(Block::Rule),
            _ => {}
        }
    }
}

/// Parse markdown into display blocks.
pub fn render(text: &str) -> Vec<Block> {
    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        renderer.event(event);
    }
    let tail = renderer.buf.trim();
    if !tail.is_empty() {
        renderer.blocks.push(Block::Paragraph(tail.to_string()));
    }
    renderer.blocks
}

/// All code blocks in `text`, in order.
pub fn code_blocks(text: &str) -> Vec<CodeBlock> {
    render(text)
        .into_iter()
        .filter_map(|block| match block {
            Block::Code(code) => Some(code),
            _ => None,
        })
        .collect()
}

/// The code in an answer: every code block joined by a blank line, or `None`
/// if the answer has no code blocks.
pub fn extract_code(text: &str) -> Option<String> {
    let blocks = code_blocks(text);
    if blocks.is_empty() {
        return None;
    }
    Some(
        blocks
            .into_iter()
            .map(|b| b.code)
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_headings() {
        let blocks = render("# Title\n\nSome *text*\nwrapped.\n\n---\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Paragraph("Some text wrapped.".into()),
                Block::Rule,
            ]
        );
    }

    #[test]
    fn test_fenced_code_keeps_language() {
        let blocks = code_blocks("Try:\n\n```python\nprint('hi')\n```\n");
        assert_eq!(
            blocks,
            vec![CodeBlock {
                language: Some("python".into()),
                code: "print('hi')".into(),
            }]
        );
    }

    #[test]
    fn test_numbered_list() {
        let blocks = render("1. one\n2. `two`\n");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    depth: 0,
                    ordinal: Some(1),
                    text: "one".into()
                },
                Block::ListItem {
                    depth: 0,
                    ordinal: Some(2),
                    text: "`two`".into()
                },
            ]
        );
    }

    #[test]
    fn test_extract_code_joins_blocks() {
        let answer = "A\n\n```\nx = 1\n```\n\nB\n\n```py\ny = 2\n```";
        assert_eq!(extract_code(answer).unwrap(), "x = 1\n\ny = 2");
        assert!(extract_code("no code here").is_none());
    }
}
