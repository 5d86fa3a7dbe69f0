//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::SiteConfig;

/// A top-level node of a rendered document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph,
    /// `highlighted` is true when a language grammar was applied
    CodeBlock { lang: Option<String>, highlighted: bool },
    Table { columns: usize },
    List { ordered: bool, tasks: bool },
    BlockQuote,
    Html,
    Rule,
    Footnote,
}

/// Output of [`MarkdownRenderer::render`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedContent {
    /// Rendered HTML fragment
    pub html: String,
    /// Top-level structure of the document, in order
    pub outline: Vec<Block>,
}

impl RenderedContent {
    /// Text of the first heading, if any
    pub fn first_heading(&self) -> Option<&str> {
        self.outline.iter().find_map(|b| match b {
            Block::Heading { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
    allow_raw_html: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false, true)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool, allow_raw_html: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
            allow_raw_html,
        }
    }

    /// Create from the site's `highlight` and `markdown` settings
    pub fn from_config(config: &SiteConfig) -> Self {
        Self::with_options(
            &config.highlight.theme,
            config.highlight.line_number,
            config.markdown.allow_raw_html,
        )
    }

    /// Render markdown to HTML plus an outline of its top-level blocks
    pub fn render(&self, markdown: &str) -> RenderedContent {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut outline = OutlineBuilder::default();
        let mut code_block: Option<Option<String>> = None;
        let mut code_block_content = String::new();

        for event in parser {
            outline.observe(&event);

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(code_lang(&kind));
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_block.take().flatten();
                    let (html, highlighted) =
                        self.highlight_code(&code_block_content, lang.as_deref());
                    outline.code_highlighted(highlighted);
                    events.push(Event::Html(CowStr::from(html)));
                }
                Event::Text(text) if code_block.is_some() => {
                    code_block_content.push_str(&text);
                }
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_raw_html => {
                    events.push(Event::Text(raw));
                }
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) if !self.allow_raw_html && is_script_url(&dest_url) => {
                    events.push(Event::Start(Tag::Link {
                        link_type,
                        dest_url: CowStr::Borrowed("#"),
                        title,
                        id,
                    }));
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedContent {
            html: html_output,
            outline: outline.finish(),
        }
    }

    /// Highlight a code block. The flag is false when no grammar matched `lang`.
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> (String, bool) {
        let grammar = lang.and_then(|lang| {
            self.syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
        });
        let lang = lang.unwrap_or("text");
        let syntax = grammar.unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next());

        let highlighted = theme.and_then(|theme| {
            highlighted_html_for_string(code, &self.syntax_set, syntax, theme).ok()
        });

        match highlighted {
            Some(highlighted) if self.line_numbers => (
                self.add_line_numbers(&highlighted, code.lines().count(), lang),
                grammar.is_some(),
            ),
            Some(highlighted) => (
                format!(
                    r#"<figure class="highlight {}">{}</figure>"#,
                    lang, highlighted
                ),
                grammar.is_some(),
            ),
            None => (
                format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    lang,
                    html_escape(code)
                ),
                false,
            ),
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, highlighted: &str, line_count: usize, lang: &str) -> String {
        let gutter = (1..=line_count)
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
            lang, gutter, highlighted
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects top-level blocks while the parser streams events
#[derive(Default)]
struct OutlineBuilder {
    blocks: Vec<Block>,
    depth: usize,
    heading: Option<(u8, String)>,
    /// Index of a top-level code block awaiting its highlight result
    code: Option<usize>,
}

impl OutlineBuilder {
    fn observe(&mut self, event: &Event) {
        match event {
            Event::Start(tag) => {
                if self.depth == 0 {
                    self.open(tag);
                }
                self.depth += 1;
            }
            Event::End(end) => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    if let (TagEnd::Heading(_), Some((level, text))) = (end, self.heading.take()) {
                        self.blocks.push(Block::Heading {
                            level,
                            text: text.trim().to_string(),
                        });
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading)) = self.heading.as_mut() {
                    heading.push_str(text);
                }
            }
            Event::TaskListMarker(_) => {
                if let Some(Block::List { tasks, .. }) = self.blocks.last_mut() {
                    *tasks = true;
                }
            }
            Event::Rule if self.depth == 0 => self.blocks.push(Block::Rule),
            Event::Html(_) if self.depth == 0 => self.blocks.push(Block::Html),
            _ => {}
        }
    }

    fn open(&mut self, tag: &Tag) {
        let block = match tag {
            Tag::Heading { level, .. } => {
                self.heading = Some((*level as u8, String::new()));
                return;
            }
            Tag::Paragraph => Block::Paragraph,
            Tag::CodeBlock(kind) => {
                self.code = Some(self.blocks.len());
                Block::CodeBlock {
                    lang: code_lang(kind),
                    highlighted: false,
                }
            }
            Tag::Table(alignments) => Block::Table {
                columns: alignments.len(),
            },
            Tag::List(start) => Block::List {
                ordered: start.is_some(),
                tasks: false,
            },
            Tag::BlockQuote(_) => Block::BlockQuote,
            Tag::HtmlBlock => Block::Html,
            Tag::FootnoteDefinition(_) => Block::Footnote,
            _ => return,
        };
        self.blocks.push(block);
    }

    /// Record whether the last top-level code block was highlighted
    fn code_highlighted(&mut self, highlighted: bool) {
        if let Some(Block::CodeBlock { highlighted: h, .. }) =
            self.code.take().and_then(|i| self.blocks.get_mut(i))
        {
            *h = highlighted;
        }
    }

    fn finish(self) -> Vec<Block> {
        self.blocks
    }
}

/// Language token of a code block: the first word of the info string, cut at
/// the first character that cannot appear in a language name
fn code_lang(kind: &CodeBlockKind) -> Option<String> {
    let CodeBlockKind::Fenced(info) = kind else {
        return None;
    };
    let word = info.split_whitespace().next().unwrap_or("");
    let lang: String = word
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
        .collect();
    (!lang.is_empty()).then_some(lang)
}

/// Whether a link target would run script when followed
fn is_script_url(url: &str) -> bool {
    let scheme: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .take_while(|c| *c != ':')
        .collect::<String>()
        .to_ascii_lowercase();
    url.contains(':') && matches!(scheme.as_str(), "javascript" | "vbscript" | "data")
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("# Hello World\n\nThis is a test.");
        assert!(out.html.contains("<h1>Hello World</h1>"));
        assert!(out.html.contains("<p>This is a test.</p>"));
        assert_eq!(
            out.outline,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Hello World".to_string()
                },
                Block::Paragraph,
            ]
        );
        assert_eq!(out.first_heading(), Some("Hello World"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("```rust\nfn main() {}\n```");
        assert!(out.html.contains(r#"<figure class="highlight rust">"#));
        assert!(out.html.contains("style="));
        assert_eq!(
            out.outline,
            vec![Block::CodeBlock {
                lang: Some("rust".to_string()),
                highlighted: true
            }]
        );
    }

    #[test]
    fn test_render_code_block_with_line_numbers() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", true, true);
        let out = renderer.render("```python\na = 1\nb = 2\n```");
        assert!(out.html.contains(r#"<span class="line-number">2</span>"#));
        assert!(!out.html.contains(r#"<span class="line-number">3</span>"#));
    }

    #[test]
    fn test_render_table() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.html.contains("<table>"));
        assert_eq!(out.outline, vec![Block::Table { columns: 2 }]);
    }

    #[test]
    fn test_render_gfm_extensions() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("~~gone~~\n\n- [x] done\n- [ ] todo\n");
        assert!(out.html.contains("<del>gone</del>"));
        assert!(out.html.contains(r#"type="checkbox""#));
        assert_eq!(
            out.outline,
            vec![
                Block::Paragraph,
                Block::List {
                    ordered: false,
                    tasks: true
                },
            ]
        );
    }

    #[test]
    fn test_render_is_stable() {
        let renderer = MarkdownRenderer::new();
        let input = "# T\n\n```js\nlet x = 1;\n```\n\n| a |\n|---|\n| 1 |\n";
        assert_eq!(renderer.render(input), renderer.render(input));
    }

    #[test]
    fn test_raw_html_passthrough() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("<div class=\"note\">hi</div>\n\ntext <kbd>K</kbd>");
        assert!(out.html.contains(r#"<div class="note">hi</div>"#));
        assert!(out.html.contains("<kbd>K</kbd>"));
        assert_eq!(out.outline[0], Block::Html);
    }

    #[test]
    fn test_raw_html_escaped_when_disabled() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", false, false);
        let out = renderer.render("<script>alert(1)</script>\n\ntext <b>x</b>");
        assert!(!out.html.contains("<script>"));
        assert!(out.html.contains("&lt;script&gt;"));
        assert!(out.html.contains("&lt;b&gt;x&lt;/b&gt;"));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("## Using `tokio`\n");
        assert_eq!(out.first_heading(), Some("Using tokio"));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let renderer = MarkdownRenderer::with_options("no-such-theme", false, true);
        let out = renderer.render("```\nplain\n```");
        assert!(out.html.contains("plain"));
        assert_eq!(
            out.outline,
            vec![Block::CodeBlock {
                lang: None,
                highlighted: false
            }]
        );
    }

    #[test]
    fn test_code_language_cannot_inject_markup() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", false, false);
        let out = renderer.render("```x\"><img/src=x/onerror=alert(1)>\ncode\n```\n");
        assert!(!out.html.contains("<img"));
        assert!(out.html.contains(r#"<figure class="highlight x">"#));

        let numbered = MarkdownRenderer::with_options("base16-ocean.dark", true, false);
        let out = numbered.render("```rust\"><b>\nfn main() {}\n```\n");
        assert!(!out.html.contains("<b>"));
        assert!(out.html.contains(r#"<figure class="highlight rust">"#));
    }

    #[test]
    fn test_script_links_neutralized_when_raw_html_disabled() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", false, false);
        let out = renderer.render("[a](javascript:alert(2)) [b]( JavaScript:alert(3)) [c](https://x.dev)");
        assert!(!out.html.to_ascii_lowercase().contains("javascript:"));
        assert!(out.html.contains(r##"<a href="#">a</a>"##));
        assert!(out.html.contains(r#"<a href="https://x.dev">c</a>"#));

        let trusted = MarkdownRenderer::new();
        let out = trusted.render("[a](javascript:void(0))");
        assert!(out.html.contains("javascript:void(0)"));
    }

    #[test]
    fn test_outline_reports_actual_highlighting() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("```\nplain\n```\n\n```nosuchlang\nx\n```\n\n```java\nclass A {}\n```\n");
        assert_eq!(
            out.outline,
            vec![
                Block::CodeBlock {
                    lang: None,
                    highlighted: false
                },
                Block::CodeBlock {
                    lang: Some("nosuchlang".to_string()),
                    highlighted: false
                },
                Block::CodeBlock {
                    lang: Some("java".to_string()),
                    highlighted: true
                },
            ]
        );
    }

    #[test]
    fn test_nested_code_block_leaves_outline_alone() {
        let renderer = MarkdownRenderer::new();
        let out = renderer.render("- item\n\n  ```rust\n  let x = 1;\n  ```\n\n```python\nx = 1\n```\n");
        assert_eq!(
            out.outline,
            vec![
                Block::List {
                    ordered: false,
                    tasks: false
                },
                Block::CodeBlock {
                    lang: Some("python".to_string()),
                    highlighted: true
                },
            ]
        );
    }
}
