use ratatui::style::{Color, Style};
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

const THEME: &str = "base16-ocean.dark";

/// Cached syntax highlighting state, loaded once and reused for all files.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
    enabled: bool,
}

impl Highlighter {
    pub fn new(enabled: bool) -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        Highlighter {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: theme_set.themes.remove(THEME),
            enabled,
        }
    }

    /// Highlight one diff or context line.
    /// `filename` picks the syntax; `base_style` carries the add/delete
    /// background, which is kept under the syntax foreground.
    pub fn highlight_line(&self, line: &str, filename: &str, base_style: Style) -> Vec<Span<'static>> {
        let plain = || vec![Span::styled(line.to_string(), base_style)];
        let theme = match (&self.theme, self.enabled) {
            (Some(theme), true) => theme,
            _ => return plain(),
        };

        let syntax = self
            .syntax_set
            .find_syntax_for_file(filename)
            .ok()
            .flatten()
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);

        // syntect needs a trailing newline
        let input = format!("{}\n", line);

        match highlighter.highlight_line(&input, &self.syntax_set) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(syn_style, text)| {
                    let fg = Color::Rgb(
                        syn_style.foreground.r,
                        syn_style.foreground.g,
                        syn_style.foreground.b,
                    );
                    Span::styled(text.trim_end_matches('\n').to_string(), base_style.fg(fg))
                })
                .filter(|span| !span.content.is_empty())
                .collect(),
            Err(_) => plain(),
        }
    }
}
