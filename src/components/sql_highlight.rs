//! SQL syntax highlighting for the query editor

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "JOIN", "INNER", "LEFT", "RIGHT", "OUTER", "FULL", "CROSS", "ON",
    "USING", "AS", "AND", "OR", "NOT", "IN", "EXISTS", "BETWEEN", "LIKE", "ILIKE", "IS", "NULL",
    "TRUE", "FALSE", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC", "LIMIT", "OFFSET", "WITH",
    "CASE", "WHEN", "THEN", "ELSE", "END", "DISTINCT", "UNION", "ALL", "INTERSECT", "EXCEPT",
    "OVER", "PARTITION", "INTERVAL", "ARRAY", "FORMAT",
];

const FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "CAST", "COALESCE", "IF", "NOW", "TODAY", "TODATE",
    "TODATETIME", "TOSTARTOFDAY", "TOSTARTOFWEEK", "TOSTARTOFMONTH", "ROUND", "UNIQ",
];

#[derive(Debug, PartialEq, Clone, Copy)]
enum TokenKind {
    Keyword,
    Function,
    String,
    Number,
    Comment,
    Variable,
    Identifier,
    Whitespace,
    Punctuation,
}

/// Split `sql` into `(kind, text)` tokens; the texts concatenate back to `sql`
fn tokenize(sql: &str) -> Vec<(TokenKind, &str)> {
    let mut tokens = Vec::new();
    let bytes = sql.as_bytes();
    let mut pos = 0;

    // Everything up to (and including) `close`, or the rest of the input
    let until = |from: usize, close: &str| -> usize {
        sql[from..]
            .find(close)
            .map(|i| from + i + close.len())
            .unwrap_or(sql.len())
    };

    while pos < sql.len() {
        let rest = &sql[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        let (kind, end) = if rest.starts_with("--") {
            let len = rest.find('\n').unwrap_or(rest.len());
            (TokenKind::Comment, pos + len)
        } else if rest.starts_with("/*") {
            (TokenKind::Comment, until(pos + 2, "*/"))
        } else if rest.starts_with("{variables.") {
            (TokenKind::Variable, until(pos, "}"))
        } else if ch == '\'' || ch == '"' || ch == '`' {
            let quote = &rest[..1];
            (TokenKind::String, until(pos + 1, quote))
        } else if ch.is_whitespace() {
            let len = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            (TokenKind::Whitespace, pos + len)
        } else if ch.is_alphanumeric() || ch == '_' {
            let len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            (classify_word(word, bytes.get(pos + len) == Some(&b'(')), pos + len)
        } else {
            (TokenKind::Punctuation, pos + ch.len_utf8())
        };

        tokens.push((kind, &sql[pos..end]));
        pos = end;
    }

    tokens
}

fn classify_word(word: &str, called: bool) -> TokenKind {
    let upper = word.to_uppercase();
    if KEYWORDS.contains(&upper.as_str()) {
        TokenKind::Keyword
    } else if called || FUNCTIONS.contains(&upper.as_str()) {
        TokenKind::Function
    } else if word.chars().all(|c| c.is_ascii_digit() || c == '.') {
        TokenKind::Number
    } else {
        TokenKind::Identifier
    }
}

fn style_for(kind: TokenKind, dark_mode: bool) -> Style {
    let text = if dark_mode { Color::White } else { Color::Black };
    match kind {
        TokenKind::Keyword => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        TokenKind::Function => Style::default().fg(Color::Blue),
        TokenKind::String => Style::default().fg(Color::Green),
        TokenKind::Number => Style::default().fg(Color::Magenta),
        TokenKind::Comment => Style::default().fg(Color::DarkGray),
        TokenKind::Variable => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        TokenKind::Identifier => Style::default().fg(text),
        TokenKind::Whitespace => Style::default(),
        TokenKind::Punctuation => Style::default().fg(Color::Gray),
    }
}

/// Highlight SQL into one `Line` per source line
pub fn highlight_sql(sql: &str, dark_mode: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();

    for (kind, text) in tokenize(sql) {
        let style = style_for(kind, dark_mode);
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
            if !part.is_empty() {
                spans.push(Span::styled(part.to_string(), style));
            }
        }
    }
    lines.push(Line::from(spans));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<(TokenKind, &str)> {
        tokenize(sql)
            .into_iter()
            .filter(|(k, _)| *k != TokenKind::Whitespace)
            .collect()
    }

    #[test]
    fn test_tokens_concatenate_back() {
        let sql = "SELECT a, 'x y' -- note\nFROM t /* c */ WHERE b = {variables.day}";
        let joined: String = tokenize(sql).iter().map(|(_, t)| *t).collect();
        assert_eq!(joined, sql);
    }

    #[test]
    fn test_tokenize_select() {
        assert_eq!(
            kinds("select count(*) from events"),
            vec![
                (TokenKind::Keyword, "select"),
                (TokenKind::Function, "count"),
                (TokenKind::Punctuation, "("),
                (TokenKind::Punctuation, "*"),
                (TokenKind::Punctuation, ")"),
                (TokenKind::Keyword, "from"),
                (TokenKind::Identifier, "events"),
            ]
        );
    }

    #[test]
    fn test_strings_comments_variables() {
        let tokens = kinds("where name = 'O''Neil' -- tail");
        assert!(tokens.contains(&(TokenKind::String, "'O'")));
        assert_eq!(tokens.last(), Some(&(TokenKind::Comment, "-- tail")));

        let tokens = kinds("limit {variables.rows}");
        assert_eq!(tokens[1], (TokenKind::Variable, "{variables.rows}"));
        assert_eq!(kinds("100")[0], (TokenKind::Number, "100"));
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let tokens = kinds("select 'abc");
        assert_eq!(tokens[1], (TokenKind::String, "'abc"));
    }

    #[test]
    fn test_highlight_keeps_line_count() {
        assert_eq!(highlight_sql("select 1\nfrom t\n", true).len(), 3);
        assert_eq!(highlight_sql("", false).len(), 1);
    }
}
