//! Byte spans of the values in a JSON document, keyed by their path.
//!
//! `serde_json::Value` drops positions, so the source text is lexed once
//! more to recover where each value and object key starts and ends. The
//! walk assumes the text already parsed; on malformed input it stops at the
//! first bad token and keeps whatever it indexed.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::str::Chars;

use logos::Logos;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Where a value sits in a document, rendered as `$[0].responses[1].trial`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// The member `key` of this object.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key.to_string()));
        Self(segments)
    }

    /// The element `index` of this array.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    /// The enclosing value.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Spans of every value and object key in one document.
#[derive(Debug, Clone, Default)]
pub struct SpanIndex {
    values: HashMap<String, Range<usize>>,
    keys: HashMap<String, Range<usize>>,
}

impl SpanIndex {
    /// Index a document.
    pub fn build(source: &str) -> Self {
        let tokens = Token::lexer(source)
            .spanned()
            .map_while(|(token, span)| token.ok().map(|token| (token, span)))
            .collect();
        let mut walker = Walker {
            source,
            tokens,
            pos: 0,
            end: 0,
            index: SpanIndex::default(),
        };
        walker.value(&KeyPath::root());
        walker.index
    }

    /// The span of the value at `path`.
    pub fn value(&self, path: &KeyPath) -> Option<Range<usize>> {
        self.values.get(&path.to_string()).cloned()
    }

    /// The span of the object key naming the value at `path`.
    pub fn key(&self, path: &KeyPath) -> Option<Range<usize>> {
        self.keys.get(&path.to_string()).cloned()
    }

    /// The span of `path`, or of its closest indexed ancestor.
    pub fn locate(&self, path: &KeyPath) -> Range<usize> {
        let mut current = Some(path.clone());
        while let Some(path) = current {
            if let Some(span) = self.value(&path) {
                return span;
            }
            current = path.parent();
        }
        0..0
    }
}

/// JSON tokens. Strings and scalars keep only their span.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Token {
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[regex(r#""([^"\\\x00-\x1F]|\\(["\\bnfrt/]|u[a-fA-F0-9]{4}))*""#)]
    Str,

    /// Numbers, `true`, `false` and `null`.
    #[regex(r#"[^ \t\r\n{}\[\]:,"]+"#)]
    Scalar,
}

struct Walker<'s> {
    source: &'s str,
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    /// End of the last consumed token.
    end: usize,
    index: SpanIndex,
}

impl Walker<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn span(&self) -> Range<usize> {
        self.tokens
            .get(self.pos)
            .map_or(self.end..self.end, |(_, span)| span.clone())
    }

    fn advance(&mut self) {
        if let Some((_, span)) = self.tokens.get(self.pos) {
            self.end = span.end;
            self.pos += 1;
        }
    }

    /// Index the value at the current token; false if there is none.
    fn value(&mut self, path: &KeyPath) -> bool {
        let start = self.span().start;
        match self.peek() {
            Some(Token::LBrace) => self.object(path),
            Some(Token::LBracket) => self.array(path),
            Some(Token::Str | Token::Scalar) => self.advance(),
            _ => return false,
        }
        self.index.values.insert(path.to_string(), start..self.end);
        true
    }

    fn object(&mut self, path: &KeyPath) {
        self.advance();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    return;
                }
                Some(Token::Comma) => self.advance(),
                Some(Token::Str) => {
                    let span = self.span();
                    let raw = self.source.get(span.start + 1..span.end - 1).unwrap_or_default();
                    let child = path.key(&unescape(raw));
                    self.index.keys.insert(child.to_string(), span);
                    self.advance();
                    if self.peek() == Some(Token::Colon) {
                        self.advance();
                    }
                    if !self.value(&child) {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn array(&mut self, path: &KeyPath) {
        self.advance();
        let mut index = 0;
        loop {
            match self.peek() {
                Some(Token::RBracket) => {
                    self.advance();
                    return;
                }
                Some(Token::Comma) => self.advance(),
                _ => {
                    if !self.value(&path.index(index)) {
                        return;
                    }
                    index += 1;
                }
            }
        }
    }
}

/// Decode the escapes of a lexed string body, joining surrogate pairs.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let decoded = match hex4(&mut chars) {
                    Some(high @ 0xD800..=0xDBFF) => {
                        let mut rest = chars.clone();
                        let low = match (rest.next(), rest.next()) {
                            (Some('\\'), Some('u')) => hex4(&mut rest),
                            _ => None,
                        };
                        match low {
                            Some(low @ 0xDC00..=0xDFFF) => {
                                chars = rest;
                                char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
                            }
                            _ => None,
                        }
                    }
                    Some(code) => char::from_u32(code),
                    None => None,
                };
                out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn hex4(chars: &mut Chars<'_>) -> Option<u32> {
    let hex: String = chars.by_ref().take(4).collect();
    u32::from_str_radix(&hex, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_render_like_selectors() {
        let path = KeyPath::root().index(0).key("responses").index(2).key("trial");
        assert_eq!(path.to_string(), "$[0].responses[2].trial");
        assert_eq!(KeyPath::root().to_string(), "$");
        assert_eq!(path.parent().map(|p| p.to_string()).as_deref(), Some("$[0].responses[2]"));
    }

    #[test]
    fn values_and_keys_are_indexed() {
        let source = r#"[{"id": "TALK_A", "responses": [{"text": "Hi"}, 12]}]"#;
        let index = SpanIndex::build(source);
        let id = KeyPath::root().index(0).key("id");
        assert_eq!(index.value(&id).map(|r| &source[r]), Some("\"TALK_A\""));
        assert_eq!(index.key(&id).map(|r| &source[r]), Some("\"id\""));
        let second = KeyPath::root().index(0).key("responses").index(1);
        assert_eq!(index.value(&second).map(|r| &source[r]), Some("12"));
        let text = KeyPath::root().index(0).key("responses").index(0).key("text");
        assert_eq!(index.value(&text).map(|r| &source[r]), Some("\"Hi\""));
    }

    #[test]
    fn missing_paths_fall_back_to_an_ancestor() {
        let source = r#"{"trial": {"type": "LIE"}}"#;
        let index = SpanIndex::build(source);
        let missing = KeyPath::root().key("trial").key("difficulty");
        assert_eq!(&source[index.locate(&missing)], r#"{"type": "LIE"}"#);
    }

    #[test]
    fn escaped_keys_are_decoded() {
        let source = r#"{"a\"b": true, "c\u0041": 1}"#;
        let index = SpanIndex::build(source);
        assert!(index.value(&KeyPath::root().key("a\"b")).is_some());
        assert!(index.value(&KeyPath::root().key("cA")).is_some());
    }

    #[test]
    fn surrogate_pairs_decode_to_one_char() {
        let source = r#"{"mood \ud83d\ude00": {"x": 1}, "lone \ud83d": 2}"#;
        let index = SpanIndex::build(source);
        let key = KeyPath::root().key("mood \u{1F600}");
        assert_eq!(index.value(&key.key("x")).map(|r| &source[r]), Some("1"));
        assert!(index.value(&KeyPath::root().key("lone \u{FFFD}")).is_some());
    }

    #[test]
    fn matches_serde_keys_for_nested_documents() {
        let source = r#"[{"type": "talk_topic", "id": ["A", "B"], "responses": [{"text": "x\"y", "trial": {"mod": [["speech", -5]]}}]}]"#;
        let value: serde_json::Value = serde_json::from_str(source).unwrap();
        let index = SpanIndex::build(source);
        let trial = KeyPath::root().index(0).key("responses").index(0).key("trial");
        assert_eq!(
            index.value(&trial.key("mod").index(0).index(1)).map(|r| &source[r]),
            Some("-5")
        );
        let text = value[0]["responses"][0]["text"].as_str().unwrap();
        assert_eq!(text, "x\"y");
        assert_eq!(
            index.value(&KeyPath::root().index(0).key("id").index(1)).map(|r| &source[r]),
            Some("\"B\"")
        );
    }

    #[test]
    fn truncated_input_does_not_panic() {
        let index = SpanIndex::build(r#"{"a": [1, 2"#);
        assert!(index.value(&KeyPath::root().key("a").index(0)).is_some());
    }
}
