//! The module with the HTTP request grammar and tokenizers.
//! It binds the generic engines of the crate to a concrete language: regex patterns
//! for the request-line fields, a CFG for the request line and a small state machine
//! tokenizer for whole request messages.

use crate::{Grammar, Production, Result, Symbol, Token};

/// The regex source recognizing an HTTP method.
pub const METHOD_PATTERN: &str = "GET|POST|PUT|DELETE|HEAD|OPTIONS";

/// The regex source recognizing an origin-form request URI.
pub const URI_PATTERN: &str = r"/[a-zA-Z0-9_.\-/]*";

/// The regex source recognizing an HTTP version.
pub const VERSION_PATTERN: &str = r"HTTP/[12]\.[0-9]";

/// The context-free grammar of an HTTP request line.
///
/// ```text
/// RequestLine → Method SP Uri SP Version
/// Method      → METHOD
/// Uri         → URI
/// Version     → HTTP_VERSION
/// ```
///
/// The terminals are token kinds as produced by [`tokenize_request_line`].
pub fn request_line_grammar() -> Result<Grammar> {
    Grammar::define(
        "RequestLine",
        vec![
            Production::new(
                "RequestLine",
                vec![
                    Symbol::nt("Method"),
                    Symbol::t("SP"),
                    Symbol::nt("Uri"),
                    Symbol::t("SP"),
                    Symbol::nt("Version"),
                ],
            ),
            Production::new("Method", vec![Symbol::t("METHOD")]),
            Production::new("Uri", vec![Symbol::t("URI")]),
            Production::new("Version", vec![Symbol::t("HTTP_VERSION")]),
        ],
    )
}

/// Tokenize a single request line.
///
/// Runs of whitespace are collapsed into a single `SP` token, leading and trailing
/// whitespace is stripped. The remaining words are classified by shape: an
/// alphabetic word is a `METHOD`, a word starting with `/` is a `URI`, a word
/// starting with `HTTP/` is an `HTTP_VERSION`; anything else is `INVALID`.
pub fn tokenize_request_line(request_line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut word_start = 0;
    for (position, c) in request_line.trim().chars().enumerate() {
        if c.is_whitespace() {
            if !word.is_empty() {
                tokens.push(classify_word(&word, word_start));
                word.clear();
            }
            if !matches!(tokens.last(), Some(t) if t.kind == "SP") {
                tokens.push(Token::new("SP", " ", position));
            }
        } else {
            if word.is_empty() {
                word_start = position;
            }
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(classify_word(&word, word_start));
    }
    tokens
}

fn classify_word(word: &str, position: usize) -> Token {
    let kind = if word.starts_with("HTTP/") {
        "HTTP_VERSION"
    } else if word.starts_with('/') {
        "URI"
    } else if word.chars().all(|c| c.is_alphabetic()) {
        "METHOD"
    } else {
        "INVALID"
    };
    Token::new(kind, word, position)
}

// The URI charset of origin-form targets, query and fragment included.
const URI_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~:/?#[]@!$&'()*+,;=%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    Method,
    UriStart,
    Uri,
    VersionStart,
    Version,
    HeaderStart,
    HeaderName,
    HeaderValueStart,
    HeaderValue,
    Body,
}

/// Tokenize a full HTTP request message.
///
/// A small state machine walks the text character by character and emits `METHOD`,
/// `SP`, `URI`, `HTTP_VERSION`, `CRLF`, `HEADER_NAME`, `COLON`, `HEADER_VALUE` and
/// `MESSAGE_BODY` tokens, the input alphabet of [`RequestPda`]. Line endings are
/// normalized to `\n` first. A URI must start with `/`, a version with `H`; leading
/// spaces of a header value are skipped; everything after the empty line is the
/// body. A character the current state cannot consume yields an `INVALID` token and
/// resets the machine.
///
/// [`RequestPda`]: crate::RequestPda
pub fn tokenize_request(input: &str) -> Vec<Token> {
    let normalized = input.replace("\r\n", "\n");
    let mut tokens = Vec::new();
    let mut state = LexState::Start;
    let mut current = String::new();
    let mut token_start = 0;
    for (position, c) in normalized.chars().enumerate() {
        match state {
            LexState::Start => {
                if c.is_alphabetic() {
                    state = LexState::Method;
                    token_start = position;
                    current.push(c);
                } else if !c.is_whitespace() {
                    tokens.push(Token::new("INVALID", c, position));
                }
            }
            LexState::Method => {
                if c.is_alphabetic() {
                    current.push(c);
                } else if c == ' ' {
                    tokens.push(Token::new("METHOD", current.as_str(), token_start));
                    tokens.push(Token::new("SP", " ", position));
                    current.clear();
                    state = LexState::UriStart;
                } else {
                    invalid(&mut tokens, &mut current, c, token_start);
                    state = LexState::Start;
                }
            }
            LexState::UriStart => {
                if c == '/' {
                    state = LexState::Uri;
                    token_start = position;
                    current.push(c);
                } else if c != ' ' {
                    tokens.push(Token::new("INVALID", c, position));
                    state = LexState::Start;
                }
            }
            LexState::Uri => {
                if c == ' ' {
                    tokens.push(Token::new("URI", current.as_str(), token_start));
                    tokens.push(Token::new("SP", " ", position));
                    current.clear();
                    state = LexState::VersionStart;
                } else if URI_CHARS.contains(c) {
                    current.push(c);
                } else {
                    invalid(&mut tokens, &mut current, c, token_start);
                    state = LexState::Start;
                }
            }
            LexState::VersionStart => {
                if c == 'H' {
                    state = LexState::Version;
                    token_start = position;
                    current.push(c);
                } else if c != ' ' {
                    tokens.push(Token::new("INVALID", c, position));
                    state = LexState::Start;
                }
            }
            LexState::Version => {
                if c == '\n' {
                    tokens.push(Token::new("HTTP_VERSION", current.as_str(), token_start));
                    tokens.push(Token::new("CRLF", "\n", position));
                    current.clear();
                    state = LexState::HeaderStart;
                } else if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '/' || c == '.' {
                    current.push(c);
                } else {
                    invalid(&mut tokens, &mut current, c, token_start);
                    state = LexState::Start;
                }
            }
            LexState::HeaderStart => {
                if c == '\n' {
                    // The empty line; what follows is the body.
                    tokens.push(Token::new("CRLF", "\n", position));
                    token_start = position + 1;
                    state = LexState::Body;
                } else if c.is_alphabetic() || c == '-' {
                    state = LexState::HeaderName;
                    token_start = position;
                    current.push(c);
                } else if !c.is_whitespace() {
                    tokens.push(Token::new("INVALID", c, position));
                    state = LexState::Start;
                }
            }
            LexState::HeaderName => {
                if c == ':' {
                    tokens.push(Token::new("HEADER_NAME", current.as_str(), token_start));
                    tokens.push(Token::new("COLON", ":", position));
                    current.clear();
                    state = LexState::HeaderValueStart;
                } else if c.is_alphanumeric() || c == '-' || c == '_' {
                    current.push(c);
                } else {
                    invalid(&mut tokens, &mut current, c, token_start);
                    state = LexState::Start;
                }
            }
            LexState::HeaderValueStart => {
                if c == '\n' {
                    tokens.push(Token::new("HEADER_VALUE", "", position));
                    tokens.push(Token::new("CRLF", "\n", position));
                    state = LexState::HeaderStart;
                } else if c != ' ' {
                    state = LexState::HeaderValue;
                    token_start = position;
                    current.push(c);
                }
            }
            LexState::HeaderValue => {
                if c == '\n' {
                    tokens.push(Token::new("HEADER_VALUE", current.as_str(), token_start));
                    tokens.push(Token::new("CRLF", "\n", position));
                    current.clear();
                    state = LexState::HeaderStart;
                } else {
                    current.push(c);
                }
            }
            LexState::Body => {
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        let kind = match state {
            LexState::Method => "METHOD",
            LexState::Uri => "URI",
            LexState::Version => "HTTP_VERSION",
            LexState::HeaderName => "HEADER_NAME",
            LexState::HeaderValue => "HEADER_VALUE",
            LexState::Body => "MESSAGE_BODY",
            _ => "INVALID",
        };
        tokens.push(Token::new(kind, current, token_start));
    }
    tokens
}

fn invalid(tokens: &mut Vec<Token>, current: &mut String, c: char, token_start: usize) {
    current.push(c);
    tokens.push(Token::new("INVALID", current.as_str(), token_start));
    current.clear();
}
