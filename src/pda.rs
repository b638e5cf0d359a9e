//! The module with the pushdown automaton for HTTP request recognition.
//! The automaton is a hand-built shift/reduce recognizer over the token kinds of an
//! HTTP request message. Its transition table is deterministic, so recognition needs
//! no search or backtracking.

use log::trace;

use crate::{ParseTree, Token};

/// A control state of the request PDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PdaState {
    /// The initial state.
    Start,
    /// Expecting the method of the request line.
    ParseMethod,
    /// Expecting the URI of the request line.
    ParseUri,
    /// Expecting the version of the request line.
    ParseVersion,
    /// The request line is complete and is reduced onto the stack.
    ReduceRequestLine,
    /// Expecting a header, the empty line or the end of input.
    ParseHeaders,
    /// Expecting the separator and value of a header.
    ParseHeaderName,
    /// Expecting the value and terminator of a header.
    ParseHeaderValue,
    /// A header is complete and is reduced onto the stack.
    ReduceHeader,
    /// Expecting the message body or the end of input.
    ParseBody,
    /// The message is complete and the stack is unwound.
    ReduceMessage,
    /// The accepting state.
    Accept,
    /// The rejecting sink state.
    Error,
}

impl std::fmt::Display for PdaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A stack symbol of the request PDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackSymbol {
    /// The bottom-of-stack marker, pushed once before the run starts.
    BottomMarker,
    /// The method terminal of the request line.
    Method,
    /// A single space separator.
    Sp,
    /// The URI terminal of the request line.
    Uri,
    /// The version terminal of the request line.
    Version,
    /// A line terminator.
    Crlf,
    /// A reduced request line.
    RequestLine,
    /// The name terminal of a header.
    HeaderName,
    /// The separator of a header.
    Colon,
    /// The value terminal of a header.
    HeaderValue,
    /// A reduced header.
    Header,
    /// A reduced header sequence.
    Headers,
    /// A reduced message body.
    Body,
}

impl std::fmt::Display for StackSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StackSymbol::BottomMarker => "Z0",
            StackSymbol::Method => "Method",
            StackSymbol::Sp => "SP",
            StackSymbol::Uri => "Uri",
            StackSymbol::Version => "Version",
            StackSymbol::Crlf => "CRLF",
            StackSymbol::RequestLine => "RequestLine",
            StackSymbol::HeaderName => "HeaderName",
            StackSymbol::Colon => "COLON",
            StackSymbol::HeaderValue => "HeaderValue",
            StackSymbol::Header => "Header",
            StackSymbol::Headers => "Headers",
            StackSymbol::Body => "Body",
        };
        write!(f, "{}", name)
    }
}

/// The stack action of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackAction {
    /// Push the symbol on top of the stack.
    Push(StackSymbol),
    /// Remove the top of the stack.
    Pop,
    /// Pop the top of the stack and push the symbol.
    Replace(StackSymbol),
}

impl std::fmt::Display for StackAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackAction::Push(symbol) => write!(f, "push:{}", symbol),
            StackAction::Pop => write!(f, "pop"),
            StackAction::Replace(symbol) => write!(f, "replace:{}", symbol),
        }
    }
}

/// The input trigger of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PdaInput {
    /// A token of the given kind, consumed by the transition.
    Symbol(&'static str),
    /// The end of input. Matching it does not advance the position.
    End,
    /// An input-free move.
    Epsilon,
}

impl std::fmt::Display for PdaInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdaInput::Symbol(kind) => write!(f, "{}", kind),
            PdaInput::End => write!(f, "$"),
            PdaInput::Epsilon => write!(f, "\u{03b5}"),
        }
    }
}

/// A single transition of the request PDA.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdaTransition {
    /// The source state.
    pub from_state: PdaState,
    /// The input trigger.
    pub input: PdaInput,
    /// The required top of the stack.
    pub stack_top: StackSymbol,
    /// The target state.
    pub to_state: PdaState,
    /// The stack action applied on the move.
    pub stack_action: StackAction,
}

/// A configuration of the PDA recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdaConfiguration {
    /// The control state.
    pub state: PdaState,
    /// The input position, counted in tokens.
    pub position: usize,
    /// The stack, bottom first.
    pub stack: Vec<String>,
    /// The step index, 0 is the initial configuration.
    pub step: usize,
}

/// The result of a PDA run.
/// A reject is not an error; it is an ordinary result with `accepted == false` and
/// the failing configuration as the terminal trace entry.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdaRun {
    /// True if the automaton accepts the token sequence.
    pub accepted: bool,
    /// The configurations passed through, including the initial one.
    pub trace: Vec<PdaConfiguration>,
    /// The maximum stack depth reached, the bottom marker included.
    pub stack_max_depth: usize,
    /// The number of tokens consumed before acceptance or rejection.
    pub tokens_consumed: usize,
    /// The state the run ended in.
    pub final_state: PdaState,
    /// A parse tree of the message, built for accepted inputs only.
    pub tree: Option<ParseTree>,
}

/// A formal description of the automaton.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdaDescription {
    /// The token kinds the automaton consumes.
    pub input_alphabet: Vec<String>,
    /// The stack symbols, the bottom marker included.
    pub stack_alphabet: Vec<String>,
    /// The transition table.
    pub transitions: Vec<PdaTransition>,
    /// The initial control state.
    pub start_state: PdaState,
    /// The accepting control state.
    pub accepting_state: PdaState,
}

/// A pushdown automaton recognizing HTTP request messages over token kinds.
///
/// The recognized shape is a request line, zero or more headers, an optional empty
/// line and an optional body:
///
/// ```text
/// Message     = RequestLine Header* [CRLF [MESSAGE_BODY]]
/// RequestLine = METHOD SP URI SP HTTP_VERSION CRLF
/// Header      = HEADER_NAME COLON HEADER_VALUE CRLF
/// ```
///
/// The table is hand-built and deterministic: at most one transition applies to any
/// configuration, with symbol-consuming transitions preferred over epsilon moves.
#[derive(Debug, Clone)]
pub struct RequestPda {
    transitions: Vec<PdaTransition>,
}

impl Default for RequestPda {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestPda {
    /// Create the automaton with its fixed transition table.
    pub fn new() -> Self {
        use PdaInput::*;
        use PdaState::*;
        use StackAction::*;
        use StackSymbol::*;
        let transitions = vec![
            // Request line. The consumed terminal is tracked as the stack top and
            // replaced as the line progresses.
            transition(Start, Symbol("METHOD"), BottomMarker, ParseMethod, Push(Method)),
            transition(ParseMethod, Symbol("SP"), Method, ParseUri, Replace(Sp)),
            transition(ParseUri, Symbol("URI"), Sp, ParseUri, Replace(Uri)),
            transition(ParseUri, Symbol("SP"), Uri, ParseVersion, Replace(Sp)),
            transition(ParseVersion, Symbol("HTTP_VERSION"), Sp, ParseVersion, Replace(Version)),
            transition(ParseVersion, Symbol("CRLF"), Version, ReduceRequestLine, Replace(Crlf)),
            transition(ReduceRequestLine, Epsilon, Crlf, ParseHeaders, Replace(RequestLine)),
            // Headers. The first header is pushed above the request line; every
            // further one folds the completed header sequence back in.
            transition(ParseHeaders, Symbol("HEADER_NAME"), RequestLine, ParseHeaderName, Push(HeaderName)),
            transition(ParseHeaders, Symbol("HEADER_NAME"), Headers, ParseHeaderName, Replace(HeaderName)),
            transition(ParseHeaderName, Symbol("COLON"), HeaderName, ParseHeaderValue, Replace(Colon)),
            transition(ParseHeaderValue, Symbol("HEADER_VALUE"), Colon, ParseHeaderValue, Replace(HeaderValue)),
            transition(ParseHeaderValue, Symbol("CRLF"), HeaderValue, ReduceHeader, Replace(Header)),
            transition(ReduceHeader, Epsilon, Header, ParseHeaders, Replace(Headers)),
            // Empty line and body.
            transition(ParseHeaders, Symbol("CRLF"), Headers, ParseBody, Replace(Headers)),
            transition(ParseHeaders, Symbol("CRLF"), RequestLine, ParseBody, Push(Headers)),
            transition(ParseBody, Symbol("MESSAGE_BODY"), Headers, ParseBody, Push(Body)),
            // Unwind the stack at the end of input.
            transition(ParseHeaders, End, Headers, ReduceMessage, Pop),
            transition(ParseHeaders, End, RequestLine, ReduceMessage, Pop),
            transition(ParseBody, End, Body, ReduceMessage, Pop),
            transition(ParseBody, End, Headers, ReduceMessage, Pop),
            transition(ReduceMessage, Epsilon, Headers, ReduceMessage, Pop),
            transition(ReduceMessage, Epsilon, RequestLine, ReduceMessage, Pop),
            transition(ReduceMessage, End, BottomMarker, Accept, Replace(BottomMarker)),
        ];
        RequestPda { transitions }
    }

    /// The formal description of the automaton.
    pub fn description(&self) -> PdaDescription {
        let mut input_alphabet = Vec::new();
        let mut stack_alphabet = vec![StackSymbol::BottomMarker.to_string()];
        for t in &self.transitions {
            if let PdaInput::Symbol(kind) = t.input {
                if !input_alphabet.contains(&kind.to_string()) {
                    input_alphabet.push(kind.to_string());
                }
            }
            let top = t.stack_top.to_string();
            if !stack_alphabet.contains(&top) {
                stack_alphabet.push(top);
            }
            let pushed = match t.stack_action {
                StackAction::Push(symbol) | StackAction::Replace(symbol) => Some(symbol),
                StackAction::Pop => None,
            };
            if let Some(symbol) = pushed {
                let symbol = symbol.to_string();
                if !stack_alphabet.contains(&symbol) {
                    stack_alphabet.push(symbol);
                }
            }
        }
        PdaDescription {
            input_alphabet,
            stack_alphabet,
            transitions: self.transitions.clone(),
            start_state: PdaState::Start,
            accepting_state: PdaState::Accept,
        }
    }

    /// Run the automaton on the token sequence.
    ///
    /// At each step the applicable transition is looked up by the current state, the
    /// next input symbol and the stack top; a symbol-consuming transition wins over an
    /// epsilon move. A configuration with no applicable transition rejects the input
    /// and is kept as the terminal trace entry.
    pub fn parse(&self, tokens: &[Token]) -> PdaRun {
        let mut state = PdaState::Start;
        let mut stack = vec![StackSymbol::BottomMarker];
        let mut position = 0;
        let mut stack_max_depth = stack.len();
        let mut trace_entries = vec![configuration(state, position, &stack, 0)];
        let mut step = 0;
        while state != PdaState::Accept && state != PdaState::Error {
            let stack_top = match stack.last() {
                Some(top) => *top,
                None => {
                    state = PdaState::Error;
                    break;
                }
            };
            let input = tokens.get(position).map(|t| t.kind.as_str());
            let transition = self
                .find_transition(state, input, stack_top)
                .or_else(|| self.find_epsilon_transition(state, stack_top));
            match transition {
                Some(t) => {
                    trace!(
                        "{} --{}/{}--> {} ({})",
                        state,
                        t.input,
                        t.stack_top,
                        t.to_state,
                        t.stack_action
                    );
                    state = t.to_state;
                    if let PdaInput::Symbol(_) = t.input {
                        position += 1;
                    }
                    match t.stack_action {
                        StackAction::Push(symbol) => stack.push(symbol),
                        StackAction::Pop => {
                            stack.pop();
                        }
                        StackAction::Replace(symbol) => {
                            stack.pop();
                            stack.push(symbol);
                        }
                    }
                    stack_max_depth = stack_max_depth.max(stack.len());
                    step += 1;
                    trace_entries.push(configuration(state, position, &stack, step));
                }
                None => {
                    trace!(
                        "Reject in {} at token {} with stack top {}",
                        state,
                        position,
                        stack_top
                    );
                    state = PdaState::Error;
                    step += 1;
                    trace_entries.push(configuration(state, position, &stack, step));
                }
            }
        }
        let accepted = state == PdaState::Accept
            && position == tokens.len()
            && stack == [StackSymbol::BottomMarker];
        PdaRun {
            accepted,
            tree: accepted.then(|| build_tree(tokens)),
            trace: trace_entries,
            stack_max_depth,
            tokens_consumed: position,
            final_state: state,
        }
    }

    fn find_transition(
        &self,
        state: PdaState,
        input: Option<&str>,
        stack_top: StackSymbol,
    ) -> Option<&PdaTransition> {
        self.transitions.iter().find(|t| {
            t.from_state == state
                && t.stack_top == stack_top
                && match t.input {
                    PdaInput::Symbol(kind) => input == Some(kind),
                    PdaInput::End => input.is_none(),
                    PdaInput::Epsilon => false,
                }
        })
    }

    fn find_epsilon_transition(
        &self,
        state: PdaState,
        stack_top: StackSymbol,
    ) -> Option<&PdaTransition> {
        self.transitions.iter().find(|t| {
            t.from_state == state && t.stack_top == stack_top && t.input == PdaInput::Epsilon
        })
    }
}

fn transition(
    from_state: PdaState,
    input: PdaInput,
    stack_top: StackSymbol,
    to_state: PdaState,
    stack_action: StackAction,
) -> PdaTransition {
    PdaTransition {
        from_state,
        input,
        stack_top,
        to_state,
        stack_action,
    }
}

fn configuration(
    state: PdaState,
    position: usize,
    stack: &[StackSymbol],
    step: usize,
) -> PdaConfiguration {
    PdaConfiguration {
        state,
        position,
        stack: stack.iter().map(|s| s.to_string()).collect(),
        step,
    }
}

// The run has already established that the token sequence is a well-formed message,
// so the tree is rebuilt by a single pass over the tokens.
fn build_tree(tokens: &[Token]) -> ParseTree {
    let mut children = Vec::new();
    let mut request_line = Vec::new();
    let mut position = 0;
    while position < tokens.len() && request_line.len() < 6 {
        let token = &tokens[position];
        request_line.push(ParseTree::leaf(&token.kind, &token.text));
        position += 1;
    }
    children.push(ParseTree::branch("RequestLine", request_line));
    let mut headers = Vec::new();
    while position + 3 < tokens.len() && tokens[position].kind == "HEADER_NAME" {
        let header = tokens[position..position + 4]
            .iter()
            .map(|t| ParseTree::leaf(&t.kind, &t.text))
            .collect();
        headers.push(ParseTree::branch("Header", header));
        position += 4;
    }
    if !headers.is_empty() {
        children.push(ParseTree::branch("Headers", headers));
    }
    // The empty line separating the headers from the body.
    if position < tokens.len() && tokens[position].kind == "CRLF" {
        let token = &tokens[position];
        children.push(ParseTree::leaf(&token.kind, &token.text));
        position += 1;
    }
    if position < tokens.len() && tokens[position].kind == "MESSAGE_BODY" {
        let token = &tokens[position];
        children.push(ParseTree::branch(
            "Body",
            vec![ParseTree::leaf(&token.kind, &token.text)],
        ));
    }
    ParseTree::branch("Message", children)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn request_line_tokens() -> Vec<Token> {
        vec![
            Token::new("METHOD", "GET", 0),
            Token::new("SP", " ", 3),
            Token::new("URI", "/index.html", 4),
            Token::new("SP", " ", 15),
            Token::new("HTTP_VERSION", "HTTP/1.1", 16),
            Token::new("CRLF", "\n", 24),
        ]
    }

    fn header_tokens(name: &str, value: &str) -> Vec<Token> {
        vec![
            Token::new("HEADER_NAME", name, 0),
            Token::new("COLON", ":", 0),
            Token::new("HEADER_VALUE", value, 0),
            Token::new("CRLF", "\n", 0),
        ]
    }

    #[test]
    fn test_parse_request_line_only() {
        init();
        let pda = RequestPda::new();
        let run = pda.parse(&request_line_tokens());
        assert!(run.accepted);
        assert_eq!(run.final_state, PdaState::Accept);
        assert_eq!(run.tokens_consumed, 6);
        assert!(run.tree.is_some());
    }

    #[test]
    fn test_parse_request_with_headers() {
        init();
        let pda = RequestPda::new();
        let mut tokens = request_line_tokens();
        tokens.extend(header_tokens("Host", "example.com"));
        tokens.extend(header_tokens("Accept", "text/html"));
        let run = pda.parse(&tokens);
        assert!(run.accepted);
        assert_eq!(run.tokens_consumed, tokens.len());
        // Z0, RequestLine and one header level.
        assert_eq!(run.stack_max_depth, 3);
    }

    #[test]
    fn test_parse_request_with_body() {
        init();
        let pda = RequestPda::new();
        let mut tokens = request_line_tokens();
        tokens.extend(header_tokens("Host", "example.com"));
        tokens.push(Token::new("CRLF", "\n", 0));
        tokens.push(Token::new("MESSAGE_BODY", "name=value", 0));
        let run = pda.parse(&tokens);
        assert!(run.accepted);
        let tree = run.tree.unwrap();
        assert_eq!(tree.symbol, "Message");
        // Request line, headers, the empty line and the body.
        assert_eq!(tree.children.len(), 4);
        assert_eq!(tree.children[2].symbol, "CRLF");
        assert_eq!(tree.children[3].symbol, "Body");
        let expected: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
        assert_eq!(tree.leaves(), expected);
    }

    #[test]
    fn test_parse_empty_line_without_body() {
        init();
        let pda = RequestPda::new();
        let mut tokens = request_line_tokens();
        tokens.extend(header_tokens("Host", "example.com"));
        tokens.push(Token::new("CRLF", "\n", 0));
        let run = pda.parse(&tokens);
        assert!(run.accepted);
    }

    #[test]
    fn test_reject_missing_separator() {
        init();
        let pda = RequestPda::new();
        let tokens = vec![
            Token::new("METHOD", "GET", 0),
            Token::new("URI", "/index.html", 4),
        ];
        let run = pda.parse(&tokens);
        assert!(!run.accepted);
        assert_eq!(run.final_state, PdaState::Error);
        // The failing configuration is the terminal trace entry.
        let last = run.trace.last().unwrap();
        assert_eq!(last.state, PdaState::Error);
        assert_eq!(last.position, 1);
        assert_eq!(run.tokens_consumed, 1);
        assert!(run.tree.is_none());
    }

    #[test]
    fn test_reject_truncated_request_line() {
        init();
        let pda = RequestPda::new();
        let tokens = request_line_tokens()[..5].to_vec();
        let run = pda.parse(&tokens);
        assert!(!run.accepted);
        assert_eq!(run.final_state, PdaState::Error);
    }

    #[test]
    fn test_reject_empty_input() {
        init();
        let pda = RequestPda::new();
        let run = pda.parse(&[]);
        assert!(!run.accepted);
        assert_eq!(run.tokens_consumed, 0);
    }

    #[test]
    fn test_trace_records_initial_configuration() {
        init();
        let pda = RequestPda::new();
        let run = pda.parse(&request_line_tokens());
        assert_eq!(run.trace[0].state, PdaState::Start);
        assert_eq!(run.trace[0].position, 0);
        assert_eq!(run.trace[0].stack, vec!["Z0".to_string()]);
    }

    #[test]
    fn test_description() {
        init();
        let pda = RequestPda::new();
        let description = pda.description();
        assert!(description.input_alphabet.contains(&"METHOD".to_string()));
        assert!(description.stack_alphabet.contains(&"Z0".to_string()));
        assert_eq!(description.start_state, PdaState::Start);
        assert_eq!(description.accepting_state, PdaState::Accept);
        assert_eq!(description.transitions.len(), 23);
    }

    #[test]
    fn test_tree_leaves_reproduce_input() {
        init();
        let pda = RequestPda::new();
        let mut tokens = request_line_tokens();
        tokens.extend(header_tokens("Host", "example.com"));
        let run = pda.parse(&tokens);
        let tree = run.tree.unwrap();
        let expected: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();
        assert_eq!(tree.leaves(), expected);
    }
}
