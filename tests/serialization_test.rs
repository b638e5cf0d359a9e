// Test JSON serialization of runs, traces and parse trees
// Run with `cargo test --test serialization_test`
#![cfg(feature = "serde")]

use formalang::{compile_pattern, http, ChartParser, ParseTree, PdaRun, RequestPda, Token};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn nfa_run_serializes_with_configurations() {
    init();
    let nfa = compile_pattern(http::METHOD_PATTERN).unwrap();
    let run = nfa.simulate("GET");
    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["accepted"], true);
    assert!(json["configurations"].as_array().unwrap().len() > 1);
    assert_eq!(json["configurations"][0]["position"], 0);
}

#[test]
fn pda_run_round_trips() {
    init();
    let pda = RequestPda::new();
    let tokens = http::tokenize_request("GET / HTTP/1.1\r\nHost: example.com\r\n");
    let run = pda.parse(&tokens);
    let json = serde_json::to_string(&run).unwrap();
    let restored: PdaRun = serde_json::from_str(&json).unwrap();
    assert!(restored.accepted);
    assert_eq!(restored.trace.len(), run.trace.len());
    assert_eq!(restored.final_state, run.final_state);
}

#[test]
fn parse_tree_round_trips() {
    init();
    let parser = ChartParser::new(&http::request_line_grammar().unwrap());
    let parse = parser.parse(&http::tokenize_request_line("GET /index.html HTTP/1.1"));
    let json = serde_json::to_string(&parse.trees).unwrap();
    let restored: Vec<ParseTree> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, parse.trees);
}

#[test]
fn tokens_serialize_with_kind_text_and_position() {
    init();
    let token = Token::new("URI", "/index.html", 4);
    let json = serde_json::to_value(&token).unwrap();
    assert_eq!(json["kind"], "URI");
    assert_eq!(json["text"], "/index.html");
    assert_eq!(json["position"], 4);
}

#[test]
fn diagnostic_serializes_on_reject() {
    init();
    let parser = ChartParser::new(&http::request_line_grammar().unwrap());
    let parse = parser.parse(&http::tokenize_request_line("GET /index.html"));
    assert!(!parse.accepted);
    let json = serde_json::to_value(&parse).unwrap();
    assert_eq!(json["diagnostic"]["position"], 3);
}
