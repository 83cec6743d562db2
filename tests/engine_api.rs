mod util;

use std::future::Future;

use plaintalk::{Engine, Severity, Value, compile};
use tokio::task::LocalSet;
use util::{RecordingHost, run_plaintalk, run_with_answers};

fn block_on<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    LocalSet::new().block_on(&runtime, future)
}

#[test]
fn syntax_errors_are_reported_once_and_nothing_runs() {
    let host = run_plaintalk("say \"before\"\nset x 5\n");
    assert!(host.infos().is_empty());
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Syntax Error:"), "{errors:?}");
    assert!(errors[0].contains("line 2"), "{errors:?}");
}

#[test]
fn unterminated_string_is_a_syntax_error() {
    let host = run_plaintalk("say \"oops");
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Syntax Error: Unterminated string"), "{errors:?}");
}

#[test]
fn deeply_nested_source_is_a_syntax_error() {
    let src = format!("say {}1{}\n", "(".repeat(1000), ")".repeat(1000));
    let host = run_plaintalk(&src);
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Syntax Error:"), "{errors:?}");
    assert!(errors[0].contains("nested too deeply"), "{errors:?}");
}

#[test]
fn empty_program_is_silent_and_idle() {
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(engine.execute("\n   \n# nothing here\n"));
    assert!(host.messages().is_empty());
    assert!(!engine.is_running());
    assert!(engine.variables().is_empty());
}

#[test]
fn compile_exposes_declarations() {
    let program = compile("to greet using name:\n    say name\nsay 1\n").expect("compile");
    assert_eq!(program.body.len(), 2);
    assert!(compile("if:\n").is_err());
}

#[test]
fn accessors_report_registered_names() {
    let src = r#"
to beta:
    say 1
to alpha using x:
    say x
when clicked:
    say "clicked"
when the program starts:
    set global g to 1
set local to 2
"#;
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(engine.execute(src));
    assert_eq!(engine.functions(), vec!["alpha", "beta"]);
    assert_eq!(engine.events(), vec!["clicked", "start"]);
    let variables = engine.variables();
    assert_eq!(variables.get("g"), Some(&Value::Number(1.0)));
    assert_eq!(variables.get("local"), Some(&Value::Number(2.0)));
    assert!(!engine.is_running());
}

#[test]
fn start_event_runs_before_top_level_statements() {
    let src = "say \"body\"\nwhen the program starts:\n    say \"start\"\n";
    assert_eq!(run_plaintalk(src).infos(), vec!["start", "body"]);
}

#[test]
fn trigger_event_runs_handler_against_current_state() {
    let src = "set clicks to 0\nwhen clicked:\n    add 1 to clicks\n    say clicks\n";
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(async {
        engine.execute(src).await;
        engine.trigger_event("clicked").await;
        engine.trigger_event("clicked").await;
        engine.trigger_event("nobody-listens").await;
    });
    assert_eq!(host.infos(), vec!["1", "2"]);
    assert!(host.errors().is_empty());
    assert_eq!(engine.variables().get("clicks"), Some(&Value::Number(2.0)));
}

#[test]
fn execute_starts_from_a_clean_slate() {
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(async {
        engine.execute("set a to 1\nto f:\n    say 1\n").await;
        engine.execute("set b to 2\n").await;
    });
    let variables = engine.variables();
    assert!(!variables.contains_key("a"));
    assert_eq!(variables.get("b"), Some(&Value::Number(2.0)));
    assert!(engine.functions().is_empty());
}

#[test]
fn syntax_error_leaves_previous_state_alone() {
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(async {
        engine.execute("set a to 1\n").await;
        engine.execute("set b to\n").await;
    });
    assert_eq!(engine.variables().get("a"), Some(&Value::Number(1.0)));
    assert_eq!(host.errors().len(), 1);
}

#[test]
fn engine_is_reusable_after_a_fault() {
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    block_on(async {
        engine.execute("say missing\n").await;
        engine.execute("say \"fine\"\n").await;
    });
    assert_eq!(host.errors().len(), 1);
    assert_eq!(host.infos(), vec!["fine"]);
    assert!(!engine.is_running());
}

#[test]
fn ask_coerces_numeric_answers() {
    let src = r#"
ask "Number?" and store result in n
ask "Name?" and store the result in name
ask "Padded?" and store result in padded
say n + 1
say name
say padded * 2
"#;
    let host = run_with_answers(src, &["41", "Ada", " 7 "]);
    assert_eq!(host.prompts(), vec!["Number?", "Name?", "Padded?"]);
    assert_eq!(host.infos(), vec!["42", "Ada", "14"]);
}

#[test]
fn ask_keeps_partial_numbers_as_text() {
    let host = RecordingHost::with_answers(&["12abc"]);
    let engine = Engine::new(host.clone());
    block_on(engine.execute("ask \"?\" and store result in v\n"));
    assert_eq!(
        engine.variables().get("v"),
        Some(&Value::String("12abc".to_string()))
    );
}

#[test]
fn shadowing_a_builtin_warns() {
    let host = run_plaintalk("to random:\n    give back 4\nsay random(10) is less than 10\n");
    let warnings = host.of(Severity::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("random"), "{warnings:?}");
    assert_eq!(host.infos(), vec!["true"]);
}

#[test]
fn terminate_reports_completion_and_stops() {
    let host = run_plaintalk("say 1\nterminate program\nsay 2\n");
    assert_eq!(host.infos(), vec!["1"]);
    assert_eq!(
        host.of(Severity::System),
        vec!["[SYSTEM] Execution completed."]
    );
}

#[test]
fn engine_handles_share_state() {
    let host = RecordingHost::new();
    let engine = Engine::new(host.clone());
    let other = engine.clone();
    block_on(engine.execute("set x to 3\n"));
    assert_eq!(other.variables().get("x"), Some(&Value::Number(3.0)));
}
