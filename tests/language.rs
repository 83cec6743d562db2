mod util;

use plaintalk::{EngineConfig, NO_NEWLINE_MARKER, Severity, Value};
use util::{RecordingHost, run_on, run_plaintalk};

#[test]
fn add_then_say_prints_sum_as_info() {
    let host = run_plaintalk("set x to 10\nadd 5 to x\nsay x\n");
    assert_eq!(host.messages(), vec![("15".to_string(), Severity::Info)]);
}

#[test]
fn division_by_zero_names_fault_and_line() {
    let host = run_plaintalk("say 1 / 0");
    assert!(host.infos().is_empty());
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Division by zero"), "{errors:?}");
    assert!(errors[0].contains("line 1"), "{errors:?}");
}

#[test]
fn parameter_writes_stay_inside_the_call() {
    let src = r#"
to f using n:
    set n to n + 1
set x to 5
f using x
say x
"#;
    let host = run_plaintalk(src);
    assert_eq!(host.infos(), vec!["5"]);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
}

#[test]
fn global_writes_inside_functions_are_visible_afterwards() {
    let src = r#"
to bump:
    set global total to 42
bump()
say total
"#;
    let host = run_plaintalk(src);
    assert_eq!(host.infos(), vec!["42"]);
}

#[test]
fn functions_cannot_see_caller_locals() {
    let src = "to peek:\n    say secret\nset secret to 1\npeek()\n";
    let host = run_plaintalk(src);
    assert!(host.infos().is_empty());
    assert_eq!(host.errors(), vec!["Error: Undefined variable: secret at line 2"]);
}

#[test]
fn followed_by_concatenates() {
    let host = run_plaintalk("say \"a\" followed by 1 followed by \"b\"");
    assert_eq!(host.infos(), vec!["a1b"]);
}

#[test]
fn natural_comparisons_agree() {
    let host = run_plaintalk("if 5 is 5 or more:\n    say \"yes\"\n");
    assert_eq!(host.infos(), vec!["yes"]);
    let host = run_plaintalk("if 5 is at least 5:\n    say \"yes\"\n");
    assert_eq!(host.infos(), vec!["yes"]);
    let host = run_plaintalk("if 4 is greater than or equal to 5:\n    say \"yes\"\n");
    assert!(host.infos().is_empty());
}

#[test]
fn for_each_over_list_of_words_drops_loop_variable() {
    let src = "set xs to list of a, b and c\nfor every x in xs:\n    say x\n";
    let host = RecordingHost::new();
    let engine = run_on(src, host.clone(), EngineConfig::default());
    assert_eq!(host.infos(), vec!["a", "b", "c"]);
    let variables = engine.variables();
    assert!(variables.contains_key("xs"));
    assert!(!variables.contains_key("x"));
}

#[test]
fn for_each_accepts_inline_and_named_lists() {
    let src = "set xs to [1, 2]\nfor every n in the list of xs:\n    say n\nfor w in list of up, down:\n    say w\n";
    assert_eq!(run_plaintalk(src).infos(), vec!["1", "2", "up", "down"]);
}

#[test]
fn else_if_chain_picks_one_branch() {
    let src = r#"
set n to 2
if n is 1:
    say "one"
else if n is 2:
    say "two"
else:
    say "many"
"#;
    assert_eq!(run_plaintalk(src).infos(), vec!["two"]);
}

#[test]
fn give_back_unwinds_loops() {
    let src = r#"
to firstOver using limit:
    for every n in [1, 5, 10]:
        if n is greater than limit:
            give back n
    give back 0

to countTo using limit:
    set i to 0
    while true:
        increase i by 1
        if i is limit:
            give back i

say firstOver using 3
say firstOver using 99
say countTo using 4
"#;
    assert_eq!(run_plaintalk(src).infos(), vec!["5", "0", "4"]);
}

#[test]
fn multiply_and_divide_in_place() {
    let host = run_plaintalk("set x to 10\nmultiply x by 3\ndivide x by 4\nsay x\n");
    assert_eq!(host.infos(), vec!["7.5"]);
}

#[test]
fn records_and_member_access() {
    let src = r#"
set p to {name: "Ada", age: 36}
say p.name followed by " " followed by p.age
say p
say [1, 2, 3].length
say "hey"[1]
"#;
    assert_eq!(
        run_plaintalk(src).infos(),
        vec!["Ada 36", "{age: 36, name: Ada}", "3", "e"]
    );
}

#[test]
fn length_forms() {
    let src = "say length of \"hello\"\nsay length(list of a, b)\n";
    assert_eq!(run_plaintalk(src).infos(), vec!["5", "2"]);
    let host = run_plaintalk("say length of 5");
    assert_eq!(
        host.errors(),
        vec!["Error: length() can only be used on arrays or strings at line 1"]
    );
}

#[test]
fn display_marks_missing_newline() {
    let host = run_plaintalk("display \"a\"\ndisplay 1\n");
    assert_eq!(
        host.infos(),
        vec![format!("a{NO_NEWLINE_MARKER}"), format!("1{NO_NEWLINE_MARKER}")]
    );
}

#[test]
fn print_call_joins_arguments_with_spaces() {
    let host = run_plaintalk("print(\"a\", 1, true)");
    assert_eq!(host.infos(), vec!["a 1 true"]);
}

#[test]
fn logical_operators_short_circuit_to_operands() {
    let src = "say 0 or \"fallback\"\nsay not 0\nsay 1 and 2\nsay false and missing\n";
    let host = run_plaintalk(src);
    assert_eq!(host.infos(), vec!["fallback", "true", "2", "false"]);
    assert!(host.errors().is_empty());
}

#[test]
fn store_and_global_reads() {
    let src = "store 5 in y\nset global g to 1\nset g to 2\nsay y\nsay global g\nsay g\n";
    assert_eq!(run_plaintalk(src).infos(), vec!["5", "1", "2"]);
}

#[test]
fn runtime_faults_carry_their_line() {
    let cases = [
        ("frobnicate using 1", "Error: Undefined function: frobnicate at line 1"),
        (
            "to f using a and b:\n    say a\nf using 1",
            "Error: Function f expects 2 arguments, got 1 at line 3",
        ),
        (
            "set s to \"x\"\nadd 1 to s",
            "Error: Cannot perform arithmetic on non-numeric values at line 2",
        ),
        (
            "set s to \"x\"\ndecrease s by 1",
            "Error: Cannot decrease non-numeric values at line 2",
        ),
        (
            "for every c in 5:\n    say c",
            "Error: Cannot iterate over non-array value at line 1",
        ),
        (
            "set p to {a: 1}\nsay p.b.c",
            "Error: Cannot access property of null or undefined at line 2",
        ),
        ("set x to 1\ndelete x\nsay x", "Error: Undefined variable: x at line 3"),
        ("say random(1, 2, 3)", "Error: random() expects 1 or 2 arguments at line 1"),
    ];
    for (src, expected) in cases {
        let host = run_plaintalk(src);
        assert_eq!(host.errors(), vec![expected.to_string()], "source: {src}");
    }
}

#[test]
fn fault_stops_remaining_statements() {
    let host = run_plaintalk("say 1\nsay missing\nsay 3\n");
    assert_eq!(host.infos(), vec!["1"]);
    assert_eq!(host.errors().len(), 1);
}

#[test]
fn deep_recursion_is_a_fault() {
    let host = RecordingHost::new();
    let config = EngineConfig { max_call_depth: 25 };
    run_on("to recurse:\n    recurse()\nrecurse()\n", host.clone(), config);
    let errors = host.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Maximum call depth of 25 exceeded"), "{errors:?}");
}

#[test]
fn runaway_recursion_on_default_limits_is_a_fault() {
    let src = "to recurse using n:\n    give back recurse using n + 1\nsay recurse using 0\n";
    let host = RecordingHost::new();
    run_on(src, host.clone(), EngineConfig::default());
    assert!(host.infos().is_empty());
    assert_eq!(
        host.errors(),
        vec!["Error: Maximum call depth of 1000 exceeded at line 2"]
    );
}

#[test]
fn deep_but_bounded_recursion_returns() {
    let src = r#"
to sumTo using n:
    if n is 0:
        give back 0
    give back n + sumTo using n - 1
say sumTo using 500
"#;
    let host = run_plaintalk(src);
    assert!(host.errors().is_empty(), "{:?}", host.errors());
    assert_eq!(host.infos(), vec!["125250"]);
}

#[test]
fn top_level_give_back_ends_program() {
    assert_eq!(run_plaintalk("say 1\ngive back\nsay 2\n").infos(), vec!["1"]);
}

#[test]
fn random_stays_in_range() {
    let src = "set a to random(3)\nset b to random using 5 and 7\n";
    let host = RecordingHost::new();
    let engine = run_on(src, host.clone(), EngineConfig::default());
    let variables = engine.variables();
    let a = variables.get("a").and_then(Value::as_number).expect("a");
    let b = variables.get("b").and_then(Value::as_number).expect("b");
    assert!((0.0..3.0).contains(&a) && a.fract() == 0.0, "a = {a}");
    assert!((5.0..=7.0).contains(&b) && b.fract() == 0.0, "b = {b}");
}
