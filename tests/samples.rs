mod util;

use plaintalk::compile;
use plaintalk::samples::{self, SAMPLES};
use util::run_with_answers;

fn run_sample(name: &str, answers: &[&str]) -> Vec<String> {
    let sample = samples::find(name).unwrap_or_else(|| panic!("missing sample {name}"));
    let host = run_with_answers(sample.source, answers);
    assert!(host.errors().is_empty(), "{name}: {:?}", host.errors());
    host.infos()
}

#[test]
fn every_sample_compiles() {
    for sample in SAMPLES {
        if let Err(err) = compile(sample.source) {
            panic!("{} failed to compile: {err}", sample.name);
        }
    }
}

#[test]
fn lookup_accepts_names_and_slugs() {
    assert_eq!(samples::find("hello-world").map(|s| s.name), Some("Hello World"));
    assert_eq!(samples::find("Simple Calculator").map(|s| s.name), Some("Simple Calculator"));
    assert_eq!(samples::find("LIST-operations").map(|s| s.name), Some("List Operations"));
    assert!(samples::find("nope").is_none());
}

#[test]
fn hello_world() {
    assert_eq!(run_sample("hello-world", &[]), vec!["Hello, World!"]);
}

#[test]
fn variables() {
    assert_eq!(
        run_sample("variables", &[]),
        vec!["Hello, Alice", "You are 25 years old"]
    );
}

#[test]
fn math_operations() {
    assert_eq!(
        run_sample("math-operations", &[]),
        vec![
            "x + y = 15",
            "x - y = 5",
            "x * y = 50",
            "x divided by y = 2",
            "After increasing x by 3: 13",
            "After decreasing y by 2: 3",
        ]
    );
}

#[test]
fn conditionals_with_numeric_answer() {
    assert_eq!(run_sample("conditionals", &["20"]), vec!["You are an adult!"]);
    assert_eq!(
        run_sample("conditionals", &["70"]),
        vec!["You are an adult!", "You qualify for senior discounts!"]
    );
}

#[test]
fn loops() {
    assert_eq!(
        run_sample("loops", &[]),
        vec![
            "Count: 1",
            "Count: 2",
            "Count: 3",
            "Count: 4",
            "Count: 5",
            "I like apple",
            "I like banana",
            "I like cherry",
        ]
    );
}

#[test]
fn functions() {
    assert_eq!(run_sample("functions", &[]), vec!["Hello, World!", "Area: 15"]);
}

#[test]
fn simple_calculator() {
    assert_eq!(
        run_sample("simple-calculator", &["8", "2"]),
        vec![
            "Simple Calculator",
            "Addition: 10",
            "Subtraction: 6",
            "Multiplication: 16",
            "Division: 4",
        ]
    );
    let outputs = run_sample("simple-calculator", &["8", "0"]);
    assert!(outputs.contains(&"Error: Cannot divide by zero!".to_string()));
    assert_eq!(outputs.last().map(String::as_str), Some("Division: 0"));
}

#[test]
fn alternative_syntax() {
    assert_eq!(
        run_sample("alternative-syntax", &["Bob"]),
        vec![
            "Hello Bob!",
            "This is iteration 1",
            "This is iteration 2",
            "This is iteration 3",
        ]
    );
}

#[test]
fn advanced_math() {
    assert_eq!(
        run_sample("advanced-math", &[]),
        vec![
            "Initial value: 10",
            "After adding 5: 15",
            "After subtracting 3: 12",
            "After multiplying by 2: 24",
            "After dividing by 4: 6",
        ]
    );
}

#[test]
fn complex_conditionals() {
    assert_eq!(
        run_sample("complex-conditionals", &["20", "yes"]),
        vec!["You are an adult", "You get a student discount!"]
    );
    assert_eq!(
        run_sample("complex-conditionals", &["15", "no"]),
        vec!["You are a teenager"]
    );
}

#[test]
fn list_operations() {
    assert_eq!(
        run_sample("list-operations", &[]),
        vec![
            "List length: 5",
            "Fruits list length: 3",
            "Processing: apple",
            "Processing: banana",
            "Processing: cherry",
            "Text length: 11",
        ]
    );
}
