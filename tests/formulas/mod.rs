// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use formulary::*;
use serde::{Deserialize, Serialize};
use std::env;
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    formula: String,
    #[serde(default = "empty_context")]
    context: Value,
    want_result: Option<Value>,
    error: Option<String>,
}

fn empty_context() -> Value {
    Value::new_object()
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {}", file);

    let yaml = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml)?;
    let engine = Engine::new();

    for case in &test.cases {
        print!("case {} ", &case.note);

        match (engine.eval_formula(&case.formula, &case.context), &case.error) {
            (Ok(actual), None) => match &case.want_result {
                Some(expected) => {
                    if actual != *expected {
                        bail!(
                            "`{}`\nexpected: {expected}\nactual:   {actual}",
                            case.formula
                        );
                    }
                }
                None => bail!("case `{}` specifies neither want_result nor error", case.note),
            },
            (Ok(actual), Some(expected)) => {
                bail!("expected error `{expected}` but got result {actual}")
            }
            (Err(actual), Some(expected)) => {
                let actual = actual.to_string();
                if !actual.contains(expected.as_str()) {
                    bail!(
                        "Error message\n`{}\n`\ndoes not contain `{}`",
                        actual,
                        expected
                    );
                }
            }
            (Err(actual), None) => return Err(actual.into()),
        }

        println!("passed");
    }

    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    if file.is_empty() {
        bail!("missing yaml test file");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/formulas/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
