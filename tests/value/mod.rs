// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use formulary::*;

#[test]
fn from_json() -> Result<()> {
    let v = Value::from_json_str(
        r#"{ "name": "Aria", "level": 3, "ratio": 0.5, "alive": true, "notes": null, "rolls": [1, 2] }"#,
    )?;

    assert_eq!(v["name"], Value::from("Aria"));
    assert_eq!(v["level"], Value::from(3.0));
    assert_eq!(v["ratio"], Value::from(0.5));
    assert_eq!(v["alive"], Value::Bool(true));
    assert_eq!(v["notes"], Value::Null);
    assert_eq!(v["rolls"][1], Value::from(2.0));
    assert_eq!(v["rolls"][2], Value::Undefined);
    assert_eq!(v["missing"], Value::Undefined);
    assert_eq!(v["name"]["x"], Value::Undefined);
    Ok(())
}

#[test]
fn to_json() -> Result<()> {
    let v = Value::from_json_str(r#"{"a": 2000, "b": 1.5, "c": [true, null], "d": "x"}"#)?;
    assert_eq!(v.to_string(), r#"{"a":2000,"b":1.5,"c":[true,null],"d":"x"}"#);
    assert_eq!(Value::Undefined.to_string(), "null");
    assert_eq!(Value::from(-0.25).to_string(), "-0.25");
    Ok(())
}

#[test]
fn from_yaml() -> Result<()> {
    let v: Value = serde_yaml::from_str("stats: { str: 10 }\ntags: [a, b]\n")?;
    assert_eq!(v["stats"]["str"], Value::from(10.0));
    assert_eq!(v["tags"][0], Value::from("a"));
    Ok(())
}

#[test]
fn accessors() -> Result<()> {
    let mut v = Value::new_object();
    v.as_object_mut()?.insert("xs".into(), Value::new_array());
    assert!(v["xs"].as_array()?.is_empty());
    assert!(v.as_array().is_err());
    assert_eq!(v.as_object()?.len(), 1);
    assert!(*Value::from(true).as_bool()?);
    assert!(Value::from(1.0).as_bool().is_err());
    assert_eq!(Value::from("Aria").as_string()?.as_ref(), "Aria");
    assert!(Value::Null.as_string().is_err());
    assert_eq!(Value::from(4usize).as_number()?, 4.0);
    assert!(Value::Undefined.is_undefined());
    assert!(Value::Null.is_null());
    assert_eq!(Value::from(true).type_name(), "boolean");
    Ok(())
}

#[test]
fn results_serialize_as_json() -> Result<()> {
    let engine = Engine::new();
    let ctx = Value::from_json_str(r#"{"a": 7, "b": 2}"#)?;
    assert_eq!(engine.eval_formula("a / b", &ctx)?.to_json_str()?, "3.5");
    assert_eq!(engine.eval_formula("a * b", &ctx)?.to_json_str()?, "14");
    assert_eq!(engine.eval_formula("c", &ctx)?.to_json_str()?, "null");
    Ok(())
}
