//! Unit tests for output read-back and row materialization

use super::*;
use crate::test_support::{FakeConnection, FakeCursor};
use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

#[test]
fn test_output_slot_presence() {
    assert_eq!(OutputSlot::Number(None).into_output(), OutputValue::Null);
    assert_eq!(OutputSlot::Text(None).into_output(), OutputValue::Null);
    assert_eq!(OutputSlot::Timestamp(None).into_output(), OutputValue::Null);
    assert_eq!(
        OutputSlot::Boolean(false).into_output(),
        OutputValue::Scalar(Value::Bool(false))
    );
    assert_eq!(
        OutputSlot::Binary(Vec::new()).into_output(),
        OutputValue::Scalar(Value::Bytes(Vec::new()))
    );
    assert_eq!(
        OutputSlot::Dynamic(Value::Null).into_output(),
        OutputValue::Null
    );
    assert_eq!(
        OutputSlot::Text(Some("hi".into())).into_output(),
        OutputValue::Scalar(Value::String("hi".into()))
    );
}

#[test]
fn test_present_column() {
    assert_eq!(
        present_column(Value::Bytes(b"abc".to_vec())),
        Value::String("abc".into())
    );

    let ts = Utc
        .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
        .unwrap()
        .fixed_offset();
    assert_eq!(
        present_column(Value::Timestamp(ts)),
        Value::String("2024-01-02T03:04:05Z".into())
    );

    let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    assert_eq!(
        present_column(Value::Date(date)),
        Value::String("2024-06-30T00:00:00Z".into())
    );

    assert_eq!(present_column(Value::Int64(5)), Value::Int64(5));
    assert_eq!(present_column(Value::Null), Value::Null);
}

#[test]
fn test_cursor_preserves_row_order_and_columns() {
    let cursor = FakeCursor::new(&["B", "A"])
        .row(vec![Value::Int64(3), Value::String("z".into())])
        .row(vec![Value::Int64(1), Value::String("y".into())])
        .row(vec![Value::Int64(2), Value::Null]);
    let conn = FakeConnection::new().with_cursor("rows", cursor);
    let params = vec![ProcedureParameter::output("rows", "REF CURSOR")];

    let result = invoke_procedure(&conn, "p", &params, &CallContext::new()).unwrap();

    let rows = result["rows"].as_rows().unwrap();
    assert_eq!(rows.len(), 3);
    for row in rows {
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["B", "A"]);
    }
    let firsts: Vec<&Value> = rows.iter().map(|row| &row["B"]).collect();
    assert_eq!(
        firsts,
        vec![&Value::Int64(3), &Value::Int64(1), &Value::Int64(2)]
    );
}

#[test]
fn test_empty_cursor_is_empty_list() {
    let conn = FakeConnection::new().with_cursor("cur", FakeCursor::new(&["X"]));
    let params = vec![ProcedureParameter::output("cur", "SYS_REFCURSOR")];

    let result = invoke_procedure(&conn, "p", &params, &CallContext::new()).unwrap();

    assert_eq!(result["cur"], OutputValue::Rows(Vec::new()));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({"cur": []})
    );
}

#[test]
fn test_fetch_failure_names_parameter_and_closes_cursor() {
    let cursor = FakeCursor::new(&["X"])
        .row(vec![Value::Int64(1)])
        .row(vec![Value::Int64(2)])
        .failing_at(1);
    let conn = FakeConnection::new().with_cursor("cur", cursor);
    let params = vec![ProcedureParameter::output("cur", "SYS_REFCURSOR")];

    let err = invoke_procedure(&conn, "p", &params, &CallContext::new()).unwrap_err();

    assert!(matches!(
        &err,
        ProcgateError::ResultProcessing { parameter, .. } if parameter == "cur"
    ));
    assert!(err.to_string().contains("fetch failed"));
    assert_eq!(conn.recorded.lock().cursors_closed, 1);
}

#[test]
fn test_short_row_is_scan_error() {
    let cursor = FakeCursor::new(&["ID", "NAME"])
        .row(vec![Value::Int64(1), Value::String("q1".into())])
        .row(vec![Value::Int64(2)]);
    let conn = FakeConnection::new().with_cursor("cur", cursor);
    let params = vec![ProcedureParameter::output("cur", "SYS_REFCURSOR")];

    let err = invoke_procedure(&conn, "p", &params, &CallContext::new()).unwrap_err();

    assert!(matches!(
        &err,
        ProcgateError::ResultProcessing { parameter, .. } if parameter == "cur"
    ));
    assert!(
        err.to_string()
            .contains("scan failed: row has 1 values for 2 columns"),
        "unexpected message: {}",
        err
    );
    assert_eq!(conn.recorded.lock().cursors_closed, 1);
}

#[test]
fn test_cancel_during_fetch_closes_cursor() {
    let cursor = FakeCursor::new(&["X"]).row(vec![Value::Int64(1)]);
    let conn = FakeConnection::new().with_cursor("cur", cursor);
    let arguments = vec![BoundArgument::Out {
        name: "cur".into(),
        destination: OutDestination::Cursor,
    }];
    let stmt = conn.prepare("BEGIN p(:cur); END;").unwrap();
    let ctx = CallContext::new();
    ctx.cancel();

    let err = normalize_outputs(stmt.as_ref(), &arguments, &ctx).unwrap_err();

    assert!(matches!(err, ProcgateError::Cancelled));
    assert_eq!(conn.recorded.lock().cursors_closed, 1);
}

#[test]
fn test_binary_output_serializes_as_base64() {
    let conn = FakeConnection::new().with_output("blob", OutputSlot::Binary(vec![0xde, 0xad]));
    let params = vec![ProcedureParameter::output("blob", "RAW")];

    let result = invoke_procedure(&conn, "p", &params, &CallContext::new()).unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({"blob": "3q0="})
    );
}
