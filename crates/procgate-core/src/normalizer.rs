//! Result normalizer: reads output destinations back into an [`InvocationResult`]

use chrono::{DateTime, FixedOffset, NaiveTime, SecondsFormat};

use crate::{
    BoundArgument, CallContext, CallableStatement, InvocationResult, OutputValue, ProcgateError,
    Result, RowMap, RowSet, Value,
};

/// The raw content of a scalar output destination after execution.
///
/// Number, text and timestamp slots carry a presence flag as an `Option`.
/// Boolean and binary slots always hold a value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSlot {
    Number(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<FixedOffset>>),
    Boolean(bool),
    Binary(Vec<u8>),
    Dynamic(Value),
}

impl OutputSlot {
    pub fn into_output(self) -> OutputValue {
        match self {
            OutputSlot::Number(v) => v.map(Value::Float64).into(),
            OutputSlot::Text(v) => v.map(Value::String).into(),
            OutputSlot::Timestamp(v) => v.map(Value::Timestamp).into(),
            OutputSlot::Boolean(v) => OutputValue::Scalar(Value::Bool(v)),
            OutputSlot::Binary(v) => OutputValue::Scalar(Value::Bytes(v)),
            OutputSlot::Dynamic(v) => Some(v).into(),
        }
    }
}

/// Collect every non-`IN` argument into the result, in bind order
pub fn normalize_outputs(
    stmt: &dyn CallableStatement,
    arguments: &[BoundArgument],
    ctx: &CallContext,
) -> Result<InvocationResult> {
    let mut result = InvocationResult::with_capacity(arguments.len());

    for argument in arguments {
        let Some(destination) = argument.destination() else {
            continue;
        };
        let name = argument.name();

        let value = if destination.is_cursor() {
            let mut consume = |rows: &mut dyn RowSet| materialize_rows(rows, ctx);
            match stmt
                .read_cursor(name, &mut consume)
                .map_err(|e| e.while_reading(name))?
            {
                Some(rows) => OutputValue::Rows(rows),
                None => OutputValue::Null,
            }
        } else {
            stmt.read_output(name, destination)
                .map_err(|e| e.while_reading(name))?
                .into_output()
        };

        tracing::debug!(parameter = %name, null = value.is_null(), "read output parameter");
        result.insert(name.to_string(), value);
    }

    Ok(result)
}

/// Drain a row set into row mappings, closing it on every exit path
pub fn materialize_rows(rows: &mut dyn RowSet, ctx: &CallContext) -> Result<Vec<RowMap>> {
    let collected = collect_rows(rows, ctx);

    if let Err(e) = rows.close() {
        tracing::warn!(error = %e, "failed to close cursor");
    }

    collected
}

fn collect_rows(rows: &mut dyn RowSet, ctx: &CallContext) -> Result<Vec<RowMap>> {
    let columns = rows.column_names()?;
    let mut collected = Vec::new();

    while let Some(row) = rows.next_row() {
        ctx.check()?;
        let values = row?;
        if values.len() != columns.len() {
            return Err(ProcgateError::Driver(format!(
                "scan failed: row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }

        let mut mapped = RowMap::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(values) {
            mapped.insert(column.clone(), present_column(value));
        }
        collected.push(mapped);
    }

    tracing::trace!(rows = collected.len(), columns = columns.len(), "materialized cursor");
    Ok(collected)
}

/// Render a fetched column value for the result tree.
///
/// Bytes become text and temporal values become RFC 3339 strings.
pub fn present_column(value: Value) -> Value {
    match value {
        Value::Bytes(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Timestamp(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        Value::DateTime(dt) => {
            Value::String(dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        }
        Value::Date(date) => Value::String(
            date.and_time(NaiveTime::MIN)
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        other => other,
    }
}
