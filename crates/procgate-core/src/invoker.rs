//! Invoker: assembles the anonymous block and runs it

use crate::{
    BoundArgument, CallContext, InvocationResult, ProcedureArgument, ProcedureConnection,
    ProcedureParameter, ProcgateError, Result, bind_parameters, normalize_outputs,
};

/// Maximum dotted parts in a procedure name (`schema.package.procedure`)
const MAX_NAME_PARTS: usize = 3;

/// Longest identifier Oracle accepts
const MAX_IDENTIFIER_LEN: usize = 128;

/// Check that a procedure name is a plain or dotted Oracle identifier.
///
/// Each part is either an unquoted identifier (letter first, then letters,
/// digits, `_`, `$` or `#`) or a double-quoted identifier without embedded quotes.
pub fn validate_procedure_name(name: &str) -> Result<()> {
    let invalid = || ProcgateError::Configuration(format!("invalid procedure name: {}", name));

    if name.is_empty() {
        return Err(ProcgateError::Configuration(
            "procedure name is required".to_string(),
        ));
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > MAX_NAME_PARTS {
        return Err(invalid());
    }

    for part in parts {
        let valid = match part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
            Some(quoted) => {
                !quoted.is_empty() && quoted.len() <= MAX_IDENTIFIER_LEN && !quoted.contains('"')
            }
            None => is_plain_identifier(part),
        };
        if !valid {
            return Err(invalid());
        }
    }

    Ok(())
}

/// Check that a bind name can follow `:` in a placeholder
pub fn validate_bind_name(name: &str) -> Result<()> {
    let valid = is_plain_identifier(name)
        || (!name.is_empty()
            && name.len() <= MAX_IDENTIFIER_LEN
            && name.bytes().all(|b| b.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        Err(ProcgateError::Configuration(format!(
            "invalid parameter name: {:?}",
            name
        )))
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    s.len() <= MAX_IDENTIFIER_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
}

/// Build `BEGIN name(:a, :b); END;` with one placeholder per argument in order
pub fn build_call_block(procedure: &str, arguments: &[BoundArgument]) -> String {
    let placeholders = arguments
        .iter()
        .map(|argument| format!(":{}", argument.name()))
        .collect::<Vec<_>>()
        .join(", ");

    format!("BEGIN {}({}); END;", procedure, placeholders)
}

/// Bind, execute and normalize one procedure call.
///
/// Configuration problems are reported before the connection is touched.
/// Execution failures carry the procedure name, read-back failures carry the
/// parameter name. Nothing is retried.
pub fn invoke_procedure(
    conn: &dyn ProcedureConnection,
    procedure: &str,
    params: &[ProcedureParameter],
    ctx: &CallContext,
) -> Result<InvocationResult> {
    tracing::info!(
        procedure = %procedure,
        param_count = params.len(),
        "invoking procedure"
    );
    for param in params {
        tracing::debug!(
            name = %param.name,
            declared_type = %param.declared_type,
            direction = %param.direction,
            value = %param.value,
            "parameter"
        );
    }

    validate_procedure_name(procedure)?;
    let arguments = bind_parameters(params)?;
    for argument in &arguments {
        validate_bind_name(argument.name())?;
    }
    let block = build_call_block(procedure, &arguments);

    ctx.check()?;

    let mut stmt = conn
        .prepare(&block)
        .map_err(|e| e.during_execution(procedure))?;
    for argument in &arguments {
        stmt.bind(argument)
            .map_err(|e| e.during_execution(procedure))?;
    }
    stmt.execute().map_err(|e| e.during_execution(procedure))?;
    ctx.check()?;

    let result = normalize_outputs(stmt.as_ref(), &arguments, ctx)?;

    tracing::info!(
        procedure = %procedure,
        outputs = result.len(),
        "procedure completed"
    );
    Ok(result)
}

/// Look up the declared arguments of a procedure owned by the connected schema
pub fn describe_procedure(
    conn: &dyn ProcedureConnection,
    procedure: &str,
    ctx: &CallContext,
) -> Result<Vec<ProcedureArgument>> {
    if procedure.trim().is_empty() {
        return Err(ProcgateError::Configuration(
            "procedure_name is required".to_string(),
        ));
    }
    ctx.check()?;

    let arguments = conn.procedure_arguments(procedure)?;
    tracing::debug!(
        procedure = %procedure,
        arguments = arguments.len(),
        "described procedure"
    );
    Ok(arguments)
}
