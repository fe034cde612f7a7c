//! Text commands received over the WebSocket, one per frame.
//!
//! `COMMAND` or `COMMAND:payload`; replies are `KIND_UPDATE:{json}`.

use formula_core::formula::{Expression, Number};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Format an error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str) -> String {
    format!("ERROR_UPDATE:{}", json!({
        "code": code,
        "message": message,
    }))
}

#[derive(Deserialize)]
struct DeclareCmd {
    name: String,
    value: f64,
    #[serde(default)]
    fixed: bool,
}

#[derive(Deserialize)]
struct RenameCmd {
    name: String,
    display: String,
}

/// Apply one command to the session's expression and build the reply frame.
pub fn handle_command(expression: &mut Expression, text: &str) -> String {
    let (command, payload) = text.split_once(':').unwrap_or((text, ""));

    match command {
        "EXPRESSION_NAME" => match expression.set_name(payload) {
            Ok(()) => {
                info!("Expression named '{}'", payload);
                expression_update(expression)
            }
            Err(e) => format_error("INVALID_NAME", &e.to_string()),
        },

        "EXPRESSION_SET" => match expression.set_expression(payload) {
            Ok(()) => {
                info!("Parsed expression '{}'", payload);
                expression_update(expression)
            }
            Err(e) => format_error("INVALID_INPUT", &e.to_string()),
        },

        "VARIABLE_DECLARE" => {
            // Format: VARIABLE_DECLARE:{"name":"x","value":10,"fixed":false}
            let Ok(cmd) = serde_json::from_str::<DeclareCmd>(payload) else {
                warn!("Failed to parse VARIABLE_DECLARE command: {}", payload);
                return format_error("BAD_COMMAND", "Malformed VARIABLE_DECLARE payload");
            };
            let result = if cmd.fixed {
                expression.declare_fixed_variable(&cmd.name, cmd.value)
            } else {
                expression.declare_variable(&cmd.name, cmd.value)
            };
            match result {
                Ok(()) => {
                    info!("Declared variable '{}' = {}", cmd.name, cmd.value);
                    variables_update(expression)
                }
                Err(e) => format_error("DECLARATION_FAILED", &e.to_string()),
            }
        }

        "VARIABLE_RENAME" => {
            // Format: VARIABLE_RENAME:{"name":"old","display":"new"}
            let Ok(cmd) = serde_json::from_str::<RenameCmd>(payload) else {
                warn!("Failed to parse VARIABLE_RENAME command: {}", payload);
                return format_error("BAD_COMMAND", "Malformed VARIABLE_RENAME payload");
            };
            expression.rename_variable(&cmd.name, &cmd.display);
            info!("Renamed '{}' to '{}' for display", cmd.name, cmd.display);
            variables_update(expression)
        }

        "STRICT" => match payload {
            "on" | "off" => {
                expression.set_strict_lookups(payload == "on");
                info!("Strict lookups {}", payload);
                expression_update(expression)
            }
            _ => format_error("BAD_COMMAND", "STRICT expects 'on' or 'off'"),
        },

        "EVALUATE" => match expression.try_evaluate() {
            Ok(value) => format!(
                "RESULT_UPDATE:{}",
                json!({ "value": number_json(Number::from(value)) })
            ),
            Err(e) => {
                warn!("Evaluation failed: {}", e);
                format_error("EVALUATION_FAILED", &e.to_string())
            }
        },

        "VARIABLES" => variables_update(expression),

        "EXPRESSION" => expression_update(expression),

        _ => {
            warn!("Unknown command: {}", text);
            format_error("UNKNOWN_COMMAND", command)
        }
    }
}

/// JSON has no infinity or NaN, so those are sent as strings rather than `null`.
fn number_json(number: Number) -> Value {
    match number {
        Number::Integer(i) => json!(i),
        Number::Real(r) if r.is_nan() => json!("NaN"),
        Number::Real(r) if r.is_infinite() => {
            json!(if r > 0.0 { "Infinity" } else { "-Infinity" })
        }
        Number::Real(r) => json!(r),
    }
}

fn expression_update(expression: &Expression) -> String {
    let mut variables = Vec::new();
    expression.collect_variables(&mut variables);
    format!(
        "EXPRESSION_UPDATE:{}",
        json!({
            "name": expression.name(),
            "source": expression.source(),
            "translated": expression.translated_text(),
            "constant": expression.is_const_expression(),
            "variables": variables,
        })
    )
}

fn variables_update(expression: &Expression) -> String {
    let scope = expression.scope();
    let variables: Vec<Value> = scope
        .names()
        .map(|name| {
            json!({
                "name": name,
                "value": scope.value(name),
                "fixed": scope.is_fixed(name),
                "display": scope.display_name(name),
            })
        })
        .collect();
    format!("VARIABLES_UPDATE:{}", Value::Array(variables))
}
