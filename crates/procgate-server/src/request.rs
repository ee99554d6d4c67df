//! Request bodies accepted by the HTTP endpoints

use procgate_core::{ProcedureParameter, Value};
use serde::Deserialize;

/// Body of `POST /api/v1/procedures/call`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CallProcedureRequest {
    pub name: String,
    pub params: Vec<ProcedureParamRequest>,
}

/// One parameter descriptor as sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcedureParamRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub value: serde_json::Value,
    pub direction: String,
}

impl ProcedureParamRequest {
    /// No name, type or direction given. Validation skips such descriptors.
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
            && self.param_type.trim().is_empty()
            && self.direction.trim().is_empty()
    }
}

impl CallProcedureRequest {
    /// Check the request shape before it reaches the database.
    ///
    /// A partially filled parameter must name all of name, type and direction.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("procedure name is required".to_string());
        }

        for (i, param) in self.params.iter().enumerate() {
            if param.is_blank() {
                continue;
            }
            if param.name.trim().is_empty() {
                return Err(format!("param[{}] name is required", i));
            }
            if param.param_type.trim().is_empty() {
                return Err(format!("param[{}] type is required", i));
            }
            if param.direction.trim().is_empty() {
                return Err(format!("param[{}] direction is required", i));
            }
        }

        Ok(())
    }

    /// Convert into core parameters in request order.
    ///
    /// Blank descriptors are kept; the binder rejects their empty direction.
    pub fn into_parameters(self) -> (String, Vec<ProcedureParameter>) {
        let params = self
            .params
            .into_iter()
            .map(|p| {
                ProcedureParameter::new(p.name, p.param_type, p.direction, Value::from_json(p.value))
            })
            .collect();
        (self.name, params)
    }
}

/// Body or query string of `GET /api/v1/procedures/info`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcedureInfoRequest {
    pub procedure_name: String,
}

impl ProcedureInfoRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.procedure_name.trim().is_empty() {
            return Err("procedure_name is required".to_string());
        }
        Ok(())
    }
}
