use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{ChartSurface, NativeSeriesHost};
use crate::drawing::{Drawing, DrawingController};
use crate::error::{AnnotationError, AnnotationResult};
use crate::script::ChartScript;

use super::AnnotationEngine;

pub const DRAWING_SET_JSON_SCHEMA_V1: u32 = 1;
pub const SCRIPT_SET_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingSetJsonContractV1 {
    pub schema_version: u32,
    pub drawings: Vec<Drawing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSetJsonContractV1 {
    pub schema_version: u32,
    pub scripts: Vec<ChartScript>,
}

impl DrawingSetJsonContractV1 {
    #[must_use]
    pub fn new(drawings: Vec<Drawing>) -> Self {
        Self {
            schema_version: DRAWING_SET_JSON_SCHEMA_V1,
            drawings,
        }
    }

    pub fn to_json_pretty(&self) -> AnnotationResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            AnnotationError::Serialization(format!("failed to serialize drawing set v1: {e}"))
        })
    }

    /// Accepts either a versioned payload or a bare drawing array.
    pub fn from_json_compat_str(input: &str) -> AnnotationResult<Vec<Drawing>> {
        if let Ok(drawings) = serde_json::from_str::<Vec<Drawing>>(input) {
            return Ok(drawings);
        }
        let payload: Self = serde_json::from_str(input).map_err(|e| {
            AnnotationError::Serialization(format!("failed to parse drawing set json payload: {e}"))
        })?;
        if payload.schema_version != DRAWING_SET_JSON_SCHEMA_V1 {
            return Err(AnnotationError::Serialization(format!(
                "unsupported drawing set schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.drawings)
    }
}

impl ScriptSetJsonContractV1 {
    #[must_use]
    pub fn new(scripts: Vec<ChartScript>) -> Self {
        Self {
            schema_version: SCRIPT_SET_JSON_SCHEMA_V1,
            scripts,
        }
    }

    pub fn to_json_pretty(&self) -> AnnotationResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            AnnotationError::Serialization(format!("failed to serialize script set v1: {e}"))
        })
    }

    /// Accepts either a versioned payload or a bare script array.
    pub fn from_json_compat_str(input: &str) -> AnnotationResult<Vec<ChartScript>> {
        if let Ok(scripts) = serde_json::from_str::<Vec<ChartScript>>(input) {
            return Ok(scripts);
        }
        let payload: Self = serde_json::from_str(input).map_err(|e| {
            AnnotationError::Serialization(format!("failed to parse script set json payload: {e}"))
        })?;
        if payload.schema_version != SCRIPT_SET_JSON_SCHEMA_V1 {
            return Err(AnnotationError::Serialization(format!(
                "unsupported script set schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.scripts)
    }
}

impl<S: ChartSurface + NativeSeriesHost> AnnotationEngine<S> {
    pub fn drawings_json_contract_v1_pretty(&self) -> AnnotationResult<String> {
        DrawingSetJsonContractV1::new(self.drawings.drawings().to_vec()).to_json_pretty()
    }

    /// Replaces the drawing set from persisted JSON.
    ///
    /// Restoring is not a user edit, so observers are not notified. On error
    /// the current set is left untouched.
    pub fn restore_drawings_json(&mut self, input: &str) -> AnnotationResult<usize> {
        let drawings = DrawingSetJsonContractV1::from_json_compat_str(input)?;
        let restored = DrawingController::from_drawings(drawings)?;
        let count = restored.len();
        self.drawings = restored;
        self.interaction.set_tool(self.interaction.tool());
        self.interaction.select(None);
        self.invalidate();
        Ok(count)
    }

    pub fn scripts_json_contract_v1_pretty(&self) -> AnnotationResult<String> {
        ScriptSetJsonContractV1::new(self.scripts.values().cloned().collect()).to_json_pretty()
    }

    /// Replaces every script from persisted JSON without notifying observers.
    pub fn restore_scripts_json(&mut self, input: &str) -> AnnotationResult<usize> {
        let scripts = ScriptSetJsonContractV1::from_json_compat_str(input)?;
        let mut restored = IndexMap::with_capacity(scripts.len());
        for script in scripts {
            if script.id.is_empty() {
                return Err(AnnotationError::InvalidData(
                    "script id must not be empty".to_owned(),
                ));
            }
            let id = script.id.clone();
            if restored.insert(id.clone(), script).is_some() {
                return Err(AnnotationError::DuplicateId(id));
            }
        }
        for id in self.scripts.keys() {
            if !restored.contains_key(id) {
                self.evaluator.forget(id);
            }
        }
        let count = restored.len();
        self.scripts = restored;
        debug!(count, "scripts restored");
        self.recompute_scripts();
        Ok(count)
    }
}
