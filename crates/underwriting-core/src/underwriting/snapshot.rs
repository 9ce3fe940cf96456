use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::inputs::ModelInputs;
use super::model::{underwrite_deal, ModelResult};
use crate::types::ComputationOutput;
use crate::UnderwritingResult;

/// Property type of a saved deal. Informational only; the engine does not branch on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Multifamily,
    Office,
    Retail,
    Industrial,
    MixedUse,
    #[default]
    #[serde(other)]
    Other,
}

/// A saved deal: inputs plus identifying metadata. Storage is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealSnapshot {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub asset_class: AssetClass,
    pub inputs: ModelInputs,
}

impl DealSnapshot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        asset_class: AssetClass,
        created_at: DateTime<Utc>,
        inputs: ModelInputs,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at,
            asset_class,
            inputs,
        }
    }

    pub fn underwrite(&self) -> UnderwritingResult<ComputationOutput<ModelResult>> {
        underwrite_deal(&self.inputs)
    }
}

/// True when the value looks like a snapshot rather than a bare input form.
pub fn is_snapshot(value: &Value) -> bool {
    value.get("inputs").is_some_and(Value::is_object)
}

/// The input form inside a document that may be either a snapshot or bare inputs.
pub fn deal_form(value: &Value) -> &Value {
    match value.get("inputs") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    }
}
