use serde::{Deserialize, Serialize};

use crate::domain::{GenerationResult, Prompt};

pub const GENERATE_ANIMATION_PATH: &str = "/generate-animation";
pub const EXPORT_ANIMATION_PATH: &str = "/generate-gif";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAnimationRequest {
    pub prompt: Prompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateAnimationResponse {
    #[serde(alias = "generated_html")]
    pub generated_markup: GenerationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportAnimationRequest {
    pub markup: GenerationResult,
}
