use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use claiss_core::AppError;
use claiss_processing::{extract_scene_code, scene_class_name, SceneCode};
use serde::Deserialize;
use std::sync::Arc;

/// Either raw scene source, or free text with a fenced code block in it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl CompileRequest {
    fn into_scene_code(self) -> Result<SceneCode, AppError> {
        let non_blank = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

        if let Some(code) = non_blank(self.code) {
            let class_name = non_blank(self.class_name)
                .unwrap_or_else(|| scene_class_name(&code).to_string());
            return Ok(SceneCode { code, class_name });
        }

        match non_blank(self.text) {
            Some(text) => extract_scene_code(&text).ok_or_else(|| {
                AppError::InvalidInput("No renderable scene code found in text".to_string())
            }),
            None => Err(AppError::InvalidInput(
                "Either code or text is required".to_string(),
            )),
        }
    }
}

/// Compile one scene and report a [`claiss_core::CompilationResult`].
///
/// The body is 200 on success and 500 otherwise; either way it carries the
/// compute tier that ran and any renderer logs.
pub async fn compile_scene(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CompileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scene = request.into_scene_code()?;

    let result = state.compilation.compile(&scene.code, &scene.class_name).await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(result)))
}
