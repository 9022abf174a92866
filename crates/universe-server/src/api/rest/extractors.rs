//! Custom extractors
//!
//! Provides request extractors whose rejections use the error envelope.

use super::types::{BotOptions, QuestionInput};
use crate::error::ServerError;
use axum::{
    extract::{multipart::Multipart, rejection::JsonRejection, FromRequest, Request},
    Json,
};
use universe_llm::{BotRequest, QuestionAnswer};

/// Custom JSON extractor with better error messages
pub struct JsonExtractor<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonExtractor<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => {
                let error_message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid JSON data: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(err) => {
                        format!("JSON syntax error: {}", err.body_text())
                    }
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing 'Content-Type: application/json' header".to_string()
                    }
                    _ => format!("Failed to parse JSON: {}", rejection.body_text()),
                };
                Err(ServerError::Validation(error_message))
            }
        }
    }
}

/// Fields of a `generate-bot` multipart form
#[derive(Debug, Default)]
pub struct BotForm {
    pub request: BotRequest,
    pub options: BotOptions,
    /// Client-chosen session id, so progress can be polled before the
    /// response arrives
    pub session_id: Option<String>,
}

/// Longest accepted client session id
const MAX_SESSION_ID_LEN: usize = 128;

fn invalid(field: &str, err: impl std::fmt::Display) -> ServerError {
    ServerError::Validation(format!("Invalid '{}' field: {}", field, err))
}

impl BotForm {
    /// Read every field of the form. `trainingFile` must be UTF-8 text; its
    /// content is appended to `trainingText`.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ServerError> {
        let mut form = BotForm::default();
        let mut training_file: Option<String> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::Validation(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "trainingFile" => {
                    let bytes = field.bytes().await.map_err(|e| invalid(&name, e))?;
                    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                        ServerError::Validation(
                            "trainingFile must be a UTF-8 text document".to_string(),
                        )
                    })?;
                    training_file = Some(text);
                }
                "prompt" | "questions" | "trainingText" | "trainingLink" | "options"
                | "sessionId" => {
                    let text = field.text().await.map_err(|e| invalid(&name, e))?;
                    form.apply_text_field(&name, text)?;
                }
                other => {
                    tracing::debug!(field = other, "ignoring unknown form field");
                }
            }
        }

        if let Some(file) = training_file.filter(|f| !f.trim().is_empty()) {
            form.request.training_text = Some(match form.request.training_text.take() {
                Some(text) => format!("{}\n\n{}", text, file),
                None => file,
            });
        }
        Ok(form)
    }

    fn apply_text_field(&mut self, name: &str, text: String) -> Result<(), ServerError> {
        let present = !text.trim().is_empty();
        match name {
            "prompt" => self.request.prompt = text,
            "questions" if present => {
                let questions: Vec<QuestionInput> =
                    serde_json::from_str(&text).map_err(|e| invalid(name, e))?;
                self.request.questions =
                    Some(questions.into_iter().map(QuestionAnswer::from).collect());
            }
            "trainingText" if present => self.request.training_text = Some(text),
            "trainingLink" if present => self.request.training_link = Some(text.trim().to_string()),
            "options" if present => {
                self.options = serde_json::from_str(&text).map_err(|e| invalid(name, e))?;
            }
            "sessionId" if present => {
                let id = text.trim();
                let well_formed = id.len() <= MAX_SESSION_ID_LEN
                    && id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
                if !well_formed {
                    return Err(invalid(
                        name,
                        "use at most 128 letters, digits, '-' or '_'",
                    ));
                }
                self.session_id = Some(id.to_string());
            }
            _ => {}
        }
        Ok(())
    }
}
