use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /send`, accepted as JSON or as an urlencoded form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendParams {
    /// The message text to publish.
    #[schema(example = "order-42")]
    pub message: String,
}

impl SendParams {
    /// A message must carry at least one non-whitespace character.
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.message.trim().is_empty() {
            Err("message must not be empty")
        } else {
            Ok(())
        }
    }
}
