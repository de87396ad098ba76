use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;

/// Deserializes the body as JSON when the request says so, otherwise as an
/// urlencoded form. Lets the same endpoint serve `fetch` calls and plain
/// HTML form posts.
pub(crate) struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RejectionType;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rejection| (rejection.status(), rejection.body_text()))?;
            Ok(JsonOrForm(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| (rejection.status(), rejection.body_text()))?;
            Ok(JsonOrForm(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        message: String,
    }

    fn request(content_type: &str, body: &'static str) -> Request {
        HttpRequest::post("/send")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body_is_accepted() {
        let JsonOrForm(payload) =
            JsonOrForm::<Payload>::from_request(request("application/json", r#"{"message":"hi"}"#), &())
                .await
                .unwrap();
        assert_eq!(payload.message, "hi");
    }

    #[tokio::test]
    async fn test_urlencoded_body_is_accepted() {
        let JsonOrForm(payload) = JsonOrForm::<Payload>::from_request(
            request("application/x-www-form-urlencoded", "message=hello+there%21"),
            &(),
        )
        .await
        .unwrap();
        assert_eq!(payload.message, "hello there!");
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let (status, _) =
            JsonOrForm::<Payload>::from_request(request("application/json", "{}"), &())
                .await
                .err()
                .unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_rejected() {
        let (status, _) = JsonOrForm::<Payload>::from_request(request("text/plain", "message"), &())
            .await
            .err()
            .unwrap();
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
