pub(crate) mod json_or_form;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
