use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ApiError, FieldErrors};

/// JSON extractor whose rejection speaks the same field→message contract as
/// every other validation failure, instead of axum's plain-text 422.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    let message = rejection.body_text();
    if let Some(field) = missing_field_name(&message) {
        return ApiError::validation(field, "This field is required.");
    }
    ApiError::Validation(FieldErrors::single("non_field_errors", &message))
}

/// serde reports an absent required field as "missing field `name`".
fn missing_field_name(message: &str) -> Option<&str> {
    let (_, rest) = message.split_once("missing field `")?;
    let (field, _) = rest.split_once('`')?;
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        email: String,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_field_surfaces_as_a_field_error() {
        let err = Json::<Payload>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(
                    errors.0.get("email").map(String::as_str),
                    Some("This field is required.")
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_json_maps_to_non_field_error() {
        let err = Json::<Payload>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert!(errors.0.contains_key("non_field_errors"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_field_name_parses_serde_messages() {
        let msg = "Failed to deserialize the JSON body into the target type: \
                   missing field `current_password` at line 1 column 2";
        assert_eq!(missing_field_name(msg), Some("current_password"));
        assert_eq!(missing_field_name("expected value at line 1"), None);
    }
}
