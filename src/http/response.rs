//! Error responses for intercepted requests.
//!
//! - Path resolution failures are the client's fault: 400
//! - Build failures carry their own status (404 / 500 / 504)
//! - Bodies are plain text; compiler output is included so theme authors see it

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::build::BuildError;
use crate::routing::PathResolutionError;

impl IntoResponse for BuildError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

impl IntoResponse for PathResolutionError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_error_statuses() {
        let not_found = BuildError::SourceNotFound {
            stem: "/theme/assets/app".into(),
            tried: vec!["scss".into(), "sass".into()],
        };
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let timeout = BuildError::Timeout {
            output: "/theme/app.css".into(),
            after: Duration::from_secs(1),
        };
        assert_eq!(timeout.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let compiler = BuildError::Compiler {
            program: "sass".into(),
            status: Some(65),
            stderr: "Error: expected \"}\"".into(),
        };
        assert_eq!(compiler.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_path_errors_are_bad_request() {
        let err = PathResolutionError::Traversal {
            url: "/theme/assets/../x.css".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
