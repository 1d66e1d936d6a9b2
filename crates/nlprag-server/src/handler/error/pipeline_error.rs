//! Pipeline error to HTTP error conversion.

use nlprag_core::ErrorKind as PipelineErrorKind;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for pipeline error conversions.
const TRACING_TARGET: &str = "nlprag_server::handler::pipeline";

impl From<nlprag_core::Error> for HttpError {
    fn from(error: nlprag_core::Error) -> Self {
        let context = error
            .message
            .clone()
            .unwrap_or_else(|| error.kind_str().to_owned());

        match error.kind {
            PipelineErrorKind::InvalidInput => {
                tracing::debug!(target: TRACING_TARGET, error = %error, "Rejected request");
                ErrorKind::BadRequest.with_context(context)
            }
            PipelineErrorKind::NotFound => ErrorKind::NotFound.with_context(context),
            PipelineErrorKind::UpstreamService | PipelineErrorKind::DataShape => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    status = ?error.status,
                    "Upstream service failed"
                );
                ErrorKind::BadGateway.with_context(context)
            }
            PipelineErrorKind::Timeout => {
                tracing::warn!(target: TRACING_TARGET, error = %error, "Upstream call timed out");
                ErrorKind::GatewayTimeout.with_context(context)
            }
            _ => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = error.kind_str(),
                    "Pipeline failed"
                );
                ErrorKind::InternalServerError.with_context(context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn pipeline_errors_map_to_statuses() {
        let cases = [
            (nlprag_core::Error::invalid_input(), StatusCode::BAD_REQUEST),
            (nlprag_core::Error::not_found(), StatusCode::NOT_FOUND),
            (nlprag_core::Error::upstream(), StatusCode::BAD_GATEWAY),
            (nlprag_core::Error::data_shape(), StatusCode::BAD_GATEWAY),
            (nlprag_core::Error::timeout(), StatusCode::GATEWAY_TIMEOUT),
            (nlprag_core::Error::resource_init(), StatusCode::INTERNAL_SERVER_ERROR),
            (nlprag_core::Error::internal(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(HttpError::from(error).status_code(), status);
        }
    }

    #[test]
    fn message_becomes_context() {
        let error = HttpError::from(
            nlprag_core::Error::invalid_input().with_message("request text is empty"),
        );
        assert_eq!(error.context(), Some("request text is empty"));
    }
}
