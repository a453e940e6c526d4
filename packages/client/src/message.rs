//! Buffered request and response types passed through handler chains

use bytes::Bytes;
use http::{Request, Response, StatusCode};

/// Request with a fully buffered body
pub type HttpRequest = Request<Bytes>;

/// Response with a fully buffered body
pub type HttpResponse = Response<Bytes>;

/// Copy a buffered request so it can be sent more than once.
///
/// Extensions are not carried over.
#[must_use]
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

/// Build an empty-bodied response with `status`.
#[must_use]
pub fn status_response(status: StatusCode) -> HttpResponse {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;
    response
}
