use rocket::{Catcher, Request, catch, catchers, http::Status};
use tracing::warn;

// rocket rejections (bad multipart body, payload over the limit, ...) as plain text
#[catch(default)]
pub fn plain_text(status: Status, req: &Request<'_>) -> (Status, String) {
    warn!(%status, uri = %req.uri(), "request rejected");
    let reason = status.reason().unwrap_or("request failed");
    (status, reason.to_string())
}

pub fn catchers() -> Vec<Catcher> {
    catchers![plain_text]
}
