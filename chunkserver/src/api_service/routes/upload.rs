use crate::api_service::controller::upload;
use rocket::{Route, routes};

pub fn routes() -> Vec<Route> {
    routes![
        upload::upload_chunk,
        upload::reject_get,
        upload::reject_put,
        upload::reject_patch,
        upload::reject_delete,
    ]
}
