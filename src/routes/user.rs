//! User routes, mounted under `/api/user`.

use crate::handlers::user::{create_user, delete_user, list_users, read_user, replace_user, update_user};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(read_user).put(replace_user).patch(update_user).delete(delete_user),
        )
        .with_state(state)
}
