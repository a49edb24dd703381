//! Inventory routes, mounted under `/api/inventory`.

use crate::handlers::inventory::{
    create_item, create_part, create_rentable, delete_item, delete_part, delete_rentable, list_items, list_rentables,
    list_variants, read_availability, read_item, read_part, read_rentable, read_variant, update_availability,
    update_item, update_part, update_rentable, update_variant,
};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn inventory_routes(state: AppState) -> Router {
    Router::new()
        .route("/rentable", get(list_rentables).post(create_rentable))
        .route(
            "/rentable/:id",
            get(read_rentable).patch(update_rentable).delete(delete_rentable),
        )
        .route("/part", post(create_part))
        .route("/part/:id", get(read_part).patch(update_part).delete(delete_part))
        .route("/availability/:id", get(read_availability).patch(update_availability))
        .route("/variant", get(list_variants))
        .route("/variant/:id", get(read_variant).patch(update_variant))
        .route("/item", get(list_items).post(create_item))
        .route("/item/:id", get(read_item).patch(update_item).delete(delete_item))
        .with_state(state)
}
