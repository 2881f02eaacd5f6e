use axum::Router;
use axum::routing::{get, post, put};

use crate::server::{handlers, state::AppState};

/// Build the route tree.
///
/// ```text
/// POST   /artworks                              create_artwork
/// GET    /artworks/{id}                         get_artwork
/// GET    /artworks/{id}/mockups                 list_mockups
/// POST   /artworks/{id}/approve                 approve
/// POST   /artworks/{id}/decline                 decline
/// POST   /artworks/{id}/retry                   retry
/// POST   /artworks/approve-batch                approve_batch
///
/// GET    /mockups/{id}/image                    image
/// PUT    /mockups/{id}/channels/{channel}       set_channel
/// POST   /mockups/{id}/storefront-primary       set_storefront_primary
///
/// GET    /templates                             list_templates
/// POST   /templates                             create_template
/// GET    /templates/{id}                        get_template
/// PUT    /templates/{id}                        update_template
/// DELETE /templates/{id}                        delete_template
/// PUT    /templates/{id}/activation             set_activation
///
/// GET    /packs                                 list_packs
/// POST   /packs                                 create_pack
/// GET    /packs/{id}                            get_pack
/// PATCH  /packs/{id}                            update_pack
/// DELETE /packs/{id}                            delete_pack
/// POST   /packs/{id}/reapply                    reapply_pack
/// GET    /presets                               list_presets
///
/// GET    /jobs                                  list
/// POST   /jobs/reapply                          reapply
/// POST   /jobs/apply-missing                    apply_missing
/// GET    /jobs/{kind}                           snapshot
/// ```
pub fn router(state: AppState) -> Router {
    let artworks = Router::new()
        .route("/", post(handlers::artworks::create_artwork))
        .route("/approve-batch", post(handlers::artworks::approve_batch))
        .route("/{id}", get(handlers::artworks::get_artwork))
        .route("/{id}/mockups", get(handlers::artworks::list_mockups))
        .route("/{id}/approve", post(handlers::artworks::approve))
        .route("/{id}/decline", post(handlers::artworks::decline))
        .route("/{id}/retry", post(handlers::artworks::retry));

    let mockups = Router::new()
        .route("/{id}/image", get(handlers::mockups::image))
        .route("/{id}/channels/{channel}", put(handlers::mockups::set_channel))
        .route(
            "/{id}/storefront-primary",
            post(handlers::mockups::set_storefront_primary),
        );

    let templates = Router::new()
        .route(
            "/",
            get(handlers::registry::list_templates).post(handlers::registry::create_template),
        )
        .route(
            "/{id}",
            get(handlers::registry::get_template)
                .put(handlers::registry::update_template)
                .delete(handlers::registry::delete_template),
        )
        .route("/{id}/activation", put(handlers::registry::set_activation));

    let packs = Router::new()
        .route(
            "/",
            get(handlers::registry::list_packs).post(handlers::registry::create_pack),
        )
        .route(
            "/{id}",
            get(handlers::registry::get_pack)
                .patch(handlers::registry::update_pack)
                .delete(handlers::registry::delete_pack),
        )
        .route("/{id}/reapply", post(handlers::jobs::reapply_pack));

    let jobs = Router::new()
        .route("/", get(handlers::jobs::list))
        .route("/reapply", post(handlers::jobs::reapply))
        .route("/apply-missing", post(handlers::jobs::apply_missing))
        .route("/{kind}", get(handlers::jobs::snapshot));

    Router::new()
        .nest("/artworks", artworks)
        .nest("/mockups", mockups)
        .nest("/templates", templates)
        .nest("/packs", packs)
        .nest("/jobs", jobs)
        .route("/presets", get(handlers::registry::list_presets))
        .with_state(state)
}
