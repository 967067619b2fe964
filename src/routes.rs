// src/routes.rs

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, auth, image, ingredient, interaction, profile, recipe, taxonomy},
    models::{
        image::EntityKind,
        taxonomy::{CATEGORIES, TAGS, Taxonomy},
    },
    state::AppState,
    utils::{
        jwt::{auth_middleware, optional_auth_middleware},
        site_visit::record_visit,
    },
};

/// Room for multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Category or tag CRUD, nested under `/category` or `/tag`.
fn taxonomy_routes(state: &AppState, kind: Taxonomy) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(taxonomy::list))
        .route("/{id}", get(taxonomy::get))
        .route("/{id}/recipes", get(taxonomy::list_recipes));

    let protected = Router::new()
        .route("/", post(taxonomy::create))
        .route("/{id}", axum::routing::put(taxonomy::rename).delete(taxonomy::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected).layer(Extension(kind))
}

/// Upload, serve and delete for one entity kind.
fn image_routes(state: &AppState, kind: EntityKind) -> Router<AppState> {
    let prefix = format!("/{}/{{id}}/image", kind.as_str());
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    let public = Router::new().route(&format!("{prefix}/{{image_id}}"), get(image::serve_image));

    let protected = Router::new()
        .route(
            &prefix,
            post(image::upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(&format!("{prefix}/{{image_id}}"), delete(image::delete_image))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected).layer(Extension(kind))
}

/// Attach/detach a category or tag on a recipe.
fn label_link_routes(state: &AppState, kind: Taxonomy) -> Router<AppState> {
    let path = format!("/recipe/{{id}}/{}/{{item_id}}", kind.label);
    Router::new()
        .route(&path, post(taxonomy::attach).delete(taxonomy::detach))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(Extension(kind))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public and protected routes per resource; protected ones carry the
///   strict auth gate.
/// * Every request passes the permissive auth gate first, then the visit
///   recorder, so visits know who made them.
/// * Trace and CORS wrap everything.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password));

    let public_routes = Router::new()
        .route("/recipe/list", get(recipe::list_recipes))
        .route("/recipe/{id}", get(recipe::get_recipe))
        .route("/recipe/{id}/ingridients", get(recipe::list_ingredients))
        .route("/recipe/{id}/comments", get(recipe::list_comments))
        .route("/recipes/top-rated", get(analytics::top_rated))
        .route("/recipes/popular", get(analytics::most_popular));

    let protected_routes = Router::new()
        .route("/recipe", post(recipe::create_recipe))
        .route(
            "/recipe/{id}",
            axum::routing::put(recipe::update_recipe).delete(recipe::delete_recipe),
        )
        .route("/comment", post(interaction::create_comment))
        .route("/comment/{id}", delete(interaction::delete_comment))
        .route("/rating", post(interaction::create_rating))
        .route("/rating/{id}", delete(interaction::delete_rating))
        .route("/favorite", post(interaction::create_favorite))
        .route("/favorite/{id}", delete(interaction::delete_favorite))
        .route("/ingridient", post(ingredient::create_ingredient))
        .route("/ingridient/{id}", delete(ingredient::delete_ingredient))
        .route("/user/{id}", get(profile::get_user))
        .route("/user/{id}/recipes", get(profile::list_user_recipes))
        .route("/user/{id}/favorites", get(profile::list_user_favorites))
        .route("/user/{id}/ratings", get(profile::list_user_ratings))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .merge(image_routes(&state, EntityKind::Recipe))
        .merge(image_routes(&state, EntityKind::User))
        .merge(label_link_routes(&state, CATEGORIES))
        .merge(label_link_routes(&state, TAGS))
        .nest("/category", taxonomy_routes(&state, CATEGORIES))
        .nest("/tag", taxonomy_routes(&state, TAGS))
        // Global Middleware (applied from outside in)
        .layer(middleware::from_fn_with_state(state.clone(), record_visit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state))
        .with_state(state)
}
