//! Read-only GraphQL view of the movie catalog.
//!
//! - POST `/graph` - Execute a query. The body is either the raw query text or,
//!   with `Content-Type: application/json`, a standard GraphQL request object.
//!
//! Root fields: `list`, `search(title_contains)`, `get(id)`.

use async_graphql::{Context, EmptyMutation, EmptySubscription, Object, Schema, SimpleObject};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::post,
};
use tracing::error;

use super::error::ApiError;
use crate::db::{Database, Movie};

pub type CatalogSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

#[derive(Clone)]
pub struct GraphState {
    pub schema: CatalogSchema,
}

pub fn schema(db: Database) -> CatalogSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(db)
        .finish()
}

pub fn router(state: GraphState) -> Router {
    Router::new()
        .route("/graph", post(execute))
        .with_state(state)
}

#[derive(SimpleObject)]
#[graphql(name = "Movie", rename_fields = "snake_case")]
pub struct MovieNode {
    id: i64,
    title: String,
    description: String,
    release_date: String,
    runtime: i64,
    mpaa_rating: String,
    image: String,
    created_at: String,
    updated_at: String,
}

impl From<Movie> for MovieNode {
    fn from(m: Movie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            release_date: m.release_date,
            runtime: m.runtime,
            mpaa_rating: m.mpaa_rating,
            image: m.image,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub struct QueryRoot;

async fn all_movies(ctx: &Context<'_>) -> async_graphql::Result<Vec<Movie>> {
    ctx.data::<Database>()?
        .movies()
        .all(None)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list movies");
            async_graphql::Error::new("database error")
        })
}

#[Object(rename_fields = "snake_case", rename_args = "snake_case")]
impl QueryRoot {
    /// List of movies
    async fn list(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<MovieNode>> {
        Ok(all_movies(ctx).await?.into_iter().map(Into::into).collect())
    }

    /// Movies whose title contains the given text, ignoring case
    async fn search(
        &self,
        ctx: &Context<'_>,
        title_contains: Option<String>,
    ) -> async_graphql::Result<Vec<MovieNode>> {
        let Some(needle) = title_contains.map(|s| s.to_lowercase()) else {
            return Ok(Vec::new());
        };
        Ok(all_movies(ctx)
            .await?
            .into_iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .map(Into::into)
            .collect())
    }

    /// Movie by id
    async fn get(
        &self,
        ctx: &Context<'_>,
        id: Option<i64>,
    ) -> async_graphql::Result<Option<MovieNode>> {
        let Some(id) = id else {
            return Ok(None);
        };
        Ok(all_movies(ctx)
            .await?
            .into_iter()
            .find(|m| m.id == id)
            .map(Into::into))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

async fn execute(
    State(state): State<GraphState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<async_graphql::Response>, ApiError> {
    let request = if is_json(&headers) {
        serde_json::from_str::<async_graphql::Request>(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid graphql request: {}", e)))?
    } else {
        async_graphql::Request::new(body)
    };

    let response = state.schema.execute(request).await;
    if let Some(err) = response.errors.first() {
        return Err(ApiError::bad_request(err.message.clone()));
    }
    Ok(Json(response))
}
