//! Genre and category endpoints, shared through [`DictionaryRoute`].

use std::sync::Arc;

use application::{Catalog, DictionaryName, DictionaryService};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{ActionTranslator, CategoryMapper, Dictionary, Entity, GenreMapper, Mapper};
use serde::de::DeserializeOwned;
use store::RowStore;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::RequestCaller;

type EntryOf<M> = <M as Mapper>::Entity;
type IdOf<M> = <EntryOf<M> as Entity>::Id;

/// Selects the catalogue service backing one dictionary.
pub trait DictionaryRoute<S: RowStore>: ActionTranslator + Sized {
    fn service(catalog: &Catalog<S>) -> &DictionaryService<S, Self>;
}

impl<S: RowStore> DictionaryRoute<S> for GenreMapper {
    fn service(catalog: &Catalog<S>) -> &DictionaryService<S, Self> {
        &catalog.genres
    }
}

impl<S: RowStore> DictionaryRoute<S> for CategoryMapper {
    fn service(catalog: &Catalog<S>) -> &DictionaryService<S, Self> {
        &catalog.categories
    }
}

/// POST /genres, POST /categories
#[tracing::instrument(skip(state), fields(dictionary = M::TABLE))]
pub async fn create<S, M>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Json(req): Json<DictionaryName>,
) -> Result<(StatusCode, Json<EntryOf<M>>), ApiError>
where
    S: RowStore + Clone + 'static,
    M: DictionaryRoute<S>,
    EntryOf<M>: Dictionary,
{
    let entry = M::service(&state.catalog).create(&caller, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /genres, GET /categories
#[tracing::instrument(skip(state), fields(dictionary = M::TABLE))]
pub async fn list<S, M>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
) -> Result<Json<Vec<EntryOf<M>>>, ApiError>
where
    S: RowStore + Clone + 'static,
    M: DictionaryRoute<S>,
    EntryOf<M>: Dictionary,
{
    let entries = M::service(&state.catalog).find_all(&caller).await?;
    Ok(Json(entries))
}

/// GET /genres/:id, GET /categories/:id
#[tracing::instrument(skip(state), fields(dictionary = M::TABLE))]
pub async fn get<S, M>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<IdOf<M>>,
) -> Result<Json<EntryOf<M>>, ApiError>
where
    S: RowStore + Clone + 'static,
    M: DictionaryRoute<S>,
    EntryOf<M>: Dictionary,
    IdOf<M>: DeserializeOwned,
{
    let entry = M::service(&state.catalog).find_by_id(&caller, id).await?;
    Ok(Json(entry))
}

/// PATCH /genres/:id, PATCH /categories/:id
#[tracing::instrument(skip(state), fields(dictionary = M::TABLE))]
pub async fn rename<S, M>(
    State(state): State<Arc<AppState<S>>>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<IdOf<M>>,
    Json(req): Json<DictionaryName>,
) -> Result<Json<EntryOf<M>>, ApiError>
where
    S: RowStore + Clone + 'static,
    M: DictionaryRoute<S>,
    EntryOf<M>: Dictionary,
    IdOf<M>: DeserializeOwned,
{
    let entry = M::service(&state.catalog).rename(&caller, id, req).await?;
    Ok(Json(entry))
}
