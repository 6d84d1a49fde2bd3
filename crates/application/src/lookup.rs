use domain::{ActionTranslator, DomainError, Entity, Mapper, Repository, Result};
use store::RowStore;

type EntityOf<M> = <M as Mapper>::Entity;
type IdOf<M> = <EntityOf<M> as Entity>::Id;

/// Fails with not-found on the first referenced id that has no row.
pub(crate) async fn require_all<S, M>(
    repository: &Repository<S, M>,
    ids: Vec<IdOf<M>>,
) -> Result<()>
where
    S: RowStore,
    M: ActionTranslator,
{
    for id in ids {
        if !repository.exists(id).await? {
            return Err(DomainError::not_found(<EntityOf<M> as Entity>::entity_type(), id));
        }
    }
    Ok(())
}
