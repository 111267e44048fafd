use thiserror::Error;

use super::{ComponentId, ComponentKind, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("no component of kind `{0}` has ever been registered")]
    UnknownKind(ComponentKind),
    #[error("component {id} of kind `{kind}` not found")]
    ComponentNotFound { kind: ComponentKind, id: ComponentId },
    #[error("component {id} is not attached to entity {entity}")]
    NotAttached { entity: EntityId, id: ComponentId },
    #[error("component {id} is a `{actual}`, not a `{expected}`")]
    KindMismatch {
        id: ComponentId,
        expected: ComponentKind,
        actual: ComponentKind,
    },
    #[error("component index corrupted: {0}")]
    IndexCorrupted(String),
}

pub type EcsResult<T> = Result<T, EcsError>;
