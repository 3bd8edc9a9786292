//! Conversion port between stored entities and their external representation.

use crate::entity::Entity;
use crate::error::Result;

/// Converts between an entity and its API-facing representation.
///
/// Services never inspect representation fields; they only hand whole
/// values to the mapper. Conversions are fallible so that a broken mapping
/// surfaces as an error instead of a panic.
pub trait Mapper<E: Entity, R>: Send + Sync {
    /// Entity to representation.
    fn to_representation(&self, entity: &E) -> Result<R>;

    /// Representation to a fresh entity.
    fn to_entity(&self, representation: &R) -> Result<E>;

    /// Copy the fields set in `representation` onto `entity`.
    ///
    /// Fields the representation leaves unset keep their current value.
    fn merge_into(&self, representation: &R, entity: &mut E) -> Result<()>;

    /// Convert a list, preserving order.
    fn to_representations(&self, entities: &[E]) -> Result<Vec<R>> {
        entities.iter().map(|e| self.to_representation(e)).collect()
    }
}
