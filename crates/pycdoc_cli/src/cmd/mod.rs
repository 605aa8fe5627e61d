/// Annotated chunk tree command.
pub mod chunks;
/// Header and object statistics command.
pub mod info;
/// Shared input loading and output helpers.
pub(crate) mod util;
