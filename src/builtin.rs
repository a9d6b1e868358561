//! The standard operator library.
//!
//! Row-streaming operators live under the `rows` namespace, single-shot
//! scalar functions under `str` and `math`. Hosts that want them call
//! [`install`] against their registry builder (or use
//! [`Registry::with_builtins`](crate::registry::Registry::with_builtins))
//! before evaluating queries; nothing is registered implicitly.

pub mod rows;
pub mod scalar;

use crate::error::EvalError;
use crate::registry::RegistryBuilder;

/// Registers the whole standard library.
pub fn install(builder: &mut RegistryBuilder) -> Result<(), EvalError> {
    rows::install(builder)?;
    scalar::install(builder)?;
    Ok(())
}
