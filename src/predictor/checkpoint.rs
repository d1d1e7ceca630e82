//! Model weight persistence
//!
//! Opaque safetensors blob keyed by a file path, written through
//! [`VarMap::save`](candle_nn::VarMap::save) to a temp file first and then
//! renamed over the target. Loading requires every variable to be present
//! with a matching shape.

use std::path::Path;

use super::rnn::Rnn;
use crate::error::CheckpointError;

pub fn save(path: &Path, rnn: &Rnn) -> Result<(), CheckpointError> {
    let tmp = path.with_extension("tmp");
    rnn.vars().save(&tmp)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Copies stored weights into `rnn`. On error the weights may be partly
/// overwritten, so callers should rebuild the network.
pub fn load(path: &Path, rnn: &mut Rnn) -> Result<(), CheckpointError> {
    rnn.vars_mut().load(path)?;
    Ok(())
}
