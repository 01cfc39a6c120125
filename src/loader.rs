//! External script loading seam

use crate::error::DialogResult;
use crate::runner::DialogRunner;

/// Translates script source into the nodes of a conversation
///
/// The engine does not parse scripts. When a source string is run as a
/// function, the loader gets the source and a target conversation name
/// and is expected to create that conversation's nodes on the runner,
/// entry node included, before returning.
pub trait ScriptLoader {
    /// Populate `conversation` on the runner from `source`
    fn load(
        &self,
        source: &str,
        conversation: &str,
        runner: &mut DialogRunner,
    ) -> DialogResult<()>;
}
