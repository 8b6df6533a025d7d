//! Linking prototype assignments back to their constructor functions.

use tracing::trace;

use super::FunctionDeclaration;
use crate::scan::classify;

/// Mark every function whose name is the receiver of a prototype
/// assignment in `functions`.
///
/// For `Foo.prototype.bar = function() {...}` the first non-assignment
/// function named `Foo` gets `has_prototype` set. Assignments whose receiver
/// is not declared among `functions` change nothing.
pub fn link_prototypes(functions: &mut [FunctionDeclaration]) {
    let receivers: Vec<String> = functions
        .iter()
        .filter(|f| f.is_prototype_assignment)
        .filter_map(|f| classify::prototype_receiver(&f.header.declaration))
        .map(str::to_string)
        .collect();

    for receiver in &receivers {
        let origin = functions
            .iter_mut()
            .find(|f| !f.is_prototype_assignment && f.name() == Some(receiver.as_str()));

        if let Some(origin) = origin {
            trace!(receiver = %receiver, "linked prototype");
            origin.has_prototype = true;
        }
    }
}
