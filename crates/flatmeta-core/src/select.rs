use tracing::trace;

use crate::{options::Options, refs::RemoteRef};

/// The only architecture reported.
pub const SUPPORTED_ARCH: &str = "x86_64";

/// Keeps the refs a run reports on, in listing order.
pub fn select_refs(refs: Vec<RemoteRef>, options: &Options) -> Vec<RemoteRef> {
    refs.into_iter()
        .filter(|r| {
            let keep = is_selected(r, options);
            if !keep {
                trace!("Skipping {}", r.format_ref());
            }
            keep
        })
        .collect()
}

fn is_selected(r: &RemoteRef, options: &Options) -> bool {
    if !options.refs.is_empty() && !options.refs.contains(&r.format_ref()) {
        return false;
    }
    if r.arch != SUPPORTED_ARCH {
        return false;
    }
    if r.is_eol() {
        return false;
    }
    options.get_built_extensions || !r.is_built_extension()
}
