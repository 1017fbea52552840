use std::sync::{
    atomic::{AtomicI32, Ordering},
    OnceLock,
};

use flatmeta_core::{cancel::CancelToken, MetaError, Result};
use nix::{
    libc,
    sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal},
};

const HANDLED: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

static TOKEN: OnceLock<CancelToken> = OnceLock::new();
static CAUGHT: AtomicI32 = AtomicI32::new(0);

extern "C" fn on_signal(signum: libc::c_int) {
    CAUGHT.store(signum, Ordering::SeqCst);
    if let Some(token) = TOKEN.get() {
        token.cancel();
    }
}

/// Cancels `token` on SIGINT, SIGTERM and SIGHUP.
///
/// The handler only stores the signal number and sets the token; the run
/// notices at its next cancellation check.
pub fn install(token: CancelToken) -> Result<()> {
    if TOKEN.set(token).is_err() {
        return Err(MetaError::Custom(
            "Signal handlers are already installed".to_string(),
        ));
    }

    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in HANDLED {
        // SAFETY: `on_signal` only performs atomic loads and stores.
        unsafe { sigaction(signal, &action) }.map_err(|errno| {
            MetaError::Custom(format!("Failed to install {signal} handler: {errno}"))
        })?;
    }

    Ok(())
}

/// The last signal received, if any.
pub fn caught() -> Option<Signal> {
    match CAUGHT.load(Ordering::SeqCst) {
        0 => None,
        signum => Signal::try_from(signum).ok(),
    }
}

#[cfg(test)]
mod tests {
    use nix::sys::signal::raise;

    use super::*;

    #[test]
    fn test_signal_cancels_token() {
        let token = CancelToken::new();
        install(token.clone()).unwrap();
        assert_eq!(caught(), None);

        raise(Signal::SIGTERM).unwrap();

        assert!(token.is_cancelled());
        assert_eq!(caught(), Some(Signal::SIGTERM));
        assert!(install(CancelToken::new()).is_err());
    }
}
