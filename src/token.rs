use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Identifies one in-flight request issued by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// Last-issued-wins sequencing plus a mounted flag for one view.
///
/// A response may only touch view state while its token is still the
/// newest one issued and the view has not been torn down. Check under the
/// same lock that guards the state being written.
#[derive(Debug)]
pub struct RequestTokens {
    latest: AtomicU64,
    mounted: AtomicBool,
}

impl Default for RequestTokens {
    fn default() -> Self {
        Self {
            latest: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }
}

impl RequestTokens {
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.is_mounted() && self.latest.load(Ordering::SeqCst) == token.0
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn teardown(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}
