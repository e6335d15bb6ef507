#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Result of a PATCH-style update whose response echoes the stored values.
///
/// `failed` lists the wire keys whose echoed value differs from what was sent.
pub struct UpdateOutcome {
    pub failed: Vec<String>,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Per-network result of a multi-network social operation.
pub struct SocialOutcome {
    pub failed: Vec<&'static str>,
}

impl SocialOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
