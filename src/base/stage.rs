/// The current stage of one endpoint validation.
/// Failure at any network or trust stage jumps straight to `CacheWriting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationStage {
    /// Nothing has happened yet.
    #[default]
    Idle,

    /// Looking up a previously recorded verdict.
    CacheCheck,

    /// Opening a trust-all connection to observe the peer chain.
    Retrieving,

    /// Building the verifier from the supplied anchors.
    AnchorBuilding,

    /// Running path validation against the custom anchors.
    ChainValidating,

    /// Asking the CT oracle about the validated chain.
    CtChecking,

    /// Recording the verdict for the endpoint.
    CacheWriting,

    /// The callback has been handed off.
    Done,
}

impl ValidationStage {
    /// Stage that follows a successful `self`.
    pub fn next(self) -> Self {
        match self {
            ValidationStage::Idle => ValidationStage::CacheCheck,
            ValidationStage::CacheCheck => ValidationStage::Retrieving,
            ValidationStage::Retrieving => ValidationStage::AnchorBuilding,
            ValidationStage::AnchorBuilding => ValidationStage::ChainValidating,
            ValidationStage::ChainValidating => ValidationStage::CtChecking,
            ValidationStage::CtChecking => ValidationStage::CacheWriting,
            ValidationStage::CacheWriting | ValidationStage::Done => ValidationStage::Done,
        }
    }

    /// Whether the stage may block on network or CPU-heavy work.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            ValidationStage::Retrieving
                | ValidationStage::AnchorBuilding
                | ValidationStage::ChainValidating
                | ValidationStage::CtChecking
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStage::Idle => "idle",
            ValidationStage::CacheCheck => "cache_check",
            ValidationStage::Retrieving => "retrieving",
            ValidationStage::AnchorBuilding => "anchor_building",
            ValidationStage::ChainValidating => "chain_validating",
            ValidationStage::CtChecking => "ct_checking",
            ValidationStage::CacheWriting => "cache_writing",
            ValidationStage::Done => "done",
        }
    }
}
