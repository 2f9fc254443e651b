pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBERS_ADDED: &str = "MEMBERS_ADDED";
pub const EXPENSE_RECORDED: &str = "EXPENSE_RECORDED";
pub const RECALCULATION_REQUESTED: &str = "RECALCULATION_REQUESTED";
pub const RECALCULATION_PUBLISH_FAILED: &str = "RECALCULATION_PUBLISH_FAILED";
pub const BALANCES_RECALCULATED: &str = "BALANCES_RECALCULATED";
pub const MESSAGE_DEAD_LETTERED: &str = "MESSAGE_DEAD_LETTERED";

/// Tracing target for recalculation triggers that could not be enqueued.
pub const PUBLISH_FAILURE_TARGET: &str = "splitledger::publish_failure";

pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 100;
