//! Metric name and label definitions.

/// Inbound event dispatch
pub mod dispatch {
    /// Inbound events seen, labelled by the route they took
    pub const EVENTS_TOTAL: &str = "cibot_dispatch_events_total";
    /// Handler failures (errors and panics) caught at the dispatch boundary
    pub const HANDLER_ERRORS_TOTAL: &str = "cibot_dispatch_handler_errors_total";
    /// Time spent dispatching one event, in seconds
    pub const DURATION_SECONDS: &str = "cibot_dispatch_duration_seconds";
}

/// Conversation contexts
pub mod contexts {
    pub const CREATED_TOTAL: &str = "cibot_contexts_created_total";
    /// Contexts removed by the expiry sweep
    pub const EXPIRED_TOTAL: &str = "cibot_contexts_expired_total";
    /// Contexts currently held
    pub const ACTIVE: &str = "cibot_contexts_active";
}

/// Outbound delivery
pub mod outbound {
    pub const MESSAGES_SENT_TOTAL: &str = "cibot_outbound_messages_sent_total";
    pub const SEND_ERRORS_TOTAL: &str = "cibot_outbound_send_errors_total";
}

/// Periodic plugin loops
pub mod loops {
    pub const RUNS_TOTAL: &str = "cibot_loop_runs_total";
    pub const ERRORS_TOTAL: &str = "cibot_loop_errors_total";
}

/// Key-value store
pub mod store {
    /// Snapshots written to disk
    pub const FLUSHES_TOTAL: &str = "cibot_store_flushes_total";
    pub const FLUSH_ERRORS_TOTAL: &str = "cibot_store_flush_errors_total";
}

/// Common label keys
pub mod labels {
    pub const ROUTE: &str = "route";
    pub const PLUGIN: &str = "plugin";
    pub const HOOK: &str = "hook";
    pub const CHANNEL: &str = "channel";
}
