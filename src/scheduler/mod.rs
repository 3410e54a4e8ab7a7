//! Cron jobs that periodically self-heal guild state.

pub mod role_refresh;
