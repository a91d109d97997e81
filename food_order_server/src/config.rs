use std::{env, time::Duration as StdDuration};

use chrono::Duration;
use food_order_engine::{LifecyclePolicy, LifecycleTask, LocalTimezone};
use fos_common::helpers::{parse_boolean, parse_positive_int};
use log::*;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/food_orders.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;
const DEFAULT_CANCELLATION_INTERVAL: StdDuration = StdDuration::from_secs(300);
const DEFAULT_COMPLETION_INTERVAL: StdDuration = StdDuration::from_secs(3600);
const DEFAULT_PAYMENT_CHECK_INTERVAL: StdDuration = StdDuration::from_secs(300);

/// Every environment variable the server reads. Used by the CLI help as well.
pub const CONFIG_ENVS: [&str; 11] = [
    "FOS_DATABASE_URL",
    "FOS_DB_MAX_CONNECTIONS",
    "FOS_UTC_OFFSET_HOURS",
    "FOS_PENDING_ORDER_TIMEOUT_MINS",
    "FOS_UNASSIGNED_DELIVERY_TIMEOUT_MINS",
    "FOS_DELIVERED_COMPLETION_HOURS",
    "FOS_PAYMENT_TIMEOUT_MINS",
    "FOS_CANCELLATION_INTERVAL_SECS",
    "FOS_COMPLETION_INTERVAL_SECS",
    "FOS_PAYMENT_CHECK_INTERVAL_SECS",
    "FOS_RUN_MIGRATIONS",
];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the embedded migrations are applied before the workers start.
    pub run_migrations: bool,
    pub workers: WorkerConfig,
}

/// Settings shared by the lifecycle workers.
#[derive(Clone, Copy, Debug)]
pub struct WorkerConfig {
    /// The local business timezone. Elapsed times are measured in this timezone.
    pub timezone: LocalTimezone,
    pub policy: LifecyclePolicy,
    /// How often the pending-order and unassigned-delivery cancellation workers run
    pub cancellation_interval: StdDuration,
    /// How often delivered orders are checked for completion
    pub completion_interval: StdDuration,
    pub payment_check_interval: StdDuration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            workers: WorkerConfig::default(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            timezone: LocalTimezone::default(),
            policy: LifecyclePolicy::default(),
            cancellation_interval: DEFAULT_CANCELLATION_INTERVAL,
            completion_interval: DEFAULT_COMPLETION_INTERVAL,
            payment_check_interval: DEFAULT_PAYMENT_CHECK_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any source of `FOS_*` values. Missing or invalid values fall back to the
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let database_url = lookup("FOS_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ FOS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = positive_setting(&lookup, "FOS_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS as i64)
            .try_into()
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let run_migrations = flag_setting(&lookup, "FOS_RUN_MIGRATIONS", true);
        let workers = WorkerConfig::from_lookup(&lookup);
        Self { database_url, max_connections, run_migrations, workers }
    }
}

impl WorkerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = LifecyclePolicy::default();
        let policy = LifecyclePolicy {
            pending_order_timeout: duration_setting(
                lookup,
                "FOS_PENDING_ORDER_TIMEOUT_MINS",
                defaults.pending_order_timeout,
                TimeUnit::Minutes,
            ),
            unassigned_delivery_timeout: duration_setting(
                lookup,
                "FOS_UNASSIGNED_DELIVERY_TIMEOUT_MINS",
                defaults.unassigned_delivery_timeout,
                TimeUnit::Minutes,
            ),
            delivered_completion: duration_setting(
                lookup,
                "FOS_DELIVERED_COMPLETION_HOURS",
                defaults.delivered_completion,
                TimeUnit::Hours,
            ),
            payment_timeout: duration_setting(
                lookup,
                "FOS_PAYMENT_TIMEOUT_MINS",
                defaults.payment_timeout,
                TimeUnit::Minutes,
            ),
        };
        Self {
            timezone: configure_timezone(lookup),
            policy,
            cancellation_interval: interval_setting(lookup, "FOS_CANCELLATION_INTERVAL_SECS", DEFAULT_CANCELLATION_INTERVAL),
            completion_interval: interval_setting(lookup, "FOS_COMPLETION_INTERVAL_SECS", DEFAULT_COMPLETION_INTERVAL),
            payment_check_interval: interval_setting(
                lookup,
                "FOS_PAYMENT_CHECK_INTERVAL_SECS",
                DEFAULT_PAYMENT_CHECK_INTERVAL,
            ),
        }
    }

    /// The period between two passes of the given task.
    pub fn interval(&self, task: LifecycleTask) -> StdDuration {
        match task {
            LifecycleTask::PendingOrderTimeout | LifecycleTask::UnassignedDeliveryTimeout => self.cancellation_interval,
            LifecycleTask::DeliveredAutoComplete => self.completion_interval,
            LifecycleTask::PaymentTimeout => self.payment_check_interval,
        }
    }
}

fn configure_timezone<F>(lookup: &F) -> LocalTimezone
where F: Fn(&str) -> Option<String> {
    let Some(value) = lookup("FOS_UTC_OFFSET_HOURS") else {
        return LocalTimezone::default();
    };
    value
        .trim()
        .parse::<i32>()
        .map_err(|e| e.to_string())
        .and_then(|hours| LocalTimezone::from_utc_offset_hours(hours).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| {
            warn!(
                "🪛️ Invalid configuration value for FOS_UTC_OFFSET_HOURS ({value}). {e}. Using the default, \
                 UTC+{DEFAULT_UTC_OFFSET_HOURS}."
            );
            LocalTimezone::default()
        })
}

fn positive_setting<F>(lookup: &F, name: &str, default: i64) -> i64
where F: Fn(&str) -> Option<String> {
    let value = lookup(name);
    match (value.as_deref(), parse_positive_int(value.as_deref())) {
        (None, _) => default,
        (Some(_), Some(v)) => v,
        (Some(s), None) => {
            warn!("🪛️ Invalid configuration value for {name} ({s}). It must be a positive integer. Using {default}.");
            default
        },
    }
}

#[derive(Clone, Copy)]
enum TimeUnit {
    Minutes,
    Hours,
}

/// A positive number of minutes or hours. Values too large to represent as a duration fall back to the default.
fn duration_setting<F>(lookup: &F, name: &str, default: Duration, unit: TimeUnit) -> Duration
where F: Fn(&str) -> Option<String> {
    let (count, make): (i64, fn(i64) -> Option<Duration>) = match unit {
        TimeUnit::Minutes => (default.num_minutes(), Duration::try_minutes),
        TimeUnit::Hours => (default.num_hours(), Duration::try_hours),
    };
    let value = positive_setting(lookup, name, count);
    make(value).unwrap_or_else(|| {
        warn!("🪛️ Invalid configuration value for {name} ({value}). It is out of range. Using {count}.");
        default
    })
}

fn flag_setting<F>(lookup: &F, name: &str, default: bool) -> bool
where F: Fn(&str) -> Option<String> {
    let Some(value) = lookup(name) else {
        return default;
    };
    parse_boolean(&value).unwrap_or_else(|| {
        warn!("🪛️ Invalid configuration value for {name} ({value}). It must be a yes/no flag. Using {default}.");
        default
    })
}

fn interval_setting<F>(lookup: &F, name: &str, default: StdDuration) -> StdDuration
where F: Fn(&str) -> Option<String> {
    let secs = positive_setting(lookup, name, default.as_secs() as i64);
    StdDuration::from_secs(secs.unsigned_abs())
}
