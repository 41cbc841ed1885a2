const TICK_FREQUENCY_MILLIS: u64 = 3000;

const QUERY_DELAY_MILLIS: u64 = 2000;

const QUERY_TIMEOUT_MILLIS: u64 = 10000;

pub mod endpoint;

pub mod flight_status;

pub mod tracker_error;

pub mod config;

pub mod flight;

pub mod store;

pub mod timer;

pub mod query;

pub mod scheduler;

pub mod tracker;
