use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::warn;

const HEALTH_PORT: &str = "HEALTH_PORT";

const DEFAULT_PORT: u16 = 8080;

pub fn get_default_port() -> u16 {
    DEFAULT_PORT
}

/// Port override from the environment, if set and valid
pub fn get_port() -> Option<u16> {
    std::env::var(HEALTH_PORT).ok()?.parse().ok()
}

const HEALTH_ADDR: &str = "HEALTH_ADDR";

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

pub fn get_default_addr() -> Ipv4Addr {
    DEFAULT_ADDR
}

/// Bind address override from the environment, if set and valid
pub fn get_addr() -> Option<Ipv4Addr> {
    std::env::var(HEALTH_ADDR).ok()?.parse().ok()
}

const HEALTH_SECRET: &str = "HEALTH_SECRET";

pub fn get_secret() -> Option<String> {
    let secret_from_env = std::env::var(HEALTH_SECRET);
    secret_from_env.ok()
}

/// Smallest period a timer is started with
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// A zero period would panic inside `tokio::time::interval`
pub fn timer_period(period: Duration, timer: &str) -> Duration {
    if period.is_zero() {
        warn!("{timer} period of 0 is not allowed, using {MIN_TIMER_PERIOD:?}");
        return MIN_TIMER_PERIOD;
    }
    period
}
