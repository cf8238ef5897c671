//! Environment-driven configuration.
//!
//! Kept in its own test binary with a single test so no other test observes
//! the process-wide variables it sets.

use rate_forwarder::config::{ENV_BATCH_SIZE, ENV_MAX_ATTEMPTS, ENV_MAX_FREQUENCY};
use rate_forwarder::{Error, ForwarderConfig};
use std::io::Write;

#[test]
fn test_env_layers_and_precedence() {
    std::env::remove_var(ENV_MAX_FREQUENCY);
    std::env::remove_var(ENV_MAX_ATTEMPTS);
    std::env::remove_var(ENV_BATCH_SIZE);
    assert_eq!(ForwarderConfig::from_env().unwrap(), ForwarderConfig::default());

    std::env::set_var(ENV_MAX_FREQUENCY, "12.5");
    std::env::set_var(ENV_MAX_ATTEMPTS, " 5 ");
    std::env::set_var(ENV_BATCH_SIZE, "");
    let from_env = ForwarderConfig::from_env().unwrap();
    assert_eq!(from_env.max_frequency, 12.5);
    assert_eq!(from_env.max_attempts, 5);
    assert_eq!(from_env.batch_size, 20);

    // A file overrides the environment only for the keys it names.
    let path = std::env::temp_dir().join(format!("forwarder-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "max_attempts: 9").unwrap();
    drop(file);
    let layered = from_env.overlay_file(&path).unwrap();
    assert_eq!(layered.max_frequency, 12.5);
    assert_eq!(layered.max_attempts, 9);
    std::fs::remove_file(&path).ok();

    std::env::set_var(ENV_BATCH_SIZE, "lots");
    let err = ForwarderConfig::from_env().unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(err.to_string().contains(ENV_BATCH_SIZE));

    std::env::remove_var(ENV_MAX_FREQUENCY);
    std::env::remove_var(ENV_MAX_ATTEMPTS);
    std::env::remove_var(ENV_BATCH_SIZE);
}
