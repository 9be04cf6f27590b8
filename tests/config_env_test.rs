use std::env;
use std::sync::Mutex;

use tenant_gate::config::{AuthConfig, HashingConfig};
use tenant_gate::AuthError;

// Process environment is shared between test threads
static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    "TENANT_GATE_JWT_SECRET",
    "JWT_SECRET",
    "TENANT_GATE_TOKEN_TTL_SECS",
    "TENANT_GATE_ARGON2_MEMORY_KIB",
    "TENANT_GATE_PERMISSION_CACHE_SIZE",
    "TENANT_GATE_MIN_LOGIN_DURATION_MS",
];

fn clear() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_from_env_reads_prefixed_variables() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();
    env::set_var("TENANT_GATE_JWT_SECRET", "k9$Vx2mQ7!rT4wZp8#Lc3nB6@hJ1yF5dQ");
    env::set_var("TENANT_GATE_TOKEN_TTL_SECS", "900");
    env::set_var("TENANT_GATE_PERMISSION_CACHE_SIZE", "0");
    env::set_var("TENANT_GATE_MIN_LOGIN_DURATION_MS", "250");

    let config = AuthConfig::from_env().unwrap();
    assert_eq!(config.token_ttl.num_seconds(), 900);
    assert_eq!(config.permission_cache_size, 0);
    assert_eq!(config.min_login_duration.as_millis(), 250);

    clear();
}

#[test]
fn test_from_env_without_secret_fails() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();

    let result = AuthConfig::from_env();
    assert!(matches!(result, Err(AuthError::ConfigurationError(_))));
}

#[test]
fn test_hashing_config_from_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear();
    env::set_var("TENANT_GATE_ARGON2_MEMORY_KIB", "32768");

    let hashing = HashingConfig::from_env().unwrap();
    assert_eq!(hashing.memory_kib, 32768);
    assert_eq!(hashing.iterations, HashingConfig::default().iterations);

    env::set_var("TENANT_GATE_ARGON2_MEMORY_KIB", "lots");
    assert!(HashingConfig::from_env().is_err());

    clear();
}
