// Token defaults
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 86_400;
pub const DEFAULT_TOKEN_LEEWAY_SECS: u64 = 0;
pub const MIN_SECRET_LEN: usize = 32;

// Argon2 cost defaults (argon2 crate recommended parameters)
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
pub const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

// Permission cache defaults
pub const DEFAULT_PERMISSION_CACHE_SIZE: usize = 256;
pub const DEFAULT_PERMISSION_CACHE_TTL_SECS: u64 = 60;

// Minimum wall-clock duration of a failed login
pub const DEFAULT_MIN_LOGIN_DURATION_MS: u64 = 100;

// Audit buffer
pub const DEFAULT_MAX_AUDIT_ENTRIES: usize = 10_000;

// Environment variable prefix
pub const ENV_PREFIX: &str = "TENANT_GATE_";

// Tokens longer than this are rejected before any decoding
pub const MAX_TOKEN_LEN: usize = 4096;
