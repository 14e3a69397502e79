//! System-wide constants for the Tradeseal settlement core.

/// Denominator for basis-point fees (1 bp = 1/10000).
pub const INVERSE_BASIS_POINT: u32 = 10_000;

/// Prefix of the signing digest, followed by the ASCII hash length.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Tradeseal Signed Message:\n";

/// Domain tag for order hashes.
pub const ORDER_HASH_DOMAIN: &[u8] = b"tradeseal:order:v1:";

/// Domain tag for proxy addresses derived from their owner.
pub const PROXY_ADDRESS_DOMAIN: &[u8] = b"tradeseal:proxy:v1:";

/// Minimum delay between starting and finishing a caller grant (2 weeks).
pub const DEFAULT_GRANT_DELAY_SECS: u64 = 14 * 24 * 60 * 60;

/// Proxy implementation version new registrations start from.
pub const INITIAL_PROXY_IMPLEMENTATION: u32 = 1;

/// Maximum calldata length accepted in an order (bytes).
pub const MAX_CALLDATA_LEN: usize = 64 * 1024;

/// Maximum static extradata length accepted in an order (bytes).
pub const MAX_STATIC_EXTRADATA_LEN: usize = 16 * 1024;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Tradeseal";
