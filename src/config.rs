//! Engine configuration from environment variables
//!
//! Controls the key-derivation cost used when exporting key blobs and the
//! number of inputs packed into a single conversion transaction.
//! [`init`] is the one-time process setup: it installs the logger and
//! pins the configuration.

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// Largest input count a transaction can encode.
pub const MAX_TRANSACTION_INPUTS: u8 = u8::MAX;

/// Four times the default KDF memory cost
pub const DEFAULT_MAX_KDF_MEMORY_KIB: u32 = 4 * 19_456;

/// Most Argon2 passes and lanes a key blob may use
pub const MAX_KDF_ITERATIONS: u32 = 16;
pub const MAX_KDF_PARALLELISM: u8 = 16;

static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Argon2id cost parameters for newly encrypted key blobs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u8,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// KDF cost written into new key blobs
    pub kdf: KdfParams,
    /// Upper bound on inputs per conversion transaction
    pub max_conversion_inputs: u8,
    /// Largest Argon2 memory cost a key blob header may declare
    pub max_kdf_memory_kib: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            max_conversion_inputs: MAX_TRANSACTION_INPUTS,
            max_kdf_memory_kib: DEFAULT_MAX_KDF_MEMORY_KIB,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WALLET_ENGINE_KDF_MEMORY_KIB`: Argon2 memory cost (default 19456)
    /// - `WALLET_ENGINE_KDF_ITERATIONS`: Argon2 passes (default 2)
    /// - `WALLET_ENGINE_KDF_PARALLELISM`: Argon2 lanes (default 1)
    /// - `WALLET_ENGINE_MAX_CONVERSION_INPUTS`: inputs per conversion transaction (default 255)
    /// - `WALLET_ENGINE_MAX_KDF_MEMORY_KIB`: memory ceiling when decrypting (default 77824)
    ///
    /// Unparseable or zero values fall back to the defaults. Passes and lanes
    /// are capped at 16; the memory ceiling is raised to the configured KDF
    /// memory so blobs this engine writes stay readable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let kdf = KdfParams {
            memory_kib: read_var("WALLET_ENGINE_KDF_MEMORY_KIB", defaults.kdf.memory_kib),
            iterations: read_var("WALLET_ENGINE_KDF_ITERATIONS", defaults.kdf.iterations),
            parallelism: read_var("WALLET_ENGINE_KDF_PARALLELISM", defaults.kdf.parallelism),
        };
        let max_conversion_inputs = read_var(
            "WALLET_ENGINE_MAX_CONVERSION_INPUTS",
            defaults.max_conversion_inputs,
        );

        let max_kdf_memory_kib = read_var(
            "WALLET_ENGINE_MAX_KDF_MEMORY_KIB",
            defaults.max_kdf_memory_kib,
        );

        let config = Self {
            kdf,
            max_conversion_inputs,
            max_kdf_memory_kib,
        }
        .normalized();

        log::debug!(
            "Engine config: kdf m={}KiB t={} p={} (ceiling {}KiB), max conversion inputs {}",
            config.kdf.memory_kib,
            config.kdf.iterations,
            config.kdf.parallelism,
            config.max_kdf_memory_kib,
            config.max_conversion_inputs
        );
        config
    }

    fn normalized(mut self) -> Self {
        self.kdf.iterations = self.kdf.iterations.min(MAX_KDF_ITERATIONS);
        self.kdf.parallelism = self.kdf.parallelism.min(MAX_KDF_PARALLELISM);
        self.max_kdf_memory_kib = self.max_kdf_memory_kib.max(self.kdf.memory_kib);
        self
    }
}

fn read_var<T>(name: &str, default: T) -> T
where
    T: FromStr + PartialEq + Default + Copy + std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value != T::default() => value,
            _ => {
                log::warn!("⚠️  Ignoring invalid {}='{}', using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// One-time engine setup
///
/// Installs the `env_logger` backend (honouring `RUST_LOG`, default `info`)
/// and pins the configuration read from the environment. Safe to call any
/// number of times; only the first call has an effect.
pub fn init() -> &'static EngineConfig {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    ENGINE_CONFIG.get_or_init(|| {
        let config = EngineConfig::from_env();
        log::info!("🔧 Wallet engine initialized");
        config
    })
}

/// Active configuration, loaded from the environment on first use
pub fn engine_config() -> &'static EngineConfig {
    ENGINE_CONFIG.get_or_init(EngineConfig::from_env)
}
