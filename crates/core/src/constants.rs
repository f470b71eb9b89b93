//! Constants used throughout the PharmAssist core crate.
//!
//! Storage keys, wire-level names and limits live here so the client, the
//! offline backend and the binaries agree on them.

/// Persisted storage key holding the theme preference.
pub const THEME_STORAGE_KEY: &str = "pharmassist-theme";

/// Persisted storage key holding the serialised session descriptor.
pub const SESSION_STORAGE_KEY: &str = "pharmassist-session";

/// Name of the cookie carrying the backend session token.
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Prefix of every prescription identifier (`RX-<year>-<seq>`).
pub const PRESCRIPTION_ID_PREFIX: &str = "RX";

/// Maximum number of medication lines on a single prescription order.
pub const MAX_MEDICATION_LINES: usize = 3;

/// Maximum number of autocomplete suggestions returned for a patient query.
pub const MAX_PATIENT_SUGGESTIONS: usize = 8;

/// Viewport width above which the mobile navigation overlay is closed.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// Default backend base URL (the dispensing unit's access point).
pub const DEFAULT_API_BASE_URL: &str = "http://192.168.4.1";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default location of the file backing persisted client storage.
pub const DEFAULT_STATE_FILE: &str = ".pharmassist/state.json";

/// Name recorded as dispenser when an order is collected.
pub const DEFAULT_DISPENSER: &str = "Pharmacy Staff";
