pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub(crate) const DEFAULT_DATA_FILE: &str = "blockchain_data.json";
/// Account that funds top-ups. Its balance only ever goes down.
pub(crate) const DEFAULT_SYSTEM_ACCOUNT: &str = "Sistem";
