//! Agora protocol constants

/// Name the agora indexer plugin publishes its data under
pub const AGORA_PLUGIN_NAME: &str = "agora";

/// Covenant variant tag of a oneshot offer, stored hex-encoded in plugin data[0]
pub const ONESHOT_COVENANT_VARIANT: &[u8] = b"ONESHOT";

/// Covenant variant tag of a partial offer. Recognized but not parsed.
pub const PARTIAL_COVENANT_VARIANT: &[u8] = b"PARTIAL";

/// Plugin group prefix marking the cancel public key
pub const PUBKEY_GROUP_PREFIX: &[u8] = b"P";

/// Enforced output count of a oneshot NFT sale: OP_RETURN plus payment
pub const ONESHOT_ENFORCED_OUTPUTS: usize = 2;

/// SEND amounts a single-NFT sale must carry: nothing to output 1 of the
/// offer tx, the NFT itself to the buyer
pub const ONESHOT_SEND_AMOUNTS: [u64; 2] = [0, 1];
