//! Short random record identifiers.

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Six uppercase characters, also used as the customer's login id.
pub fn customer_id() -> String {
    base36(6).to_uppercase()
}

/// `COL` followed by four uppercase characters.
pub fn collector_id() -> String {
    format!("COL{}", base36(4).to_uppercase())
}

/// Nine lowercase characters for bills, packages, routers and accounts.
pub fn record_id() -> String {
    base36(9)
}
