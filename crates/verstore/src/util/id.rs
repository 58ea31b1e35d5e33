use uuid::Uuid;

use crate::envelope::now_millis;

const SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A time-prefixed random id: `<epoch ms>-<7 lowercase base36 chars>`.
pub fn generate_id() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(BASE36[(bits % 36) as usize] as char);
        bits /= 36;
    }
    format!("{}-{suffix}", now_millis())
}
