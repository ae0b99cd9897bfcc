//! Anonymous user ids for voting.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a generated user id.
pub const USER_ID_LEN: usize = 36;

/// Generate a new random user id: 36 ASCII letters and digits.
pub fn new_user_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(USER_ID_LEN)
        .map(char::from)
        .collect()
}
