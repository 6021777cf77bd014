//! Unwrap helpers for test code.
//!
//! Panics carry the caller's location through `#[track_caller]`.

use std::fmt::Debug;
use std::str::FromStr;

/// Unwrap a `Result`, panicking with the error on failure.
///
/// ```rust
/// use spindle_vfd_test_helpers::must;
///
/// let map: spindle_vfd_protocol::SpeedMap = must("0=0% 24000=100%".parse());
/// assert_eq!(map.max_rpm(), 24000);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// # Panics
///
/// Panics with `msg` if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// # Panics
///
/// Panics if `s` does not parse as `T`.
#[track_caller]
pub fn must_parse<T: FromStr>(s: &str) -> T
where
    T::Err: Debug,
{
    match s.parse() {
        Ok(v) => v,
        Err(e) => panic!("must_parse: failed to parse {s:?}: {e:?}"),
    }
}
