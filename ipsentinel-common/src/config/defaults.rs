use std::time::Duration;

use crate::{ListenEndpoint, Secret};

pub(crate) const fn _default_false() -> bool {
    false
}

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data/db".to_owned())
}

#[inline]
pub(crate) fn _default_http_listen() -> ListenEndpoint {
    ListenEndpoint::all_interfaces(8888)
}

#[inline]
pub(crate) fn _default_admin_username() -> String {
    "admin".to_owned()
}

#[inline]
pub(crate) fn _default_admin_password() -> Secret<String> {
    Secret::new("admin".to_owned())
}

#[inline]
pub(crate) fn _default_retention() -> Duration {
    Duration::from_secs(60 * 60 * 24 * 90)
}

#[inline]
pub(crate) fn _default_session_max_age() -> Duration {
    Duration::from_secs(60 * 30)
}

#[inline]
pub(crate) fn _default_empty_vec<T>() -> Vec<T> {
    vec![]
}
