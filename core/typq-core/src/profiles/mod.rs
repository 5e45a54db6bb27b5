//! Built-in profiles (made by FontLab https://www.fontlab.com/)
//!
//! `opentype` holds checks against the OpenType specification itself,
//! `universal` adds checks every font should pass, and the vendor profiles
//! build on `universal` with their own additions and overrides.

pub mod adobefonts;
pub mod googlefonts;
pub mod opentype;
pub mod universal;

use crate::profile::Profile;

/// Every built-in profile, in no particular order.
pub fn builtin() -> Vec<Profile> {
    vec![
        opentype::profile(),
        universal::profile(),
        adobefonts::profile(),
        googlefonts::profile(),
    ]
}
