//! Empty crate root; this package exists only to host the black-box HTTP
//! tests under `tests/` that drive `auris-server`'s router end to end.
