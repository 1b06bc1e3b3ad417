//! Tests running against a live server, see `system_tests` and `load_tests` features.
//! The server url is taken from `LIBRARY_SERVICE_URL`, defaulting to http://127.0.0.1:8080

#[cfg(test)]
mod test_env;
