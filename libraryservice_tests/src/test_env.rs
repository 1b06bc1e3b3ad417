use rand::distributions::Alphanumeric;
use rand::Rng;

use libraryservice_server::client::LibraryServiceClient;

pub fn service_url() -> String {
    std::env::var("LIBRARY_SERVICE_URL").unwrap_or("http://127.0.0.1:8080".to_string())
}

/// Client logged in with the bootstrapped admin credentials
/// (`LIBRARY_AUTH__ADMIN_USERNAME` / `LIBRARY_AUTH__ADMIN_PASSWORD`, admin/adminpass by default)
pub async fn logged_in_client() -> LibraryServiceClient {
    let username =
        std::env::var("LIBRARY_AUTH__ADMIN_USERNAME").unwrap_or("admin".to_string());
    let password =
        std::env::var("LIBRARY_AUTH__ADMIN_PASSWORD").unwrap_or("adminpass".to_string());
    let client = LibraryServiceClient::new(&service_url()).expect("Failed to create client");
    client
        .login(&username, &password)
        .await
        .expect("Failed to log in");
    client
}

pub fn random_word(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
