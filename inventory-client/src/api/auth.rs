use secrecy::Secret;

/// Pull the session token out of a `Cookie` header string.
pub fn token_from_cookie(cookie: &str, name: &str) -> Option<Secret<String>> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
        .map(|value| Secret::new(value.to_string()))
}
