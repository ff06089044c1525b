//! Bearer token extraction from request headers

use http::header::AUTHORIZATION;
use http::HeaderMap;

use crate::error::{AuthError, AuthResult};

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// No header at all is `MissingToken`; anything present but unusable is
/// `InvalidToken`.
pub fn bearer_token(headers: &HeaderMap) -> AuthResult<&str> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::InvalidToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidToken);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer  abc")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_malformed_header() {
        for value in ["Bearer", "Bearer   ", "Basic dXNlcjpwYXNz", "abc.def.ghi"] {
            assert!(
                matches!(bearer_token(&headers(value)), Err(AuthError::InvalidToken)),
                "{value}"
            );
        }
    }
}
