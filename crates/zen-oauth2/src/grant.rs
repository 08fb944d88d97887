//! Grant types and their token request parameters

use crate::error::{OAuthError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The three grant types understood by the token endpoint call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    /// Authorization code, selected by `"code"`
    Code,
    /// Resource owner password credentials, selected by `"password"`
    Password,
    /// Refresh token, selected by `"token"`
    Token,
}

impl GrantType {
    /// The selector string accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Password => "password",
            Self::Token => "token",
        }
    }

    /// The `grant_type` value sent to the token endpoint.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::Code => "authorization_code",
            Self::Password => "password",
            Self::Token => "refresh_token",
        }
    }

    /// Keys that must be supplied for this grant, in the order they are sent.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Code => &["code", "redirect_uri"],
            Self::Password => &["username", "password"],
            Self::Token => &["refresh_token"],
        }
    }
}

impl FromStr for GrantType {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "code" => Ok(Self::Code),
            "password" => Ok(Self::Password),
            "token" => Ok(Self::Token),
            other => Err(OAuthError::InvalidGrantType(other.to_string())),
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete token request for one grant type.
#[derive(Clone, PartialEq, Eq)]
pub enum GrantRequest {
    /// Exchange an authorization code
    AuthorizationCode {
        /// Code received on the redirect
        code: String,
        /// Redirect URI used in the authorization request
        redirect_uri: String,
    },
    /// Exchange the resource owner's credentials
    Password {
        /// Resource owner username
        username: String,
        /// Resource owner password
        password: String,
    },
    /// Exchange a refresh token
    RefreshToken {
        /// Previously issued refresh token
        refresh_token: String,
    },
}

impl GrantRequest {
    /// Create an authorization code request.
    pub fn authorization_code(code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self::AuthorizationCode {
            code: code.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Create a password request.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create a refresh token request.
    pub fn refresh_token(refresh_token: impl Into<String>) -> Self {
        Self::RefreshToken {
            refresh_token: refresh_token.into(),
        }
    }

    /// Build a request from a grant selector and a key-value mapping.
    ///
    /// The selector is validated first. Keys not required by the grant type
    /// are ignored; an empty value counts as present.
    ///
    /// # Errors
    ///
    /// - [`OAuthError::InvalidGrantType`] for an unknown selector
    /// - [`OAuthError::MissingParameter`] for the first absent required key
    pub fn from_keys(grant_type: &str, keys: &BTreeMap<String, String>) -> Result<Self> {
        let grant_type: GrantType = grant_type.parse()?;
        let take = |field: &str| {
            keys.get(field)
                .cloned()
                .ok_or_else(|| OAuthError::missing(field))
        };

        Ok(match grant_type {
            GrantType::Code => Self::AuthorizationCode {
                code: take("code")?,
                redirect_uri: take("redirect_uri")?,
            },
            GrantType::Password => Self::Password {
                username: take("username")?,
                password: take("password")?,
            },
            GrantType::Token => Self::RefreshToken {
                refresh_token: take("refresh_token")?,
            },
        })
    }

    /// The grant type of this request.
    pub fn grant_type(&self) -> GrantType {
        match self {
            Self::AuthorizationCode { .. } => GrantType::Code,
            Self::Password { .. } => GrantType::Password,
            Self::RefreshToken { .. } => GrantType::Token,
        }
    }

    /// Grant-specific form parameters, `grant_type` first.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let mut params = vec![("grant_type", self.grant_type().grant_type())];
        match self {
            Self::AuthorizationCode { code, redirect_uri } => {
                params.push(("code", code.as_str()));
                params.push(("redirect_uri", redirect_uri.as_str()));
            }
            Self::Password { username, password } => {
                params.push(("username", username.as_str()));
                params.push(("password", password.as_str()));
            }
            Self::RefreshToken { refresh_token } => {
                params.push(("refresh_token", refresh_token.as_str()));
            }
        }
        params
    }
}

// Credentials stay out of logs.
impl fmt::Debug for GrantRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthorizationCode { redirect_uri, .. } => f
                .debug_struct("AuthorizationCode")
                .field("code", &"[redacted]")
                .field("redirect_uri", redirect_uri)
                .finish(),
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[redacted]")
                .finish(),
            Self::RefreshToken { .. } => f
                .debug_struct("RefreshToken")
                .field("refresh_token", &"[redacted]")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_grant_type_parsing() {
        assert_eq!("code".parse::<GrantType>().unwrap(), GrantType::Code);
        assert_eq!("password".parse::<GrantType>().unwrap(), GrantType::Password);
        assert_eq!("token".parse::<GrantType>().unwrap(), GrantType::Token);

        for bad in ["", "Code", "refresh_token", "client_credentials"] {
            assert!(matches!(
                bad.parse::<GrantType>(),
                Err(OAuthError::InvalidGrantType(s)) if s == bad
            ));
        }
    }

    #[test]
    fn test_code_grant_params() {
        let grant = GrantRequest::from_keys(
            "code",
            &keys(&[("code", "abc"), ("redirect_uri", "https://app/cb"), ("extra", "x")]),
        )
        .unwrap();

        assert_eq!(
            grant.params(),
            vec![
                ("grant_type", "authorization_code"),
                ("code", "abc"),
                ("redirect_uri", "https://app/cb"),
            ]
        );
    }

    #[test]
    fn test_password_and_refresh_params() {
        let grant = GrantRequest::password("alice", "hunter2");
        assert_eq!(
            grant.params(),
            vec![
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "hunter2"),
            ]
        );

        let grant = GrantRequest::refresh_token("r1");
        assert_eq!(
            grant.params(),
            vec![("grant_type", "refresh_token"), ("refresh_token", "r1")]
        );
    }

    #[test]
    fn test_missing_code() {
        let result = GrantRequest::from_keys("code", &keys(&[("redirect_uri", "x")]));
        assert!(matches!(
            result,
            Err(OAuthError::MissingParameter { field }) if field == "code"
        ));
    }

    #[test]
    fn test_invalid_type_checked_before_keys() {
        let result = GrantRequest::from_keys("implicit", &BTreeMap::new());
        assert!(matches!(result, Err(OAuthError::InvalidGrantType(_))));
    }

    #[test]
    fn test_empty_value_counts_as_present() {
        let grant = GrantRequest::from_keys("token", &keys(&[("refresh_token", "")])).unwrap();
        assert_eq!(grant, GrantRequest::refresh_token(""));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", GrantRequest::password("alice", "hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));

        let debug = format!("{:?}", GrantRequest::refresh_token("r-secret"));
        assert!(!debug.contains("r-secret"));
    }

    fn grant_type_strategy() -> impl Strategy<Value = GrantType> {
        prop_oneof![
            Just(GrantType::Code),
            Just(GrantType::Password),
            Just(GrantType::Token),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every required key present yields exactly that key set plus grant_type.
        #[test]
        fn prop_params_are_exact(
            grant_type in grant_type_strategy(),
            value in "[a-zA-Z0-9 ./:]{0,20}",
            noise in prop::collection::btree_map("[a-z]{1,8}", "[a-z]{0,8}", 0..4),
        ) {
            let mut map: BTreeMap<String, String> = noise;
            for field in grant_type.required_fields() {
                map.insert(field.to_string(), value.clone());
            }

            let grant = GrantRequest::from_keys(grant_type.as_str(), &map).unwrap();
            prop_assert_eq!(grant.grant_type(), grant_type);

            let params = grant.params();
            let names: Vec<&str> = params.iter().map(|(k, _)| *k).collect();
            let mut expected = vec!["grant_type"];
            expected.extend_from_slice(grant_type.required_fields());
            prop_assert_eq!(names, expected);
            prop_assert_eq!(params[0].1, grant_type.grant_type());
            for (_, v) in &params[1..] {
                prop_assert_eq!(*v, value.as_str());
            }
        }

        /// Dropping any required key fails with that key's name.
        #[test]
        fn prop_missing_field_is_reported(
            grant_type in grant_type_strategy(),
            index in 0usize..2,
        ) {
            let fields = grant_type.required_fields();
            let missing = fields[index % fields.len()];
            let map: BTreeMap<String, String> = fields
                .iter()
                .filter(|f| **f != missing)
                .map(|f| (f.to_string(), "v".to_string()))
                .collect();

            match GrantRequest::from_keys(grant_type.as_str(), &map) {
                Err(OAuthError::MissingParameter { field }) => prop_assert_eq!(field, missing),
                other => prop_assert!(false, "unexpected result: {:?}", other),
            }
        }
    }
}
