//! Authorization
//!
//! See [sigv4-auth-using-authorization-header](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-auth-using-authorization-header.html)
//!

use super::amz_date::is_valid_scope_date;
use crate::signature_v4::{CredentialScope, AWS4_HMAC_SHA256};

/// Authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationV4<'a> {
    /// The algorithm that was used to calculate the signature.
    pub algorithm: &'a str,

    /// Access key ID and the scope information, which includes the date, Region, and service that were used to calculate the signature.
    pub credential: CredentialV4<'a>,

    /// A semicolon-separated list of request headers that you used to compute `Signature`.
    pub signed_headers: Vec<&'a str>,

    /// The 256-bit signature expressed as 64 lowercase hexadecimal characters.
    pub signature: &'a str,
}

/// Access key ID and the scope information, which includes the date, Region, and service that were used to calculate the signature.
///
/// This string has the following form:
/// `<your-access-key-id>/<date>/<aws-region>/<aws-service>/aws4_request`
///
/// See [sigv4-auth-using-authorization-header](https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-auth-using-authorization-header.html)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialV4<'a> {
    /// access key id
    pub access_key_id: &'a str,
    /// <date> value is specified using YYYYMMDD format.
    pub date: &'a str,
    /// region
    pub aws_region: &'a str,
    /// <aws-service> value is `s3` when sending request to Amazon S3.
    pub aws_service: &'a str,
}

/// `ParseAuthorizationError`
#[derive(Debug, thiserror::Error)]
pub enum ParseAuthorizationError {
    /// the header does not use `AWS4-HMAC-SHA256`
    #[error("unsupported authorization scheme")]
    UnsupportedScheme,
    /// the key/value structure is broken
    #[error("malformed authorization header: {0}")]
    Malformed(&'static str),
}

/// `ParseCredentialError`
#[allow(missing_copy_implementations)]
#[derive(Debug, thiserror::Error)]
#[error("ParseCredentialError")]
pub struct ParseCredentialError {
    /// priv place holder
    _priv: (),
}

/// nom parser: `segment/`
fn slash_tail(input: &str) -> nom::IResult<&str, &str> {
    use nom::bytes::complete::{tag, take_till1};
    use nom::sequence::terminated;

    terminated(take_till1(|c: char| c == '/'), tag("/"))(input)
}

impl<'a> CredentialV4<'a> {
    /// Parses `<access-key-id>/<date>/<region>/<service>[/aws4_request]`
    ///
    /// The `aws4_request` terminator is mandatory when `require_terminator` is set.
    ///
    /// # Errors
    /// Returns an `Err` if the credential is invalid
    pub fn parse(input: &'a str, require_terminator: bool) -> Result<Self, ParseCredentialError> {
        /// nom parser
        fn parse(input: &str) -> nom::IResult<&str, (CredentialV4<'_>, bool)> {
            use nom::bytes::complete::{tag, take_till1};
            use nom::combinator::{all_consuming, opt};

            let (input, access_key_id) = slash_tail(input)?;
            let (input, date) = slash_tail(input)?;
            let (input, aws_region) = slash_tail(input)?;
            let (input, aws_service) = take_till1(|c: char| c == '/')(input)?;
            let (input, terminator) = all_consuming(opt(tag("/aws4_request")))(input)?;

            let credential = CredentialV4 {
                access_key_id,
                date,
                aws_region,
                aws_service,
            };
            Ok((input, (credential, terminator.is_some())))
        }

        let err = || ParseCredentialError { _priv: () };

        let (credential, has_terminator) = parse(input).map_err(|_| err())?.1;

        if require_terminator && !has_terminator {
            return Err(err());
        }
        if !is_valid_scope_date(credential.date) {
            return Err(err());
        }
        Ok(credential)
    }

    /// the credential scope
    #[must_use]
    pub const fn scope(&self) -> CredentialScope<'a> {
        CredentialScope {
            date: self.date,
            region: self.aws_region,
            service: self.aws_service,
        }
    }
}

impl<'a> AuthorizationV4<'a> {
    /// Returns true if `auth` claims the `AWS4-HMAC-SHA256` scheme
    #[must_use]
    pub fn is_sigv4(auth: &str) -> bool {
        auth.trim_start().starts_with(AWS4_HMAC_SHA256)
    }

    /// parse `AuthorizationV4` from `Authorization` header
    ///
    /// Components are separated by commas with optional whitespace and may
    /// appear in any order. Each of `Credential`, `SignedHeaders` and
    /// `Signature` must appear exactly once.
    ///
    /// # Errors
    /// Returns an `Err` if the header is invalid
    pub fn from_header_str(auth: &'a str) -> Result<AuthorizationV4<'a>, ParseAuthorizationError> {
        /// nom parser
        fn parse(input: &str) -> nom::IResult<&str, (&str, Vec<(&str, &str)>)> {
            use nom::{
                bytes::complete::{tag, take_till, take_till1},
                character::complete::{alpha1, char, multispace0, multispace1},
                combinator::all_consuming,
                multi::separated_list1,
                sequence::{delimited, preceded, separated_pair, terminated, tuple},
            };

            let (input, algorithm) =
                preceded(multispace0, take_till1(|c: char| c.is_ascii_whitespace()))(input)?;
            let (input, _) = multispace1(input)?;

            let value = take_till(|c: char| c == ',' || c.is_ascii_whitespace());
            let component = separated_pair(alpha1, tag("="), value);
            let separator = tuple((multispace0, char(','), multispace0));

            let (input, components) = all_consuming(terminated(
                separated_list1(separator, component),
                delimited(multispace0, nom::combinator::opt(char(',')), multispace0),
            ))(input)?;

            Ok((input, (algorithm, components)))
        }

        if !Self::is_sigv4(auth) {
            return Err(ParseAuthorizationError::UnsupportedScheme);
        }

        let (algorithm, components) = parse(auth)
            .map_err(|_| ParseAuthorizationError::Malformed("invalid structure"))?
            .1;

        if algorithm != AWS4_HMAC_SHA256 {
            return Err(ParseAuthorizationError::UnsupportedScheme);
        }

        let mut credential: Option<&str> = None;
        let mut signed_headers: Option<&str> = None;
        let mut signature: Option<&str> = None;

        for (key, value) in components {
            let slot = match key {
                "Credential" => &mut credential,
                "SignedHeaders" => &mut signed_headers,
                "Signature" => &mut signature,
                _ => return Err(ParseAuthorizationError::Malformed("unknown component")),
            };
            if slot.replace(value).is_some() {
                return Err(ParseAuthorizationError::Malformed("duplicate component"));
            }
        }

        let credential = credential.ok_or(ParseAuthorizationError::Malformed("missing Credential"))?;
        let signed_headers =
            signed_headers.ok_or(ParseAuthorizationError::Malformed("missing SignedHeaders"))?;
        let signature = signature.ok_or(ParseAuthorizationError::Malformed("missing Signature"))?;

        let credential = CredentialV4::parse(credential, true)
            .map_err(|_| ParseAuthorizationError::Malformed("invalid Credential"))?;

        let signed_headers = parse_signed_headers(signed_headers)
            .ok_or(ParseAuthorizationError::Malformed("invalid SignedHeaders"))?;

        if signature.is_empty() {
            return Err(ParseAuthorizationError::Malformed("empty Signature"));
        }

        Ok(AuthorizationV4 {
            algorithm,
            credential,
            signed_headers,
            signature,
        })
    }
}

/// Splits a `SignedHeaders` list. Returns `None` if it is empty or has an empty entry.
pub(crate) fn parse_signed_headers(s: &str) -> Option<Vec<&str>> {
    if s.is_empty() || !s.is_ascii() {
        return None;
    }
    let headers: Vec<&str> = s.split(';').collect();
    if headers.iter().any(|h| h.is_empty()) {
        return None;
    }
    Some(headers)
}
