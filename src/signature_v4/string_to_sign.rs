//! canonical request and string to sign

use super::canonical::{self, MissingSignedHeader};
use super::{CredentialScope, AWS4_HMAC_SHA256};
use crate::data_structures::OrderedHeaders;
use crate::utils::Also;

use hyper::Method;

/// create canonical request
///
/// `signed_names` must be lowercase and `payload_hash` is written as given.
///
/// # Errors
/// Returns an error if a signed header is absent
pub fn create_canonical_request<K, V>(
    method: &Method,
    raw_path: &str,
    query_strings: impl IntoIterator<Item = (K, V)>,
    headers: &OrderedHeaders<'_>,
    signed_names: &[impl AsRef<str>],
    payload_hash: &str,
) -> Result<String, MissingSignedHeader>
where
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    let canonical_headers = canonical::canonical_headers(headers, signed_names)?;

    let ans = String::with_capacity(256)
        .also(|ans| {
            // <HTTPMethod>\n
            ans.push_str(method.as_str());
            ans.push('\n');
        })
        .also(|ans| {
            // <CanonicalURI>\n
            ans.push_str(&canonical::canonical_uri(raw_path));
            ans.push('\n');
        })
        .also(|ans| {
            // <CanonicalQueryString>\n
            ans.push_str(&canonical::canonical_query_string(query_strings));
            ans.push('\n');
        })
        .also(|ans| {
            // <CanonicalHeaders>\n
            ans.push_str(&canonical_headers);
            ans.push('\n');
        })
        .also(|ans| {
            // <SignedHeaders>\n
            for (i, name) in signed_names.iter().enumerate() {
                if i != 0 {
                    ans.push(';');
                }
                ans.push_str(name.as_ref());
            }
            ans.push('\n');
        })
        .also(|ans| {
            // <HashedPayload>
            ans.push_str(payload_hash);
        });

    Ok(ans)
}

/// create string to sign
///
/// `timestamp` is the request timestamp exactly as the client sent it.
#[must_use]
pub fn create_string_to_sign(
    canonical_request: &str,
    timestamp: &str,
    scope: &CredentialScope<'_>,
) -> String {
    String::with_capacity(256)
        .also(|ans| {
            // <Algorithm>\n
            ans.push_str(AWS4_HMAC_SHA256);
            ans.push('\n');
        })
        .also(|ans| {
            // <RequestDateTime>\n
            ans.push_str(timestamp);
            ans.push('\n');
        })
        .also(|ans| {
            // <CredentialScope>\n
            ans.push_str(&scope.to_string());
            ans.push('\n');
        })
        .also(|ans| {
            // <HashedCanonicalRequest>
            ans.push_str(&canonical::sha256_hex(canonical_request.as_bytes()));
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature_v4::SigningKey;

    const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
    const TIMESTAMP: &str = "20130524T000000Z";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    const NO_QUERY: [(&str, &str); 0] = [];

    const SCOPE: CredentialScope<'static> = CredentialScope {
        date: "20130524",
        region: "us-east-1",
        service: "s3",
    };

    fn sign(string_to_sign: &str) -> String {
        SigningKey::derive(SECRET_ACCESS_KEY, &SCOPE).sign(string_to_sign)
    }

    #[test]
    fn example_get_object() {
        let headers = OrderedHeaders::from_slice_unchecked(&[
            ("host", "examplebucket.s3.amazonaws.com"),
            ("range", "bytes=0-9"),
            ("x-amz-content-sha256", EMPTY_SHA256),
            ("x-amz-date", TIMESTAMP),
        ]);
        let signed = ["host", "range", "x-amz-content-sha256", "x-amz-date"];

        let canonical_request = create_canonical_request(
            &Method::GET,
            "/test.txt",
            NO_QUERY,
            &headers,
            &signed,
            EMPTY_SHA256,
        )
        .unwrap();

        assert_eq!(
            canonical_request,
            concat!(
                "GET\n",
                "/test.txt\n",
                "\n",
                "host:examplebucket.s3.amazonaws.com\n",
                "range:bytes=0-9\n",
                "x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n",
                "x-amz-date:20130524T000000Z\n",
                "\n",
                "host;range;x-amz-content-sha256;x-amz-date\n",
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            )
        );

        let string_to_sign = create_string_to_sign(&canonical_request, TIMESTAMP, &SCOPE);
        assert_eq!(
            string_to_sign,
            concat!(
                "AWS4-HMAC-SHA256\n",
                "20130524T000000Z\n",
                "20130524/us-east-1/s3/aws4_request\n",
                "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972",
            )
        );

        assert_eq!(
            sign(&string_to_sign),
            "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
        );
    }

    #[test]
    fn example_put_object_single_chunk() {
        let payload = "Welcome to Amazon S3.";
        let payload_hash = canonical::sha256_hex(payload.as_bytes());
        assert_eq!(
            payload_hash,
            "44ce7dd67c959e0d3524ffac1771dfbba87d2b6b4b4e99e42034a8b803f8b072"
        );

        let headers = OrderedHeaders::from_slice_unchecked(&[
            ("date", "Fri, 24 May 2013 00:00:00 GMT"),
            ("host", "examplebucket.s3.amazonaws.com"),
            ("x-amz-content-sha256", payload_hash.as_str()),
            ("x-amz-date", TIMESTAMP),
            ("x-amz-storage-class", "REDUCED_REDUNDANCY"),
        ]);
        let signed = [
            "date",
            "host",
            "x-amz-content-sha256",
            "x-amz-date",
            "x-amz-storage-class",
        ];

        let canonical_request = create_canonical_request(
            &Method::PUT,
            "/test$file.text",
            NO_QUERY,
            &headers,
            &signed,
            &payload_hash,
        )
        .unwrap();

        assert_eq!(
            canonical_request,
            concat!(
                "PUT\n",
                "/test%24file.text\n",
                "\n",
                "date:Fri, 24 May 2013 00:00:00 GMT\n",
                "host:examplebucket.s3.amazonaws.com\n",
                "x-amz-content-sha256:44ce7dd67c959e0d3524ffac1771dfbba87d2b6b4b4e99e42034a8b803f8b072\n",
                "x-amz-date:20130524T000000Z\n",
                "x-amz-storage-class:REDUCED_REDUNDANCY\n",
                "\n",
                "date;host;x-amz-content-sha256;x-amz-date;x-amz-storage-class\n",
                "44ce7dd67c959e0d3524ffac1771dfbba87d2b6b4b4e99e42034a8b803f8b072",
            )
        );

        let string_to_sign = create_string_to_sign(&canonical_request, TIMESTAMP, &SCOPE);
        assert_eq!(
            string_to_sign,
            concat!(
                "AWS4-HMAC-SHA256\n",
                "20130524T000000Z\n",
                "20130524/us-east-1/s3/aws4_request\n",
                "9e0e90d9c76de8fa5b200d8c849cd5b8dc7a3be3951ddb7f6a76b4158342019d",
            )
        );

        assert_eq!(
            sign(&string_to_sign),
            "98ad721746da40c64f1a55b78f14c238d841ea1380cd77a1b5971af0ece108bd"
        );
    }

    #[test]
    fn example_get_bucket_lifecycle_configuration() {
        let headers = OrderedHeaders::from_slice_unchecked(&[
            ("host", "examplebucket.s3.amazonaws.com"),
            ("x-amz-content-sha256", EMPTY_SHA256),
            ("x-amz-date", TIMESTAMP),
        ]);
        let signed = ["host", "x-amz-content-sha256", "x-amz-date"];

        let canonical_request = create_canonical_request(
            &Method::GET,
            "/",
            [("lifecycle", "")],
            &headers,
            &signed,
            EMPTY_SHA256,
        )
        .unwrap();

        assert_eq!(
            canonical_request,
            concat!(
                "GET\n",
                "/\n",
                "lifecycle=\n",
                "host:examplebucket.s3.amazonaws.com\n",
                "x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n",
                "x-amz-date:20130524T000000Z\n",
                "\n",
                "host;x-amz-content-sha256;x-amz-date\n",
                "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
            )
        );

        let string_to_sign = create_string_to_sign(&canonical_request, TIMESTAMP, &SCOPE);
        assert_eq!(
            sign(&string_to_sign),
            "fea454ca298b7da1c68078a5d1bdbfbbe0d65c699e0f91ac7a200a0136783543"
        );
    }

    #[test]
    fn example_list_objects() {
        let headers = OrderedHeaders::from_slice_unchecked(&[
            ("host", "examplebucket.s3.amazonaws.com"),
            ("x-amz-content-sha256", EMPTY_SHA256),
            ("x-amz-date", TIMESTAMP),
        ]);
        let signed = ["host", "x-amz-content-sha256", "x-amz-date"];

        let canonical_request = create_canonical_request(
            &Method::GET,
            "/",
            vec![("prefix", "J"), ("max-keys", "2")],
            &headers,
            &signed,
            EMPTY_SHA256,
        )
        .unwrap();

        assert!(canonical_request.starts_with("GET\n/\nmax-keys=2&prefix=J\n"));

        let string_to_sign = create_string_to_sign(&canonical_request, TIMESTAMP, &SCOPE);
        assert_eq!(
            sign(&string_to_sign),
            "34b48302e7b5fa45bde8084f4b7868a86f0a534bc59db6670ed5711ef69dc6f7"
        );
    }

    #[test]
    fn missing_signed_header() {
        let headers = OrderedHeaders::from_slice_unchecked(&[("host", "example.com")]);
        let err = create_canonical_request(
            &Method::GET,
            "/",
            NO_QUERY,
            &headers,
            &["host", "x-amz-date"],
            EMPTY_SHA256,
        )
        .unwrap_err();
        assert_eq!(err.name, "x-amz-date");
    }
}
