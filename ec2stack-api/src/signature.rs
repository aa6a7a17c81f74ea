//! EC2 query signatures, version 2.

use base64::Engine;
use ec2stack_cloudstack::{Ec2Error, Ec2Request};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMethod {
    HmacSha1,
    HmacSha256,
}

impl SignatureMethod {
    pub fn parse(name: &str) -> Result<Self, Ec2Error> {
        match name {
            "HmacSHA1" => Ok(SignatureMethod::HmacSha1),
            "HmacSHA256" => Ok(SignatureMethod::HmacSha256),
            other => Err(Ec2Error::AuthFailure(format!(
                "unsupported SignatureMethod {other}"
            ))),
        }
    }
}

/// `name=value` pairs except `Signature`, RFC 3986 encoded, sorted by name.
pub fn canonical_query(request: &Ec2Request) -> String {
    // BTreeMap iteration is already sorted by byte order of the name.
    request
        .params()
        .iter()
        .filter(|(name, _)| name.as_str() != "Signature")
        .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(method: &str, host: &str, path: &str, request: &Ec2Request) -> String {
    let path = if path.is_empty() { "/" } else { path };
    format!(
        "{}\n{}\n{}\n{}",
        method.to_uppercase(),
        host.to_lowercase(),
        path,
        canonical_query(request)
    )
}

/// Base64 signature of `string_to_sign` under `secret_key`.
pub fn sign(
    method: SignatureMethod,
    secret_key: &str,
    string_to_sign: &str,
) -> Result<String, Ec2Error> {
    let digest = match method {
        SignatureMethod::HmacSha1 => {
            let mut mac = new_mac::<HmacSha1>(secret_key)?;
            mac.update(string_to_sign.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        SignatureMethod::HmacSha256 => {
            let mut mac = new_mac::<HmacSha256>(secret_key)?;
            mac.update(string_to_sign.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };
    Ok(base64::engine::general_purpose::STANDARD.encode(digest))
}

/// Constant-time check of a base64 `signature`.
pub fn verify(
    method: SignatureMethod,
    secret_key: &str,
    string_to_sign: &str,
    signature: &str,
) -> Result<(), Ec2Error> {
    let provided = base64::engine::general_purpose::STANDARD
        .decode(signature)
        .map_err(|_| Ec2Error::SignatureDoesNotMatch)?;

    let verified = match method {
        SignatureMethod::HmacSha1 => {
            let mut mac = new_mac::<HmacSha1>(secret_key)?;
            mac.update(string_to_sign.as_bytes());
            mac.verify_slice(&provided)
        }
        SignatureMethod::HmacSha256 => {
            let mut mac = new_mac::<HmacSha256>(secret_key)?;
            mac.update(string_to_sign.as_bytes());
            mac.verify_slice(&provided)
        }
    };
    verified.map_err(|_| Ec2Error::SignatureDoesNotMatch)
}

fn new_mac<M: Mac + KeyInit>(secret_key: &str) -> Result<M, Ec2Error> {
    <M as KeyInit>::new_from_slice(secret_key.as_bytes())
        .map_err(|e| Ec2Error::AuthFailure(format!("HMAC error: {e}")))
}
