use md5::{Digest, Md5};

/// Sign a parameter set the way the affiliate gateway verifies it:
/// uppercase-hex MD5 over `secret + k₁v₁k₂v₂… + secret` with keys in
/// ascending byte order.
pub fn sign(params: &[(String, String)], secret: &str) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut payload = String::with_capacity(
        2 * secret.len() + sorted.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>(),
    );
    payload.push_str(secret);
    for (key, value) in sorted {
        payload.push_str(key);
        payload.push_str(value);
    }
    payload.push_str(secret);

    hex::encode_upper(Md5::digest(payload.as_bytes()))
}
