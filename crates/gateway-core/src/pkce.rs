//! PKCE (Proof Key for Code Exchange) generation, per RFC 7636 S256.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::security::ANTHROPIC_OAUTH;

/// Verifier/challenge/state triple for a single pending login attempt.
///
/// Unlike a naive PKCE implementation, `state` is generated independently
/// of `challenge` — it authenticates the callback round-trip, the challenge
/// authenticates the code exchange, and the two must not be conflated.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

/// Generate a fresh, cryptographically random verifier/challenge/state triple.
pub fn generate_pkce() -> PkcePair {
    let verifier = random_url_safe_token();
    let hash = Sha256::digest(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hash);
    let state = random_url_safe_token();

    PkcePair {
        verifier,
        challenge,
        state,
    }
}

fn random_url_safe_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the full authorize URL for the Claude Code OAuth client.
pub fn build_auth_url(pair: &PkcePair) -> String {
    let scopes = ANTHROPIC_OAUTH.scopes.join(" ");

    format!(
        "{}?code=true&client_id={}&redirect_uri={}&response_type=code&scope={}&code_challenge={}&code_challenge_method=S256&state={}",
        ANTHROPIC_OAUTH.auth_url,
        ANTHROPIC_OAUTH.client_id,
        encode(ANTHROPIC_OAUTH.redirect_uri),
        encode(&scopes),
        pair.challenge,
        pair.state,
    )
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

/// The code pasted back by the user may come as `code#state` (Anthropic's
/// callback page concatenates them). Split it and return `(code, state)`.
pub fn split_pasted_code(pasted: &str) -> (&str, Option<&str>) {
    match pasted.split_once('#') {
        Some((code, state)) => (code, Some(state)),
        None => (pasted, None),
    }
}
