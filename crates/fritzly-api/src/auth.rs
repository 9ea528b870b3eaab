// Challenge-response authentication
//
// The router never sees the password. `GET /login_sid.lua` returns a
// nonce, we answer with `challenge-md5(utf16le(challenge-password))`,
// and the router replies with a session id (or the zero sentinel).

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Error;
use crate::session::Session;
use crate::sid::SessionId;
use crate::transport;

const LOGIN_PATH: &str = "/login_sid.lua";
const HOME_PATH: &str = "/home/home.lua";

/// Credentials for logging in. Older firmware runs password-only, so the
/// username is optional.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: Option<String>, password: SecretString) -> Self {
        Self { username, password }
    }
}

/// The `<SessionInfo>` document served by `login_sid.lua`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionInfo {
    #[serde(rename = "SID", default)]
    sid: String,
    #[serde(default)]
    challenge: String,
    #[serde(default)]
    block_time: Option<u64>,
}

fn parse_session_info(body: &str) -> Result<SessionInfo, Error> {
    quick_xml::de::from_str(body).map_err(|e| Error::Xml {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

/// Compute the login response for a challenge.
///
/// Characters above code point 255 are replaced with `.` before hashing,
/// matching what the router does on its side. The digest is taken over
/// the UTF-16LE encoding and rendered as lowercase hex.
pub fn challenge_response(challenge: &str, password: &str) -> String {
    let masked: String = password
        .chars()
        .map(|c| if u32::from(c) > 255 { '.' } else { c })
        .collect();

    let mut hasher = Md5::new();
    for unit in format!("{challenge}-{masked}").encode_utf16() {
        hasher.update(unit.to_le_bytes());
    }
    format!("{challenge}-{:x}", hasher.finalize())
}

impl Session {
    /// Log in, or adopt the current session if the router still accepts it.
    ///
    /// Idempotent: calling it on a live session only refreshes the
    /// last-action timestamp.
    pub async fn login(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let url = if self.sid().is_valid() {
            self.endpoint_with_sid(LOGIN_PATH)?
        } else {
            self.endpoint(LOGIN_PATH)?
        };

        debug!(%url, "requesting login challenge");
        let body = transport::send_text(self.http().get(url), cancel).await?;
        let info = parse_session_info(&body)?;

        let sid = SessionId::new(info.sid);
        if sid.is_valid() {
            debug!("router reports session still valid");
            self.adopt(sid);
            return Ok(());
        }

        if info.challenge.is_empty() {
            return Err(Error::protocol("login response carries no challenge"));
        }

        let response = challenge_response(
            &info.challenge,
            self.credentials().password.expose_secret(),
        );
        let mut form: Vec<(&str, &str)> = vec![("response", response.as_str())];
        if let Some(username) = self.credentials().username.as_deref() {
            form.push(("username", username));
        }

        let url = self.endpoint(LOGIN_PATH)?;
        debug!(%url, "posting challenge response");
        let body = transport::send_text(self.http().post(url).form(&form), cancel).await?;
        let info = parse_session_info(&body)?;

        let sid = SessionId::new(info.sid);
        if !sid.is_valid() {
            let message = match info.block_time {
                Some(secs) if secs > 0 => {
                    format!("challenge response rejected, login blocked for {secs}s")
                }
                _ => "challenge response rejected".to_owned(),
            };
            return Err(Error::LoginFailed { message });
        }

        debug!("login successful");
        self.adopt(sid);
        Ok(())
    }

    /// Ask the router whether the current session is still alive.
    ///
    /// Records activity either way, since the exchange itself succeeded.
    pub async fn invalidate(&self, cancel: &CancellationToken) -> Result<bool, Error> {
        let url = self.endpoint_with_sid(LOGIN_PATH)?;
        debug!(%url, "checking session validity");

        let body = transport::send_text(self.http().get(url), cancel).await?;
        let info = parse_session_info(&body)?;
        self.touch();

        Ok(SessionId::new(info.sid).is_valid())
    }

    /// End the session.
    ///
    /// The local identity is dropped whatever the router answers. Returns
    /// whether the router redirected to its login page, which is how it
    /// acknowledges the logout.
    pub async fn logout(&self, cancel: &CancellationToken) -> Result<bool, Error> {
        self.force_session(cancel).await?;

        let mut url = self.endpoint_with_sid(HOME_PATH)?;
        url.query_pairs_mut().append_pair("logout", "1");
        debug!(%url, "logging out");

        let result = transport::send_text(self.http().get(url), cancel).await;
        self.reset();

        let body = result?;
        let acknowledged = body.contains("/login.lua");
        if !acknowledged {
            warn!("router did not acknowledge logout");
        }
        Ok(acknowledged)
    }
}
