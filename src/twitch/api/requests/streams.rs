use log::debug;

use crate::twitch::api::{LookupError, StreamInfo, TwitchAPIClient};

/// Returns the live stream for `user_login`, or `None` when the channel is
/// offline.
pub async fn get_stream_info(
    api_client: &TwitchAPIClient,
    user_login: &str,
) -> Result<Option<StreamInfo>, LookupError> {
    let streams: Vec<StreamInfo> = api_client
        .helix_get("streams", &[("user_login", user_login)])
        .await?;

    let stream = streams
        .into_iter()
        .find(|stream| stream.user_login.eq_ignore_ascii_case(user_login));

    match &stream {
        Some(stream) => debug!("{} is live (session {})", user_login, stream.id),
        None => debug!("{} is offline", user_login),
    }

    Ok(stream)
}
